//! POS sales API client.
//!
//! Blocking reqwest client (no Tokio runtime required). Covers the two reads
//! the daily submission needs: store lookup by name and the receipts of one
//! store for one business date, following the continuation cursor.

mod client;
mod receipts;
mod stores;
pub mod window;

pub use client::{ApiConfig, PosClient, PosError, DEFAULT_API_BASE};
pub use receipts::PAGE_LIMIT;
pub use stores::{match_store, Store};
pub use window::DateWindow;
