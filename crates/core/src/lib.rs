//! `mallfeed-core`: tenants, net sales aggregation, sales file codec.
//!
//! Pure crate: receives already-fetched receipts, returns the figure and
//! the file the mall expects. No network, no logging.

pub mod aggregate;
pub mod codec;
pub mod error;
pub mod model;
pub mod tenants;

pub use aggregate::{aggregate, net_sales};
pub use codec::{encode_file_content, encode_file_name, parse_file_content};
pub use error::CoreError;
pub use model::{AggregationResult, SalesFile, Tenant, TransactionRecord};
pub use tenants::{load_tenants, parse_tenants};
