//! `mallfeed`: daily per-outlet sales submission.
//!
//! For each tenant: resolve the POS store, fetch the day's receipts, compute
//! net sales, write `<lot>_<DDMMYYYY>.txt` and push it to the mall's SFTP
//! server. Outlets are processed one after another; one failing outlet never
//! stops the rest.

pub mod config;
pub mod delivery;
pub mod exit_codes;
pub mod logging;
pub mod run;

use exit_codes::{EXIT_TENANTS_IO, EXIT_TENANTS_PARSE, EXIT_USAGE};
use mallfeed_core::CoreError;

/// Startup error: aborts the whole run with a non-zero exit code.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Map a tenant list error to its exit code.
    pub fn tenants(err: CoreError) -> Self {
        let code = match err {
            CoreError::TenantLine { .. } => EXIT_TENANTS_PARSE,
            _ => EXIT_TENANTS_IO,
        };
        Self { code, message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// `--version` text: crate version, commit and build target.
pub fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
            "\napi:     ", "loyverse v1.0",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
            "\napi:     ", "loyverse v1.0",
        )
    }
}
