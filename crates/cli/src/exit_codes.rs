//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; cron jobs rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain      | Description                                |
//! |---------|-------------|--------------------------------------------|
//! | 0       | Universal   | Success (also when some outlets failed)    |
//! | 2       | Universal   | CLI usage error (bad args)                 |
//! | 3-9     | tenants     | Tenant list problems                       |
//! | 50-59   | credentials | POS token / SFTP credentials               |
//!
//! Per-outlet failures (store lookup, fetch, transfer) are reported in the
//! log only and never change the exit code.

// =============================================================================
// Universal (0, 2)
// =============================================================================

/// Success - every outlet was attempted.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments (date, timezone).
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Tenants (3-9)
// =============================================================================

/// Tenant list could not be read.
pub const EXIT_TENANTS_IO: u8 = 3;

/// Tenant list has a malformed line.
pub const EXIT_TENANTS_PARSE: u8 = 4;

// =============================================================================
// Credentials (50-59)
// =============================================================================

/// No POS API token for the selected environment.
pub const EXIT_MISSING_TOKEN: u8 = 50;

/// `--submit` without an SFTP username.
pub const EXIT_MISSING_SFTP_CREDENTIALS: u8 = 51;
