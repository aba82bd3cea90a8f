use std::fmt;

#[derive(Debug, PartialEq)]
pub enum CoreError {
    /// Malformed line in the tenant list (1-based line number).
    TenantLine { line: usize, message: String },
    /// Sales file content does not follow `<lot>|<DDMMYYYY>|<amount>`.
    InvalidContent(String),
    /// Amount is not a plain two-decimal number.
    InvalidAmount(String),
    /// IO error (tenant file read, etc.).
    Io(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TenantLine { line, message } => write!(f, "tenant list line {line}: {message}"),
            Self::InvalidContent(msg) => write!(f, "invalid sales file content: {msg}"),
            Self::InvalidAmount(value) => write!(f, "invalid amount '{value}'"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}
