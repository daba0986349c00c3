//! Error types for grid-ledger.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
