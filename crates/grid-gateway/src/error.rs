//! Error types for grid-gateway.

use thiserror::Error;

/// Gateway error taxonomy.
///
/// `Network` is transient: the caller may retry on the next tick with no
/// state change. `Rejected` means the venue refused the action; the caller
/// logs it and drops that single intended action.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Venue rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Failed to parse venue response: {0}")]
    Parse(String),

    #[error("Credential error: {0}")]
    Credentials(String),
}

impl GatewayError {
    /// Returns true if retrying on the next tick is reasonable.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
