//! Error types for grid-engine.
//!
//! The taxonomy mirrors the recovery policy: `Network`, `Rejection` and
//! `Precision` are handled at the tick boundary and never stop the loop;
//! `InvalidConfig` refuses to start; `Unexpected` escalates to the process
//! boundary so an external supervisor can restart the bot.

use grid_core::CoreError;
use grid_gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Transient transport failure; retry on the next tick, no state change.
    #[error("Network error: {0}")]
    Network(String),

    /// The venue refused an order or cancellation; that single action is
    /// logged and dropped.
    #[error("Exchange rejection: {0}")]
    Rejection(String),

    /// Quantized quantity is zero or below the venue minimum; the intended
    /// order is logged and dropped.
    #[error("Precision error: {0}")]
    Precision(String),

    /// Startup-time configuration problem; fatal, refuses to start.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Anything uncaught inside a tick. Restart-worthy under external
    /// supervision.
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl EngineError {
    /// Returns true if the loop should simply attempt the next tick.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Rejection(_) | Self::Precision(_)
        )
    }
}

impl From<GatewayError> for EngineError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Network(m) => Self::Network(m),
            GatewayError::Rejected { code, message } => {
                Self::Rejection(format!("venue code {code}: {message}"))
            }
            // Odd payloads from the venue are treated like transport noise:
            // the next poll fetches fresh data.
            GatewayError::Parse(m) => Self::Network(m),
            GatewayError::Credentials(m) => Self::InvalidConfig(m),
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidConfig(m) => Self::InvalidConfig(m),
            other => Self::Unexpected(other.to_string()),
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
