//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] grid_gateway::GatewayError),

    #[error("Engine error: {0}")]
    Engine(#[from] grid_engine::EngineError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] grid_ledger::LedgerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
