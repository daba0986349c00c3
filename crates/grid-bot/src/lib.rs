//! Grid trading bot application.
//!
//! Orchestrates the exchange gateway, the reconciliation engine and the
//! trade ledger behind a single poll loop.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_logging;
