//! Grid state machine and order reconciliation.
//!
//! [`ReconcileEngine`] is the heart of the bot: anchored once at startup,
//! then driven by a fixed-interval poll loop that reconciles the observed
//! price and the venue's open orders against its own book.

pub mod config;
pub mod engine;
pub mod error;
pub mod order_manager;

pub use config::{EngineConfig, SpacingPolicy};
pub use engine::{ReconcileEngine, TickReport};
pub use error::{EngineError, EngineResult};
pub use order_manager::OrderManager;
