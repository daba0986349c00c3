//! Exchange gateway for the grid trading bot.
//!
//! Defines the [`ExchangeGateway`] contract the engine consumes and a
//! signed REST adapter implementing it against a Binance-style venue.

pub mod credentials;
pub mod error;
pub mod gateway;
pub mod rest;
pub mod types;

pub use credentials::ApiCredentials;
pub use error::{GatewayError, GatewayResult};
pub use gateway::ExchangeGateway;
pub use rest::{GatewayConfig, RestGateway};
