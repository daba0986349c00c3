//! Core domain types for the grid trading bot.
//!
//! This crate provides the fundamental types used throughout the system:
//! - `Price`, `Qty`: precision-safe numeric types
//! - `Side`, `OrderStatus`, `LiveOrder`: order model
//! - `GridLine`, `GridState`: grid geometry and per-tick state

pub mod decimal;
pub mod error;
pub mod grid;
pub mod order;

pub use decimal::{Price, Qty};
pub use error::{CoreError, Result};
pub use grid::{adaptive_spacing, compute_grid_lines, GridLine, GridState};
pub use order::{ClientOrderId, LiveOrder, OrderAck, OrderStatus, Side};
