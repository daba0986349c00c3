//! Engine configuration.

use crate::error::{EngineError, EngineResult};
use grid_core::{adaptive_spacing, Price, Qty};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the distance between adjacent grid lines is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum SpacingPolicy {
    /// Constant spacing for the lifetime of the run.
    Fixed {
        #[serde(with = "rust_decimal::serde::str")]
        grid_spacing: Decimal,
    },
    /// Spacing recomputed from the latest observed price so that one
    /// filled round trip earns roughly `target_profit_percent`.
    Adaptive {
        #[serde(with = "rust_decimal::serde::str")]
        target_profit_percent: Decimal,
    },
}

impl Default for SpacingPolicy {
    fn default() -> Self {
        Self::Fixed {
            grid_spacing: default_grid_spacing(),
        }
    }
}

impl SpacingPolicy {
    /// Spacing to use for a price observed now.
    pub fn spacing_for(&self, order_qty: Qty, last_price: Price) -> Price {
        match self {
            Self::Fixed { grid_spacing } => Price::new(*grid_spacing),
            Self::Adaptive {
                target_profit_percent,
            } => adaptive_spacing(order_qty, last_price, *target_profit_percent),
        }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, Self::Adaptive { .. })
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trading pair, venue notation (e.g. "BTCUSDT").
    pub symbol: String,

    /// Grid spacing policy.
    #[serde(default)]
    pub spacing: SpacingPolicy,

    /// Number of grid intervals; the planner produces `count + 1` lines.
    #[serde(default = "default_grid_line_count")]
    pub grid_line_count: u32,

    /// Per-side cap on live orders.
    #[serde(default = "default_max_open_orders")]
    pub max_open_orders: u32,

    /// Quantity for each grid order (base asset).
    #[serde(
        default = "default_base_order_quantity",
        with = "rust_decimal::serde::str"
    )]
    pub base_order_quantity: Decimal,

    /// Smallest quantity the venue accepts; quantized orders below this
    /// are dropped.
    #[serde(default = "default_min_order_quantity", with = "rust_decimal::serde::str")]
    pub min_order_quantity: Decimal,

    /// Seconds between reconciliation ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Cancel any orders already open on the venue before building the
    /// initial ladder.
    #[serde(default = "default_cancel_existing_on_start")]
    pub cancel_existing_on_start: bool,

    /// Decimal places for order quantities (floor-quantized).
    #[serde(default = "default_quantity_precision")]
    pub quantity_precision: u32,

    /// Decimal places for order prices (half-up).
    #[serde(default = "default_price_precision")]
    pub price_precision: u32,
}

fn default_grid_spacing() -> Decimal {
    Decimal::new(40, 0)
}

fn default_grid_line_count() -> u32 {
    4
}

fn default_max_open_orders() -> u32 {
    4
}

fn default_base_order_quantity() -> Decimal {
    Decimal::new(18, 4) // 0.0018
}

fn default_min_order_quantity() -> Decimal {
    Decimal::new(1, 5) // 0.00001
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_cancel_existing_on_start() -> bool {
    true
}

fn default_quantity_precision() -> u32 {
    5
}

fn default_price_precision() -> u32 {
    2
}

impl EngineConfig {
    /// Validate the configuration. Called once at startup; any failure
    /// here is fatal.
    pub fn validate(&self) -> EngineResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "symbol must not be empty".to_string(),
            ));
        }
        match &self.spacing {
            SpacingPolicy::Fixed { grid_spacing } => {
                if *grid_spacing <= Decimal::ZERO {
                    return Err(EngineError::InvalidConfig(format!(
                        "grid_spacing must be positive, got {grid_spacing}"
                    )));
                }
            }
            SpacingPolicy::Adaptive {
                target_profit_percent,
            } => {
                if *target_profit_percent <= Decimal::ZERO {
                    return Err(EngineError::InvalidConfig(format!(
                        "target_profit_percent must be positive, got {target_profit_percent}"
                    )));
                }
            }
        }
        if self.grid_line_count < 1 {
            return Err(EngineError::InvalidConfig(
                "grid_line_count must be at least 1".to_string(),
            ));
        }
        if self.max_open_orders < 1 {
            return Err(EngineError::InvalidConfig(
                "max_open_orders must be at least 1".to_string(),
            ));
        }
        if self.base_order_quantity <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(format!(
                "base_order_quantity must be positive, got {}",
                self.base_order_quantity
            )));
        }
        if self.min_order_quantity < Decimal::ZERO {
            return Err(EngineError::InvalidConfig(format!(
                "min_order_quantity must not be negative, got {}",
                self.min_order_quantity
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            spacing: SpacingPolicy::default(),
            grid_line_count: default_grid_line_count(),
            max_open_orders: default_max_open_orders(),
            base_order_quantity: default_base_order_quantity(),
            min_order_quantity: default_min_order_quantity(),
            poll_interval_secs: default_poll_interval_secs(),
            cancel_existing_on_start: default_cancel_existing_on_start(),
            quantity_precision: default_quantity_precision(),
            price_precision: default_price_precision(),
        }
    }
}
