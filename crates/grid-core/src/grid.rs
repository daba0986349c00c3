//! Grid geometry: line planning and per-tick index state.
//!
//! The planner is a pure function of `(anchor, spacing, count)`; all
//! mutable bookkeeping lives in a single [`GridState`] value that the
//! reconciliation engine threads through each tick.

use crate::error::{CoreError, Result};
use crate::{Price, Qty};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One price level of the grid.
///
/// Indices are signed and centered on the anchor (index 0 = anchor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLine {
    pub index: i32,
    pub price: Price,
}

/// Compute the ordered grid lines for `(anchor, spacing, count)`.
///
/// Produces `count + 1` lines at `anchor + i * spacing`. The index range
/// uses floor division on the lower bound, so an odd `count` gets one
/// extra line below the anchor.
///
/// Fails with `InvalidConfig` if `spacing <= 0` or `count < 1`.
pub fn compute_grid_lines(anchor: Price, spacing: Price, count: u32) -> Result<Vec<GridLine>> {
    if !spacing.is_positive() {
        return Err(CoreError::InvalidConfig(format!(
            "grid spacing must be positive, got {spacing}"
        )));
    }
    if count < 1 {
        return Err(CoreError::InvalidConfig(
            "grid line count must be at least 1".to_string(),
        ));
    }

    let hi = (count / 2) as i32;
    let lo = -(((count + 1) / 2) as i32);

    Ok((lo..=hi)
        .map(|index| GridLine {
            index,
            price: anchor + spacing * Decimal::from(index),
        })
        .collect())
}

/// Spacing derived from a target profit percentage.
///
/// The adaptive policy recomputes spacing from the latest observed price
/// before each new placement: `qty * price / (1 + profit_percent)`.
pub fn adaptive_spacing(order_qty: Qty, last_price: Price, profit_percent: Decimal) -> Price {
    Price::new(order_qty.inner() * last_price.inner() / (Decimal::ONE + profit_percent))
}

/// Mutable grid state, owned exclusively by the reconciliation engine.
///
/// Created once at startup from the first observed price and mutated only
/// at the end of a tick. `last_buy_index` and `last_sell_index` move only
/// in the direction the price has actually moved; they are never stepped
/// back except on full re-initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    pub anchor_price: Price,
    pub spacing: Price,
    pub line_count: u32,
    pub last_buy_index: i32,
    pub last_sell_index: i32,
}

impl GridState {
    /// Create the initial state. Both last-indices start at the anchor.
    pub fn new(anchor_price: Price, spacing: Price, line_count: u32) -> Result<Self> {
        if !spacing.is_positive() {
            return Err(CoreError::InvalidConfig(format!(
                "grid spacing must be positive, got {spacing}"
            )));
        }
        if line_count < 1 {
            return Err(CoreError::InvalidConfig(
                "grid line count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            anchor_price,
            spacing,
            line_count,
            last_buy_index: 0,
            last_sell_index: 0,
        })
    }

    /// Grid index band containing `price`: `round((price - anchor) / spacing)`.
    ///
    /// A band beyond `i32` range saturates instead of collapsing to the
    /// anchor band, so a wildly off price still registers as a crossing.
    pub fn current_index(&self, price: Price) -> i32 {
        let bands = ((price.inner() - self.anchor_price.inner()) / self.spacing.inner()).round();
        bands.to_i32().unwrap_or(if bands.is_sign_negative() {
            i32::MIN
        } else {
            i32::MAX
        })
    }

    /// Price of the grid line at `index`.
    pub fn line_price(&self, index: i32) -> Price {
        self.anchor_price + self.spacing * Decimal::from(index)
    }

    /// Replace the spacing (adaptive policy only). Rejects non-positive values.
    pub fn set_spacing(&mut self, spacing: Price) -> Result<()> {
        if !spacing.is_positive() {
            return Err(CoreError::InvalidConfig(format!(
                "grid spacing must be positive, got {spacing}"
            )));
        }
        self.spacing = spacing;
        Ok(())
    }

    /// The full line set for the current anchor and spacing.
    pub fn lines(&self) -> Result<Vec<GridLine>> {
        compute_grid_lines(self.anchor_price, self.spacing, self.line_count)
    }
}
