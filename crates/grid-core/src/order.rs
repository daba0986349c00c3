//! Order-related types and identifiers.

use crate::{Price, Qty};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// State of an order as reported by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Resting on the book.
    Open,
    /// Completely filled.
    Filled,
    /// Cancelled (by us or by the venue).
    Cancelled,
    /// Rejected by the venue.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }

    /// Returns true if the order still rests on the book.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Client order ID for idempotency.
///
/// Every placement carries a unique cloid so a retried request cannot
/// create a duplicate order on the venue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `grid_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("grid_{ts}_{uuid_short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order as the engine tracks it: one venue-acknowledged limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveOrder {
    /// Venue-assigned order identifier (opaque).
    pub venue_id: String,
    /// Order side.
    pub side: Side,
    /// Limit price.
    pub price: Price,
    /// Order quantity.
    pub qty: Qty,
    /// Last known status.
    pub status: OrderStatus,
}

impl LiveOrder {
    /// Returns true if this order occupies the given (side, price) slot.
    #[must_use]
    pub fn occupies(&self, side: Side, price: Price) -> bool {
        self.side == side && self.price == price
    }
}

/// Raw venue acknowledgment of a placement.
///
/// Carried back to the order manager so the full response can be logged
/// for observability; only `venue_id` and `status` drive control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub symbol: String,
    pub venue_id: String,
    pub client_order_id: String,
    pub side: Side,
    pub price: Price,
    pub requested_qty: Qty,
    pub executed_qty: Qty,
    pub status: OrderStatus,
}
