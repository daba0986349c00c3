//! Wire types for the venue REST API.
//!
//! The venue serializes all decimals as strings; `rust_decimal`'s string
//! serde keeps them exact. Conversions into `grid-core` types happen here
//! so the rest of the system never sees venue strings.

use crate::error::{GatewayError, GatewayResult};
use grid_core::{LiveOrder, OrderAck, OrderStatus, Price, Qty, Side};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Response of `GET /api/v3/ticker/price`.
#[derive(Debug, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// One entry of `GET /api/v3/openOrders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderEntry {
    pub order_id: u64,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub orig_qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub executed_qty: Decimal,
    pub status: String,
    pub side: String,
}

/// Acknowledgment of `POST /api/v3/order`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAckResponse {
    pub symbol: String,
    pub order_id: u64,
    pub client_order_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub orig_qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub executed_qty: Decimal,
    pub status: String,
    pub side: String,
}

/// One balance entry of `GET /api/v3/account`.
#[derive(Debug, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub locked: Decimal,
}

/// Response of `GET /api/v3/account` (fields we consume).
#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    pub balances: Vec<AssetBalance>,
}

/// Venue error body, e.g. `{"code":-1013,"msg":"Filter failure: LOT_SIZE"}`.
#[derive(Debug, Deserialize)]
pub struct VenueErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Map a venue status string onto the order model.
pub fn parse_status(status: &str) -> GatewayResult<OrderStatus> {
    match status {
        "NEW" | "PARTIALLY_FILLED" => Ok(OrderStatus::Open),
        "FILLED" => Ok(OrderStatus::Filled),
        "CANCELED" | "PENDING_CANCEL" | "EXPIRED" => Ok(OrderStatus::Cancelled),
        "REJECTED" => Ok(OrderStatus::Rejected),
        other => Err(GatewayError::Parse(format!(
            "unknown order status: {other}"
        ))),
    }
}

/// Map a venue side string onto [`Side`].
pub fn parse_side(side: &str) -> GatewayResult<Side> {
    match side {
        "BUY" => Ok(Side::Buy),
        "SELL" => Ok(Side::Sell),
        other => Err(GatewayError::Parse(format!("unknown order side: {other}"))),
    }
}

/// Venue-facing side string.
pub fn side_param(side: Side) -> &'static str {
    match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}

impl OpenOrderEntry {
    /// Convert into the engine's order model.
    pub fn into_live_order(self) -> GatewayResult<LiveOrder> {
        Ok(LiveOrder {
            venue_id: self.order_id.to_string(),
            side: parse_side(&self.side)?,
            price: Price::new(self.price),
            qty: Qty::new(self.orig_qty),
            status: parse_status(&self.status)?,
        })
    }
}

impl OrderAckResponse {
    /// Convert into the engine's acknowledgment model.
    pub fn into_order_ack(self) -> GatewayResult<OrderAck> {
        Ok(OrderAck {
            symbol: self.symbol,
            venue_id: self.order_id.to_string(),
            client_order_id: self.client_order_id,
            side: parse_side(&self.side)?,
            price: Price::new(self.price),
            requested_qty: Qty::new(self.orig_qty),
            executed_qty: Qty::new(self.executed_qty),
            status: parse_status(&self.status)?,
        })
    }
}
