//! The exchange gateway contract consumed by the core.
//!
//! The gateway owns all network concerns; the engine sees only typed
//! results and the error taxonomy in [`crate::error`].

use crate::error::GatewayResult;
use async_trait::async_trait;
use grid_core::{ClientOrderId, LiveOrder, OrderAck, Price, Qty, Side};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Narrow interface to the trading venue.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Latest traded price for `symbol`.
    async fn fetch_price(&self, symbol: &str) -> GatewayResult<Price>;

    /// All currently open orders for `symbol`.
    async fn fetch_open_orders(&self, symbol: &str) -> GatewayResult<Vec<LiveOrder>>;

    /// Place a limit order; returns the venue acknowledgment.
    async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        qty: Qty,
        price: Price,
        client_order_id: &ClientOrderId,
    ) -> GatewayResult<OrderAck>;

    /// Cancel a single order by venue id.
    async fn cancel_order(&self, venue_id: &str, symbol: &str) -> GatewayResult<()>;

    /// Total balances (free + locked) for the requested assets.
    ///
    /// Used only by the startup funds report.
    async fn fetch_balances(&self, assets: &[String]) -> GatewayResult<HashMap<String, Decimal>>;
}
