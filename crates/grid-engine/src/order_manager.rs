//! Order placement and cancellation on top of the exchange gateway.
//!
//! The manager owns venue precision handling: every quantity is
//! floor-quantized before it leaves the process, and a quantity that
//! quantizes below the venue minimum is refused here rather than bounced
//! by the venue.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use grid_core::{ClientOrderId, LiveOrder, OrderStatus, Price, Qty, Side};
use grid_gateway::ExchangeGateway;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

pub struct OrderManager {
    gateway: Arc<dyn ExchangeGateway>,
    symbol: String,
    quantity_precision: u32,
    min_order_quantity: Decimal,
}

impl OrderManager {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, config: &EngineConfig) -> Self {
        Self {
            gateway,
            symbol: config.symbol.clone(),
            quantity_precision: config.quantity_precision,
            min_order_quantity: config.min_order_quantity,
        }
    }

    /// Place one limit order at `price` for `qty`, floor-quantized to the
    /// venue's quantity precision.
    ///
    /// Returns the order as the engine should track it. A quantity that
    /// quantizes to zero or below the venue minimum yields
    /// `EngineError::Precision` without touching the network.
    pub async fn place_order(&self, side: Side, price: Price, qty: Qty) -> EngineResult<LiveOrder> {
        let quantized = qty.quantize_down(self.quantity_precision);
        if !quantized.is_positive() || quantized.inner() < self.min_order_quantity {
            return Err(EngineError::Precision(format!(
                "quantity {qty} quantizes to {quantized} at {} decimals (minimum {})",
                self.quantity_precision, self.min_order_quantity
            )));
        }

        let client_order_id = ClientOrderId::new();
        let ack = self
            .gateway
            .place_limit_order(&self.symbol, side, quantized, price, &client_order_id)
            .await?;

        // Full acknowledgment goes to the log; only id and status drive
        // control flow.
        info!(
            symbol = %ack.symbol,
            venue_id = %ack.venue_id,
            client_order_id = %ack.client_order_id,
            side = %ack.side,
            price = %ack.price,
            requested_qty = %ack.requested_qty,
            executed_qty = %ack.executed_qty,
            status = %ack.status,
            "Order acknowledged"
        );

        if ack.status == OrderStatus::Rejected {
            return Err(EngineError::Rejection(format!(
                "venue rejected {side} {quantized} @ {price}"
            )));
        }

        Ok(LiveOrder {
            venue_id: ack.venue_id,
            side,
            price,
            qty: quantized,
            status: ack.status,
        })
    }

    /// Cancel every open order on the venue for our symbol.
    ///
    /// A failed cancellation is logged and skipped; the sweep keeps going
    /// so one stuck order cannot block startup.
    pub async fn cancel_all(&self) -> EngineResult<usize> {
        let open = self.gateway.fetch_open_orders(&self.symbol).await?;
        let total = open.len();
        let mut cancelled = 0usize;

        for order in open {
            match self.gateway.cancel_order(&order.venue_id, &self.symbol).await {
                Ok(()) => {
                    info!(
                        venue_id = %order.venue_id,
                        side = %order.side,
                        price = %order.price,
                        "Cancelled open order"
                    );
                    cancelled += 1;
                }
                Err(e) => {
                    warn!(
                        venue_id = %order.venue_id,
                        error = %e,
                        "Failed to cancel order, continuing sweep"
                    );
                }
            }
        }

        if total > 0 {
            info!(cancelled, total, "Cancel sweep finished");
        }
        Ok(cancelled)
    }
}
