//! Poll-based reconciliation engine.
//!
//! The engine observes the market once per tick and reconciles three
//! views: the latest traded price, the venue's open-order set, and its
//! own in-memory order book. Price crossings place new grid orders;
//! orders that vanish from the venue's open set are treated as fills,
//! logged to the ledger exactly once, and replaced one spacing further
//! out. Grid state is written back only when a tick completes, so a
//! failed tick leaves the engine exactly where it was.

use crate::config::{EngineConfig, SpacingPolicy};
use crate::error::{EngineError, EngineResult};
use crate::order_manager::OrderManager;
use grid_core::{GridState, LiveOrder, Price, Qty, Side};
use grid_gateway::ExchangeGateway;
use grid_ledger::{TradeLedger, TradeRecord};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orders placed on each side of the anchor when the ladder is built.
const INITIAL_LADDER_DEPTH: u32 = 2;

/// What one tick did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub price: Price,
    pub current_index: i32,
    pub orders_placed: usize,
    pub fills_detected: usize,
}

pub struct ReconcileEngine {
    config: EngineConfig,
    gateway: Arc<dyn ExchangeGateway>,
    orders: OrderManager,
    ledger: TradeLedger,
    /// None until [`initialize`](Self::initialize) has run.
    state: Option<GridState>,
    /// Orders we placed and still believe to be resting, by venue id.
    tracked: HashMap<String, LiveOrder>,
}

impl ReconcileEngine {
    pub fn new(
        config: EngineConfig,
        gateway: Arc<dyn ExchangeGateway>,
        ledger: TradeLedger,
    ) -> EngineResult<Self> {
        config.validate()?;
        let orders = OrderManager::new(gateway.clone(), &config);
        Ok(Self {
            config,
            gateway,
            orders,
            ledger,
            state: None,
            tracked: HashMap::new(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    /// Grid state, once initialized.
    pub fn state(&self) -> Option<&GridState> {
        self.state.as_ref()
    }

    /// The orders the engine currently believes to be resting.
    pub fn tracked_orders(&self) -> impl Iterator<Item = &LiveOrder> {
        self.tracked.values()
    }

    /// Anchor the grid on the first observed price and build the initial
    /// symmetric ladder.
    ///
    /// Orders already open on the venue are cancelled first when
    /// `cancel_existing_on_start` is set; otherwise they are adopted into
    /// the tracked set, so no line ever carries two live orders on the
    /// same side.
    pub async fn initialize(&mut self) -> EngineResult<()> {
        let anchor = self.gateway.fetch_price(&self.config.symbol).await?;
        let spacing = self
            .config
            .spacing
            .spacing_for(Qty::new(self.config.base_order_quantity), anchor);
        let state = GridState::new(anchor, spacing, self.config.grid_line_count)?;

        let lines = state.lines()?;
        info!(
            symbol = %self.config.symbol,
            anchor = %anchor,
            spacing = %spacing,
            lines = lines.len(),
            "Grid anchored"
        );
        for line in &lines {
            info!(
                index = line.index,
                price = %line.price.round_dp(self.config.price_precision),
                "Grid line"
            );
        }

        self.tracked.clear();
        if self.config.cancel_existing_on_start {
            self.orders.cancel_all().await?;
        } else {
            // Adopt whatever already rests on the book: placements then
            // dedup against those lines, the per-side cap counts them,
            // and a later absence is handled as a fill like any other.
            let open = self.gateway.fetch_open_orders(&self.config.symbol).await?;
            for order in open {
                info!(
                    venue_id = %order.venue_id,
                    side = %order.side,
                    price = %order.price,
                    qty = %order.qty,
                    "Adopted existing open order"
                );
                self.tracked.insert(order.venue_id.clone(), order);
            }
        }

        let qty = self.desired_qty(anchor, spacing);
        for step in 1..=INITIAL_LADDER_DEPTH {
            let offset = spacing * Decimal::from(step);
            let buy_price = (anchor - offset).round_dp(self.config.price_precision);
            let sell_price = (anchor + offset).round_dp(self.config.price_precision);
            self.try_place(Side::Buy, buy_price, qty).await?;
            self.try_place(Side::Sell, sell_price, qty).await?;
        }

        info!(live_orders = self.tracked.len(), "Initial ladder placed");
        self.state = Some(state);
        Ok(())
    }

    /// One reconciliation pass.
    ///
    /// Steps: observe the price, handle at most one grid crossing, then
    /// detect fills by absence from the venue's open-order set and place
    /// replacements. Grid state is committed only at the end, so an error
    /// anywhere leaves the last-index bookkeeping untouched and the next
    /// tick re-observes the same crossing.
    pub async fn tick(&mut self) -> EngineResult<TickReport> {
        let mut state = self
            .state
            .clone()
            .ok_or_else(|| EngineError::Unexpected("tick before initialization".to_string()))?;

        let price = self.gateway.fetch_price(&self.config.symbol).await?;

        // Adaptive policy: re-derive spacing from the freshest price so
        // index math and every placement this tick use one spacing value.
        if self.config.spacing.is_adaptive() {
            let spacing = self
                .config
                .spacing
                .spacing_for(Qty::new(self.config.base_order_quantity), price);
            state.set_spacing(spacing)?;
        }

        let current_index = state.current_index(price);
        debug!(
            price = %price,
            current_index,
            last_buy_index = state.last_buy_index,
            last_sell_index = state.last_sell_index,
            "Tick"
        );

        let mut orders_placed = 0usize;

        // Crossing: at most one side reacts per tick. An upward move
        // buys at the newly crossed line, a downward move sells there.
        if current_index > state.last_buy_index {
            let target = state
                .line_price(current_index)
                .round_dp(self.config.price_precision);
            let qty = self.desired_qty(price, state.spacing);
            if let Some(order) = self.try_place(Side::Buy, target, qty).await? {
                orders_placed += 1;
                self.record_trade(order.side, order.price, order.qty, price);
            }
            state.last_buy_index = current_index;
        } else if current_index < state.last_sell_index {
            let target = state
                .line_price(current_index)
                .round_dp(self.config.price_precision);
            let qty = self.desired_qty(price, state.spacing);
            if let Some(order) = self.try_place(Side::Sell, target, qty).await? {
                orders_placed += 1;
                self.record_trade(order.side, order.price, order.qty, price);
            }
            state.last_sell_index = current_index;
        }

        // Fill detection by absence: a tracked order missing from the
        // venue's open set has been executed.
        let open = self.gateway.fetch_open_orders(&self.config.symbol).await?;
        let open_ids: HashSet<&str> = open.iter().map(|o| o.venue_id.as_str()).collect();

        let mut filled: Vec<LiveOrder> = self
            .tracked
            .values()
            .filter(|o| !open_ids.contains(o.venue_id.as_str()))
            .cloned()
            .collect();
        filled.sort_by(|a, b| a.price.cmp(&b.price));

        // Remove before replacing, so a replacement can land on a line
        // another fill just vacated.
        for order in &filled {
            self.tracked.remove(&order.venue_id);
        }

        let fills_detected = filled.len();
        for order in filled {
            info!(
                venue_id = %order.venue_id,
                side = %order.side,
                price = %order.price,
                qty = %order.qty,
                "Fill detected"
            );
            self.record_trade(order.side, order.price, order.qty, price);

            if self.live_count(order.side) < self.config.max_open_orders as usize {
                let replacement = match order.side {
                    Side::Buy => order.price - state.spacing,
                    Side::Sell => order.price + state.spacing,
                }
                .round_dp(self.config.price_precision);
                let qty = self.desired_qty(price, state.spacing);
                if self.try_place(order.side, replacement, qty).await?.is_some() {
                    orders_placed += 1;
                }
            } else {
                debug!(side = %order.side, "Side at max_open_orders, no replacement");
            }
        }

        self.state = Some(state);
        Ok(TickReport {
            price,
            current_index,
            orders_placed,
            fills_detected,
        })
    }

    /// Place and track one order, honoring the (side, price) uniqueness
    /// rule and the per-side cap.
    ///
    /// Rejections and precision failures drop this single placement and
    /// return `None`; network errors propagate and end the tick.
    async fn try_place(
        &mut self,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> EngineResult<Option<LiveOrder>> {
        if self.tracked.values().any(|o| o.occupies(side, price)) {
            debug!(%side, %price, "Live order already at this line, skipping");
            return Ok(None);
        }
        if self.live_count(side) >= self.config.max_open_orders as usize {
            debug!(%side, %price, "Side at max_open_orders, skipping placement");
            return Ok(None);
        }

        match self.orders.place_order(side, price, qty).await {
            Ok(order) => {
                self.tracked.insert(order.venue_id.clone(), order.clone());
                Ok(Some(order))
            }
            Err(e @ (EngineError::Rejection(_) | EngineError::Precision(_))) => {
                warn!(%side, %price, error = %e, "Dropping order placement");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn live_count(&self, side: Side) -> usize {
        self.tracked.values().filter(|o| o.side == side).count()
    }

    fn desired_qty(&self, last_price: Price, spacing: Price) -> Qty {
        match &self.config.spacing {
            SpacingPolicy::Fixed { .. } => Qty::new(self.config.base_order_quantity),
            SpacingPolicy::Adaptive {
                target_profit_percent,
            } => Qty::new(
                spacing.inner() / last_price.inner() * (Decimal::ONE + *target_profit_percent),
            ),
        }
    }

    /// Ledger writes never interrupt trading; a failed append is logged
    /// and the tick continues.
    fn record_trade(&mut self, side: Side, price: Price, qty: Qty, current_price: Price) {
        let record = TradeRecord::now(side, price, qty, current_price);
        if let Err(e) = self.ledger.append(&record) {
            warn!(error = %e, side = %side, price = %price, "Failed to append trade record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::{ClientOrderId, OrderAck, OrderStatus};
    use grid_gateway::{GatewayError, GatewayResult};
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted venue: a queue of prices to serve and a mutable open-order
    /// set the tests manipulate to simulate fills.
    struct FakeGateway {
        prices: Mutex<VecDeque<Decimal>>,
        venue_open: Mutex<Vec<LiveOrder>>,
        next_id: AtomicU64,
        fail_open_orders: AtomicBool,
    }

    impl FakeGateway {
        fn with_prices(prices: &[Decimal]) -> Arc<Self> {
            Arc::new(Self {
                prices: Mutex::new(prices.iter().copied().collect()),
                venue_open: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                fail_open_orders: AtomicBool::new(false),
            })
        }

        /// Simulate a fill: drop the resting order at `price` from the
        /// venue's open set.
        fn fill_at(&self, price: Decimal) {
            let mut open = self.venue_open.lock().unwrap();
            let before = open.len();
            open.retain(|o| o.price != Price::new(price));
            assert!(open.len() < before, "no venue order at {price} to fill");
        }

        fn set_fail_open_orders(&self, fail: bool) {
            self.fail_open_orders.store(fail, Ordering::SeqCst);
        }

        fn venue_order_count(&self) -> usize {
            self.venue_open.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ExchangeGateway for FakeGateway {
        async fn fetch_price(&self, _symbol: &str) -> GatewayResult<Price> {
            let mut prices = self.prices.lock().unwrap();
            let price = if prices.len() > 1 {
                prices.pop_front().unwrap()
            } else {
                *prices.front().expect("price script exhausted")
            };
            Ok(Price::new(price))
        }

        async fn fetch_open_orders(&self, _symbol: &str) -> GatewayResult<Vec<LiveOrder>> {
            if self.fail_open_orders.load(Ordering::SeqCst) {
                return Err(GatewayError::Network("connection reset".to_string()));
            }
            Ok(self.venue_open.lock().unwrap().clone())
        }

        async fn place_limit_order(
            &self,
            symbol: &str,
            side: Side,
            qty: Qty,
            price: Price,
            client_order_id: &ClientOrderId,
        ) -> GatewayResult<OrderAck> {
            let venue_id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            self.venue_open.lock().unwrap().push(LiveOrder {
                venue_id: venue_id.clone(),
                side,
                price,
                qty,
                status: OrderStatus::Open,
            });
            Ok(OrderAck {
                symbol: symbol.to_string(),
                venue_id,
                client_order_id: client_order_id.to_string(),
                side,
                price,
                requested_qty: qty,
                executed_qty: Qty::ZERO,
                status: OrderStatus::Open,
            })
        }

        async fn cancel_order(&self, venue_id: &str, _symbol: &str) -> GatewayResult<()> {
            self.venue_open
                .lock()
                .unwrap()
                .retain(|o| o.venue_id != venue_id);
            Ok(())
        }

        async fn fetch_balances(
            &self,
            assets: &[String],
        ) -> GatewayResult<HashMap<String, Decimal>> {
            Ok(assets
                .iter()
                .map(|a| (a.clone(), dec!(1000)))
                .collect())
        }
    }

    fn fixed_config() -> EngineConfig {
        EngineConfig {
            spacing: SpacingPolicy::Fixed {
                grid_spacing: dec!(40),
            },
            ..EngineConfig::default()
        }
    }

    fn engine_with(
        gateway: Arc<FakeGateway>,
        config: EngineConfig,
        dir: &TempDir,
    ) -> ReconcileEngine {
        let ledger = TradeLedger::new(dir.path().join("trades.csv"));
        ReconcileEngine::new(config, gateway, ledger).unwrap()
    }

    fn ledger_rows(dir: &TempDir) -> usize {
        let contents =
            std::fs::read_to_string(dir.path().join("trades.csv")).unwrap_or_default();
        // Minus the header line.
        contents.lines().count().saturating_sub(1)
    }

    fn tracked_at(engine: &ReconcileEngine, side: Side, price: Decimal) -> bool {
        engine
            .tracked_orders()
            .any(|o| o.occupies(side, Price::new(price)))
    }

    #[tokio::test]
    async fn test_initialize_places_symmetric_ladder() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);

        engine.initialize().await.unwrap();

        assert_eq!(engine.tracked_orders().count(), 4);
        assert!(tracked_at(&engine, Side::Buy, dec!(49960)));
        assert!(tracked_at(&engine, Side::Buy, dec!(49920)));
        assert!(tracked_at(&engine, Side::Sell, dec!(50040)));
        assert!(tracked_at(&engine, Side::Sell, dec!(50080)));

        let state = engine.state().unwrap();
        assert_eq!(state.anchor_price, Price::new(dec!(50000)));
        assert_eq!(state.last_buy_index, 0);
        assert_eq!(state.last_sell_index, 0);
    }

    #[tokio::test]
    async fn test_initialize_cancels_existing_orders() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        // A leftover order from a previous run.
        gateway.venue_open.lock().unwrap().push(LiveOrder {
            venue_id: "stale".to_string(),
            side: Side::Sell,
            price: Price::new(dec!(51000)),
            qty: Qty::new(dec!(0.0018)),
            status: OrderStatus::Open,
        });

        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        let open = gateway.venue_open.lock().unwrap();
        assert!(open.iter().all(|o| o.venue_id != "stale"));
        assert_eq!(open.len(), 4);
    }

    #[tokio::test]
    async fn test_no_cancel_start_adopts_existing_orders() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        // A resting buy from a previous run already sits on a ladder line.
        gateway.venue_open.lock().unwrap().push(LiveOrder {
            venue_id: "prior".to_string(),
            side: Side::Buy,
            price: Price::new(dec!(49960)),
            qty: Qty::new(dec!(0.0018)),
            status: OrderStatus::Open,
        });

        let mut config = fixed_config();
        config.cancel_existing_on_start = false;
        let mut engine = engine_with(gateway.clone(), config, &dir);
        engine.initialize().await.unwrap();

        // The occupied line is not doubled up; the rest of the ladder
        // fills in around it.
        let open = gateway.venue_open.lock().unwrap();
        let buys_at_line = open
            .iter()
            .filter(|o| o.occupies(Side::Buy, Price::new(dec!(49960))))
            .count();
        assert_eq!(buys_at_line, 1);
        assert_eq!(open.len(), 4);
        drop(open);

        assert!(tracked_at(&engine, Side::Buy, dec!(49960)));
        assert!(tracked_at(&engine, Side::Buy, dec!(49920)));
        assert!(tracked_at(&engine, Side::Sell, dec!(50040)));
        assert!(tracked_at(&engine, Side::Sell, dec!(50080)));
    }

    #[tokio::test]
    async fn test_adopted_order_fill_is_detected() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        gateway.venue_open.lock().unwrap().push(LiveOrder {
            venue_id: "prior".to_string(),
            side: Side::Sell,
            price: Price::new(dec!(50080)),
            qty: Qty::new(dec!(0.0018)),
            status: OrderStatus::Open,
        });

        let mut config = fixed_config();
        config.cancel_existing_on_start = false;
        let mut engine = engine_with(gateway.clone(), config, &dir);
        engine.initialize().await.unwrap();

        gateway.fill_at(dec!(50080));
        let report = engine.tick().await.unwrap();

        assert_eq!(report.fills_detected, 1);
        assert!(tracked_at(&engine, Side::Sell, dec!(50120)));
        assert_eq!(ledger_rows(&dir), 1);
    }

    #[tokio::test]
    async fn test_upward_crossing_places_buy_at_crossed_line() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000), dec!(50045)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        let report = engine.tick().await.unwrap();

        assert_eq!(report.current_index, 1);
        assert_eq!(report.orders_placed, 1);
        assert!(tracked_at(&engine, Side::Buy, dec!(50040)));

        let state = engine.state().unwrap();
        assert_eq!(state.last_buy_index, 1);
        assert_eq!(state.last_sell_index, 0, "sell side untouched this tick");
        assert_eq!(ledger_rows(&dir), 1, "implied trade logged");
    }

    #[tokio::test]
    async fn test_downward_crossing_places_sell() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000), dec!(49915)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        let report = engine.tick().await.unwrap();

        assert_eq!(report.current_index, -2);
        assert_eq!(report.orders_placed, 1);
        assert!(tracked_at(&engine, Side::Sell, dec!(49920)));
        assert_eq!(engine.state().unwrap().last_sell_index, -2);
        assert_eq!(engine.state().unwrap().last_buy_index, 0);
    }

    #[tokio::test]
    async fn test_no_order_within_same_band() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000), dec!(50045), dec!(50046)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        let first = engine.tick().await.unwrap();
        assert_eq!(first.orders_placed, 1);

        // Still in band 1: no crossing, no new order.
        let second = engine.tick().await.unwrap();
        assert_eq!(second.current_index, 1);
        assert_eq!(second.orders_placed, 0);
        assert_eq!(engine.tracked_orders().count(), 5);
    }

    #[tokio::test]
    async fn test_fill_detected_and_replaced_one_spacing_out() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        gateway.fill_at(dec!(50080));
        let report = engine.tick().await.unwrap();

        assert_eq!(report.fills_detected, 1);
        assert_eq!(report.orders_placed, 1);
        assert!(!tracked_at(&engine, Side::Sell, dec!(50080)));
        assert!(tracked_at(&engine, Side::Sell, dec!(50120)));
        // One ledger row for the fill, none for the resting replacement.
        assert_eq!(ledger_rows(&dir), 1);
    }

    #[tokio::test]
    async fn test_fill_logged_exactly_once() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        gateway.fill_at(dec!(50080));
        let first = engine.tick().await.unwrap();
        assert_eq!(first.fills_detected, 1);
        assert_eq!(ledger_rows(&dir), 1);

        // The order stays absent from the venue; it must not be logged again.
        let second = engine.tick().await.unwrap();
        assert_eq!(second.fills_detected, 0);
        assert_eq!(ledger_rows(&dir), 1);
    }

    #[tokio::test]
    async fn test_replacement_skips_occupied_line() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        // Fill the inner sell; its replacement line (50080) is already
        // occupied by the outer sell.
        gateway.fill_at(dec!(50040));
        let report = engine.tick().await.unwrap();

        assert_eq!(report.fills_detected, 1);
        assert_eq!(report.orders_placed, 0);
        assert_eq!(
            engine
                .tracked_orders()
                .filter(|o| o.side == Side::Sell)
                .count(),
            1
        );
        assert!(tracked_at(&engine, Side::Sell, dec!(50080)));
    }

    #[tokio::test]
    async fn test_both_sells_filled_ladder_moves_out() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        gateway.fill_at(dec!(50040));
        gateway.fill_at(dec!(50080));
        let report = engine.tick().await.unwrap();

        assert_eq!(report.fills_detected, 2);
        assert_eq!(report.orders_placed, 2);
        assert!(tracked_at(&engine, Side::Sell, dec!(50080)));
        assert!(tracked_at(&engine, Side::Sell, dec!(50120)));
        assert_eq!(ledger_rows(&dir), 2);
    }

    #[tokio::test]
    async fn test_crossing_respects_max_open_orders() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000), dec!(50085)]);
        let mut config = fixed_config();
        config.max_open_orders = 2;
        let mut engine = engine_with(gateway.clone(), config, &dir);
        engine.initialize().await.unwrap();
        assert_eq!(
            engine
                .tracked_orders()
                .filter(|o| o.side == Side::Buy)
                .count(),
            2
        );

        let report = engine.tick().await.unwrap();

        // The crossing is acknowledged (index advances) but the buy side
        // is already at its cap, so nothing is placed.
        assert_eq!(report.current_index, 2);
        assert_eq!(report.orders_placed, 0);
        assert_eq!(engine.state().unwrap().last_buy_index, 2);
    }

    #[tokio::test]
    async fn test_initial_ladder_respects_max_open_orders() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut config = fixed_config();
        config.max_open_orders = 1;
        let mut engine = engine_with(gateway.clone(), config, &dir);
        engine.initialize().await.unwrap();

        assert_eq!(engine.tracked_orders().count(), 2);
        assert!(tracked_at(&engine, Side::Buy, dec!(49960)));
        assert!(tracked_at(&engine, Side::Sell, dec!(50040)));
    }

    #[tokio::test]
    async fn test_adaptive_spacing_recomputed_each_tick() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000), dec!(51000)]);
        let mut config = fixed_config();
        config.spacing = SpacingPolicy::Adaptive {
            target_profit_percent: dec!(0.01),
        };
        let mut engine = engine_with(gateway.clone(), config, &dir);
        engine.initialize().await.unwrap();

        let initial = dec!(0.0018) * dec!(50000) / dec!(1.01);
        assert_eq!(engine.state().unwrap().spacing.inner(), initial);

        engine.tick().await.unwrap();

        let updated = dec!(0.0018) * dec!(51000) / dec!(1.01);
        assert_eq!(engine.state().unwrap().spacing.inner(), updated);
    }

    #[tokio::test]
    async fn test_dust_quantity_dropped_without_aborting() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut config = fixed_config();
        // Quantizes to zero at 5 decimals.
        config.base_order_quantity = dec!(0.0000042);
        let mut engine = engine_with(gateway.clone(), config, &dir);

        engine.initialize().await.unwrap();

        assert_eq!(engine.tracked_orders().count(), 0);
        assert_eq!(gateway.venue_order_count(), 0);
    }

    #[tokio::test]
    async fn test_network_error_leaves_grid_state_unchanged() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000), dec!(50045), dec!(50046)]);
        let mut engine = engine_with(gateway.clone(), fixed_config(), &dir);
        engine.initialize().await.unwrap();

        gateway.set_fail_open_orders(true);
        let err = engine.tick().await.unwrap_err();
        assert!(matches!(err, EngineError::Network(_)));
        // The crossing order went out before the failure, but the grid
        // state was not committed.
        assert!(tracked_at(&engine, Side::Buy, dec!(50040)));
        assert_eq!(engine.state().unwrap().last_buy_index, 0);

        // Next tick re-observes the crossing; the line is occupied so no
        // duplicate is placed, and the state finally commits.
        gateway.set_fail_open_orders(false);
        let report = engine.tick().await.unwrap();
        assert_eq!(report.orders_placed, 0);
        assert_eq!(engine.state().unwrap().last_buy_index, 1);
    }

    #[tokio::test]
    async fn test_tick_before_initialize_is_unexpected() {
        let dir = TempDir::new().unwrap();
        let gateway = FakeGateway::with_prices(&[dec!(50000)]);
        let mut engine = engine_with(gateway, fixed_config(), &dir);

        let err = engine.tick().await.unwrap_err();
        assert!(matches!(err, EngineError::Unexpected(_)));
        assert!(!err.is_recoverable());
    }
}
