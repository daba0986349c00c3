//! Main application orchestration.
//!
//! Wires credentials, gateway, ledger and engine together, then drives
//! the engine on a fixed-interval poll loop until Ctrl-C. Shutdown is
//! only honored at a tick boundary, so a tick in flight always finishes.

use crate::config::AppConfig;
use crate::error::AppResult;
use grid_engine::ReconcileEngine;
use grid_gateway::{ApiCredentials, ExchangeGateway, RestGateway};
use grid_ledger::TradeLedger;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    gateway: Arc<RestGateway>,
    engine: ReconcileEngine,
}

impl Application {
    /// Build the application. Credentials come from the environment
    /// variables named in the config, never from the config file itself.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let credentials = ApiCredentials::from_env(&config.api_key_var, &config.api_secret_var)?;
        let gateway = Arc::new(RestGateway::new(config.gateway.clone(), credentials)?);
        let ledger = TradeLedger::new(&config.ledger.trades_path);
        let engine = ReconcileEngine::new(config.engine.clone(), gateway.clone(), ledger)?;

        Ok(Self {
            config,
            gateway,
            engine,
        })
    }

    /// Run until Ctrl-C or an unrecoverable engine error.
    pub async fn run(&mut self) -> AppResult<()> {
        self.report_funds().await;

        self.engine.initialize().await?;

        let mut interval = tokio::time::interval(self.engine.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick fires immediately; skip it so the first
        // reconciliation happens one full interval after the ladder.
        interval.tick().await;

        info!(
            symbol = %self.engine.symbol(),
            interval_secs = self.engine.poll_interval().as_secs(),
            "Entering reconciliation loop"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.engine.tick().await {
                        Ok(report) => {
                            debug!(
                                price = %report.price,
                                current_index = report.current_index,
                                orders_placed = report.orders_placed,
                                fills_detected = report.fills_detected,
                                "Tick complete"
                            );
                        }
                        Err(e) if e.is_recoverable() => {
                            warn!(error = %e, "Tick failed, retrying next interval");
                        }
                        Err(e) => {
                            error!(error = %e, "Unrecoverable engine error, shutting down");
                            return Err(e.into());
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping at tick boundary");
                    return Ok(());
                }
            }
        }
    }

    /// Startup funds report. Informational only; a failure here must not
    /// stop the bot.
    async fn report_funds(&self) {
        match self.gateway.fetch_balances(&self.config.balance_assets).await {
            Ok(balances) => {
                for asset in &self.config.balance_assets {
                    let total = balances.get(asset).copied().unwrap_or_default();
                    info!(asset = %asset, total = %total, "Account balance");
                }
            }
            Err(e) => warn!(error = %e, "Failed to fetch balances for funds report"),
        }
    }
}
