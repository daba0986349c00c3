//! Application configuration.

use crate::error::{AppError, AppResult};
use grid_engine::EngineConfig;
use grid_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};

/// Trade ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// CSV file the ledger appends to.
    #[serde(default = "default_trades_path")]
    pub trades_path: String,
}

fn default_trades_path() -> String {
    "data/trades.csv".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            trades_path: default_trades_path(),
        }
    }
}

/// Application configuration.
///
/// API credentials never live here: only the names of the environment
/// variables they are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine configuration.
    pub engine: EngineConfig,
    /// Exchange gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Trade ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_var")]
    pub api_key_var: String,
    /// Environment variable holding the API secret.
    #[serde(default = "default_api_secret_var")]
    pub api_secret_var: String,
    /// Assets listed in the startup funds report.
    #[serde(default = "default_balance_assets")]
    pub balance_assets: Vec<String>,
}

fn default_api_key_var() -> String {
    "GRIDBOT_API_KEY".to_string()
}

fn default_api_secret_var() -> String {
    "GRIDBOT_API_SECRET".to_string()
}

fn default_balance_assets() -> Vec<String> {
    vec!["BTC".to_string(), "USDT".to_string()]
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            gateway: GatewayConfig::default(),
            ledger: LedgerConfig::default(),
            api_key_var: default_api_key_var(),
            api_secret_var: default_api_secret_var(),
            balance_assets: default_balance_assets(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_engine::SpacingPolicy;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.symbol, "BTCUSDT");
        assert_eq!(config.api_key_var, "GRIDBOT_API_KEY");
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            balance_assets = ["BTC", "USDT"]

            [engine]
            symbol = "BTCUSDT"
            grid_line_count = 4
            max_open_orders = 4
            base_order_quantity = "0.0018"
            poll_interval_secs = 60

            [engine.spacing]
            policy = "adaptive"
            target_profit_percent = "0.01"

            [gateway]
            rest_url = "https://testnet.binance.vision"

            [ledger]
            trades_path = "data/trades.csv"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.engine.spacing,
            SpacingPolicy::Adaptive {
                target_profit_percent: dec!(0.01)
            }
        );
        assert_eq!(config.ledger.trades_path, "data/trades.csv");
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_round() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("symbol"));
        assert!(toml_str.contains("trades_path"));
    }
}
