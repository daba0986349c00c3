//! Signed REST adapter for the venue.
//!
//! Every private endpoint takes an HMAC-SHA256 signature over the query
//! string plus a timestamp; public endpoints (ticker) are unsigned. Rate
//! limiting and retries are the venue client's concern, not the engine's:
//! transient failures surface as `GatewayError::Network` and the engine
//! simply tries again next tick.

use crate::credentials::ApiCredentials;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ExchangeGateway;
use crate::types::{
    side_param, AccountResponse, OpenOrderEntry, OrderAckResponse, TickerPriceResponse,
    VenueErrorBody,
};
use async_trait::async_trait;
use grid_core::{ClientOrderId, LiveOrder, OrderAck, Price, Qty, Side};
use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// REST gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the venue REST API.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Signed-request validity window (ms).
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_rest_url() -> String {
    "https://testnet.binance.vision".to_string()
}

fn default_recv_window_ms() -> u64 {
    5_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            recv_window_ms: default_recv_window_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// HTTP adapter implementing [`ExchangeGateway`] against the venue.
pub struct RestGateway {
    client: Client,
    config: GatewayConfig,
    credentials: ApiCredentials,
}

impl RestGateway {
    pub fn new(config: GatewayConfig, credentials: ApiCredentials) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.rest_url, path)
    }

    /// Append recvWindow, timestamp and signature to a query string.
    fn signed_query(&self, params: &str) -> GatewayResult<String> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let payload = if params.is_empty() {
            format!(
                "recvWindow={}&timestamp={}",
                self.config.recv_window_ms, timestamp
            )
        } else {
            format!(
                "{params}&recvWindow={}&timestamp={}",
                self.config.recv_window_ms, timestamp
            )
        };
        let signature = self.credentials.sign(&payload)?;
        Ok(format!("{payload}&signature={signature}"))
    }

    /// Issue a signed request and deserialize the JSON response.
    async fn signed_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        path: &str,
        params: &str,
    ) -> GatewayResult<T> {
        let query = self.signed_query(params)?;
        let url = format!("{}?{}", self.endpoint(path), query);

        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", self.credentials.api_key())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_error_response(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::Parse(format!("failed to decode {path} response: {e}"))
        })
    }
}

/// Transport-level failures are transient by definition here; the engine
/// retries on the next tick.
fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Network(err.to_string())
}

/// Classify a non-success HTTP response.
///
/// Throttling and server-side failures are transient; everything else is a
/// venue rejection carrying the venue's error code when the body parses.
fn classify_error_response(status: StatusCode, body: &str) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::SERVICE_UNAVAILABLE
        || status == StatusCode::GATEWAY_TIMEOUT
        || status.is_server_error()
    {
        return GatewayError::Network(format!("HTTP {status}: {body}"));
    }

    match serde_json::from_str::<VenueErrorBody>(body) {
        Ok(venue) => GatewayError::Rejected {
            code: venue.code,
            message: venue.msg,
        },
        Err(_) => GatewayError::Rejected {
            code: 0,
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Plain decimal parameter without trailing zeros.
fn decimal_param(value: Decimal) -> String {
    value.normalize().to_string()
}

#[async_trait]
impl ExchangeGateway for RestGateway {
    async fn fetch_price(&self, symbol: &str) -> GatewayResult<Price> {
        let url = format!("{}?symbol={symbol}", self.endpoint("/api/v3/ticker/price"));
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(classify_error_response(status, &body));
        }

        let ticker: TickerPriceResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Parse(format!("failed to decode ticker: {e}")))?;

        debug!(symbol = %ticker.symbol, price = %ticker.price, "Fetched ticker price");
        Ok(Price::new(ticker.price))
    }

    async fn fetch_open_orders(&self, symbol: &str) -> GatewayResult<Vec<LiveOrder>> {
        let entries: Vec<OpenOrderEntry> = self
            .signed_request(Method::GET, "/api/v3/openOrders", &format!("symbol={symbol}"))
            .await?;

        let mut orders = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.into_live_order() {
                Ok(order) => orders.push(order),
                // A malformed entry should not blind the engine to the rest
                // of the book.
                Err(e) => warn!(error = %e, "Skipping unparseable open order"),
            }
        }

        debug!(symbol, open_orders = orders.len(), "Fetched open orders");
        Ok(orders)
    }

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        qty: Qty,
        price: Price,
        client_order_id: &ClientOrderId,
    ) -> GatewayResult<OrderAck> {
        let params = format!(
            "symbol={symbol}&side={}&type=LIMIT&timeInForce=GTC&quantity={}&price={}&newClientOrderId={}&newOrderRespType=RESULT",
            side_param(side),
            decimal_param(qty.inner()),
            decimal_param(price.inner()),
            client_order_id,
        );

        let ack: OrderAckResponse = self
            .signed_request(Method::POST, "/api/v3/order", &params)
            .await?;
        ack.into_order_ack()
    }

    async fn cancel_order(&self, venue_id: &str, symbol: &str) -> GatewayResult<()> {
        let params = format!("symbol={symbol}&orderId={venue_id}");
        // The cancel response echoes the order; we only need success.
        let _: serde_json::Value = self
            .signed_request(Method::DELETE, "/api/v3/order", &params)
            .await?;
        debug!(venue_id, symbol, "Cancelled order");
        Ok(())
    }

    async fn fetch_balances(&self, assets: &[String]) -> GatewayResult<HashMap<String, Decimal>> {
        let account: AccountResponse = self
            .signed_request(Method::GET, "/api/v3/account", "")
            .await?;

        let balances = account
            .balances
            .into_iter()
            .filter(|b| assets.is_empty() || assets.iter().any(|a| a == &b.asset))
            .map(|b| (b.asset, b.free + b.locked))
            .collect();
        Ok(balances)
    }
}
