//! Binance spot REST adapter with bounded retry.
//!
//! Public endpoints only, no API keys. Transient failures (network
//! errors, HTTP 429 and 5xx) are retried with jittered exponential
//! backoff up to a fixed attempt budget, then surfaced; client errors
//! are never retried.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::MarketDataError;
use super::provider::{KlineSource, SymbolUniverse};
use super::types::{Bar, KlineInterval};

/// Largest kline batch the exchange serves per request.
const MAX_BATCH: usize = 1000;

/// Retry policy for exchange requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts before surfacing the failure.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Ceiling on the delay between retries.
    pub max_backoff: Duration,
    /// Backoff growth factor.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(backoff)
    }
}

/// Spread retry wake-ups so concurrent workers do not synchronize.
fn with_jitter(delay: Duration) -> Duration {
    delay.mul_f64(0.5 + rand::random::<f64>() * 0.5)
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
    status: String,
    #[serde(rename = "quoteAsset")]
    quote_asset: String,
}

/// Bar-history and symbol-universe provider backed by the Binance spot API.
pub struct BinanceMarketData {
    client: reqwest::Client,
    base_url: String,
    quote_asset: String,
    retry: RetryConfig,
}

impl BinanceMarketData {
    /// Build an adapter against `base_url`, screening pairs quoted in
    /// `quote_asset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        quote_asset: impl Into<String>,
        retry: RetryConfig,
    ) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            quote_asset: quote_asset.into(),
            retry,
        })
    }

    async fn get_json(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut backoff = ExponentialBackoff::new(&self.retry);

        loop {
            let outcome = self.client.get(&url).query(query).send().await;

            let message = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json().await.map_err(|e| MarketDataError::Decode {
                            endpoint: endpoint.to_string(),
                            message: e.to_string(),
                        });
                    }
                    if !is_retryable(status) {
                        return Err(MarketDataError::Status {
                            endpoint: endpoint.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    format!("status {status}")
                }
                Err(e) => e.to_string(),
            };

            match backoff.next_backoff() {
                Some(delay) => {
                    warn!(
                        endpoint,
                        attempt = backoff.attempt,
                        error = %message,
                        "Transient upstream error, retrying"
                    );
                    tokio::time::sleep(with_jitter(delay)).await;
                }
                None => {
                    return Err(MarketDataError::ExhaustedRetries {
                        endpoint: endpoint.to_string(),
                        attempts: backoff.attempt,
                        message,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl KlineSource for BinanceMarketData {
    async fn get_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> Result<Vec<Bar>, MarketDataError> {
        let symbol = symbol.to_uppercase();
        let mut all_bars: Vec<Bar> = Vec::new();
        let mut end_time: Option<i64> = None;
        let mut remaining = limit;

        // Page backwards in time until the limit is filled or history
        // runs out.
        while remaining > 0 {
            let batch_size = remaining.min(MAX_BATCH);
            let mut query = vec![
                ("symbol", symbol.clone()),
                ("interval", interval.as_str().to_string()),
                ("limit", batch_size.to_string()),
            ];
            if let Some(end) = end_time {
                query.push(("endTime", end.to_string()));
            }

            let body = self.get_json("/api/v3/klines", &query).await?;
            let rows = body.as_array().ok_or_else(|| MarketDataError::Decode {
                endpoint: "/api/v3/klines".to_string(),
                message: "expected a JSON array of klines".to_string(),
            })?;
            if rows.is_empty() {
                break;
            }

            let mut batch = Vec::with_capacity(rows.len());
            for row in rows {
                batch.push(parse_kline_row(row)?);
            }

            let fetched = batch.len();
            end_time = batch.first().map(|b| b.open_time - 1);
            batch.extend(all_bars);
            all_bars = batch;
            remaining = remaining.saturating_sub(fetched);

            if fetched < batch_size {
                break;
            }
        }

        // Keep only the most recent `limit` bars.
        if all_bars.len() > limit {
            all_bars.drain(..all_bars.len() - limit);
        }

        debug!(symbol, bars = all_bars.len(), "Fetched kline history");
        Ok(all_bars)
    }
}

#[async_trait]
impl SymbolUniverse for BinanceMarketData {
    async fn list_symbols(&self) -> Result<Vec<String>, MarketDataError> {
        let body = self.get_json("/api/v3/exchangeInfo", &[]).await?;
        let info: ExchangeInfo =
            serde_json::from_value(body).map_err(|e| MarketDataError::Decode {
                endpoint: "/api/v3/exchangeInfo".to_string(),
                message: e.to_string(),
            })?;

        let symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset == self.quote_asset)
            .map(|s| s.symbol)
            .collect();

        debug!(
            quote_asset = %self.quote_asset,
            count = symbols.len(),
            "Fetched symbol universe"
        );
        Ok(symbols)
    }
}

/// Decode one kline row: `[openTime, open, high, low, close, volume, ...]`
/// with prices as JSON strings.
fn parse_kline_row(row: &serde_json::Value) -> Result<Bar, MarketDataError> {
    let fields = row.as_array().ok_or_else(|| decode_error("row is not an array"))?;
    if fields.len() < 6 {
        return Err(decode_error("row has fewer than 6 fields"));
    }

    let open_time = fields[0]
        .as_i64()
        .ok_or_else(|| decode_error("open time is not an integer"))?;

    Ok(Bar {
        open_time,
        open: parse_price(&fields[1])?,
        high: parse_price(&fields[2])?,
        low: parse_price(&fields[3])?,
        close: parse_price(&fields[4])?,
        volume: parse_price(&fields[5])?,
    })
}

fn parse_price(value: &serde_json::Value) -> Result<Decimal, MarketDataError> {
    let text = value
        .as_str()
        .ok_or_else(|| decode_error("price field is not a string"))?;
    Decimal::from_str(text).map_err(|e| decode_error(&format!("bad decimal '{text}': {e}")))
}

fn decode_error(message: &str) -> MarketDataError {
    MarketDataError::Decode {
        endpoint: "/api/v3/klines".to_string(),
        message: message.to_string(),
    }
}
