use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finassist_models::{MarketConfig, StockQuote};
use moka::future::Cache;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ensure_success, AgentError};

/// Source of stock quotes. Mockable for testing.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<StockQuote, AgentError>;
}

const USER_AGENT: &str = "Mozilla/5.0 (compatible; finassist/0.1)";

/// Yahoo Finance chart API client with a short-lived in-memory quote cache.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, StockQuote>,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    exchange_name: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_volume: Option<u64>,
    regular_market_time: Option<i64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Deserialize, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Deserialize, Default)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn price(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(2))
}

fn no_data(symbol: &str, reason: impl Into<String>) -> AgentError {
    AgentError::NoData {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

impl YahooProvider {
    pub fn new(config: &MarketConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(config.quote_ttl_seconds))
                .build(),
        })
    }

    async fn fetch(&self, symbol: &str) -> Result<StockQuote, AgentError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );
        debug!(symbol = %symbol, "Fetching chart");

        let response = self
            .client
            .get(url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(no_data(symbol, "symbol may be delisted or not found"));
        }
        let response = ensure_success("Yahoo Finance", response).await?;
        let envelope: ChartEnvelope = response.json().await?;

        if let Some(error) = envelope.chart.error {
            let reason = error
                .description
                .or(error.code)
                .unwrap_or_else(|| "unknown chart error".to_string());
            return Err(no_data(symbol, reason));
        }

        let result = envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| no_data(symbol, "symbol may be delisted or not found"))?;

        build_quote(symbol, result)
    }
}

fn build_quote(requested: &str, result: ChartResult) -> Result<StockQuote, AgentError> {
    let meta = result.meta;
    let series = result.indicators.quote.into_iter().next().unwrap_or_default();
    let closes = series.close;

    let current = meta
        .regular_market_price
        .or_else(|| closes.iter().rev().find_map(|c| *c))
        .and_then(price)
        .ok_or_else(|| no_data(requested, "no price data"))?;

    // The last bar is the current session, even while its close is still
    // null; the bar before it is the previous session.
    let previous = closes
        .len()
        .checked_sub(2)
        .and_then(|i| closes[i])
        .or(meta.previous_close)
        .or(meta.chart_previous_close)
        .and_then(price)
        .unwrap_or(current);

    let volume = meta
        .regular_market_volume
        .or_else(|| series.volume.into_iter().flatten().last())
        .unwrap_or(0);

    let symbol = meta.symbol.unwrap_or_else(|| requested.to_uppercase());
    let name = meta
        .long_name
        .or(meta.short_name)
        .unwrap_or_else(|| symbol.clone());
    let last_updated: DateTime<Utc> = meta
        .regular_market_time
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .unwrap_or_else(Utc::now);

    Ok(StockQuote {
        change_percent: StockQuote::percent_change(current, previous),
        symbol,
        name,
        current_price: current,
        previous_close: previous,
        volume,
        currency: meta.currency,
        exchange: meta.exchange_name,
        last_updated,
    })
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn quote(&self, symbol: &str) -> Result<StockQuote, AgentError> {
        let key = symbol.to_uppercase();
        if let Some(hit) = self.cache.get(&key).await {
            debug!(symbol = %key, "Quote cache hit");
            return Ok(hit);
        }
        match self.fetch(&key).await {
            Ok(quote) => {
                self.cache.insert(key, quote.clone()).await;
                Ok(quote)
            }
            Err(e) => {
                warn!(symbol = %key, error = %e, "Quote fetch failed");
                Err(e)
            }
        }
    }
}
