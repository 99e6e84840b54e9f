//! Yahoo Finance Chart Client
//!
//! Reads the one-day chart (`range=1d&interval=1d`) and takes the last
//! reported close.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

use super::MarketDataClient;
use crate::error::{MarketDataError, Result};
use crate::model::Quote;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// The chart endpoint rejects requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo client configuration
#[derive(Clone, Debug)]
pub struct YahooConfig {
    /// Base URL of the chart API
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 10,
        }
    }
}

impl YahooConfig {
    /// Read configuration through a variable lookup function
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = get("MARKET_DATA_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(secs) = get("MARKET_DATA_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            config.timeout_secs = secs.trim().parse().map_err(|_| {
                MarketDataError::Config(format!("MARKET_DATA_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }

        Ok(config)
    }
}

/// Yahoo Finance chart API client
pub struct YahooChartClient {
    http: reqwest::Client,
    base_url: Url,
}

impl YahooChartClient {
    pub fn new(config: YahooConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| MarketDataError::Config(format!("invalid base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MarketDataError::Config(format!("invalid base URL {}", config.base_url)));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Chart URL for a symbol; the symbol is percent-encoded as one path segment
    fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v8", "finance", "chart", symbol]);
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    symbol: String,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Turn a chart response into the latest close
fn parse_chart(status: StatusCode, body: &str, symbol: &str) -> Result<Quote> {
    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status == StatusCode::NOT_FOUND => {
            return Err(MarketDataError::UnknownSymbol(symbol.to_string()));
        }
        Err(e) => return Err(MarketDataError::InvalidResponse(format!("HTTP {}: {}", status, e))),
    };

    if let Some(error) = envelope.chart.error {
        return Err(match error.code.as_str() {
            "Not Found" => MarketDataError::UnknownSymbol(symbol.to_string()),
            _ => MarketDataError::Unavailable(format!(
                "{}: {}",
                error.code,
                error.description.unwrap_or_default()
            )),
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(MarketDataError::UnknownSymbol(symbol.to_string()));
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let (index, close) = closes
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, c)| c.and_then(Decimal::from_f64).map(|d| (i, d)))
        .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))?;

    let as_of = result
        .timestamp
        .get(index)
        .and_then(|ts| DateTime::<Utc>::from_timestamp(*ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(Quote {
        symbol: result.meta.symbol,
        close,
        currency: result.meta.currency,
        as_of,
    })
}

#[async_trait]
impl MarketDataClient for YahooChartClient {
    async fn latest_close(&self, symbol: &str) -> Result<Quote> {
        let response = self.http
            .get(self.chart_url(symbol))
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| MarketDataError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(MarketDataError::Unavailable(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::Unavailable(e.to_string()))?;

        parse_chart(status, &body, symbol)
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}
