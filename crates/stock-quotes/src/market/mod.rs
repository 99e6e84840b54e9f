//! Market Data Integration
//!
//! Abstraction over daily price-history providers.

mod mock;
mod yahoo;

pub use mock::MockMarketData;
pub use yahoo::{YahooChartClient, YahooConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Quote;

/// Market data client trait (Strategy pattern)
///
/// Implement this for each data source: Yahoo Finance, an exchange feed, etc.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Most recent daily close for a symbol
    async fn latest_close(&self, symbol: &str) -> Result<Quote>;

    /// Provider name
    fn name(&self) -> &str;
}
