//! Mock Market Data
//!
//! For testing and demo purposes. Returns static closing prices.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::MarketDataClient;
use crate::error::{MarketDataError, Result};
use crate::model::Quote;

enum Entry {
    Close(Decimal),
    EmptyHistory,
}

/// Mock market data with static prices
pub struct MockMarketData {
    entries: HashMap<String, Entry>,
    unavailable: bool,
    lookups: AtomicUsize,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketData {
    /// Mock with a small table of NSE and US tickers
    pub fn new() -> Self {
        let table = [
            ("RELIANCE.NS", dec!(2950.45)),
            ("TCS.NS", dec!(4100.00)),
            ("INFY.NS", dec!(1875.3)),
            ("HDFCBANK.NS", dec!(1650.755)),
            ("AAPL", dec!(190.12)),
            ("MSFT", dec!(415.5)),
        ];

        Self {
            entries: table
                .into_iter()
                .map(|(symbol, close)| (symbol.to_string(), Entry::Close(close)))
                .collect(),
            unavailable: false,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Add or replace a closing price
    pub fn with_close(mut self, symbol: &str, close: Decimal) -> Self {
        self.entries.insert(symbol.to_uppercase(), Entry::Close(close));
        self
    }

    /// Known symbol whose history is empty
    pub fn with_empty_history(mut self, symbol: &str) -> Self {
        self.entries.insert(symbol.to_uppercase(), Entry::EmptyHistory);
        self
    }

    /// Every lookup fails as if the provider were down
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataClient for MockMarketData {
    async fn latest_close(&self, symbol: &str) -> Result<Quote> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unavailable {
            return Err(MarketDataError::Unavailable("mock provider offline".into()));
        }

        let key = symbol.to_uppercase();
        match self.entries.get(&key) {
            Some(Entry::Close(close)) => Ok(Quote::new(key, *close).with_currency("INR")),
            Some(Entry::EmptyHistory) => Err(MarketDataError::NoData(symbol.to_string())),
            None => Err(MarketDataError::UnknownSymbol(symbol.to_string())),
        }
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_market_data() {
        let market = MockMarketData::new();

        let quote = market.latest_close("reliance.ns").await.unwrap();
        assert_eq!(quote.symbol, "RELIANCE.NS");
        assert_eq!(quote.close, dec!(2950.45));
        assert_eq!(market.lookups(), 1);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let market = MockMarketData::new().with_empty_history("HALTED.NS");
        assert!(matches!(
            market.latest_close("NOTREAL").await,
            Err(MarketDataError::UnknownSymbol(_))
        ));
        assert!(matches!(
            market.latest_close("HALTED.NS").await,
            Err(MarketDataError::NoData(_))
        ));

        let offline = MockMarketData::new().unavailable();
        assert!(matches!(
            offline.latest_close("AAPL").await,
            Err(MarketDataError::Unavailable(_))
        ));
    }
}
