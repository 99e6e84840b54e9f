//! Domain Models
//!
//! Quotes and lookup outcomes. Prices are `rust_decimal` values, never f64.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::MarketDataError;

/// Currency prefix used in every price sentence
pub const CURRENCY_SYMBOL: char = '₹';

/// Most recent daily close for a symbol
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol as reported by the provider (e.g., "RELIANCE.NS")
    pub symbol: String,

    /// Last closing price
    pub close: Decimal,

    /// Trading currency, when the provider reports it
    pub currency: Option<String>,

    /// Time of the close
    pub as_of: DateTime<Utc>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, close: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            close,
            currency: None,
            as_of: Utc::now(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Close rounded half away from zero to two decimal places
    pub fn rounded_close(&self) -> Decimal {
        self.close
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Why a lookup produced no price
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteFailure {
    UnknownSymbol,
    NoData,
    ProviderUnavailable,
}

impl QuoteFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteFailure::UnknownSymbol => "unknown_symbol",
            QuoteFailure::NoData => "no_data",
            QuoteFailure::ProviderUnavailable => "provider_unavailable",
        }
    }
}

impl std::fmt::Display for QuoteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&MarketDataError> for QuoteFailure {
    fn from(err: &MarketDataError) -> Self {
        match err {
            MarketDataError::UnknownSymbol(_) => QuoteFailure::UnknownSymbol,
            MarketDataError::NoData(_) => QuoteFailure::NoData,
            MarketDataError::Unavailable(_)
            | MarketDataError::InvalidResponse(_)
            | MarketDataError::Config(_)
            | MarketDataError::Network(_)
            | MarketDataError::Serialization(_) => QuoteFailure::ProviderUnavailable,
        }
    }
}

/// Result of a price lookup, rendered as one sentence for the model
#[derive(Clone, Debug)]
pub enum QuoteOutcome {
    Price {
        /// Ticker as requested
        ticker: String,
        quote: Quote,
    },
    Failed {
        ticker: String,
        reason: QuoteFailure,
    },
}

impl QuoteOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            QuoteOutcome::Price { ticker, .. } | QuoteOutcome::Failed { ticker, .. } => ticker,
        }
    }

    pub fn is_price(&self) -> bool {
        matches!(self, QuoteOutcome::Price { .. })
    }

    /// The sentence handed to the model
    pub fn sentence(&self) -> String {
        match self {
            QuoteOutcome::Price { ticker, quote } => format!(
                "The current price of {} is {}{:.2}",
                ticker,
                CURRENCY_SYMBOL,
                quote.rounded_close()
            ),
            QuoteOutcome::Failed { ticker, .. } => format!("Could not fetch data for {}.", ticker),
        }
    }

    /// Structured view for logs and tool result data
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            QuoteOutcome::Price { ticker, quote } => serde_json::json!({
                "ticker": ticker,
                "symbol": quote.symbol,
                "close": quote.rounded_close(),
                "currency": quote.currency,
                "as_of": quote.as_of,
            }),
            QuoteOutcome::Failed { ticker, reason } => serde_json::json!({
                "ticker": ticker,
                "reason": reason,
            }),
        }
    }
}

impl std::fmt::Display for QuoteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sentence())
    }
}
