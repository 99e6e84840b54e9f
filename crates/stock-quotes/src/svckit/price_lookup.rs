//! Price Lookup Tool
//!
//! Fetches the latest daily close for a ticker and phrases it as one
//! sentence. Lookups never fail toward the model: every failure becomes the
//! fixed "Could not fetch data" sentence, with the reason kept in the result
//! data and the logs.

use std::sync::Arc;
use async_trait::async_trait;

use agent_core::{
    Tool, ToolSchema, ToolCall, ToolResult,
    tool::ParameterSchema,
    Result as CoreResult,
};

use crate::market::MarketDataClient;
use crate::model::{QuoteFailure, QuoteOutcome};

pub const TOOL_NAME: &str = "get_stock_price";

/// Tool for looking up stock prices
pub struct PriceLookupTool {
    market: Arc<dyn MarketDataClient>,
}

impl PriceLookupTool {
    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }

    /// Look up one ticker
    pub async fn lookup(&self, ticker: &str) -> QuoteOutcome {
        let ticker = ticker.trim();
        tracing::info!(ticker, provider = self.market.name(), "Fetching stock price");

        if ticker.is_empty() {
            return QuoteOutcome::Failed {
                ticker: String::new(),
                reason: QuoteFailure::UnknownSymbol,
            };
        }

        match self.market.latest_close(ticker).await {
            Ok(quote) => QuoteOutcome::Price {
                ticker: ticker.to_string(),
                quote,
            },
            Err(e) => {
                let reason = QuoteFailure::from(&e);
                tracing::warn!(ticker, %reason, error = %e, "Stock price lookup failed");
                QuoteOutcome::Failed {
                    ticker: ticker.to_string(),
                    reason,
                }
            }
        }
    }
}

#[async_trait]
impl Tool for PriceLookupTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: TOOL_NAME.into(),
            description: "Fetches the current live stock price for a given ticker symbol. Use the .NS suffix for stocks listed in India (e.g. RELIANCE.NS).".into(),
            parameters: vec![
                ParameterSchema::required_string(
                    "ticker",
                    "Ticker symbol, including any exchange suffix (e.g., 'RELIANCE.NS', 'AAPL')",
                ),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let ticker = match call.arguments.get("ticker") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let outcome = self.lookup(&ticker).await;
        let result = if outcome.is_price() {
            ToolResult::success(TOOL_NAME, outcome.sentence())
        } else {
            ToolResult::failure(TOOL_NAME, outcome.sentence())
        };

        Ok(result.with_data(outcome.to_json()))
    }
}
