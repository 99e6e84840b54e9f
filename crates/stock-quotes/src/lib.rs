//! # stock-quotes
//!
//! Stock price lookup for the agent: a market-data abstraction, a Yahoo
//! Finance chart client, and the `get_stock_price` tool the model can call.
//!
//! ## Flow
//!
//! ```text
//! model ──get_stock_price{ticker}──▶ PriceLookupTool
//!                                      │
//!                                      ▼
//!                               MarketDataClient ──▶ Yahoo chart API (1d)
//!                                      │
//!                                      ▼
//!                               QuoteOutcome ──▶ "The current price of X is ₹123.45"
//!                                            └─▶ "Could not fetch data for X."
//! ```

pub mod svckit;
pub mod market;
pub mod model;
pub mod error;

pub use error::{MarketDataError, Result};
pub use model::{Quote, QuoteFailure, QuoteOutcome, CURRENCY_SYMBOL};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::PriceLookupTool;
}

/// System instruction for the stock-price agent
pub const STOCK_AGENT_PROMPT: &str = r#"You are a concise market assistant.

Use the `get_stock_price` tool whenever the user asks for the price of a stock.
Pass the ticker symbol with its exchange suffix: stocks listed in India use the
.NS suffix (for example RELIANCE.NS or TCS.NS).

Report prices exactly as the tool returns them. If the tool says it could not
fetch data, say so plainly and do not guess a price.

Answer questions that do not need market data directly, without calling tools."#;
