//! quant-agent HTTP Server
//!
//! Axum-based server exposing a single question-answering endpoint backed by
//! a hosted Gemini model that can look up live stock prices.

mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, LlmProvider, ToolRegistry};
use agent_runtime::GeminiProvider;
use stock_quotes::{
    market::{MarketDataClient, YahooChartClient},
    tools::PriceLookupTool,
    STOCK_AGENT_PROMPT,
};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider = Arc::new(GeminiProvider::new(config.gemini.clone())?);

    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to Gemini (model: {})", provider.model()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Gemini not reachable - questions will fail until it is");
            tracing::warn!("  Check GEMINI_API_KEY and network access");
        }
    }

    // Initialize market data for the price tool
    let market: Arc<dyn MarketDataClient> = Arc::new(YahooChartClient::new(config.market.clone())?);
    tracing::info!("Market data: {} ({})", market.name(), config.market.base_url);

    let mut tools = ToolRegistry::new();
    tools.register(PriceLookupTool::new(market));

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .system_prompt(STOCK_AGENT_PROMPT)
        .model(config.gemini.model.clone())
        .max_iterations(config.max_iterations)
        .build()?;

    // Build application state
    let state = AppState {
        agent: Arc::new(agent),
    };

    let cors = routes::cors_layer(config.cors_origins.as_deref())?;
    match &config.cors_origins {
        Some(origins) => tracing::info!("CORS restricted to: {}", origins.join(", ")),
        None => tracing::info!("CORS: any origin"),
    }

    let app = routes::router(state, cors);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 quant-agent server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  POST /api/ask-agent   - Ask a question");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
