//! Router
//!
//! One route: `POST /api/ask-agent`. CORS and request tracing wrap it.

use axum::{http::HeaderValue, routing::post, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::ask_agent;
use crate::state::AppState;

/// CORS policy: any origin unless an allow-list is configured
pub fn cors_layer(origins: Option<&[String]>) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let Some(origins) = origins else {
        return Ok(cors.allow_origin(Any));
    };

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| anyhow::anyhow!("invalid CORS origin {:?}: {}", o, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(cors.allow_origin(AllowOrigin::list(origins)))
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/ask-agent", post(ask_agent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
