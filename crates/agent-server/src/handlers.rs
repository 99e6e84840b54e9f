//! HTTP Handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use agent_core::AgentError;

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Map an agent failure to a status and envelope without leaking provider detail
pub fn agent_error_response(err: &AgentError) -> ApiError {
    let (status, code) = match err {
        e if e.is_retryable() => (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
        AgentError::Auth(_) => (StatusCode::BAD_GATEWAY, "MODEL_AUTH_FAILED"),
        AgentError::Provider(_) | AgentError::Parse(_) | AgentError::Json(_) => {
            (StatusCode::BAD_GATEWAY, "MODEL_ERROR")
        }
        AgentError::MaxIterations(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_LOOP_EXHAUSTED"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    };

    api_error(status, code, err.user_message())
}

/// Map a body extraction failure; size and content-type problems keep their status
pub fn body_rejection_response(rejection: &JsonRejection) -> ApiError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "BODY_TOO_LARGE",
            "Request body is too large",
        ),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => api_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            "Request body must be sent as `Content-Type: application/json`",
        ),
        _ => api_error(
            StatusCode::BAD_REQUEST,
            "MALFORMED_BODY",
            "Request body must be a JSON object with a string `query` field",
        ),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Answer one free-text question, letting the model look up stock prices
pub async fn ask_agent(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
        body_rejection_response(&rejection)
    })?;

    tracing::info!(query = ?request.query, "Received query");

    let query = request
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "INVALID_QUERY", "`query` must be a non-empty string"))?;

    let answer = state.agent.ask(&query).await.map_err(|e| {
        tracing::error!("Agent error: {}", e);
        agent_error_response(&e)
    })?;

    tracing::info!(
        session = %answer.session_id,
        tool_calls = answer.tool_calls.len(),
        round_trips = answer.round_trips,
        "Answered query"
    );

    Ok(Json(AskResponse { answer: answer.text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let cases = [
            (AgentError::ProviderUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
            (AgentError::RateLimited("429".into()), StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
            (AgentError::Auth("bad key".into()), StatusCode::BAD_GATEWAY, "MODEL_AUTH_FAILED"),
            (AgentError::Parse("garbled".into()), StatusCode::BAD_GATEWAY, "MODEL_ERROR"),
            (AgentError::MaxIterations(10), StatusCode::INTERNAL_SERVER_ERROR, "AGENT_LOOP_EXHAUSTED"),
            (AgentError::Other("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
        ];

        for (err, status, code) in cases {
            let (got_status, Json(body)) = agent_error_response(&err);
            assert_eq!(got_status, status, "{:?}", err);
            assert_eq!(body.code, code);
        }
    }

    #[test]
    fn test_error_envelope_hides_detail() {
        let (_, Json(body)) = agent_error_response(&AgentError::Auth("API_KEY_INVALID sk-123".into()));
        assert!(!body.error.contains("sk-123"));
    }
}
