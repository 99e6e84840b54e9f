//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` for the Google Generative Language API.
//! Tools are sent as `functionDeclarations`; the model answers with
//! `functionCall` parts, and tool results go back as `functionResponse` parts.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, TokenUsage},
    tool::{ToolCall, ToolSchema},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key for the Generative Language API
    pub api_key: String,

    /// API base URL (without trailing slash)
    pub api_base: String,

    /// Model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Read configuration through a variable lookup function.
    ///
    /// Fails when no API key is set, so a missing credential stops the
    /// server at startup instead of failing the first request.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_blank = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let api_key = non_blank("GEMINI_API_KEY")
            .or_else(|| non_blank("GOOGLE_API_KEY"))
            .ok_or_else(|| {
                AgentError::Config("GEMINI_API_KEY (or GOOGLE_API_KEY) must be set".into())
            })?;

        let mut config = Self::new(api_key.trim());

        if let Some(model) = non_blank("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base) = non_blank("GEMINI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = non_blank("GEMINI_TIMEOUT_SECS") {
            config.timeout_secs = secs.trim().parse().map_err(|_| {
                AgentError::Config(format!("GEMINI_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }

        Ok(config)
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create from configuration
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Model configured for this provider
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn generate_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.config.api_base, model)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.config.api_base)
    }
}

/// Build the `generateContent` request body
fn build_request_body(
    messages: &[Message],
    tools: &[ToolSchema],
    options: &GenerationOptions,
) -> Value {
    let mut contents: Vec<Value> = Vec::new();
    let mut system_parts: Vec<Value> = Vec::new();
    let mut last_was_tool = false;

    for msg in messages {
        match msg.role {
            Role::System => {
                system_parts.push(json!({ "text": msg.content }));
                continue;
            }
            Role::User => {
                contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": msg.content }]
                }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                if !msg.content.is_empty() {
                    parts.push(json!({ "text": msg.content }));
                }
                for call in &msg.tool_calls {
                    let mut part = json!({
                        "functionCall": { "name": call.name, "args": call.arguments }
                    });
                    if let Some(signature) = &call.signature {
                        part["thoughtSignature"] = json!(signature);
                    }
                    parts.push(part);
                }
                if !parts.is_empty() {
                    contents.push(json!({ "role": "model", "parts": parts }));
                }
            }
            Role::Tool => {
                let part = json!({
                    "functionResponse": {
                        "name": msg.name.as_deref().unwrap_or_default(),
                        "response": { "result": msg.content }
                    }
                });
                // All responses to one model turn travel in a single content
                if last_was_tool {
                    if let Some(parts) = contents.last_mut().and_then(|c| c["parts"].as_array_mut()) {
                        parts.push(part);
                        continue;
                    }
                }
                contents.push(json!({ "role": "user", "parts": [part] }));
                last_was_tool = true;
                continue;
            }
        }
        last_was_tool = false;
    }

    let mut generation_config = json!({
        "temperature": options.temperature,
        "topP": options.top_p,
        "maxOutputTokens": options.max_tokens,
    });
    if !options.stop_sequences.is_empty() {
        generation_config["stopSequences"] = json!(options.stop_sequences);
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });

    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    if !tools.is_empty() {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters_json_schema(),
                })
            })
            .collect();
        body["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    body
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<FunctionCall>,
    #[serde(default)]
    thought: bool,
    thought_signature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    display_name: Option<String>,
    input_token_limit: Option<u32>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Error,
    }
}

/// Convert a `generateContent` response into a completion
fn parse_response(response: GenerateContentResponse, model: &str) -> Result<Completion> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".into());
        return Err(AgentError::Provider(format!("prompt rejected: {}", reason)));
    };

    let mut content = String::new();
    let mut tool_calls = Vec::new();

    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if part.thought {
            continue;
        }
        if let Some(text) = part.text {
            content.push_str(&text);
        }
        if let Some(fc) = part.function_call {
            tool_calls.push(ToolCall {
                name: fc.name,
                arguments: fc.args.into_iter().collect(),
                id: Some(uuid::Uuid::new_v4().to_string()),
                signature: part.thought_signature,
            });
        }
    }

    let finish_reason = if tool_calls.is_empty() {
        candidate.finish_reason.as_deref().map(map_finish_reason)
    } else {
        Some(FinishReason::ToolUse)
    };

    Ok(Completion {
        content,
        tool_calls,
        model: response.model_version.unwrap_or_else(|| model.to_string()),
        usage: response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }),
        finish_reason,
    })
}

/// Map a non-success HTTP status to an agent error
fn classify_status(status: StatusCode, body: &str) -> AgentError {
    let detail = format!("HTTP {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
        // Gemini reports a bad key as 400 INVALID_ARGUMENT
        _ if body.contains("API_KEY_INVALID") => AgentError::Auth(detail),
        _ => AgentError::Provider(detail),
    }
}

fn transport_error(e: reqwest::Error) -> AgentError {
    if e.is_decode() {
        AgentError::Parse(e.to_string())
    } else {
        AgentError::ProviderUnavailable(e.to_string())
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Gemini health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = build_request_body(messages, tools, options);

        tracing::debug!(model = %options.model, messages = messages.len(), tools = tools.len(), "Gemini request");

        let response = self.http
            .post(self.generate_url(&options.model))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(transport_error)?;
        let completion = parse_response(parsed, &options.model)?;

        tracing::debug!(
            tool_calls = completion.tool_calls.len(),
            finish_reason = ?completion.finish_reason,
            "Gemini response"
        );

        Ok(completion)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self.http
            .get(self.models_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let list: ModelList = response.json().await.map_err(transport_error)?;

        Ok(list
            .models
            .into_iter()
            .map(|m| {
                let id = m.name.strip_prefix("models/").unwrap_or(&m.name).to_string();
                ModelInfo {
                    name: m.display_name.unwrap_or_else(|| id.clone()),
                    id,
                    context_length: m.input_token_limit,
                    supports_tools: m
                        .supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent"),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::ParameterSchema;
    use std::collections::HashMap;

    fn price_schema() -> ToolSchema {
        ToolSchema {
            name: "get_stock_price".into(),
            description: "Fetches the current live stock price for a given ticker symbol.".into(),
            parameters: vec![ParameterSchema::required_string("ticker", "Ticker symbol")],
        }
    }

    fn parse(json: Value) -> Result<Completion> {
        let response: GenerateContentResponse = serde_json::from_value(json).unwrap();
        parse_response(response, "gemini-2.5-flash")
    }

    #[test]
    fn test_config_from_vars() {
        let vars = HashMap::from([
            ("GOOGLE_API_KEY", " secret-key "),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMINI_API_BASE", "http://localhost:8080/v1beta/"),
        ]);
        let config = GeminiConfig::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_key, "secret-key");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.api_base, "http://localhost:8080/v1beta");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_config_requires_key() {
        let err = GeminiConfig::from_vars(|_| None).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));

        let blank = GeminiConfig::from_vars(|k| (k == "GEMINI_API_KEY").then(|| "  ".to_string()));
        assert!(blank.is_err());

        let bad_timeout = GeminiConfig::from_vars(|k| match k {
            "GEMINI_API_KEY" => Some("k".into()),
            "GEMINI_TIMEOUT_SECS" => Some("soon".into()),
            _ => None,
        });
        assert!(bad_timeout.is_err());
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = GeminiConfig::new("AIza-very-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("AIza-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_generate_url() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        assert_eq!(
            provider.generate_url("models/gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_with_tool_round_trip() {
        let first = ToolCall::new("get_stock_price").with_argument("ticker", json!("RELIANCE.NS"));
        let second = ToolCall::new("get_stock_price").with_argument("ticker", json!("TCS.NS"));
        let messages = vec![
            Message::system("Answer briefly."),
            Message::user("Compare RELIANCE.NS and TCS.NS"),
            Message::assistant_tool_calls("", vec![first, second]),
            Message::tool("The current price of RELIANCE.NS is ₹2950.45", None).with_name("get_stock_price"),
            Message::tool("The current price of TCS.NS is ₹4100.00", None).with_name("get_stock_price"),
        ];

        let body = build_request_body(&messages, &[price_schema()], &GenerationOptions::default());

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Answer briefly.");

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["args"]["ticker"], "RELIANCE.NS");

        // Both responses answer the same model turn
        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1]["functionResponse"]["name"], "get_stock_price");
        assert_eq!(
            responses[1]["functionResponse"]["response"]["result"],
            "The current price of TCS.NS is ₹4100.00"
        );

        let declaration = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(declaration["name"], "get_stock_price");
        assert_eq!(declaration["parameters"]["required"][0], "ticker");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_request_body_without_tools() {
        let body = build_request_body(&[Message::user("hi")], &[], &GenerationOptions::default());
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let completion = parse(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Paris" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 1, "totalTokenCount": 13 },
            "modelVersion": "gemini-2.5-flash"
        }))
        .unwrap();

        assert_eq!(completion.content, "Paris");
        assert!(completion.tool_calls.is_empty());
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 13);
    }

    #[test]
    fn test_parse_function_call_response() {
        let completion = parse(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "functionCall": { "name": "get_stock_price", "args": { "ticker": "RELIANCE.NS" } } }
                    ]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert!(completion.content.is_empty());
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].argument_str("ticker"), Some("RELIANCE.NS"));
        assert!(completion.tool_calls[0].id.is_some());
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolUse));
        assert_eq!(completion.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_thought_signature_survives_round_trip() {
        let completion = parse(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": { "name": "get_stock_price", "args": { "ticker": "TCS.NS" } },
                        "thoughtSignature": "CiQB0e2Kb7"
                    }]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(completion.tool_calls[0].signature.as_deref(), Some("CiQB0e2Kb7"));

        let messages = vec![
            Message::user("Price of TCS.NS?"),
            Message::assistant_tool_calls(completion.content, completion.tool_calls),
            Message::tool("The current price of TCS.NS is ₹4100.00", None).with_name("get_stock_price"),
        ];
        let body = build_request_body(&messages, &[price_schema()], &GenerationOptions::default());

        let model_part = &body["contents"][1]["parts"][0];
        assert_eq!(model_part["functionCall"]["name"], "get_stock_price");
        assert_eq!(model_part["thoughtSignature"], "CiQB0e2Kb7");

        // Calls without a signature are sent without the field
        let unsigned = Message::assistant_tool_calls(
            "",
            vec![ToolCall::new("get_stock_price").with_argument("ticker", json!("TCS.NS"))],
        );
        let body = build_request_body(&[unsigned], &[], &GenerationOptions::default());
        assert!(body["contents"][0]["parts"][0].get("thoughtSignature").is_none());
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let err = parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap_err();
        assert!(matches!(err, AgentError::Provider(msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(StatusCode::FORBIDDEN, ""), AgentError::Auth(_)));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"reason": "API_KEY_INVALID"}"#),
            AgentError::Auth(_)
        ));
        assert!(matches!(classify_status(StatusCode::TOO_MANY_REQUESTS, ""), AgentError::RateLimited(_)));
        assert!(matches!(classify_status(StatusCode::SERVICE_UNAVAILABLE, ""), AgentError::ProviderUnavailable(_)));
        assert!(matches!(classify_status(StatusCode::BAD_REQUEST, "bad"), AgentError::Provider(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let config = GeminiConfig::new("k").with_api_base("http://127.0.0.1:9/v1beta");
        let provider = GeminiProvider::new(config).unwrap();

        let err = provider
            .complete(&[Message::user("hi")], &[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(!provider.health_check().await.unwrap());
    }
}
