//! Scripted Provider
//!
//! For tests and offline demos. Replays a fixed list of completions and
//! records every request it receives.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider, ModelInfo};
use crate::tool::ToolSchema;

/// A request captured by [`ScriptedProvider`]
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    /// Names of the tools declared on this turn
    pub tools: Vec<String>,
    pub model: String,
}

/// Provider that answers from a script
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Completion>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests.lock().await.push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
            model: options.model.clone(),
        });

        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted".into(),
            name: "scripted".into(),
            context_length: None,
            supports_tools: true,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_replays_in_order() {
        let provider = ScriptedProvider::new(vec![
            Ok(Completion::text("m", "first")),
            Ok(Completion::text("m", "second")),
        ]);
        let options = GenerationOptions::default();

        let a = provider.complete(&[Message::user("1")], &[], &options).await.unwrap();
        let b = provider.complete(&[Message::user("2")], &[], &options).await.unwrap();
        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert!(provider.complete(&[], &[], &options).await.is_err());

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].messages[0].content, "2");
    }
}
