//! Reasoning Loop
//!
//! Automatic function calling: the model is asked for a turn with every
//! registered tool declared; when the turn requests tools, each call is run
//! locally, its text result is appended as a tool turn, and the model is asked
//! again. The loop ends at the first turn without tool requests, or with
//! `AgentError::MaxIterations` once the configured bound is hit.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{GenerationOptions, LlmProvider};
use crate::session::{Session, SessionId};
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System instruction sent with every session
    pub system_prompt: Option<String>,

    /// Maximum model completions per question
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            generation: GenerationOptions::default(),
        }
    }
}

/// Final outcome of one question
#[derive(Clone, Debug)]
pub struct Answer {
    /// The model's final text
    pub text: String,

    /// Session that produced it
    pub session_id: SessionId,

    /// Tool calls executed while answering, in order
    pub tool_calls: Vec<ToolCall>,

    /// Model completions used
    pub round_trips: usize,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Answer one question in a fresh session
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let mut session = Session::start(self.config.system_prompt.as_deref(), question);
        self.run(&mut session).await
    }

    /// Drive a session until the model produces a final answer
    pub async fn run(&self, session: &mut Session) -> Result<Answer> {
        let schemas = self.tools.schemas();

        loop {
            if session.round_trips >= self.config.max_iterations {
                tracing::warn!(
                    session = %session.id,
                    max = self.config.max_iterations,
                    "Tool-calling loop exhausted"
                );
                return Err(AgentError::MaxIterations(self.config.max_iterations));
            }
            session.round_trips += 1;

            let completion = self.provider
                .complete(session.conversation.messages(), &schemas, &self.config.generation)
                .await?;

            if !completion.wants_tools() {
                if completion.content.trim().is_empty() {
                    return Err(AgentError::Provider(format!(
                        "model returned neither text nor tool calls (finish reason: {:?})",
                        completion.finish_reason
                    )));
                }

                session.push(Message::assistant(&completion.content).with_model(&completion.model));

                return Ok(Answer {
                    text: completion.content,
                    session_id: session.id.clone(),
                    tool_calls: session.tool_calls.clone(),
                    round_trips: session.round_trips,
                });
            }

            let calls: Vec<ToolCall> = completion
                .tool_calls
                .into_iter()
                .map(|mut call| {
                    if call.id.is_none() {
                        call.id = Some(uuid::Uuid::new_v4().to_string());
                    }
                    call
                })
                .collect();

            session.push(
                Message::assistant_tool_calls(completion.content, calls.clone())
                    .with_model(&completion.model),
            );

            for call in calls {
                tracing::debug!(session = %session.id, tool = %call.name, "Executing tool");

                let result = self.execute_tool(&call).await;
                session.push(Message::tool(result.output, call.id.clone()).with_name(&call.name));
                session.record_tool_call(call);
            }
        }
    }

    /// Execute a tool call; errors become a failure result for the model
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                tracing::debug!(
                    tool = %call.name,
                    success = result.success,
                    data = ?result.data,
                    "Tool result"
                );
                result.id = call.id.clone();
                result
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call rejected");
                ToolResult {
                    name: call.name.clone(),
                    id: call.id.clone(),
                    success: false,
                    output: format!("Error: {}", e),
                    data: None,
                }
            }
        }
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}
