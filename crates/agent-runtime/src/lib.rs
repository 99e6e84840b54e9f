//! # agent-runtime
//!
//! Hosted model providers for the agent.
//!
//! ## Providers
//!
//! - **Gemini**: Google Generative Language API (`generateContent`) with
//!   native function declarations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{GeminiConfig, GeminiProvider};
//!
//! let provider = GeminiProvider::new(GeminiConfig::new(api_key))?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, Session, Tool, ToolRegistry,
};
