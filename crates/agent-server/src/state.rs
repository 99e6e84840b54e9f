//! Application State

use std::sync::Arc;

use agent_core::Agent;

/// Shared application state
///
/// The agent is read-only; every question runs in its own session.
#[derive(Clone)]
pub struct AppState {
    /// Agent answering questions
    pub agent: Arc<Agent>,
}
