use async_trait::async_trait;
use finassist_models::{AgentKind, AgentRequest};

use crate::error::AgentError;

/// What an agent hands back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    /// Text merged into the final answer.
    pub text: String,
    /// Structured vendor data behind `text`.
    pub data: Option<serde_json::Value>,
}

impl AgentOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
        }
    }
}

/// Trait for agents. Mockable for testing.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> AgentKind;

    async fn run(&self, request: &AgentRequest) -> Result<AgentOutput, AgentError>;
}

/// Ask a chat model to condense vendor data, keeping the raw data when the
/// model is absent, errors, or returns nothing.
pub(crate) async fn condense(
    chat: Option<&dyn crate::llm::ChatModel>,
    system: &str,
    user: &str,
    raw: String,
) -> String {
    let Some(chat) = chat else {
        return raw;
    };
    match chat.complete(system, user).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => raw,
        Err(e) => {
            tracing::warn!(model = %chat.model(), error = %e, "Chat model failed, using raw data");
            raw
        }
    }
}
