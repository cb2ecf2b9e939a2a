use std::sync::Arc;

use async_trait::async_trait;
use finassist_models::{AgentKind, AgentRequest};
use tracing::debug;

use crate::agent::{Agent, AgentOutput};
use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::prompts;

pub const NO_CONTEXT: &str = "No document context available.";

/// Answers from retrieved document context only. The orchestrator performs
/// retrieval and passes the context in the request.
pub struct DocumentAgent {
    chat: Option<Arc<dyn ChatModel>>,
}

impl DocumentAgent {
    pub fn new(chat: Option<Arc<dyn ChatModel>>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Agent for DocumentAgent {
    fn name(&self) -> &str {
        "document_agent"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::DocumentContext
    }

    async fn run(&self, request: &AgentRequest) -> Result<AgentOutput, AgentError> {
        let Some(context) = request.context.as_deref().filter(|c| !c.trim().is_empty()) else {
            return Ok(AgentOutput::text(NO_CONTEXT));
        };
        debug!(request_id = %request.request_id, chars = context.len(), "Answering from documents");

        let text = match &self.chat {
            Some(chat) => {
                chat.complete(
                    &prompts::document_answer_prompt(),
                    &prompts::query_with_data(&request.query.text, "Document Context", context),
                )
                .await?
            }
            None => format!("From your documents:\n\n{context}"),
        };

        Ok(AgentOutput {
            text,
            data: Some(serde_json::json!({ "context": context })),
        })
    }
}
