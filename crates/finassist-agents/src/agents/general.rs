use std::sync::Arc;

use async_trait::async_trait;
use finassist_models::{AgentKind, AgentRequest};

use crate::agent::{Agent, AgentOutput};
use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::prompts;

/// Reply used when no chat model is configured.
pub const OFFLINE_REPLY: &str = "Hello! I can look up stock prices, market overviews, sector \
     performance and financial news, and answer questions about documents you upload. \
     Open-ended conversation needs an OpenAI API key.";

/// Conversational replies for greetings and non-finance questions.
pub struct GeneralChatAgent {
    chat: Option<Arc<dyn ChatModel>>,
}

impl GeneralChatAgent {
    pub fn new(chat: Option<Arc<dyn ChatModel>>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Agent for GeneralChatAgent {
    fn name(&self) -> &str {
        "general_chat_agent"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::GeneralChat
    }

    async fn run(&self, request: &AgentRequest) -> Result<AgentOutput, AgentError> {
        let Some(chat) = &self.chat else {
            return Ok(AgentOutput::text(OFFLINE_REPLY));
        };
        let text = chat
            .complete(
                &prompts::general_chat_prompt(&prompts::today()),
                &request.query.text,
            )
            .await?;
        Ok(AgentOutput::text(text))
    }
}
