use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::Query;
use crate::route::Route;

/// Which kind of agent produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    MarketData,
    News,
    DocumentContext,
    GeneralChat,
}

impl AgentKind {
    /// Heading used when the result is merged into a response.
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::MarketData => "Market Data",
            AgentKind::News => "Recent News",
            AgentKind::DocumentContext => "Documents",
            AgentKind::GeneralChat => "Assistant",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentKind::MarketData => "market_data",
            AgentKind::News => "news",
            AgentKind::DocumentContext => "document_context",
            AgentKind::GeneralChat => "general_chat",
        };
        f.write_str(s)
    }
}

/// Request handed to every selected agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRequest {
    pub request_id: Uuid,
    pub query: Query,
    pub route: Route,
    /// Retrieved document context, pre-fetched by the orchestrator.
    pub context: Option<String>,
}

impl AgentRequest {
    pub fn new(query: Query, route: Route, context: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            query,
            route,
            context,
        }
    }
}

/// Output of one agent invocation. Failed invocations carry `error` and an
/// inline message in `text`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResult {
    pub agent_name: String,
    pub kind: AgentKind,
    pub text: String,
    /// Structured fields from the vendor response, when there are any.
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl AgentResult {
    pub fn succeeded(
        agent_name: impl Into<String>,
        kind: AgentKind,
        text: impl Into<String>,
        data: Option<serde_json::Value>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            kind,
            text: text.into(),
            data,
            error: None,
            elapsed_ms,
        }
    }

    pub fn failed(
        agent_name: impl Into<String>,
        kind: AgentKind,
        error: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        let error = error.into();
        Self {
            agent_name: agent_name.into(),
            kind,
            text: format!("{}: unavailable ({error})", kind.label()),
            data: None,
            error: Some(error),
            elapsed_ms,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
