use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent_message::AgentKind;

/// The routing decision for a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    /// Answer from uploaded documents only.
    RagOnly,
    /// Live market data.
    ApiAgent,
    /// Recent news, earnings or sentiment from web search.
    ScrapingAgent,
    /// Market data and news together.
    Both,
    /// Greetings and non-finance questions.
    GeneralChat,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::RagOnly,
        Route::ApiAgent,
        Route::ScrapingAgent,
        Route::Both,
        Route::GeneralChat,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Route::RagOnly => "RAG_ONLY",
            Route::ApiAgent => "API_AGENT",
            Route::ScrapingAgent => "SCRAPING_AGENT",
            Route::Both => "BOTH",
            Route::GeneralChat => "GENERAL_CHAT",
        }
    }

    /// Parse an exact label (case-insensitive). Returns None for anything else.
    pub fn from_label(label: &str) -> Option<Route> {
        let upper = label.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|r| r.label() == upper)
    }

    /// The agents this route dispatches to, in reporting order.
    pub fn agents(&self) -> &'static [AgentKind] {
        match self {
            Route::RagOnly => &[AgentKind::DocumentContext],
            Route::ApiAgent => &[AgentKind::MarketData],
            Route::ScrapingAgent => &[AgentKind::News],
            Route::Both => &[AgentKind::MarketData, AgentKind::News],
            Route::GeneralChat => &[AgentKind::GeneralChat],
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
