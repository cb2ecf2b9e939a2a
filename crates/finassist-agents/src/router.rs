use std::sync::Arc;

use finassist_models::Route;
use tracing::{info, warn};

use crate::agents::market_data::has_explicit_ticker;
use crate::llm::ChatModel;
use crate::parser::parse_route_label;
use crate::prompts;

/// Nouns naming an upload. Matched as whole words, plurals included.
const DOCUMENT_TERMS: &[&str] = &["document", "report", "file", "upload", "uploaded"];
const MARKET_TERMS: &[&str] = &[
    "price", "stock", "quote", "share", "trading", "portfolio", "market", "indices", "index",
    "sector", "valuation",
];
const NEWS_TERMS: &[&str] = &[
    "news", "headline", "earning", "sentiment", "announce", "outlook", "analyst", "result",
];

fn any_word_starts_with(words: &[String], terms: &[&str]) -> bool {
    words
        .iter()
        .any(|w| terms.iter().any(|t| w.starts_with(t)))
}

fn names_document(words: &[String]) -> bool {
    words.iter().any(|w| {
        let singular = w.strip_suffix('s').unwrap_or(w);
        DOCUMENT_TERMS.contains(&w.as_str()) || DOCUMENT_TERMS.contains(&singular)
    })
}

/// Classifies queries into routes, asking the chat model when one is
/// configured and falling back to keyword rules otherwise.
pub struct QueryRouter {
    chat: Option<Arc<dyn ChatModel>>,
}

impl QueryRouter {
    pub fn new(chat: Option<Arc<dyn ChatModel>>) -> Self {
        Self { chat }
    }

    pub async fn route(&self, query: &str, has_context: bool) -> Route {
        if let Some(chat) = &self.chat {
            let system = prompts::router_system_prompt(&prompts::today(), has_context);
            match chat.complete(&system, query).await {
                Ok(reply) => match parse_route_label(&reply) {
                    Some(route) => {
                        info!(route = %route, source = "model", "Query routed");
                        return route;
                    }
                    None => warn!(reply = %reply, "Unrecognized route label"),
                },
                Err(e) => warn!(error = %e, "Router model failed"),
            }
        }
        let route = Self::keyword_route(query, has_context);
        info!(route = %route, source = "keywords", "Query routed");
        route
    }

    /// Rule-based classification.
    pub fn keyword_route(query: &str, has_context: bool) -> Route {
        let words: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect();

        let market =
            any_word_starts_with(&words, MARKET_TERMS) || has_explicit_ticker(query);
        let news = any_word_starts_with(&words, NEWS_TERMS);

        // "this" only points at the documents when nothing asks for live data.
        let points_at_upload = words.iter().any(|w| w == "this") && !market && !news;
        if has_context && (names_document(&words) || points_at_upload) {
            return Route::RagOnly;
        }
        match (market, news) {
            (true, true) => Route::Both,
            (true, false) => Route::ApiAgent,
            (false, true) => Route::ScrapingAgent,
            (false, false) => Route::GeneralChat,
        }
    }
}
