use std::sync::Arc;

use finassist_models::{AgentKind, AgentResult, OrchestratorConfig, Route};
use tracing::{debug, warn};

use crate::llm::ChatModel;
use crate::prompts;

pub const NO_RESULTS: &str = "I'm sorry, I couldn't find relevant information for your query. \
     Please try rephrasing or asking about a specific company or topic.";
pub const MARKET_UNAVAILABLE: &str = "I'm sorry, but current market data for your query is not \
     available. Please try asking about a specific stock symbol or check back later.";

/// Merges agent results into the final answer.
pub struct Synthesizer {
    chat: Option<Arc<dyn ChatModel>>,
    config: OrchestratorConfig,
}

fn with_failures(text: String, failures: &[&AgentResult]) -> String {
    if failures.is_empty() {
        return text;
    }
    let lines: Vec<&str> = failures.iter().map(|r| r.text.as_str()).collect();
    format!("{text}\n\n{}", lines.join("\n"))
}

impl Synthesizer {
    pub fn new(chat: Option<Arc<dyn ChatModel>>, config: OrchestratorConfig) -> Self {
        Self { chat, config }
    }

    /// Build the answer for `route` from `results` (in route order).
    ///
    /// `fallback` is the news result run after market data failed on a
    /// market-only route. Failed agents always appear inline.
    pub async fn synthesize(
        &self,
        query: &str,
        route: Route,
        results: &[AgentResult],
        fallback: Option<&AgentResult>,
    ) -> String {
        let failures: Vec<&AgentResult> = results
            .iter()
            .chain(fallback)
            .filter(|r| !r.is_ok())
            .collect();

        if let Some(fallback) = fallback {
            let market = results
                .iter()
                .find(|r| r.kind == AgentKind::MarketData && r.is_ok());
            let text = if fallback.is_ok() {
                format!("Based on web search: {}", fallback.text)
            } else if let Some(market) = market {
                // Search failed too: keep whatever market data came back.
                market.text.clone()
            } else {
                MARKET_UNAVAILABLE.to_string()
            };
            return with_failures(text, &failures);
        }

        let successes: Vec<&AgentResult> = results.iter().filter(|r| r.is_ok()).collect();
        if successes.is_empty() {
            let apology = if route == Route::ApiAgent {
                MARKET_UNAVAILABLE
            } else {
                NO_RESULTS
            };
            return with_failures(apology.to_string(), &failures);
        }

        if results.len() == 1 {
            return successes[0].text.clone();
        }

        let combined = successes
            .iter()
            .map(|r| format!("{}: {}", r.kind.label(), r.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        let merged = match (&self.chat, self.config.summarize) {
            (Some(chat), true) => {
                let user = prompts::query_with_data(query, "Sections", &combined);
                match chat.complete(&prompts::synthesis_prompt(), &user).await {
                    Ok(summary) if !summary.trim().is_empty() => summary,
                    Ok(_) => combined,
                    Err(e) => {
                        warn!(error = %e, "Summary failed, concatenating results");
                        combined
                    }
                }
            }
            _ => combined,
        };
        with_failures(merged, &failures)
    }

    /// Optional formatting pass; returns `text` unchanged when disabled or
    /// when the model fails.
    pub async fn format(&self, text: String) -> String {
        let Some(chat) = self.chat.as_ref().filter(|_| self.config.format_response) else {
            return text;
        };
        if text.trim().chars().count() < 5 {
            return text;
        }
        match chat.complete(&prompts::formatting_prompt(), &text).await {
            Ok(formatted) if !formatted.trim().is_empty() => {
                debug!("Response formatted");
                formatted.trim().to_string()
            }
            Ok(_) => text,
            Err(e) => {
                warn!(error = %e, "Formatting failed, keeping original text");
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedChat;

    fn ok(kind: AgentKind, text: &str) -> AgentResult {
        AgentResult::succeeded(kind.to_string(), kind, text, None, 5)
    }

    fn failed(kind: AgentKind, error: &str) -> AgentResult {
        AgentResult::failed(kind.to_string(), kind, error, 5)
    }

    fn plain() -> Synthesizer {
        Synthesizer::new(None, OrchestratorConfig::default())
    }

    #[tokio::test]
    async fn single_agent_text_passes_through() {
        let text = plain()
            .synthesize("AAPL", Route::ApiAgent, &[ok(AgentKind::MarketData, "AAPL $227")], None)
            .await;
        assert_eq!(text, "AAPL $227");
    }

    #[tokio::test]
    async fn both_concatenates_labelled_sections() {
        let results = [
            ok(AgentKind::MarketData, "NVDA $120"),
            ok(AgentKind::News, "NVDA unveils chip"),
        ];
        let text = plain().synthesize("NVDA", Route::Both, &results, None).await;
        assert_eq!(text, "Market Data: NVDA $120\n\nRecent News: NVDA unveils chip");
    }

    #[tokio::test]
    async fn failed_agent_appears_inline() {
        let results = [
            failed(AgentKind::MarketData, "HTTP 500"),
            ok(AgentKind::News, "NVDA unveils chip"),
        ];
        let text = plain().synthesize("NVDA", Route::Both, &results, None).await;
        assert_eq!(
            text,
            "Recent News: NVDA unveils chip\n\nMarket Data: unavailable (HTTP 500)"
        );
    }

    #[tokio::test]
    async fn everything_failed_apologizes() {
        let results = [
            failed(AgentKind::MarketData, "HTTP 500"),
            failed(AgentKind::News, "HTTP 429"),
        ];
        let text = plain().synthesize("NVDA", Route::Both, &results, None).await;
        assert!(text.starts_with(NO_RESULTS));
        assert!(text.contains("Market Data: unavailable (HTTP 500)"));
        assert!(text.contains("Recent News: unavailable (HTTP 429)"));

        let text = plain()
            .synthesize("AAPL", Route::ApiAgent, &results[..1], None)
            .await;
        assert!(text.starts_with(MARKET_UNAVAILABLE));
    }

    #[tokio::test]
    async fn news_fallback_is_labelled() {
        let results = [failed(AgentKind::MarketData, "no data")];
        let news = ok(AgentKind::News, "Apple rallied after earnings.");
        let text = plain()
            .synthesize("AAPL", Route::ApiAgent, &results, Some(&news))
            .await;
        assert!(text.starts_with("Based on web search: Apple rallied after earnings."));
        assert!(text.contains("Market Data: unavailable (no data)"));
    }

    #[tokio::test]
    async fn failed_fallback_keeps_market_text() {
        let results = [ok(
            AgentKind::MarketData,
            "Stock Data:\n- Apple Inc. (AAPL): $227.50\n- GUY: no data (not found)",
        )];
        let news = failed(AgentKind::News, "Not configured: news agent");
        let text = plain()
            .synthesize("AAPL and GUY", Route::ApiAgent, &results, Some(&news))
            .await;
        assert!(text.starts_with("Stock Data:\n- Apple Inc. (AAPL): $227.50"));
        assert!(text.contains("GUY: no data"));
        assert!(text.ends_with("Recent News: unavailable (Not configured: news agent)"));

        let results = [failed(AgentKind::MarketData, "HTTP 500")];
        let text = plain()
            .synthesize("AAPL", Route::ApiAgent, &results, Some(&news))
            .await;
        assert!(text.starts_with(MARKET_UNAVAILABLE));
    }

    #[tokio::test]
    async fn summary_used_when_configured() {
        let chat = Arc::new(ScriptedChat::new("NVDA trades at $120 after unveiling a chip."));
        let synthesizer = Synthesizer::new(Some(chat), OrchestratorConfig::default());
        let results = [
            ok(AgentKind::MarketData, "NVDA $120"),
            ok(AgentKind::News, "NVDA unveils chip"),
            failed(AgentKind::News, "HTTP 429"),
        ];
        let text = synthesizer.synthesize("NVDA", Route::Both, &results, None).await;
        assert_eq!(
            text,
            "NVDA trades at $120 after unveiling a chip.\n\nRecent News: unavailable (HTTP 429)"
        );
    }

    #[tokio::test]
    async fn summary_failure_concatenates() {
        let synthesizer =
            Synthesizer::new(Some(Arc::new(ScriptedChat::failing())), OrchestratorConfig::default());
        let results = [
            ok(AgentKind::MarketData, "NVDA $120"),
            ok(AgentKind::News, "NVDA unveils chip"),
        ];
        let text = synthesizer.synthesize("NVDA", Route::Both, &results, None).await;
        assert!(text.contains("Market Data: NVDA $120"));
        assert!(text.contains("Recent News: NVDA unveils chip"));
    }

    #[tokio::test]
    async fn formatting_is_opt_in() {
        let chat = Arc::new(ScriptedChat::new("Apple is trading at $202.82."));
        let off = Synthesizer::new(Some(chat.clone()), OrchestratorConfig::default());
        assert_eq!(off.format("Appleistrading at 202.82".into()).await, "Appleistrading at 202.82");

        let config = OrchestratorConfig {
            format_response: true,
            ..OrchestratorConfig::default()
        };
        let on = Synthesizer::new(Some(chat), config);
        assert_eq!(on.format("Appleistrading at 202.82".into()).await, "Apple is trading at $202.82.");
    }
}
