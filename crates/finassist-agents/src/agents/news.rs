use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use finassist_models::news::truncate_content;
use finassist_models::{AgentKind, AgentRequest, NewsDigest, NewsTopic};
use tracing::{info, warn};

use crate::agent::{condense, Agent, AgentOutput};
use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::prompts;
use crate::search::{SearchProvider, SearchRequest};

/// Which searches a query calls for. General news is the default whenever
/// the query is not purely about earnings or sentiment.
pub fn select_topics(query: &str) -> Vec<NewsTopic> {
    let lower = query.to_lowercase();
    let has = |term: &str| lower.contains(term);

    let mut topics = Vec::new();
    if has("news") || has("latest") || !(has("earnings") || has("sentiment")) {
        topics.push(NewsTopic::News);
    }
    if has("earnings") || has("results") {
        topics.push(NewsTopic::Earnings);
    }
    if has("sentiment") {
        topics.push(NewsTopic::Sentiment);
    }
    topics
}

/// News agent backed by web search.
pub struct NewsAgent {
    search: Arc<dyn SearchProvider>,
    chat: Option<Arc<dyn ChatModel>>,
    max_results: usize,
}

impl NewsAgent {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        chat: Option<Arc<dyn ChatModel>>,
        max_results: usize,
    ) -> Self {
        Self {
            search,
            chat,
            max_results,
        }
    }

    async fn digest(&self, topic: NewsTopic, query: &str) -> Result<NewsDigest, AgentError> {
        let limit = topic.max_articles().min(self.max_results.max(1));
        let results = self
            .search
            .search(&SearchRequest {
                query: topic.search_query(query),
                topic: topic.search_topic().to_string(),
                max_results: limit,
            })
            .await?;

        let articles = results
            .articles
            .into_iter()
            .take(limit)
            .map(|mut article| {
                article.content = truncate_content(&article.content, topic.content_limit());
                article
            })
            .collect();

        Ok(NewsDigest {
            topic,
            query: query.to_string(),
            answer: results.answer,
            articles,
            searched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Agent for NewsAgent {
    fn name(&self) -> &str {
        "news_agent"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::News
    }

    async fn run(&self, request: &AgentRequest) -> Result<AgentOutput, AgentError> {
        let query = &request.query.text;
        let topics = select_topics(query);
        info!(request_id = %request.request_id, topics = ?topics, "News search");

        let mut digests = Vec::new();
        let mut failures = Vec::new();
        for topic in topics {
            match self.digest(topic, query).await {
                Ok(digest) => digests.push(digest),
                Err(e) => {
                    warn!(topic = ?topic, error = %e, "News search failed");
                    failures.push((topic, e));
                }
            }
        }

        if digests.is_empty() {
            if let Some((_, e)) = failures.into_iter().next() {
                return Err(e);
            }
            return Err(AgentError::NoData {
                symbol: query.clone(),
                reason: "no news topics matched".to_string(),
            });
        }

        let mut sections: Vec<String> = digests.iter().map(NewsDigest::render).collect();
        sections.extend(
            failures
                .iter()
                .map(|(topic, e)| format!("{}: unavailable ({e})", topic.heading())),
        );
        let raw = sections.join("\n\n");

        let text = condense(
            self.chat.as_deref(),
            &prompts::news_summary_prompt(&prompts::today()),
            &prompts::query_with_data(query, "News Data", &raw),
            raw.clone(),
        )
        .await;

        Ok(AgentOutput {
            text,
            data: Some(serde_json::to_value(&digests)?),
        })
    }
}
