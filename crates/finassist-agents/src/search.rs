use std::time::Duration;

use async_trait::async_trait;
use finassist_models::{NewsArticle, SearchConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_success, AgentError};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// Vendor topic, e.g. "news" or "general".
    pub topic: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub answer: Option<String>,
    pub articles: Vec<NewsArticle>,
}

/// Web search backend. Mockable for testing.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, AgentError>;
}

/// Tavily search API client.
pub struct TavilySearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    topic: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
}

#[derive(Deserialize)]
struct TavilyResponse {
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
    published_date: Option<String>,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, AgentError> {
        debug!(query = %request.query, topic = %request.topic, "Web search");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&TavilyRequest {
                query: &request.query,
                topic: &request.topic,
                max_results: request.max_results,
                search_depth: "basic",
                include_answer: true,
            })
            .send()
            .await?;
        let response = ensure_success("Tavily", response).await?;
        let parsed: TavilyResponse = response.json().await?;

        Ok(SearchResults {
            answer: parsed.answer.filter(|a| !a.trim().is_empty()),
            articles: parsed
                .results
                .into_iter()
                .map(|r| NewsArticle {
                    title: if r.title.is_empty() {
                        "No title".to_string()
                    } else {
                        r.title
                    },
                    url: r.url,
                    content: r.content,
                    score: r.score,
                    published_date: r.published_date,
                })
                .collect(),
        })
    }
}
