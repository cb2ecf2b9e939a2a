use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a news search is looking for. Each topic has its own search template
/// and truncation limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NewsTopic {
    News,
    Earnings,
    Sentiment,
}

impl NewsTopic {
    pub fn search_query(&self, query: &str) -> String {
        match self {
            NewsTopic::News => format!("financial news {query} earnings market stock"),
            NewsTopic::Earnings => {
                format!("{query} earnings report quarterly results financial performance")
            }
            NewsTopic::Sentiment => {
                format!("market sentiment {query} analyst opinion bull bear outlook")
            }
        }
    }

    /// Vendor search topic ("news" restricts to news outlets).
    pub fn search_topic(&self) -> &'static str {
        match self {
            NewsTopic::News => "news",
            NewsTopic::Earnings | NewsTopic::Sentiment => "general",
        }
    }

    pub fn max_articles(&self) -> usize {
        match self {
            NewsTopic::News => 5,
            NewsTopic::Earnings => 3,
            NewsTopic::Sentiment => 4,
        }
    }

    pub fn content_limit(&self) -> usize {
        match self {
            NewsTopic::News => 500,
            NewsTopic::Earnings => 300,
            NewsTopic::Sentiment => 400,
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            NewsTopic::News => "Financial News",
            NewsTopic::Earnings => "Earnings Information",
            NewsTopic::Sentiment => "Market Sentiment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
    pub published_date: Option<String>,
}

/// Truncate to `limit` characters, appending "..." when anything was cut.
pub fn truncate_content(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let cut: String = content.chars().take(limit).collect();
    format!("{cut}...")
}

/// Results of one topic search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsDigest {
    pub topic: NewsTopic,
    pub query: String,
    /// Vendor-generated summary answer, when provided.
    pub answer: Option<String>,
    pub articles: Vec<NewsArticle>,
    pub searched_at: DateTime<Utc>,
}

impl NewsDigest {
    pub fn render(&self) -> String {
        let mut out = format!("{} for: {}\n", self.topic.heading(), self.query);
        if let Some(answer) = self.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            out.push_str(&format!("Summary: {answer}\n"));
        }
        for (i, article) in self.articles.iter().enumerate() {
            out.push_str(&format!("{}. {}", i + 1, article.title));
            if let Some(date) = &article.published_date {
                out.push_str(&format!(" ({date})"));
            }
            out.push('\n');
            out.push_str(&format!("   {}\n", article.content));
            out.push_str(&format!("   URL: {}\n", article.url));
        }
        if self.articles.is_empty() {
            out.push_str("No articles found.\n");
        }
        out.trim_end().to_string()
    }
}
