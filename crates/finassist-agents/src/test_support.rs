//! Test doubles for agents and vendor clients.
//!
//! Each double records how often it was called so tests can assert which
//! agents a route actually invoked.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use finassist_models::{AgentKind, AgentRequest, AudioClip, NewsArticle, StockQuote};
use rust_decimal::Decimal;

use crate::agent::{Agent, AgentOutput};
use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::market::MarketDataProvider;
use crate::search::{SearchProvider, SearchRequest, SearchResults};
use crate::speech::Transcriber;
use crate::tts::SpeechSynthesizer;

/// Agent returning fixed text (or a fixed failure) and counting invocations.
pub struct StaticAgent {
    kind: AgentKind,
    text: String,
    error: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_context: Mutex<Option<String>>,
}

impl StaticAgent {
    pub fn new(kind: AgentKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            error: None,
            delay: None,
            calls: AtomicUsize::new(0),
            last_context: Mutex::new(None),
        }
    }

    pub fn failing(kind: AgentKind, error: &str) -> Self {
        let mut agent = Self::new(kind, "");
        agent.error = Some(error.to_string());
        agent
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Document context passed with the most recent request.
    pub fn last_context(&self) -> Option<String> {
        self.last_context.lock().ok().and_then(|c| c.clone())
    }
}

#[async_trait]
impl Agent for StaticAgent {
    fn name(&self) -> &str {
        match self.kind {
            AgentKind::MarketData => "market_data_agent",
            AgentKind::News => "news_agent",
            AgentKind::DocumentContext => "document_agent",
            AgentKind::GeneralChat => "general_chat_agent",
        }
    }

    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn run(&self, request: &AgentRequest) -> Result<AgentOutput, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_context.lock() {
            *last = request.context.clone();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.error {
            Some(error) => Err(AgentError::NotConfigured(error.clone())),
            None => Ok(AgentOutput::text(self.text.clone())),
        }
    }
}

/// Chat model answering from a script: the first rule whose needle appears
/// in the system prompt wins, otherwise the default reply is used.
pub struct ScriptedChat {
    rules: Vec<(String, String)>,
    default_reply: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    pub fn new(default_reply: &str) -> Self {
        Self {
            rules: Vec::new(),
            default_reply: Some(default_reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A model whose every call fails.
    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            default_reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn when(mut self, system_contains: &str, reply: &str) -> Self {
        self.rules
            .push((system_contains.to_string(), reply.to_string()));
        self
    }

    /// (system, user) pairs of every call so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((system.to_string(), user.to_string()));
        }
        if let Some((_, reply)) = self.rules.iter().find(|(needle, _)| system.contains(needle)) {
            return Ok(reply.clone());
        }
        self.default_reply.clone().ok_or(AgentError::Api {
            service: "OpenAI",
            status: 500,
            body: "scripted failure".to_string(),
        })
    }
}

/// Market data from a fixed table. Unknown symbols are reported as delisted.
#[derive(Default)]
pub struct StubMarket {
    quotes: HashMap<String, StockQuote>,
    panics_on: Option<String>,
    calls: AtomicUsize,
}

impl StubMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, symbol: &str, name: &str, price: Decimal, previous: Decimal) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            StockQuote {
                symbol: symbol.to_string(),
                name: name.to_string(),
                current_price: price,
                previous_close: previous,
                change_percent: StockQuote::percent_change(price, previous),
                volume: 1_000_000,
                currency: Some("USD".to_string()),
                exchange: Some("NMS".to_string()),
                last_updated: Utc::now(),
            },
        );
        self
    }

    /// Panic when `symbol` is requested.
    pub fn panicking_on(mut self, symbol: &str) -> Self {
        self.panics_on = Some(symbol.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for StubMarket {
    async fn quote(&self, symbol: &str) -> Result<StockQuote, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panics_on.as_deref() == Some(symbol) {
            panic!("stub market panicked on {symbol}");
        }
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| AgentError::NoData {
                symbol: symbol.to_string(),
                reason: "symbol may be delisted or not found".to_string(),
            })
    }
}

/// Search returning the same articles for every request, or always failing.
pub struct StubSearch {
    results: Option<SearchResults>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl StubSearch {
    pub fn new(articles: Vec<(&str, &str)>) -> Self {
        Self {
            results: Some(SearchResults {
                answer: None,
                articles: articles
                    .into_iter()
                    .enumerate()
                    .map(|(i, (title, content))| NewsArticle {
                        title: title.to_string(),
                        url: format!("https://news.example.com/{i}"),
                        content: content.to_string(),
                        score: 0.9,
                        published_date: None,
                    })
                    .collect(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            results: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, AgentError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.results.clone().ok_or(AgentError::Api {
            service: "Tavily",
            status: 429,
            body: "rate limited".to_string(),
        })
    }
}

/// Voice that "speaks" by returning the text bytes, or always fails.
pub struct StubVoice {
    fail: bool,
}

impl StubVoice {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for StubVoice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for StubVoice {
    fn default_voice(&self) -> &str {
        "en-US-natalie"
    }

    async fn synthesize(&self, text: &str, _voice_id: &str) -> Result<AudioClip, AgentError> {
        if self.fail {
            return Err(AgentError::Api {
                service: "Murf",
                status: 401,
                body: "invalid api key".to_string(),
            });
        }
        Ok(AudioClip {
            format: "wav".to_string(),
            bytes: text.as_bytes().to_vec(),
        })
    }
}

/// Transcriber returning a fixed transcript and recording the file names it saw.
pub struct StubTranscriber {
    text: Option<String>,
    files: Mutex<Vec<String>>,
}

impl StubTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            files: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            files: Mutex::new(Vec::new()),
        }
    }

    pub fn files(&self) -> Vec<String> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, file_name: &str, _audio: Vec<u8>) -> Result<String, AgentError> {
        if let Ok(mut files) = self.files.lock() {
            files.push(file_name.to_string());
        }
        self.text.clone().ok_or_else(|| AgentError::Api {
            service: "Groq",
            status: 400,
            body: "could not decode audio".to_string(),
        })
    }
}
