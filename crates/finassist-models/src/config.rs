use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration for finassist.
///
/// Every section has defaults, so an empty TOML file is a valid config.
/// API keys never live in the file: each vendor section names the
/// environment variable that holds its key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub market: MarketConfig,
    pub search: SearchConfig,
    pub speech: SpeechConfig,
    pub tts: TtsConfig,
    pub rag: RagConfig,
    pub orchestrator: OrchestratorConfig,
    pub server: ServerConfig,
}

/// Chat model and embeddings (OpenAI-compatible API).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub embedding_model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: 800,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
            embedding_model: "text-embedding-3-small".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Market data (Yahoo Finance chart API, no key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    pub base_url: String,
    /// Maximum symbols quoted per query.
    pub max_symbols: usize,
    /// How long a fetched quote is reused.
    pub quote_ttl_seconds: u64,
    pub timeout_seconds: u64,
    /// Quoted when a query asks about stocks without naming any.
    pub default_symbols: Vec<String>,
    /// Analysed for portfolio/risk questions that name no symbols.
    pub portfolio_symbols: Vec<String>,
    /// Indices in the market overview, rendered in this order.
    pub indices: Vec<MarketSymbol>,
    /// Sector ETFs in the sector view, rendered in this order.
    pub sector_etfs: Vec<MarketSymbol>,
}

/// A display name paired with the symbol quoted for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketSymbol {
    pub name: String,
    pub symbol: String,
}

impl MarketSymbol {
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        let indices = [
            ("S&P 500", "^GSPC"),
            ("Dow Jones", "^DJI"),
            ("NASDAQ", "^IXIC"),
            ("Russell 2000", "^RUT"),
        ];
        let sectors = [
            ("Technology", "XLK"),
            ("Healthcare", "XLV"),
            ("Financials", "XLF"),
            ("Energy", "XLE"),
            ("Consumer Discretionary", "XLY"),
        ];
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            max_symbols: 3,
            quote_ttl_seconds: 60,
            timeout_seconds: 20,
            default_symbols: vec!["AAPL".into(), "MSFT".into(), "GOOGL".into()],
            portfolio_symbols: vec![
                "AAPL".into(),
                "MSFT".into(),
                "GOOGL".into(),
                "TSLA".into(),
                "NVDA".into(),
            ],
            indices: indices
                .iter()
                .map(|(name, symbol)| MarketSymbol::new(name, symbol))
                .collect(),
            sector_etfs: sectors
                .iter()
                .map(|(name, symbol)| MarketSymbol::new(name, symbol))
                .collect(),
        }
    }
}

/// Web search (Tavily).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub max_results: usize,
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: 5,
            timeout_seconds: 30,
        }
    }
}

/// Speech-to-text (Groq Whisper, OpenAI-compatible transcription endpoint).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub model: String,
    pub language: String,
    pub timeout_seconds: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "whisper-large-v3".to_string(),
            language: "en".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Text-to-speech (Murf).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub default_voice: String,
    /// Display label -> vendor voice id.
    pub voices: BTreeMap<String, String>,
    pub format: String,
    pub timeout_seconds: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        let mut voices = BTreeMap::new();
        voices.insert("Male Voice".to_string(), "en-US-ken".to_string());
        voices.insert("Female Voice".to_string(), "en-US-natalie".to_string());
        Self {
            base_url: "https://api.murf.ai/v1".to_string(),
            api_key_env: "MURF_API_KEY".to_string(),
            default_voice: "en-US-natalie".to_string(),
            voices,
            format: "wav".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Document chunking and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Retrieved context shorter than this counts as no context.
    pub min_context_chars: usize,
    /// Dimensions of the offline hashing embedder.
    pub hashing_dimensions: usize,
    pub embedding_cache_capacity: u64,
    pub embedding_cache_ttl_seconds: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            min_context_chars: 20,
            hashing_dimensions: 512,
            embedding_cache_capacity: 10_000,
            embedding_cache_ttl_seconds: 3600,
        }
    }
}

/// Synthesis behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Lightly summarize multi-agent answers with the chat model.
    pub summarize: bool,
    /// Run a final formatting pass over the answer with the chat model.
    pub format_response: bool,
    /// Fall back to web search when market data fails on a market-only route.
    pub news_fallback: bool,
    /// Let agents condense their raw vendor data with the chat model.
    pub agent_summaries: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            summarize: true,
            format_response: false,
            news_fallback: true,
            agent_summaries: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Read an API key from the environment. Empty values and the
/// `your_..._here` placeholders shipped in sample `.env` files count as unset.
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| is_real_key(v))
}

pub fn is_real_key(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !(trimmed.starts_with("your_") && trimmed.ends_with("_here"))
}
