//! finassist - multi-agent finance assistant
//!
//! Routes a question to market-data, news-search, document and general
//! agents, runs the selected ones concurrently and merges their answers.
//! Uploaded documents are chunked and embedded for retrieval; answers can
//! be voiced through a text-to-speech vendor.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use finassist::models::{AppConfig, Query};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let assistant = finassist::build_assistant(&AppConfig::default())?;
//! let response = assistant.orchestrator.handle(&Query::new("NVDA price?")).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

pub mod server;

pub use finassist_agents as agents;
pub use finassist_docs as docs;
pub use finassist_models as models;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use finassist_agents::{
    Agent, ChatModel, DocumentAgent, GeneralChatAgent, GroqTranscriber, MarketDataAgent,
    MurfSynthesizer, NewsAgent, OpenAiChat, Orchestrator, QueryRouter, SpeechSynthesizer,
    Synthesizer, TavilySearch, Transcriber, YahooProvider,
};
use finassist_docs::{DocumentStore, Embedder, HashingEmbedder, OpenAiEmbedder};
use finassist_models::config::api_key_from_env;
use finassist_models::{AgentKind, AppConfig};

/// Default config location, used when no `--config` is given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "config/finassist.toml";

/// Everything the CLI and web API need to answer requests.
pub struct Assistant {
    pub orchestrator: Orchestrator,
    pub documents: Arc<DocumentStore>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub voice: Option<Arc<dyn SpeechSynthesizer>>,
    pub config: AppConfig,
    /// Chat model in use, `None` when running without an LLM key.
    pub chat_model: Option<String>,
    /// Whether web search is configured.
    pub news_search: bool,
}

/// Which vendors are configured, for `/api/status` and `finassist status`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApiStatus {
    pub chat_model: Option<String>,
    pub embedder: String,
    pub market_data: bool,
    pub news_search: bool,
    pub transcription: bool,
    pub text_to_speech: bool,
    pub documents: Vec<String>,
    pub chunks: usize,
}

impl Assistant {
    pub async fn status(&self) -> ApiStatus {
        ApiStatus {
            chat_model: self.chat_model.clone(),
            embedder: self.documents.embedder_name().to_string(),
            market_data: self.orchestrator.has_agent(AgentKind::MarketData),
            news_search: self.news_search,
            transcription: self.transcriber.is_some(),
            text_to_speech: self.voice.is_some(),
            documents: self.documents.document_names().await,
            chunks: self.documents.chunk_count().await,
        }
    }
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] when it
/// exists, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = match path {
        Some(p) => p,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Path::new(DEFAULT_CONFIG_PATH),
        None => return Ok(AppConfig::default()),
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Build the assistant from configuration and the API keys in the environment.
///
/// A missing key disables its vendor instead of failing: no LLM key means
/// keyword routing and offline embeddings, no search key means no news agent,
/// and so on.
pub fn build_assistant(config: &AppConfig) -> anyhow::Result<Assistant> {
    let llm_key = api_key_from_env(&config.llm.api_key_env);

    let chat: Option<Arc<dyn ChatModel>> = match &llm_key {
        Some(key) => Some(Arc::new(
            OpenAiChat::new(config.llm.clone(), key).context("Failed to build chat client")?,
        )),
        None => {
            warn!(var = %config.llm.api_key_env, "No LLM key, using keyword routing and raw agent output");
            None
        }
    };

    let embedder: Arc<dyn Embedder> = match &llm_key {
        Some(key) => Arc::new(
            OpenAiEmbedder::new(
                &config.llm.base_url,
                key,
                &config.llm.embedding_model,
                Duration::from_secs(config.llm.timeout_seconds),
            )
            .context("Failed to build embedding client")?,
        ),
        None => Arc::new(HashingEmbedder::new(config.rag.hashing_dimensions)),
    };
    let documents = Arc::new(DocumentStore::from_config(embedder, &config.rag));

    let summary_chat = if config.orchestrator.agent_summaries {
        chat.clone()
    } else {
        None
    };

    let market = YahooProvider::new(&config.market).context("Failed to build market client")?;
    let mut agents: Vec<Arc<dyn Agent>> = vec![Arc::new(MarketDataAgent::new(
        Arc::new(market),
        summary_chat.clone(),
        config.market.clone(),
    ))];

    let news_search = match api_key_from_env(&config.search.api_key_env) {
        Some(key) => {
            let search =
                TavilySearch::new(&config.search, key).context("Failed to build search client")?;
            agents.push(Arc::new(NewsAgent::new(
                Arc::new(search),
                summary_chat,
                config.search.max_results,
            )));
            true
        }
        None => {
            warn!(var = %config.search.api_key_env, "No search key, news agent disabled");
            false
        }
    };

    agents.push(Arc::new(DocumentAgent::new(chat.clone())));
    agents.push(Arc::new(GeneralChatAgent::new(chat.clone())));

    let transcriber: Option<Arc<dyn Transcriber>> =
        match api_key_from_env(&config.speech.api_key_env) {
            Some(key) => Some(Arc::new(
                GroqTranscriber::new(config.speech.clone(), key)
                    .context("Failed to build transcription client")?,
            )),
            None => {
                warn!(var = %config.speech.api_key_env, "No transcription key, voice input disabled");
                None
            }
        };

    let voice: Option<Arc<dyn SpeechSynthesizer>> = match api_key_from_env(&config.tts.api_key_env)
    {
        Some(key) => Some(Arc::new(
            MurfSynthesizer::new(config.tts.clone(), key)
                .context("Failed to build text-to-speech client")?,
        )),
        None => {
            warn!(var = %config.tts.api_key_env, "No text-to-speech key, voice output disabled");
            None
        }
    };

    let mut orchestrator = Orchestrator::new(
        agents,
        QueryRouter::new(chat.clone()),
        Synthesizer::new(chat.clone(), config.orchestrator.clone()),
        config,
    )
    .with_documents(documents.clone());
    if let Some(voice) = &voice {
        orchestrator = orchestrator.with_voice(voice.clone());
    }

    info!(
        chat = chat.is_some(),
        embedder = %documents.embedder_name(),
        news = news_search,
        transcription = transcriber.is_some(),
        tts = voice.is_some(),
        "Assistant ready"
    );

    Ok(Assistant {
        orchestrator,
        documents,
        transcriber,
        voice,
        config: config.clone(),
        chat_model: chat.map(|c| c.model().to_string()),
        news_search,
    })
}
