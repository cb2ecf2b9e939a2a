pub mod agent_message;
pub mod config;
pub mod document;
pub mod market;
pub mod news;
pub mod query;
pub mod response;
pub mod route;

pub use agent_message::{AgentKind, AgentRequest, AgentResult};
pub use config::{
    AppConfig, LlmConfig, MarketConfig, MarketSymbol, OrchestratorConfig, RagConfig,
    SearchConfig, ServerConfig, SpeechConfig, TtsConfig,
};
pub use document::{Chunk, Document, DocumentKind, RetrievedChunk};
pub use market::{
    Holding, IndexSnapshot, MarketSnapshot, PortfolioRisk, RiskLevel, SectorSnapshot, StockQuote,
};
pub use news::{NewsArticle, NewsDigest, NewsTopic};
pub use query::{Query, QueryOptions};
pub use response::{AudioClip, Response};
pub use route::Route;
