pub mod agent;
pub mod agents;
pub mod error;
pub mod llm;
pub mod market;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod router;
pub mod search;
pub mod speech;
pub mod synthesizer;
pub mod tts;

pub mod test_support;

pub use agent::{Agent, AgentOutput};
pub use agents::{DocumentAgent, GeneralChatAgent, MarketDataAgent, NewsAgent};
pub use error::AgentError;
pub use llm::{ChatModel, OpenAiChat};
pub use market::{MarketDataProvider, YahooProvider};
pub use orchestrator::Orchestrator;
pub use router::QueryRouter;
pub use search::{SearchProvider, SearchRequest, SearchResults, TavilySearch};
pub use speech::{GroqTranscriber, Transcriber};
pub use synthesizer::Synthesizer;
pub use tts::{MurfSynthesizer, SpeechSynthesizer};
