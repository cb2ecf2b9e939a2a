pub mod documents;
pub mod general;
pub mod market_data;
pub mod news;

pub use documents::DocumentAgent;
pub use general::GeneralChatAgent;
pub use market_data::MarketDataAgent;
pub use news::NewsAgent;
