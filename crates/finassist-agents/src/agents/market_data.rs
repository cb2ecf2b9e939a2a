use std::sync::Arc;

use async_trait::async_trait;
use finassist_models::{
    AgentKind, AgentRequest, Holding, IndexSnapshot, MarketConfig, MarketSnapshot, PortfolioRisk,
    RiskLevel, SectorSnapshot, StockQuote,
};
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::agent::{condense, Agent, AgentOutput};
use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::market::MarketDataProvider;
use crate::prompts;

/// Uppercase words that look like tickers but are not.
const STOP_WORDS: &[&str] = &[
    "A", "I", "AM", "AN", "AND", "ARE", "AS", "AT", "BE", "BUT", "BY", "CAN", "DO", "FOR", "FROM",
    "GET", "HAS", "HOW", "IF", "IN", "INTO", "IS", "IT", "ITS", "ME", "MY", "NO", "NOT", "OF",
    "ON", "OR", "OUT", "SO", "THE", "TO", "UP", "US", "WAS", "WE", "WHAT", "WHEN", "WHERE",
    "WHICH", "WHO", "WHY", "WILL", "WITH", "YOU", "ABOUT", "ALL", "ANY", "NEW", "NOW", "TODAY",
    "NEWS", "STOCK", "PRICE", "SHARE", "HELLO", "SHOW", "TELL", "GIVE", "AI", "CEO", "CFO",
    "CTO", "IPO", "ETF", "ETFS", "GDP", "CPI", "EPS", "PE", "FED", "SEC", "FOMC", "NYSE", "USA",
    "USD", "EUR", "GBP", "JPY", "UK", "EU", "API", "OK", "VS", "YOY", "QOQ", "YTD", "ATH", "EOD",
    "EST", "PST", "UTC", "FYI",
];

/// Lowercase company names mapped to their tickers.
const COMPANIES: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("amazon", "AMZN"),
    ("meta", "META"),
    ("facebook", "META"),
    ("netflix", "NFLX"),
    ("intel", "INTC"),
    ("amd", "AMD"),
    ("oracle", "ORCL"),
    ("salesforce", "CRM"),
    ("adobe", "ADBE"),
];

fn is_ticker_shape(token: &str) -> bool {
    (1..=5).contains(&token.len()) && token.chars().all(|c| c.is_ascii_alphabetic())
}

fn clean_token(raw: &str) -> &str {
    let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '$');
    trimmed.split(['\'', '\u{2019}']).next().unwrap_or(trimmed)
}

/// A ticker the user wrote explicitly: in capitals (`NVDA`) or with a
/// dollar prefix (`$nvda`).
fn explicit_ticker(token: &str) -> Option<String> {
    if let Some(rest) = token.strip_prefix('$') {
        return is_ticker_shape(rest).then(|| rest.to_ascii_uppercase());
    }
    (is_ticker_shape(token)
        && token.chars().all(|c| c.is_ascii_uppercase())
        && !STOP_WORDS.contains(&token))
    .then(|| token.to_string())
}

fn company_symbol(token: &str) -> Option<String> {
    let lower = token.to_lowercase();
    COMPANIES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, symbol)| symbol.to_string())
}

/// True when the text contains an explicitly written ticker.
pub fn has_explicit_ticker(query: &str) -> bool {
    query
        .split_whitespace()
        .any(|raw| explicit_ticker(clean_token(raw)).is_some())
}

/// Pull ticker symbols out of free text, in order of appearance: explicit
/// tickers plus known company names (`apple`).
pub fn extract_symbols(query: &str, max: usize) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for raw in query.split_whitespace() {
        if symbols.len() >= max {
            break;
        }
        let token = clean_token(raw);
        if let Some(symbol) = explicit_ticker(token).or_else(|| company_symbol(token)) {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
    }
    symbols
}

/// What kind of market data a query asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketIntent {
    Portfolio(Vec<String>),
    Quotes { title: String, symbols: Vec<String> },
    Sectors,
    Overview,
}

fn mentions(query: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| query.contains(t))
}

pub fn classify_intent(query: &str, config: &MarketConfig) -> MarketIntent {
    let lower = query.to_lowercase();
    let symbols = extract_symbols(query, config.max_symbols);

    if mentions(&lower, &["portfolio", "risk", "diversif"]) {
        let symbols = if symbols.is_empty() {
            config.portfolio_symbols.clone()
        } else {
            symbols
        };
        return MarketIntent::Portfolio(symbols);
    }
    if !symbols.is_empty() {
        return MarketIntent::Quotes {
            title: "Stock Data".to_string(),
            symbols,
        };
    }
    if mentions(&lower, &["sector"]) {
        return MarketIntent::Sectors;
    }
    if mentions(&lower, &["market", "indices", "index", "dow", "s&p", "nasdaq", "russell"]) {
        return MarketIntent::Overview;
    }
    if mentions(&lower, &["stock", "price", "share", "quote", "trading"]) {
        return MarketIntent::Quotes {
            title: "Top Tech Stocks".to_string(),
            symbols: config.default_symbols.clone(),
        };
    }
    MarketIntent::Overview
}

/// Market-data agent: quotes, index overview, sector ETFs and a simple
/// equal-weight portfolio view.
pub struct MarketDataAgent {
    provider: Arc<dyn MarketDataProvider>,
    chat: Option<Arc<dyn ChatModel>>,
    config: MarketConfig,
}

impl MarketDataAgent {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        chat: Option<Arc<dyn ChatModel>>,
        config: MarketConfig,
    ) -> Self {
        Self {
            provider,
            chat,
            config,
        }
    }

    /// Fetch quotes concurrently, keeping request order. Failures are
    /// returned per symbol.
    async fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> (Vec<StockQuote>, Vec<(String, String)>) {
        let mut handles = Vec::new();
        for symbol in symbols {
            let provider = Arc::clone(&self.provider);
            let task_symbol = symbol.clone();
            handles.push((
                symbol.clone(),
                tokio::spawn(async move { provider.quote(&task_symbol).await }),
            ));
        }

        let mut quotes = Vec::new();
        let mut errors = Vec::new();
        for (symbol, handle) in handles {
            match handle.await {
                Ok(Ok(quote)) => quotes.push(quote),
                Ok(Err(AgentError::NoData { reason, .. })) => errors.push((symbol, reason)),
                Ok(Err(e)) => errors.push((symbol, e.to_string())),
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Quote task panicked");
                    errors.push((symbol, "quote task panicked".to_string()));
                }
            }
        }
        (quotes, errors)
    }

    async fn snapshot(&self, intent: MarketIntent) -> MarketSnapshot {
        match intent {
            MarketIntent::Quotes { title, symbols } => {
                let (quotes, errors) = self.fetch_quotes(&symbols).await;
                MarketSnapshot::Quotes {
                    title,
                    quotes,
                    errors,
                }
            }
            MarketIntent::Overview => {
                let symbols: Vec<String> =
                    self.config.indices.iter().map(|i| i.symbol.clone()).collect();
                let (quotes, errors) = self.fetch_quotes(&symbols).await;
                let indices = self
                    .config
                    .indices
                    .iter()
                    .map(|index| {
                        let quote = quotes.iter().find(|q| q.symbol == index.symbol);
                        IndexSnapshot {
                            name: index.name.clone(),
                            symbol: index.symbol.clone(),
                            current: quote.map(|q| q.current_price),
                            change_percent: quote.map(|q| q.change_percent),
                            error: lookup_error(&errors, &index.symbol),
                        }
                    })
                    .collect();
                MarketSnapshot::Overview { indices }
            }
            MarketIntent::Sectors => {
                let symbols: Vec<String> = self
                    .config
                    .sector_etfs
                    .iter()
                    .map(|s| s.symbol.clone())
                    .collect();
                let (quotes, errors) = self.fetch_quotes(&symbols).await;
                let sectors = self
                    .config
                    .sector_etfs
                    .iter()
                    .map(|etf| {
                        let quote = quotes.iter().find(|q| q.symbol == etf.symbol);
                        SectorSnapshot {
                            sector: etf.name.clone(),
                            etf: etf.symbol.clone(),
                            current: quote.map(|q| q.current_price),
                            change_percent: quote.map(|q| q.change_percent),
                            error: lookup_error(&errors, &etf.symbol),
                        }
                    })
                    .collect();
                MarketSnapshot::Sectors { sectors }
            }
            MarketIntent::Portfolio(symbols) => {
                let (quotes, errors) = self.fetch_quotes(&symbols).await;
                MarketSnapshot::Portfolio {
                    portfolio: equal_weight_portfolio(symbols.len(), &quotes),
                    errors,
                }
            }
        }
    }
}

fn lookup_error(errors: &[(String, String)], symbol: &str) -> Option<String> {
    errors
        .iter()
        .find(|(s, _)| s == symbol)
        .map(|(_, e)| e.clone())
}

/// Equal weights across the requested symbols; risk level follows the
/// requested holding count.
pub fn equal_weight_portfolio(requested: usize, quotes: &[StockQuote]) -> PortfolioRisk {
    let weight = if requested == 0 {
        Decimal::ZERO
    } else {
        (Decimal::ONE / Decimal::from(requested)).round_dp(4)
    };
    let holdings: Vec<Holding> = quotes
        .iter()
        .map(|q| Holding {
            symbol: q.symbol.clone(),
            weight,
            current_price: q.current_price,
            weighted_value: (q.current_price * weight).round_dp(2),
        })
        .collect();
    PortfolioRisk {
        total_value: holdings.iter().map(|h| h.weighted_value).sum(),
        holdings,
        risk_level: RiskLevel::for_holdings(requested),
    }
}

fn first_error(snapshot: &MarketSnapshot) -> (String, String) {
    let fallback = ("market data".to_string(), "no prices returned".to_string());
    match snapshot {
        MarketSnapshot::Quotes { errors, .. } | MarketSnapshot::Portfolio { errors, .. } => {
            let symbols = errors
                .iter()
                .map(|(s, _)| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            errors
                .first()
                .map(|(_, reason)| (symbols, reason.clone()))
                .unwrap_or(fallback)
        }
        MarketSnapshot::Overview { indices } => indices
            .iter()
            .find_map(|i| i.error.clone())
            .map(|e| ("indices".to_string(), e))
            .unwrap_or(fallback),
        MarketSnapshot::Sectors { sectors } => sectors
            .iter()
            .find_map(|s| s.error.clone())
            .map(|e| ("sectors".to_string(), e))
            .unwrap_or(fallback),
    }
}

#[async_trait]
impl Agent for MarketDataAgent {
    fn name(&self) -> &str {
        "market_data_agent"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::MarketData
    }

    async fn run(&self, request: &AgentRequest) -> Result<AgentOutput, AgentError> {
        let query = &request.query.text;
        let intent = classify_intent(query, &self.config);
        info!(request_id = %request.request_id, intent = ?intent, "Market data intent");

        let snapshot = self.snapshot(intent).await;
        if !snapshot.has_data() {
            let (symbol, reason) = first_error(&snapshot);
            return Err(AgentError::NoData { symbol, reason });
        }

        let raw = snapshot.render();
        let text = condense(
            self.chat.as_deref(),
            &prompts::market_analysis_prompt(&prompts::today()),
            &prompts::query_with_data(query, "Market Data", &raw),
            raw.clone(),
        )
        .await;

        Ok(AgentOutput {
            text,
            data: Some(serde_json::to_value(&snapshot)?),
        })
    }
}
