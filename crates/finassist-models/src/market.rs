use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest quote for a single symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub current_price: Decimal,
    pub previous_close: Decimal,
    /// Percent change from `previous_close`, rounded to 2 dp.
    pub change_percent: Decimal,
    pub volume: u64,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl StockQuote {
    /// Percent change between two prices, rounded to 2 dp. Zero when `previous` is not positive.
    pub fn percent_change(current: Decimal, previous: Decimal) -> Decimal {
        if previous <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2)
    }

    pub fn render(&self) -> String {
        format!(
            "{} ({}): ${} ({}{}% vs previous close ${}), volume {}",
            self.name,
            self.symbol,
            self.current_price,
            if self.change_percent >= Decimal::ZERO { "+" } else { "" },
            self.change_percent,
            self.previous_close,
            self.volume
        )
    }
}

/// One major index in the market overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSnapshot {
    pub name: String,
    pub symbol: String,
    pub current: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub error: Option<String>,
}

/// One sector ETF in the sector performance view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorSnapshot {
    pub sector: String,
    pub etf: String,
    pub current: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Medium,
    High,
}

impl RiskLevel {
    /// Portfolios with more than five holdings count as diversified.
    pub fn for_holdings(count: usize) -> Self {
        if count > 5 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub weight: Decimal,
    pub current_price: Decimal,
    pub weighted_value: Decimal,
}

/// Equal-weight portfolio analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioRisk {
    pub total_value: Decimal,
    pub holdings: Vec<Holding>,
    pub risk_level: RiskLevel,
}

/// Everything the market-data agent can report, tagged by intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum MarketSnapshot {
    Quotes {
        title: String,
        quotes: Vec<StockQuote>,
        /// Symbols that could not be quoted, with the reason.
        errors: Vec<(String, String)>,
    },
    Overview {
        indices: Vec<IndexSnapshot>,
    },
    Sectors {
        sectors: Vec<SectorSnapshot>,
    },
    Portfolio {
        portfolio: PortfolioRisk,
        errors: Vec<(String, String)>,
    },
}

fn render_change(current: Option<Decimal>, change: Option<Decimal>, error: Option<&str>) -> String {
    match (current, change, error) {
        (Some(current), Some(change), _) => {
            let sign = if change >= Decimal::ZERO { "+" } else { "" };
            format!("{current} ({sign}{change}%)")
        }
        (_, _, Some(error)) => format!("unavailable ({error})"),
        _ => "unavailable".to_string(),
    }
}

impl MarketSnapshot {
    /// Plain-text rendering handed to the synthesizer.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            MarketSnapshot::Quotes {
                title,
                quotes,
                errors,
            } => {
                out.push_str(&format!("{title}:\n"));
                for quote in quotes {
                    out.push_str(&format!("- {}\n", quote.render()));
                }
                for (symbol, error) in errors {
                    out.push_str(&format!("- {symbol}: no data ({error})\n"));
                }
            }
            MarketSnapshot::Overview { indices } => {
                out.push_str("Market Overview:\n");
                for index in indices {
                    out.push_str(&format!(
                        "- {}: {}\n",
                        index.name,
                        render_change(index.current, index.change_percent, index.error.as_deref())
                    ));
                }
            }
            MarketSnapshot::Sectors { sectors } => {
                out.push_str("Sector Performance:\n");
                for sector in sectors {
                    out.push_str(&format!(
                        "- {} ({}): {}\n",
                        sector.sector,
                        sector.etf,
                        render_change(
                            sector.current,
                            sector.change_percent,
                            sector.error.as_deref()
                        )
                    ));
                }
            }
            MarketSnapshot::Portfolio { portfolio, errors } => {
                out.push_str(&format!(
                    "Portfolio Risk Analysis: total weighted value ${}, risk level {:?}\n",
                    portfolio.total_value, portfolio.risk_level
                ));
                for holding in &portfolio.holdings {
                    out.push_str(&format!(
                        "- {}: weight {}, price ${}, weighted value ${}\n",
                        holding.symbol,
                        holding.weight,
                        holding.current_price,
                        holding.weighted_value
                    ));
                }
                for (symbol, error) in errors {
                    out.push_str(&format!("- {symbol}: no data ({error})\n"));
                }
            }
        }
        out.trim_end().to_string()
    }

    /// True when the snapshot holds at least one usable price.
    pub fn has_data(&self) -> bool {
        match self {
            MarketSnapshot::Quotes { quotes, .. } => !quotes.is_empty(),
            MarketSnapshot::Overview { indices } => indices.iter().any(|i| i.current.is_some()),
            MarketSnapshot::Sectors { sectors } => sectors.iter().any(|s| s.current.is_some()),
            MarketSnapshot::Portfolio { portfolio, .. } => !portfolio.holdings.is_empty(),
        }
    }
}
