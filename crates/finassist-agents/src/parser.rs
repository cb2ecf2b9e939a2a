use finassist_models::Route;

/// Find the route label in a classifier reply.
///
/// Tolerates markdown, quotes, trailing punctuation and prefixes such as
/// `Route: BOTH`. Returns `None` when no known label appears.
pub fn parse_route_label(raw: &str) -> Option<Route> {
    raw.to_uppercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .find_map(Route::from_label)
}

/// Strip markdown emphasis, headings and code ticks so the text reads
/// naturally when spoken.
pub fn clean_for_speech(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '#' | '`'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

const ERROR_INDICATORS: &[&str] = &["error", "not found", "no data", "unavailable", "failed"];
const FINANCIAL_QUERY_TERMS: &[&str] = &[
    "stock", "price", "market", "earnings", "revenue", "cap", "trading",
];
const FINANCIAL_INDICATORS: &[&str] = &[
    "$",
    "%",
    "trading",
    "market cap",
    "revenue",
    "earnings",
    "shares",
];

/// Whether a market-data answer actually addresses the query.
///
/// Short answers and answers reporting errors are irrelevant. For financial
/// queries the answer must also carry a financial figure or term.
pub fn is_relevant(query: &str, response: &str) -> bool {
    let response = response.trim();
    if response.chars().count() < 10 {
        return false;
    }
    if has_error_indicator(response) {
        return false;
    }
    let lower = response.to_lowercase();
    let query = query.to_lowercase();
    if FINANCIAL_QUERY_TERMS.iter().any(|t| query.contains(t)) {
        return FINANCIAL_INDICATORS.iter().any(|i| lower.contains(i));
    }
    true
}

fn has_error_indicator(line: &str) -> bool {
    let lower = line.to_lowercase();
    ERROR_INDICATORS.iter().any(|i| lower.contains(i))
}

/// Drop the lines that report a per-item failure (`- GUY: no data (...)`),
/// keeping the rest. Returns `text` unchanged when every line is an error.
pub fn without_error_lines(text: &str) -> String {
    let kept: Vec<&str> = text.lines().filter(|l| !has_error_indicator(l)).collect();
    if kept.iter().all(|l| l.trim().is_empty()) {
        return text.to_string();
    }
    kept.join("\n")
}
