use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} is not set")]
    MissingKey(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("No data for {symbol}: {reason}")]
    NoData { symbol: String, reason: String },

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Query is empty")]
    EmptyQuery,

    #[error("Document error: {0}")]
    Docs(#[from] finassist_docs::DocsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const MAX_ERROR_BODY: usize = 300;

/// Turn a non-2xx vendor response into [`AgentError::Api`], keeping a
/// bounded slice of the body for the inline error text.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    Err(AgentError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}
