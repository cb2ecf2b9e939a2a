//! HTTP API over the assistant.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query as UrlQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use finassist_agents::AgentError;
use finassist_models::Query;

use crate::Assistant;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiReply = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiReply {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn fail(status: StatusCode, message: impl Into<String>) -> ApiReply {
    (status, Json(ApiResponse::error(message)))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Restrict retrieval to these uploaded documents.
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub speak: bool,
    #[serde(default)]
    pub voice_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    #[serde(default)]
    pub voice_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub name: Option<String>,
}

/// Build the API router.
pub fn router(assistant: Arc<Assistant>) -> Router {
    let body_limit = assistant.config.server.max_upload_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/voices", get(voices))
        .route("/api/query", post(ask))
        .route(
            "/api/documents",
            get(list_documents)
                .post(upload_documents)
                .delete(delete_documents),
        )
        .route("/api/transcribe", post(transcribe))
        .route("/api/speak", post(speak))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(assistant)
}

/// Serve the API on `bind` until `shutdown` is cancelled.
pub async fn serve(
    assistant: Arc<Assistant>,
    bind: &str,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "API listening");

    axum::serve(listener, router(assistant))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("API stopped");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn status(State(assistant): State<Arc<Assistant>>) -> ApiReply {
    ok(assistant.status().await)
}

async fn voices(State(assistant): State<Arc<Assistant>>) -> ApiReply {
    let tts = &assistant.config.tts;
    ok(serde_json::json!({
        "default": tts.default_voice,
        "voices": tts.voices,
        "enabled": assistant.voice.is_some(),
    }))
}

async fn ask(
    State(assistant): State<Arc<Assistant>>,
    Json(req): Json<QueryRequest>,
) -> ApiReply {
    let mut query = Query::new(req.query).with_documents(req.documents);
    if req.speak {
        query = query.with_speech(req.voice_id);
    }
    info!(query_id = %query.id, "Query received");

    match assistant.orchestrator.handle(&query).await {
        Ok(response) => ok(response),
        Err(AgentError::EmptyQuery) => fail(StatusCode::BAD_REQUEST, "Query is empty"),
        Err(e) => {
            error!(query_id = %query.id, error = %e, "Query failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR, format!("Query failed: {e}"))
        }
    }
}

async fn list_documents(State(assistant): State<Arc<Assistant>>) -> ApiReply {
    ok(serde_json::json!({
        "documents": assistant.documents.document_names().await,
        "chunks": assistant.documents.chunk_count().await,
    }))
}

/// Ingest every file field of a multipart upload. Files that fail to load
/// are reported alongside the ones that succeeded.
async fn upload_documents(
    State(assistant): State<Arc<Assistant>>,
    mut multipart: Multipart,
) -> ApiReply {
    let mut ingested = Vec::new();
    let mut errors = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return fail(StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")),
        };
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return fail(StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")),
        };
        match assistant.documents.ingest_bytes(&name, &bytes).await {
            Ok(report) => ingested.push(report),
            Err(e) => {
                warn!(document = %name, error = %e, "Document rejected");
                errors.push(serde_json::json!({ "document": name, "error": e.to_string() }));
            }
        }
    }

    if ingested.is_empty() && errors.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "No files in upload");
    }
    if ingested.is_empty() {
        let message = errors
            .iter()
            .filter_map(|e| e["error"].as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return fail(StatusCode::UNPROCESSABLE_ENTITY, message);
    }
    ok(serde_json::json!({ "ingested": ingested, "errors": errors }))
}

async fn delete_documents(
    State(assistant): State<Arc<Assistant>>,
    UrlQuery(params): UrlQuery<DeleteParams>,
) -> ApiReply {
    match params.name {
        Some(name) => {
            if assistant.documents.remove(&name).await {
                ok(serde_json::json!({ "removed": [name] }))
            } else {
                fail(StatusCode::NOT_FOUND, format!("No document named {name}"))
            }
        }
        None => {
            let names = assistant.documents.document_names().await;
            assistant.documents.clear().await;
            ok(serde_json::json!({ "removed": names }))
        }
    }
}

async fn transcribe(
    State(assistant): State<Arc<Assistant>>,
    mut multipart: Multipart,
) -> ApiReply {
    let Some(transcriber) = assistant.transcriber.clone() else {
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "Speech-to-text is not configured",
        );
    };

    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return fail(StatusCode::BAD_REQUEST, "No audio in upload"),
        Err(e) => return fail(StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")),
    };
    let name = field.file_name().unwrap_or("audio.wav").to_string();
    let bytes = match field.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => return fail(StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")),
    };

    match transcriber.transcribe(&name, bytes).await {
        Ok(text) => ok(serde_json::json!({ "text": text })),
        Err(e) => {
            warn!(file = %name, error = %e, "Transcription failed");
            fail(StatusCode::BAD_GATEWAY, format!("Transcription failed: {e}"))
        }
    }
}

/// Voice arbitrary text. Returns the audio bytes with their MIME type.
async fn speak(
    State(assistant): State<Arc<Assistant>>,
    Json(req): Json<SpeakRequest>,
) -> Response {
    let Some(voice) = assistant.voice.clone() else {
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "Text-to-speech is not configured",
        )
        .into_response();
    };
    if req.text.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Text is empty").into_response();
    }

    let voice_id = req
        .voice_id
        .unwrap_or_else(|| voice.default_voice().to_string());
    match voice.synthesize(&req.text, &voice_id).await {
        Ok(clip) => ([(header::CONTENT_TYPE, clip.mime_type())], clip.bytes).into_response(),
        Err(e) => {
            warn!(voice = %voice_id, error = %e, "Speech synthesis failed");
            fail(StatusCode::BAD_GATEWAY, format!("Speech synthesis failed: {e}")).into_response()
        }
    }
}
