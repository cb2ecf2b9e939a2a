//! Web API tests driven through the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use finassist::agents::test_support::{StaticAgent, StubTranscriber, StubVoice};
use finassist::agents::{
    Agent, DocumentAgent, GeneralChatAgent, Orchestrator, QueryRouter, SpeechSynthesizer,
    Synthesizer, Transcriber,
};
use finassist::docs::{DocumentStore, HashingEmbedder};
use finassist::models::{AgentKind, AppConfig};
use finassist::{server, Assistant};

struct Options {
    voice: Option<Arc<dyn SpeechSynthesizer>>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

fn app(options: Options) -> Router {
    let config = AppConfig::default();
    let documents = Arc::new(DocumentStore::from_config(
        Arc::new(HashingEmbedder::new(256)),
        &config.rag,
    ));
    let agents: Vec<Arc<dyn Agent>> = vec![
        Arc::new(StaticAgent::new(
            AgentKind::MarketData,
            "NVIDIA (NVDA): $120.00 (+2.10%)",
        )),
        Arc::new(DocumentAgent::new(None)),
        Arc::new(GeneralChatAgent::new(None)),
    ];
    let mut orchestrator = Orchestrator::new(
        agents,
        QueryRouter::new(None),
        Synthesizer::new(None, config.orchestrator.clone()),
        &config,
    )
    .with_documents(documents.clone());
    if let Some(voice) = &options.voice {
        orchestrator = orchestrator.with_voice(voice.clone());
    }

    server::router(Arc::new(Assistant {
        orchestrator,
        documents,
        transcriber: options.transcriber,
        voice: options.voice,
        config,
        chat_model: None,
        news_search: false,
    }))
}

fn plain_app() -> Router {
    app(Options {
        voice: None,
        transcriber: None,
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "finassist-test-boundary";

fn multipart(uri: &str, files: &[(&str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, contents) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(contents.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let (status, body) = send_json(&plain_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn status_lists_configured_vendors() {
    let (status, body) = send_json(&plain_app(), get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["embedder"], "hashing");
    assert_eq!(body["data"]["market_data"], true);
    assert_eq!(body["data"]["text_to_speech"], false);
    assert!(body["data"]["chat_model"].is_null());
}

#[tokio::test]
async fn voices_lists_config_voices() {
    let (_, body) = send_json(&plain_app(), get("/api/voices")).await;
    assert_eq!(body["data"]["default"], "en-US-natalie");
    assert_eq!(body["data"]["voices"]["Male Voice"], "en-US-ken");
    assert_eq!(body["data"]["enabled"], false);
}

#[tokio::test]
async fn query_returns_synthesized_response() {
    let (status, body) = send_json(
        &plain_app(),
        post_json("/api/query", json!({ "query": "What is the NVDA stock price?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["route"], "API_AGENT");
    assert!(body["data"]["text"].as_str().unwrap().contains("NVIDIA (NVDA)"));
    assert!(body["data"]["audio"].is_null());
}

#[tokio::test]
async fn blank_query_is_bad_request() {
    let (status, body) =
        send_json(&plain_app(), post_json("/api/query", json!({ "query": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Query is empty");
}

#[tokio::test]
async fn uploaded_document_answers_later_queries() {
    let app = plain_app();

    let (status, body) = send_json(
        &app,
        multipart(
            "/api/documents",
            &[("memo.txt", "The board approved a $2B share buyback in March.")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ingested"][0]["document"], "memo.txt");
    assert_eq!(body["data"]["ingested"][0]["chunks"], 1);

    let (_, listed) = send_json(&app, get("/api/documents")).await;
    assert_eq!(listed["data"]["documents"], json!(["memo.txt"]));

    let (status, answer) = send_json(
        &app,
        post_json(
            "/api/query",
            json!({ "query": "What does this file say about the buyback?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["data"]["route"], "RAG_ONLY");
    assert!(answer["data"]["text"]
        .as_str()
        .unwrap()
        .contains("$2B share buyback"));
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let (status, body) = send_json(
        &plain_app(),
        multipart("/api/documents", &[("scan.pdf", "%PDF-1.7 binary")]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("scan.pdf"));
}

#[tokio::test]
async fn delete_removes_named_or_all_documents() {
    let app = plain_app();
    send(
        &app,
        multipart(
            "/api/documents",
            &[("a.txt", "Alpha notes."), ("b.md", "# Beta\nBeta notes.")],
        ),
    )
    .await;

    let delete = |uri: &str| Request::delete(uri).body(Body::empty()).unwrap();

    let (status, _) = send_json(&app, delete("/api/documents?name=a.txt")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(&app, delete("/api/documents?name=a.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app, delete("/api/documents")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], json!(["b.md"]));

    let (_, listed) = send_json(&app, get("/api/documents")).await;
    assert_eq!(listed["data"]["chunks"], 0);
}

#[tokio::test]
async fn speak_without_voice_is_unavailable() {
    let (status, body) = send_json(
        &plain_app(),
        post_json("/api/speak", json!({ "text": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn speak_returns_audio_bytes() {
    let app = app(Options {
        voice: Some(Arc::new(StubVoice::new())),
        transcriber: None,
    });
    let response = app
        .oneshot(post_json("/api/speak", json!({ "text": "Markets are up" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Markets are up");
}

#[tokio::test]
async fn spoken_query_carries_audio() {
    let app = app(Options {
        voice: Some(Arc::new(StubVoice::new())),
        transcriber: None,
    });
    let (status, body) = send_json(
        &app,
        post_json(
            "/api/query",
            json!({ "query": "What is the NVDA stock price?", "speak": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["audio"]["format"], "wav");
    assert!(body["data"]["audio_error"].is_null());
}

#[tokio::test]
async fn transcribe_returns_text() {
    let transcriber = Arc::new(StubTranscriber::new("What is Apple trading at?"));
    let app = app(Options {
        voice: None,
        transcriber: Some(transcriber.clone()),
    });
    let (status, body) = send_json(
        &app,
        multipart("/api/transcribe", &[("question.wav", "RIFF....")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "What is Apple trading at?");
    assert_eq!(transcriber.files(), vec!["question.wav"]);
}

#[tokio::test]
async fn failed_transcription_is_bad_gateway() {
    let app = app(Options {
        voice: None,
        transcriber: Some(Arc::new(StubTranscriber::failing())),
    });
    let (status, body) = send_json(
        &app,
        multipart("/api/transcribe", &[("noise.wav", "????")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("Transcription failed"));
}
