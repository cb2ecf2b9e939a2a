//! HTTP contract tests for vendor clients against wiremock servers.

use finassist_agents::{
    AgentError, ChatModel, GroqTranscriber, MarketDataProvider, MurfSynthesizer, OpenAiChat,
    SearchProvider, SearchRequest, SpeechSynthesizer, TavilySearch, Transcriber, YahooProvider,
};
use finassist_models::{LlmConfig, MarketConfig, SearchConfig, SpeechConfig, TtsConfig};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Chat model ────────────────────────────────────────────────────

#[tokio::test]
async fn chat_completion_sends_settings_and_reads_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 800,
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Hi!  "}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: server.uri(),
        ..LlmConfig::default()
    };
    let chat = OpenAiChat::new(config, "sk-test").unwrap();
    assert_eq!(chat.complete("Be brief.", "Hello").await.unwrap(), "Hi!");
}

#[tokio::test]
async fn chat_rate_limit_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit reached"))
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: server.uri(),
        ..LlmConfig::default()
    };
    let chat = OpenAiChat::new(config, "sk-test").unwrap();
    match chat.complete("sys", "user").await.unwrap_err() {
        AgentError::Api { status, body, .. } => {
            assert_eq!(status, 429);
            assert_eq!(body, "Rate limit reached");
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

// ── Market data ───────────────────────────────────────────────────

fn chart_body() -> serde_json::Value {
    json!({
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "AAPL",
                    "currency": "USD",
                    "exchangeName": "NMS",
                    "longName": "Apple Inc.",
                    "regularMarketPrice": 227.5,
                    "regularMarketVolume": 41000000u64
                },
                "timestamp": [1, 2],
                "indicators": {"quote": [{"close": [225.0, 227.5], "volume": [1, 2]}]}
            }],
            "error": null
        }
    })
}

#[tokio::test]
async fn yahoo_quote_is_parsed_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .and(query_param("range", "5d"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = MarketConfig {
        base_url: server.uri(),
        ..MarketConfig::default()
    };
    let provider = YahooProvider::new(&config).unwrap();

    let quote = provider.quote("AAPL").await.unwrap();
    assert_eq!(quote.name, "Apple Inc.");
    assert_eq!(quote.current_price, dec!(227.50));
    assert_eq!(quote.previous_close, dec!(225.00));
    assert_eq!(quote.change_percent, dec!(1.11));
    assert_eq!(quote.volume, 41_000_000);

    // Served from cache; the mock expects exactly one request.
    let again = provider.quote("aapl").await.unwrap();
    assert_eq!(again.current_price, quote.current_price);
}

#[tokio::test]
async fn yahoo_not_found_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/GUY"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}
        })))
        .mount(&server)
        .await;

    let config = MarketConfig {
        base_url: server.uri(),
        ..MarketConfig::default()
    };
    let provider = YahooProvider::new(&config).unwrap();
    match provider.quote("GUY").await.unwrap_err() {
        AgentError::NoData { symbol, reason } => {
            assert_eq!(symbol, "GUY");
            assert!(reason.contains("delisted"));
        }
        other => panic!("Expected NoData, got {other:?}"),
    }
}

#[tokio::test]
async fn yahoo_chart_error_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/XXXX"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}
        })))
        .mount(&server)
        .await;

    let config = MarketConfig {
        base_url: server.uri(),
        ..MarketConfig::default()
    };
    let provider = YahooProvider::new(&config).unwrap();
    assert!(matches!(
        provider.quote("XXXX").await.unwrap_err(),
        AgentError::NoData { .. }
    ));
}

// ── Web search ────────────────────────────────────────────────────

#[tokio::test]
async fn tavily_search_maps_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer tvly-test"))
        .and(body_partial_json(json!({
            "query": "financial news Tesla earnings market stock",
            "topic": "news",
            "max_results": 5,
            "include_answer": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "financial news Tesla earnings market stock",
            "answer": "Tesla beat delivery estimates.",
            "results": [
                {"title": "Tesla deliveries beat", "url": "https://example.com/1", "content": "Deliveries rose.", "score": 0.93, "published_date": "2026-10-18"},
                {"url": "https://example.com/2", "content": "Untitled piece.", "score": 0.5}
            ]
        })))
        .mount(&server)
        .await;

    let config = SearchConfig {
        base_url: server.uri(),
        ..SearchConfig::default()
    };
    let search = TavilySearch::new(&config, "tvly-test").unwrap();
    let results = search
        .search(&SearchRequest {
            query: "financial news Tesla earnings market stock".to_string(),
            topic: "news".to_string(),
            max_results: 5,
        })
        .await
        .unwrap();

    assert_eq!(results.answer.as_deref(), Some("Tesla beat delivery estimates."));
    assert_eq!(results.articles.len(), 2);
    assert_eq!(results.articles[0].published_date.as_deref(), Some("2026-10-18"));
    assert_eq!(results.articles[1].title, "No title");
}

// ── Speech ────────────────────────────────────────────────────────

#[tokio::test]
async fn groq_transcription_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header("authorization", "Bearer gsk-test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"text": " What is Apple trading at? "})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = SpeechConfig {
        base_url: server.uri(),
        ..SpeechConfig::default()
    };
    let transcriber = GroqTranscriber::new(config, "gsk-test").unwrap();
    let text = transcriber
        .transcribe("question.wav", vec![0x52, 0x49, 0x46, 0x46])
        .await
        .unwrap();
    assert_eq!(text, "What is Apple trading at?");
}

#[tokio::test]
async fn empty_audio_is_rejected_locally() {
    let transcriber = GroqTranscriber::new(SpeechConfig::default(), "gsk-test").unwrap();
    assert!(transcriber.transcribe("empty.wav", vec![]).await.is_err());
}

#[tokio::test]
async fn murf_generates_then_downloads_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/speech/generate"))
        .and(header("api-key", "murf-test"))
        .and(body_partial_json(json!({
            "text": "Apple is up 2%",
            "voiceId": "en-US-ken",
            "format": "WAV"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audioFile": format!("{}/files/answer.wav", server.uri()),
            "audioLengthInSeconds": 1.2
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/answer.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFdata".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = TtsConfig {
        base_url: server.uri(),
        ..TtsConfig::default()
    };
    let voice = MurfSynthesizer::new(config, "murf-test").unwrap();
    let clip = voice
        .synthesize("**Apple** is up `2%`", "en-US-ken")
        .await
        .unwrap();
    assert_eq!(clip.format, "wav");
    assert_eq!(clip.bytes, b"RIFFdata");
    assert_eq!(clip.mime_type(), "audio/wav");
}

#[tokio::test]
async fn murf_auth_failure_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/speech/generate"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let config = TtsConfig {
        base_url: server.uri(),
        ..TtsConfig::default()
    };
    let voice = MurfSynthesizer::new(config, "bad").unwrap();
    let err = voice.synthesize("hello", "en-US-natalie").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}
