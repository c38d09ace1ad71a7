//! End-to-end dispatch tests against in-memory collaborators

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};
use vavi::config::VaviConfigFile;
use vavi::dispatch::{EMPTY_REPLY_MESSAGE, NO_VIDEO_MESSAGE, Response};
use vavi::llm::{DEFAULT_MODEL, PERSONA_PREAMBLE};
use vavi::video::{VideoMode, VideoOutcome};
use vavi::{ApplicationRegistry, Assistant, Config, Intent, classify, normalize};

mod common;
use common::{FakeGenerator, FakeSearch, Harness, RecordingSpawner};

#[test]
fn test_normalize_idempotent() {
    for input in ["", "Hello **World**", "*** ", "ÄPFEL *und* Birnen", "already clean"] {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "input: {input:?}");
        assert!(!once.contains('*'));
    }
}

#[test]
fn test_first_registered_key_wins() {
    let registry = ApplicationRegistry::default();

    // "edge" appears first in the text but "chrome" comes first in the registry
    assert_eq!(
        classify("open edge or chrome", &registry),
        Intent::LaunchApplication("chrome".to_string())
    );
    assert_eq!(
        classify("please open my calculator then notepad", &registry),
        Intent::LaunchApplication("notepad".to_string())
    );
}

#[test]
fn test_classification_examples() {
    let registry = ApplicationRegistry::default();

    assert_eq!(
        classify("open chrome and play jazz", &registry),
        Intent::LaunchApplication("chrome".to_string())
    );
    assert_eq!(
        classify("play some jazz music", &registry),
        Intent::PlayVideo("some jazz music".to_string())
    );
    assert_eq!(
        classify("play", &registry),
        Intent::Converse("play".to_string())
    );
    assert_eq!(
        classify("what's the weather", &registry),
        Intent::Converse("what's the weather".to_string())
    );
}

#[tokio::test]
async fn test_launch_known_app() {
    let harness = Harness::default();
    let assistant = harness.assistant(VideoMode::Interactive);

    assert_eq!(assistant.process("Open Calculator").await, "Opening calculator");

    let registry = ApplicationRegistry::default();
    assert_eq!(
        harness.spawner.spawned(),
        [registry.target("calculator").unwrap()]
    );
}

#[tokio::test]
async fn test_launch_failure_is_rendered() {
    let harness = Harness::default().with_spawner(RecordingSpawner::failing());
    let assistant = harness.assistant(VideoMode::Interactive);

    let response = assistant.dispatch("open paint").await;
    assert!(response.error().is_some());
    assert!(
        response
            .to_string()
            .starts_with("Error opening paint: ")
    );
}

#[tokio::test]
async fn test_interactive_video_opens_browser() {
    let harness = Harness::default();
    let assistant = harness.assistant(VideoMode::Interactive);

    let reply = assistant.process("play lofi beats").await;

    assert_eq!(reply, "Playing Lofi Hip Hop Radio");
    assert_eq!(harness.search.queries(), ["lofi beats"]);
    assert_eq!(
        harness.browser.opened(),
        ["https://www.youtube.com/watch?v=dQw4w9WgXcQ"]
    );
}

#[tokio::test]
async fn test_api_video_returns_link() {
    let harness = Harness::default();
    let assistant = harness.assistant(VideoMode::Api);

    let response = assistant.dispatch("youtube lofi").await;

    let link = response.video_link().expect("structured link");
    assert_eq!(link.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert_eq!(link.title, "Lofi Hip Hop Radio");
    assert!(harness.browser.opened().is_empty());
}

#[tokio::test]
async fn test_video_no_match_and_fault() {
    let harness = Harness::new(FakeSearch::default(), FakeGenerator::replying("unused"));
    let assistant = harness.assistant(VideoMode::Interactive);
    assert_eq!(assistant.process("play nothing at all").await, NO_VIDEO_MESSAGE);

    let harness = Harness::new(FakeSearch::failing(), FakeGenerator::replying("unused"));
    let assistant = harness.assistant(VideoMode::Interactive);
    let response = assistant.dispatch("play jazz").await;
    assert!(matches!(
        response,
        Response::Video { result: Err(_), .. }
    ));
    assert_eq!(response.to_string(), "Error playing video: quota exceeded");
}

#[tokio::test]
async fn test_open_with_unknown_app_searches_video() {
    let harness = Harness::default();
    let assistant = harness.assistant(VideoMode::Api);

    let response = assistant.dispatch("open youtube and play lofi").await;

    assert!(matches!(
        response,
        Response::Video {
            result: Ok(VideoOutcome::Found(_)),
            ..
        }
    ));
    assert_eq!(harness.search.queries(), ["open  and  lofi"]);
}

#[tokio::test]
async fn test_conversation_reply_is_cleaned() {
    let harness = Harness::new(
        FakeSearch::default(),
        FakeGenerator::replying("**Paris** is the *capital* of France."),
    );
    let assistant = harness.assistant(VideoMode::Interactive);

    let reply = assistant.process("What is the capital of France").await;

    assert_eq!(reply, "paris is the capital of france.");
    let prompts = harness.generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with(PERSONA_PREAMBLE));
    assert!(prompts[0].ends_with("\n\nUser Query: what is the capital of france"));
}

#[tokio::test]
async fn test_conversation_fault_and_empty_reply() {
    let harness = Harness::new(FakeSearch::default(), FakeGenerator::failing("503 overloaded"));
    let assistant = harness.assistant(VideoMode::Interactive);
    assert_eq!(
        assistant.process("hello").await,
        "Sorry, I encountered an error: 503 overloaded"
    );

    let harness = Harness::new(FakeSearch::default(), FakeGenerator::replying("***"));
    let assistant = harness.assistant(VideoMode::Interactive);
    assert_eq!(assistant.process("hello").await, EMPTY_REPLY_MESSAGE);
}

#[test]
fn test_process_is_total() {
    let harness = Harness::new(FakeSearch::failing(), FakeGenerator::replying(""));
    let assistant = harness.assistant(VideoMode::Interactive);

    for input in ["", "   ", "*", "play", "open", "video", "open notepad", "¿qué?"] {
        let reply = tokio_test::block_on(assistant.process(input));
        assert!(!reply.is_empty(), "empty reply for {input:?}");
    }
}

/// Stand-in for the Gemini `generateContent` endpoint
async fn fake_generate(
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("x-goog-api-key")
        .is_some_and(|key| key == "test-key");
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    if call != format!("{DEFAULT_MODEL}:generateContent")
        || !authorized
        || !prompt.ends_with("User Query: hello")
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "unexpected request"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "**Hi** there"}]},
                "finishReason": "STOP"
            }]
        })),
    )
}

#[tokio::test]
async fn test_configured_llm_endpoint_is_used() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/models/{call}", post(fake_generate));
    tokio::spawn(async move { axum::serve(listener, app).await });

    let base_url = format!("http://{addr}/");
    let config = Config::from_sources(VaviConfigFile::default(), |name| match name {
        "GEMINI_API_KEY" => Some("test-key".to_string()),
        "VAVI_LLM_BASE_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();
    let assistant = Assistant::from_config(&config, VideoMode::Api).unwrap();

    assert_eq!(assistant.process("Hello").await, "hi there");
}
