//! Integration tests for the HTTP surface.
//!
//! Drives the axum router in-process with a stub model client, so no network
//! access or API key is needed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use glass_mind::clients::{CompletionRequest, CompletionResponse, ModelClient, ModelError};
use glass_mind::config::Config;
use glass_mind::normalizer::{DEFAULT_FOLLOW_UPS, FALLBACK_CONCLUSION};
use glass_mind::server::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Replays a canned reply and records the requests it saw
struct StubClient {
    reply: Result<String, String>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl StubClient {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for StubClient {
    fn provider(&self) -> &str {
        "stub"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ModelError> {
        self.seen.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(CompletionResponse { text: text.clone() }),
            Err(message) => Err(ModelError::Transport(message.clone())),
        }
    }
}

fn structured_reply() -> String {
    json!({
        "thinking": [
            {"label": "Understanding the Question", "content": "Choosing a database."},
            {"label": "My Approach", "content": "Compare workloads."},
            {"label": "Key Assumptions", "content": "Mostly reads."},
            {"label": "Missing Information", "content": "Expected scale."},
            {"label": "Alternative Perspectives", "content": "Managed services."}
        ],
        "conclusion": "Start with Postgres.",
        "followUpQuestions": ["How big will the data get?"]
    })
    .to_string()
}

fn state_with(client: Arc<StubClient>, labels: bool) -> AppState {
    let mut config = Config::default();
    config.label.enabled = labels;
    AppState::new(config, client)
}

async fn post_raw(state: AppState, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/think")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn post_json(state: AppState, body: Value) -> (StatusCode, Value) {
    post_raw(state, &body.to_string()).await
}

#[tokio::test]
async fn missing_question_is_bad_request() {
    let client = StubClient::replying(&structured_reply());
    let (status, body) = post_json(state_with(client.clone(), true), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Question is required"}));
    assert!(client.requests().is_empty(), "model must not be called");
}

#[tokio::test]
async fn non_string_question_is_bad_request() {
    let client = StubClient::replying(&structured_reply());
    let (status, body) = post_json(state_with(client, true), json!({"question": 12})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Question is required");
}

#[tokio::test]
async fn structured_reply_is_returned_with_label() {
    let client = StubClient::replying(&structured_reply());
    let (status, body) = post_json(
        state_with(client, true),
        json!({"question": "Which database should we use?", "analysisType": "practical"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["thinking"].as_array().unwrap().len(), 5);
    assert_eq!(body["conclusion"], "Start with Postgres.");
    assert_eq!(body["followUpQuestions"], json!(["How big will the data get?"]));

    let label = &body["label"];
    assert_eq!(label["model"]["version"], "gpt-4-turbo-preview");
    assert_eq!(label["confidence"]["overall"], 95);
    assert_eq!(label["certifications"]["transparency_score"], 95);
    assert_eq!(label["certifications"]["verification_level"], "premium");
}

#[tokio::test]
async fn label_can_be_disabled() {
    let client = StubClient::replying(&structured_reply());
    let (status, body) = post_json(
        state_with(client, false),
        json!({"question": "Which database should we use?"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("label").is_none());
}

#[tokio::test]
async fn unstructured_reply_falls_back() {
    let client = StubClient::replying("I am not sure.");
    let (status, body) =
        post_json(state_with(client, false), json!({"question": "What now?"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["thinking"].as_array().unwrap().len(), 1);
    assert_eq!(body["conclusion"], FALLBACK_CONCLUSION);
    assert_eq!(body["followUpQuestions"], json!(DEFAULT_FOLLOW_UPS));
}

#[tokio::test]
async fn model_failure_is_generic_server_error() {
    let client = StubClient::failing("connection reset by peer");
    let (status, body) =
        post_json(state_with(client, true), json!({"question": "What now?"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to process request"}));
}

#[tokio::test]
async fn empty_model_reply_is_server_error() {
    let client = StubClient::replying("   ");
    let (status, body) =
        post_json(state_with(client, true), json!({"question": "What now?"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process request");
}

#[tokio::test]
async fn malformed_body_is_server_error() {
    let client = StubClient::replying(&structured_reply());
    let (status, body) = post_raw(state_with(client, true), "{not json").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process request");
}

#[tokio::test]
async fn request_carries_prompt_and_sampling_parameters() {
    let client = StubClient::replying(&structured_reply());
    let (status, _) = post_json(
        state_with(client.clone(), true),
        json!({
            "question": "Should we hire now?",
            "analysisType": "risk-focused",
            "userProfile": {"previousQuestions": ["What is our burn rate?", "Should we hire now?"]}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.model, "gpt-4-turbo-preview");
    assert_eq!(req.user_message, "Should we hire now?");
    assert_eq!(req.max_tokens, 1500);
    assert!(req.system_prompt.contains("risk-focused analysis"));
    assert!(req.system_prompt.contains("1. What is our burn rate?"));
    assert!(!req.system_prompt.contains("2. Should we hire now?"));
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() {
    let client = StubClient::replying(&structured_reply());
    let state = state_with(client, true);

    let _ = post_json(state.clone(), json!({"question": "Ping?"})).await;
    let _ = post_json(state.clone(), json!({})).await;

    let resp = router(state.clone())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    let metrics: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(metrics["total_requests"], 2);
    assert_eq!(metrics["errors_total"], 1);
}

#[tokio::test]
async fn info_lists_prompt_templates() {
    let client = StubClient::replying(&structured_reply());
    let resp = router(state_with(client, true))
        .oneshot(Request::builder().uri("/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    let info: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(info["model"]["provider"], "stub");
    assert_eq!(info["prompts"].as_array().unwrap().len(), 6);
    assert_eq!(info["prompts"][4]["analysis_type"], "risk-focused");
}
