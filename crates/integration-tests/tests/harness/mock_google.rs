//! Mock Google Generative Language backend for integration tests
//!
//! Serves `models/{model}:generateContent`, records every request and can
//! be told to fail its first requests or to answer with a tool call.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Model turn returned when the mock asks for a tool
pub fn tool_call_content() -> Value {
    json!({
        "role": "model",
        "parts": [{
            "functionCall": {"name": "get_user_trips", "args": {"status": "upcoming"}},
            "thoughtSignature": "c2lnbmF0dXJlLW9wYXF1ZQ=="
        }]
    })
}

/// What a successful request answers with
#[derive(Debug, Clone)]
pub enum Script {
    /// Plain text naming the model that answered
    Echo,
    /// Fixed text
    Text(String),
    /// A tool call first, then text once a function response comes back
    ToolThenText(String),
}

/// One request as the mock saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub model: String,
    pub key: Option<String>,
    pub body: Value,
}

pub struct MockGoogle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockGoogleState>,
}

struct MockGoogleState {
    script: Script,
    /// Requests left to fail (`u32::MAX` fails forever)
    fail_remaining: AtomicU32,
    fail_status: StatusCode,
    requests: Mutex<Vec<Recorded>>,
}

impl MockGoogle {
    pub async fn start(script: Script) -> anyhow::Result<Self> {
        Self::start_inner(script, 0, StatusCode::OK).await
    }

    /// Fail the first `n` requests with `status`
    pub async fn start_failing(n: u32, status: StatusCode, script: Script) -> anyhow::Result<Self> {
        Self::start_inner(script, n, status).await
    }

    /// Fail every request with `status`
    pub async fn start_always_failing(status: StatusCode) -> anyhow::Result<Self> {
        Self::start_inner(Script::Echo, u32::MAX, status).await
    }

    async fn start_inner(script: Script, fail_count: u32, fail_status: StatusCode) -> anyhow::Result<Self> {
        let state = Arc::new(MockGoogleState {
            script,
            fail_remaining: AtomicU32::new(fail_count),
            fail_status,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1beta/models/{action}", routing::post(handle_generate))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including the API version path
    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Upstream model names requested, in order
    pub fn models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }
}

impl Drop for MockGoogle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_generate(
    State(state): State<Arc<MockGoogleState>>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let model = action.trim_end_matches(":generateContent").to_owned();
    state.requests.lock().unwrap().push(Recorded {
        model: model.clone(),
        key: query.get("key").cloned(),
        body: body.clone(),
    });

    let remaining = state.fail_remaining.load(Ordering::Relaxed);
    if remaining > 0 {
        if remaining != u32::MAX {
            state.fail_remaining.fetch_sub(1, Ordering::Relaxed);
        }
        let status = state.fail_status;
        let marker = if status == StatusCode::TOO_MANY_REQUESTS { "RESOURCE_EXHAUSTED" } else { "INVALID_ARGUMENT" };
        return (
            status,
            Json(json!({
                "error": {
                    "code": status.as_u16(),
                    "message": "mock server intentional failure",
                    "status": marker
                }
            })),
        )
            .into_response();
    }

    let has_function_response = body["contents"]
        .as_array()
        .is_some_and(|contents| {
            contents.iter().any(|content| {
                content["parts"]
                    .as_array()
                    .is_some_and(|parts| parts.iter().any(|part| part.get("functionResponse").is_some()))
            })
        });

    let content = match &state.script {
        Script::Echo => text_content(&format!("answer from {model}")),
        Script::Text(text) => text_content(text),
        Script::ToolThenText(_) if !has_function_response => tool_call_content(),
        Script::ToolThenText(text) => text_content(text),
    };

    Json(json!({
        "candidates": [{"content": content, "finishReason": "STOP"}],
        "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
    }))
    .into_response()
}

fn text_content(text: &str) -> Value {
    json!({"role": "model", "parts": [{"text": text}]})
}
