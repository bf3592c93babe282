//! Mock OpenAI-compatible backend for integration tests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub struct MockOpenAi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockOpenAiState>,
}

struct MockOpenAiState {
    /// Requests left to fail (`u32::MAX` fails forever)
    fail_remaining: AtomicU32,
    fail_status: StatusCode,
    models: Mutex<Vec<String>>,
    authorizations: Mutex<Vec<String>>,
}

impl MockOpenAi {
    /// Answer every request with text naming the requested model
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, StatusCode::OK).await
    }

    /// Fail every request with `status`
    pub async fn start_always_failing(status: StatusCode) -> anyhow::Result<Self> {
        Self::start_inner(u32::MAX, status).await
    }

    async fn start_inner(fail_count: u32, fail_status: StatusCode) -> anyhow::Result<Self> {
        let state = Arc::new(MockOpenAiState {
            fail_remaining: AtomicU32::new(fail_count),
            fail_status,
            models: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
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

    /// Base URL including `/v1`, since the adapter appends `chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.state.models.lock().unwrap().len()
    }

    /// Upstream model names requested, in order
    pub fn models(&self) -> Vec<String> {
        self.state.models.lock().unwrap().clone()
    }

    /// `Authorization` header values received, in order
    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().unwrap().clone()
    }
}

impl Drop for MockOpenAi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockOpenAiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let model = body["model"].as_str().unwrap_or_default().to_owned();
    state.models.lock().unwrap().push(model.clone());
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorizations.lock().unwrap().push(auth.to_owned());
    }

    let remaining = state.fail_remaining.load(Ordering::Relaxed);
    if remaining > 0 {
        if remaining != u32::MAX {
            state.fail_remaining.fetch_sub(1, Ordering::Relaxed);
        }
        return (
            state.fail_status,
            Json(json!({
                "error": {
                    "message": "mock server intentional failure",
                    "type": "server_error"
                }
            })),
        )
            .into_response();
    }

    Json(json!({
        "id": "chatcmpl-test-123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": format!("answer from {model}")},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}
