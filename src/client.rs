use crate::session::Turn;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Duration;

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<Turn>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            message: message.into(),
            history,
        }
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    /// Transport failure: connection refused, timeout, reset.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-2xx status.
    #[error("backend returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// Backend answered 2xx but the body was not JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Sends one chat request and yields the raw JSON reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<Value, ChatError>;
}

/// reqwest-backed transport for a `/chat` backend
#[derive(Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    chat_url: String,
}

impl HttpChatClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))?;

        Ok(Self {
            client,
            chat_url: chat_url(endpoint),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

fn chat_url(endpoint: &str) -> String {
    format!("{}/chat", endpoint.trim_end_matches('/'))
}

/// Pull the FastAPI-style `{"detail": "..."}` message out of an error body,
/// falling back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<Value, ChatError> {
        tracing::debug!(
            url = %self.chat_url,
            history = request.history.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&self.chat_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status,
                detail: error_detail(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))
    }
}
