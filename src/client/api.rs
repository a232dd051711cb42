use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::dto::{AuthResponse, LoginRequest, SignupRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service answered with a non-2xx status.
    #[error("request rejected with status {status}: {}", .messages.join("; "))]
    Rejected { status: u16, messages: Vec<String> },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn mentions(&self, needle: &str) -> bool {
        match self {
            ClientError::Rejected { messages, .. } => messages
                .iter()
                .any(|m| m.to_lowercase().contains(&needle.to_lowercase())),
            ClientError::Transport(_) => false,
        }
    }
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, ClientError>;
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError>;
}

#[derive(Clone)]
pub struct HttpAuthApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.http.post(&url).json(body).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.json::<Value>().await.unwrap_or(Value::Null);
            let messages = error_messages(&body);
            debug!(%url, %status, ?messages, "auth request rejected");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                messages,
            });
        }
        Ok(res.json::<AuthResponse>().await?)
    }
}

impl Default for HttpAuthApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, ClientError> {
        self.post("/api/auth/signup", req).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.post("/api/auth/login", req).await
    }
}

/// Pulls human-readable messages out of `{errors: [...]}`, `{errors: "..."}` or `{error: "..."}`.
fn error_messages(body: &Value) -> Vec<String> {
    match (body.get("errors"), body.get("error")) {
        (Some(Value::Array(items)), _) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => other.get("msg").and_then(Value::as_str).map(str::to_owned),
            })
            .collect(),
        (Some(Value::String(s)), _) | (_, Some(Value::String(s))) => vec![s.clone()],
        _ => Vec::new(),
    }
}
