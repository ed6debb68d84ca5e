use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Remote service that answers health questions.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one user message and return the assistant's markdown reply.
    async fn send(&self, message: &str) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: Option<String>,
    error: Option<String>,
}

/// JSON-over-HTTP chat backend.
///
/// Wire format: `POST {"message": ...}` answered by `{"response": ...}` or
/// `{"error": ...}`. Requests carry no timeout and are never retried.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpChatBackend {
    pub fn new(endpoint: Url, auth_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            auth_token,
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let endpoint = config.require_chat_url()?.clone();
        Ok(Self::new(endpoint, config.chat_token.clone()))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request(&self, payload: &ChatRequest<'_>) -> AppResult<reqwest::RequestBuilder> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AppError::Config(format!("invalid chat token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .json(payload))
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn send(&self, message: &str) -> AppResult<String> {
        let res = self.build_request(&ChatRequest { message })?.send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!(
                "Chat request failed with status {}: {}",
                status, body
            )));
        }

        let reply: ChatReply = res.json().await?;
        if let Some(error) = reply.error {
            return Err(AppError::Backend(error));
        }

        let response = reply
            .response
            .ok_or_else(|| AppError::Backend("reply has no response field".to_string()))?;
        debug!(chars = response.len(), "Chat reply received");
        info!("Chat request completed");
        Ok(response)
    }
}
