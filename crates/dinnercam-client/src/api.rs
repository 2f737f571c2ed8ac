//! Authenticated HTTP/JSON API client.
//!
//! Wraps the remote cooking-assistant service: the streaming chat endpoint,
//! the persisted conversation store, and the rate-limit status service.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use dinnercam_core::Message;

use crate::auth::RequestSigner;
use crate::error::ClientError;
use crate::rate_limit::{RateLimitSource, RateLimitStatus};
use crate::transport::{ChatTransport, ChunkStream, TransportError, TurnRequest};

/// Body of a 429 rejection: `{"detail": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct RateLimitRejection {
    detail: RateLimitDetail,
}

#[derive(Debug, Deserialize)]
struct RateLimitDetail {
    message: String,
}

/// `GET /conversations/messages` response.
#[derive(Debug, Default, Deserialize)]
pub struct StoredConversation {
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub messages: Vec<Message>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    signer: Arc<dyn RequestSigner>,
}

impl ApiClient {
    pub fn new(base_url: &str, signer: Arc<dyn RequestSigner>) -> Result<Self, ClientError> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&normalized)?,
            signer,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn fetch_messages(&self) -> Result<Vec<Message>, ClientError> {
        let url = self.endpoint("conversations/messages")?;
        let response = self.signer.sign(self.http.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Api(format!(
                "loading conversation failed: {}",
                response.status()
            )));
        }
        let stored: StoredConversation = response.json().await?;
        tracing::debug!("restored {} persisted messages", stored.message_count);
        Ok(stored.messages)
    }

    pub async fn save_message(&self, message: &Message) -> Result<(), ClientError> {
        let url = self.endpoint("conversations/messages")?;
        let response = self
            .signer
            .sign(self.http.post(url).json(&json!({ "message": message })))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Api(format!(
                "saving message failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    pub async fn clear_messages(&self) -> Result<(), ClientError> {
        let url = self.endpoint("conversations/messages")?;
        let response = self.signer.sign(self.http.delete(url)).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Api(format!(
                "clearing conversation failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    pub async fn fetch_rate_limits(&self) -> Result<RateLimitStatus, ClientError> {
        let url = self.endpoint("rate-limits")?;
        let response = self.signer.sign(self.http.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Api(format!(
                "rate limit status failed: {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn open_turn(&self, request: &TurnRequest) -> Result<ChunkStream, TransportError> {
        let url = self
            .endpoint("chat/v2")
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let response = self
            .signer
            .sign(self.http.post(url).json(request))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        // A rate-limit rejection arrives before any stream bytes and must
        // stay distinguishable from a mid-stream failure.
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let message = match response.json::<RateLimitRejection>().await {
                Ok(rejection) => rejection.detail.message,
                Err(_) => "You've hit the usage limit. Please try again later. ⏰".to_string(),
            };
            return Err(TransportError::RateLimited { message });
        }
        if !response.status().is_success() {
            return Err(TransportError::Network(format!(
                "chat request failed: {}",
                response.status()
            )));
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Network(e.to_string())));
        Ok(Box::pin(chunks))
    }
}

#[async_trait]
impl RateLimitSource for ApiClient {
    async fn fetch(&self) -> Result<RateLimitStatus, ClientError> {
        self.fetch_rate_limits().await
    }
}
