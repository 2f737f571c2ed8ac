//! The narrow interface between the session controller and the network.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use thiserror::Error;

/// Request body for one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRequest {
    pub message: String,
    pub has_image: bool,
    pub with_images: bool,
    pub with_nutrition: bool,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The initiating response was a rate-limit rejection; no stream bytes
    /// were produced. Carries the server-supplied user-facing message.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("network error: {0}")]
    Network(String),
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Opens the event stream for one turn. Implemented over HTTP by
/// [`crate::api::ApiClient`] and by in-memory fakes in tests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_turn(&self, request: &TurnRequest) -> Result<ChunkStream, TransportError>;
}
