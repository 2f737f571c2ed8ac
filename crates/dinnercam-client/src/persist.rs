//! Remote conversation persistence.

use std::sync::Arc;

use async_trait::async_trait;

use dinnercam_core::{ConversationSink, Message, PersistError};

use crate::api::ApiClient;

/// Saves messages to the remote conversation store, best effort. The
/// in-memory transcript never waits on (or rolls back for) these calls.
pub struct RemoteConversationSink {
    api: Arc<ApiClient>,
}

impl RemoteConversationSink {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ConversationSink for RemoteConversationSink {
    async fn save(&self, message: Message) -> Result<(), PersistError> {
        self.api
            .save_message(&message)
            .await
            .map_err(|e| PersistError(e.to_string()))
    }
}
