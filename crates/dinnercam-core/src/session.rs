//! Per-conversation state outside the message list.

use tokio_util::sync::CancellationToken;

use crate::message::NutritionSummary;

/// Ingredient-confirmation sub-flow state. Present only while the
/// confirmation prompt is open; its presence gates free-text turns.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub candidates: Vec<String>,
    pub origin_message_id: String,
}

#[derive(Debug, Default)]
pub struct SessionState {
    /// Transient progress text, empty when nothing is streaming.
    pub stream_status: String,
    /// Id of the message receiving in-place updates for the open turn.
    pub active_turn_id: Option<String>,
    pub current_recipe: Option<String>,
    pub current_nutrition: Option<NutritionSummary>,
    pub pending_confirmation: Option<PendingConfirmation>,
    /// Abort handle for the in-flight stream; exists only while one is open.
    pub cancel: Option<CancellationToken>,
}

impl SessionState {
    pub fn is_streaming(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn is_confirmation_pending(&self) -> bool {
        self.pending_confirmation.is_some()
    }

    /// Reset everything tied to the open turn.
    pub fn end_turn(&mut self) {
        self.stream_status.clear();
        self.active_turn_id = None;
        self.cancel = None;
    }
}
