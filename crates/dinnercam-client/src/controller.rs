//! Stream session controller.
//!
//! Owns one in-flight turn at a time: opens the stream, drives the
//! read-parse-dispatch loop, and converts every terminal condition
//! (completion, cancellation, transport failure, rate-limit rejection)
//! into final message state.

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use dinnercam_core::dispatch;
use dinnercam_core::timeout::{ProgressiveTimeout, TimeoutPreset};
use dinnercam_core::{
    ConversationSink, LineDecoder, Message, MessagePatch, MessageStore, SessionState, StreamEvent,
};

use crate::error::ClientError;
use crate::rate_limit::RateLimitMonitor;
use crate::transport::{ChatTransport, TransportError, TurnRequest};

pub const PLACEHOLDER_TEXT: &str = "Working on it... 🔄";
pub const STOPPED_TEXT: &str = "Stopped generating. Anything else I can help with?";
pub const FAILED_TEXT: &str = "Something went wrong. Please try again. 🙏";

/// Per-session toggles sent with every turn.
#[derive(Debug, Clone)]
pub struct TurnOptions {
    pub with_images: bool,
    pub with_nutrition: bool,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            with_images: false,
            with_nutrition: true,
        }
    }
}

enum TurnOutcome {
    Completed,
    Cancelled,
    Failed,
    RateLimited(String),
}

struct Conversation {
    session: SessionState,
    store: MessageStore,
    options: TurnOptions,
}

struct ControllerInner {
    transport: Arc<dyn ChatTransport>,
    rate_limits: Arc<RateLimitMonitor>,
    state: Mutex<Conversation>,
    timeout: Mutex<Option<ProgressiveTimeout>>,
    display_name: String,
}

/// Cheaply cloneable handle; clones share the same conversation.
pub struct ChatController {
    inner: Arc<ControllerInner>,
}

impl Clone for ChatController {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl ChatController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        rate_limits: Arc<RateLimitMonitor>,
        sink: Option<Arc<dyn ConversationSink>>,
        display_name: impl Into<String>,
    ) -> Self {
        let store = match sink {
            Some(sink) => MessageStore::with_sink(sink),
            None => MessageStore::new(),
        };
        Self {
            inner: Arc::new(ControllerInner {
                transport,
                rate_limits,
                state: Mutex::new(Conversation {
                    session: SessionState::default(),
                    store,
                    options: TurnOptions::default(),
                }),
                timeout: Mutex::new(None),
                display_name: display_name.into(),
            }),
        }
    }

    // ---------- Conversation lifecycle ----------

    /// Feed the result of loading the persisted conversation. A load
    /// failure falls back to an empty conversation so the welcome flow
    /// still runs.
    pub fn restore_conversation(&self, fetched: Result<Vec<Message>, ClientError>) {
        let snapshot = match fetched {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("conversation restore failed, starting empty: {e}");
                Vec::new()
            }
        };
        let mut state = self.lock();
        state.store.restore(snapshot, &self.inner.display_name);
    }

    /// Empty the transcript and reset synchronization state; the next load
    /// runs a fresh restore. Cancels any in-flight stream first.
    pub fn clear_conversation(&self) {
        let mut state = self.lock();
        if let Some(cancel) = &state.session.cancel {
            cancel.cancel();
        }
        state.session = SessionState::default();
        state.store.clear();
    }

    /// Append a message outside the streaming path (user uploads, analysis
    /// progress notices). Returns the assigned id.
    pub fn append_message(&self, message: Message) -> String {
        self.lock().store.append(message)
    }

    // ---------- Turns ----------

    /// Submit one free-text turn and drive its stream to completion.
    pub async fn send_message(&self, text: &str) -> Result<(), ClientError> {
        let (request, active_id, cancel) = {
            let mut state = self.lock();
            if !state.store.is_synced() {
                return Err(ClientError::NotSynced);
            }
            if state.session.is_confirmation_pending() {
                return Err(ClientError::ConfirmationPending);
            }
            if state.session.is_streaming() {
                return Err(ClientError::TurnInProgress);
            }

            state.store.append(Message::user(text));
            let active_id = state.store.append(Message::assistant(PLACEHOLDER_TEXT));
            state.session.active_turn_id = Some(active_id.clone());
            state.session.stream_status = "Working on it...".to_string();
            let cancel = CancellationToken::new();
            state.session.cancel = Some(cancel.clone());

            let request = TurnRequest {
                message: text.to_string(),
                has_image: false,
                with_images: state.options.with_images,
                with_nutrition: state.options.with_nutrition,
            };
            (request, active_id, cancel)
        };

        self.start_timeout(TimeoutPreset::interactive());
        let outcome = self.run_turn(&request, &cancel).await;
        self.stop_timeout();
        self.finish_turn(&active_id, outcome);
        self.inner.rate_limits.request_refresh();
        Ok(())
    }

    /// Request abort of the in-flight stream, if any. The decode loop
    /// observes the token at its next suspension point; events received
    /// afterwards are silently discarded.
    pub fn cancel(&self) {
        let state = self.lock();
        if let Some(cancel) = &state.session.cancel {
            cancel.cancel();
        }
    }

    async fn run_turn(&self, request: &TurnRequest, cancel: &CancellationToken) -> TurnOutcome {
        let opened = tokio::select! {
            _ = cancel.cancelled() => return TurnOutcome::Cancelled,
            opened = self.inner.transport.open_turn(request) => opened,
        };
        let mut chunks = match opened {
            Ok(chunks) => chunks,
            Err(TransportError::RateLimited { message }) => {
                return TurnOutcome::RateLimited(message);
            }
            Err(e) => {
                tracing::warn!("failed to open chat stream: {e}");
                return TurnOutcome::Failed;
            }
        };

        let mut decoder = LineDecoder::new();
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return TurnOutcome::Cancelled,
                chunk = chunks.next() => chunk,
            };
            let Some(chunk) = chunk else {
                return TurnOutcome::Completed;
            };
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("transport error mid-stream: {e}");
                    return TurnOutcome::Failed;
                }
            };

            let text = String::from_utf8_lossy(&bytes);
            let lines = match decoder.feed(&text) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::error!("{e}");
                    return TurnOutcome::Failed;
                }
            };
            for line in lines {
                if cancel.is_cancelled() {
                    return TurnOutcome::Cancelled;
                }
                let Some(event) = StreamEvent::parse_frame(&line) else {
                    continue;
                };
                if let StreamEvent::GeneratingImage { step_index } = &event {
                    // Image steps run long; switch to the slower schedule.
                    self.start_timeout(TimeoutPreset::image_generation(*step_index));
                }
                let mut state = self.lock();
                let Conversation { session, store, .. } = &mut *state;
                dispatch::apply_event(event, session, store);
            }
        }
    }

    fn finish_turn(&self, active_id: &str, outcome: TurnOutcome) {
        let mut state = self.lock();
        match outcome {
            TurnOutcome::Completed => {}
            TurnOutcome::Cancelled => {
                state
                    .store
                    .update(active_id, MessagePatch::content(STOPPED_TEXT));
            }
            TurnOutcome::Failed => {
                state
                    .store
                    .update(active_id, MessagePatch::content(FAILED_TEXT));
            }
            TurnOutcome::RateLimited(message) => {
                state
                    .store
                    .update(active_id, MessagePatch::content(message));
            }
        }
        state.session.end_turn();
    }

    // ---------- Ingredient confirmation sub-flow ----------

    /// Open the confirmation prompt for externally detected ingredients.
    /// While open, free-text turns are refused.
    pub fn open_ingredient_check(&self, candidates: Vec<String>, origin_message_id: &str) {
        let mut state = self.lock();
        let Conversation { session, store, .. } = &mut *state;
        session.open_ingredient_check(store, candidates, origin_message_id);
    }

    /// Confirm the selection and feed the synthesized follow-up turn into
    /// the normal flow, as if the user had typed it.
    pub async fn confirm_ingredients(&self, selected: &[String]) -> Result<(), ClientError> {
        let follow_up = {
            let mut state = self.lock();
            let Conversation { session, store, .. } = &mut *state;
            session.confirm_ingredients(store, selected)?
        };
        self.send_message(&follow_up).await
    }

    /// Close the confirmation prompt without starting a turn.
    pub fn reset_ingredient_check(&self) {
        let mut state = self.lock();
        let Conversation { session, store, .. } = &mut *state;
        session.reset_ingredient_check(store);
    }

    // ---------- Accessors ----------

    pub fn messages(&self) -> Vec<Message> {
        self.lock().store.messages().to_vec()
    }

    pub fn stream_status(&self) -> String {
        self.lock().session.stream_status.clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().session.is_streaming()
    }

    pub fn is_confirmation_pending(&self) -> bool {
        self.lock().session.is_confirmation_pending()
    }

    pub fn current_recipe(&self) -> Option<String> {
        self.lock().session.current_recipe.clone()
    }

    pub fn set_turn_options(&self, options: TurnOptions) {
        self.lock().options = options;
    }

    // ---------- Internals ----------

    fn lock(&self) -> std::sync::MutexGuard<'_, Conversation> {
        self.inner.state.lock().unwrap()
    }

    fn start_timeout(&self, preset: TimeoutPreset) {
        let weak = Arc::downgrade(&self.inner);
        let timeout = ProgressiveTimeout::start(preset, move |status| {
            if let Some(inner) = weak.upgrade() {
                inner.state.lock().unwrap().session.stream_status = status;
            }
        });
        if let Some(previous) = self.inner.timeout.lock().unwrap().replace(timeout) {
            previous.stop();
        }
    }

    fn stop_timeout(&self) {
        if let Some(timeout) = self.inner.timeout.lock().unwrap().take() {
            timeout.stop();
        }
    }
}
