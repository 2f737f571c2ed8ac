//! Applies decoded stream events to the conversation.
//!
//! Exactly one message is active per turn and receives in-place updates;
//! `nutrition`, `image`, `image_error` and actionable `suggestion` events
//! always append a new message so every artifact keeps its own place in the
//! transcript. Arrival order is display order.

use crate::events::StreamEvent;
use crate::message::{Message, MessagePatch, StepImage};
use crate::session::SessionState;
use crate::store::MessageStore;

/// Suggestion sub-type the client acts on; everything else is ignored.
const ACTIONABLE_SUGGESTION: &str = "recipe_generation";

pub fn apply_event(event: StreamEvent, session: &mut SessionState, store: &mut MessageStore) {
    let Some(active_id) = session.active_turn_id.clone() else {
        tracing::warn!("dropping {} event with no active turn", event.kind());
        return;
    };

    match event {
        StreamEvent::Status(text) => {
            session.stream_status = text;
        }
        StreamEvent::Intent(intent) => {
            // Diagnostic scratch content, overwritten by later events.
            let pct = (intent.confidence * 100.0).round() as i64;
            store.update(
                &active_id,
                MessagePatch::content(format!(
                    "Intent: {} (confidence: {pct}%)",
                    intent.intent
                )),
            );
        }
        StreamEvent::ChatResponse(text) => {
            store.update(&active_id, MessagePatch::content(text));
        }
        StreamEvent::Recipe(markdown) => {
            session.current_recipe = Some(markdown.clone());
            store.update(
                &active_id,
                MessagePatch::content("Your recipe is ready! 🎉").with_recipe(markdown),
            );
        }
        StreamEvent::Nutrition(summary) => {
            session.current_nutrition = Some(summary.clone());
            store.append(
                Message::assistant("Nutrition analysis complete! 🥗").with_nutrition(summary),
            );
        }
        StreamEvent::GeneratingImage { step_index } => {
            session.stream_status =
                format!("Generating the image for step {}... 🖼️", step_index + 1);
        }
        StreamEvent::Image(step_image) => {
            let content = format!("Here's the image for step {}!", step_image.step_index + 1);
            store.append(Message::assistant(content).with_step_image(step_image));
        }
        StreamEvent::ImageError {
            step_index,
            step_text,
        } => {
            let content = format!(
                "⚠️ Couldn't generate the image for step {}: {step_text}",
                step_index + 1
            );
            store.append(Message::assistant(content).with_step_image(StepImage {
                step_index,
                step_text,
                image_url: String::new(),
                failed: true,
            }));
        }
        StreamEvent::Suggestion(suggestion) => {
            if suggestion.kind == ACTIONABLE_SUGGESTION {
                let content = format!("💡 {}", suggestion.message);
                store.append(Message::assistant(content).with_suggestion(suggestion));
            }
        }
        StreamEvent::Complete => {
            session.stream_status.clear();
        }
        StreamEvent::Error { message } => {
            store.update(
                &active_id,
                MessagePatch::content(format!("❌ Error: {message}")),
            );
        }
        StreamEvent::Unrecognized { event_type, .. } => {
            tracing::debug!("ignoring unrecognized event type: {event_type}");
        }
    }
}
