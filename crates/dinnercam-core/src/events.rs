//! Typed events decoded from the chat stream.
//!
//! One event per `data: <json>` line, payload `{"type": ..., "content": ...}`.
//! Unknown kinds become [`StreamEvent::Unrecognized`] so new server event
//! types never break an older client.

use serde::Deserialize;
use serde_json::Value;

use crate::message::{NutritionSummary, StepImage, Suggestion};

/// Frame prefix for event lines on the wire.
const DATA_PREFIX: &str = "data: ";

// ---------- Payloads ----------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntentSummary {
    pub intent: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    content: Value,
}

#[derive(Debug, Deserialize)]
struct StepRef {
    step_index: usize,
    #[serde(default)]
    step_text: String,
}

// ---------- StreamEvent ----------

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Status(String),
    Intent(IntentSummary),
    ChatResponse(String),
    Recipe(String),
    Nutrition(NutritionSummary),
    GeneratingImage { step_index: usize },
    Image(StepImage),
    ImageError { step_index: usize, step_text: String },
    Suggestion(Suggestion),
    Complete,
    Error { message: String },
    Unrecognized { event_type: String, content: Value },
}

impl StreamEvent {
    /// Parse one decoded line into a typed event.
    ///
    /// Lines without the frame prefix (blank separators, comments) are not
    /// events and yield `None`. A payload that fails to parse as JSON is
    /// logged and dropped; it never aborts the stream.
    pub fn parse_frame(line: &str) -> Option<StreamEvent> {
        let payload = line.strip_prefix(DATA_PREFIX).or_else(|| {
            // Tolerate a missing space after the colon.
            line.strip_prefix("data:")
        })?;
        let payload = payload.trim();
        if payload.is_empty() {
            return None;
        }

        let frame: WireFrame = match serde_json::from_str(payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("dropping malformed event frame: {e}");
                return None;
            }
        };
        Some(Self::from_wire(frame.event_type, frame.content))
    }

    fn from_wire(event_type: String, content: Value) -> StreamEvent {
        match Self::decode_known(&event_type, content) {
            Ok(event) => event,
            // Unknown kind, or a known kind whose payload did not match its
            // shape. Either way a safe no-op downstream.
            Err(content) => StreamEvent::Unrecognized {
                event_type,
                content,
            },
        }
    }

    /// Decode a known event kind; hands `content` back for anything that
    /// has to fall through to `Unrecognized`.
    fn decode_known(event_type: &str, content: Value) -> Result<StreamEvent, Value> {
        Ok(match event_type {
            "status" => StreamEvent::Status(as_text(&content)),
            "chat_response" => StreamEvent::ChatResponse(as_text(&content)),
            "recipe" => StreamEvent::Recipe(as_text(&content)),
            "complete" => StreamEvent::Complete,
            "intent" => match decode::<IntentSummary>(event_type, &content) {
                Some(intent) => StreamEvent::Intent(intent),
                None => return Err(content),
            },
            "nutrition" => match decode::<NutritionSummary>(event_type, &content) {
                Some(nutrition) => StreamEvent::Nutrition(nutrition),
                None => return Err(content),
            },
            "generating_image" => match decode::<StepRef>(event_type, &content) {
                Some(step) => StreamEvent::GeneratingImage {
                    step_index: step.step_index,
                },
                None => return Err(content),
            },
            "image" => match decode::<StepImage>(event_type, &content) {
                Some(image) => StreamEvent::Image(image),
                None => return Err(content),
            },
            "image_error" => match decode::<StepRef>(event_type, &content) {
                Some(step) => StreamEvent::ImageError {
                    step_index: step.step_index,
                    step_text: step.step_text,
                },
                None => return Err(content),
            },
            "suggestion" => match decode::<Suggestion>(event_type, &content) {
                Some(suggestion) => StreamEvent::Suggestion(suggestion),
                None => return Err(content),
            },
            "error" => {
                let message = content
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| as_text(&content));
                StreamEvent::Error { message }
            }
            _ => return Err(content),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Status(_) => "status",
            StreamEvent::Intent(_) => "intent",
            StreamEvent::ChatResponse(_) => "chat_response",
            StreamEvent::Recipe(_) => "recipe",
            StreamEvent::Nutrition(_) => "nutrition",
            StreamEvent::GeneratingImage { .. } => "generating_image",
            StreamEvent::Image(_) => "image",
            StreamEvent::ImageError { .. } => "image_error",
            StreamEvent::Suggestion(_) => "suggestion",
            StreamEvent::Complete => "complete",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Unrecognized { .. } => "unrecognized",
        }
    }
}

fn as_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(event_type: &str, content: &Value) -> Option<T> {
    match serde_json::from_value(content.clone()) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!("malformed {event_type} payload: {e}");
            None
        }
    }
}
