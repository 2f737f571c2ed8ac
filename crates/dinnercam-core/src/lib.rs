//! Streaming conversation engine for the DinnerCam cooking assistant.
//!
//! Decodes a chunked event stream into typed events, applies them to a
//! durable ordered transcript, and coordinates the session-level side
//! state (recipe, nutrition, ingredient confirmation, progress text).
//! Transport lives in `dinnercam-client`; this crate never touches the
//! network.

pub mod confirm;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod ids;
pub mod message;
pub mod session;
pub mod store;
pub mod timeout;

pub use decoder::LineDecoder;
pub use error::{EngineError, PersistError};
pub use events::{IntentSummary, StreamEvent};
pub use message::{
    Macronutrients, Message, MessagePatch, NutritionScore, NutritionSummary, Role, StepImage,
    Suggestion,
};
pub use session::{PendingConfirmation, SessionState};
pub use store::{ConversationSink, MessageStore};
pub use timeout::{ProgressiveTimeout, TimeoutPreset, TimeoutStage};
