//! Transport shell for the DinnerCam conversation engine.
//!
//! Talks to the remote cooking-assistant service over HTTP: one chunked
//! event stream per turn, a best-effort persisted conversation store, and
//! the rate-limit status service. The engine itself lives in
//! `dinnercam-core`.

pub mod api;
pub mod auth;
pub mod controller;
pub mod error;
pub mod persist;
pub mod rate_limit;
pub mod transport;

pub use api::ApiClient;
pub use auth::{BearerTokenSigner, NoopSigner, RequestSigner};
pub use controller::{ChatController, TurnOptions};
pub use error::ClientError;
pub use persist::RemoteConversationSink;
pub use rate_limit::{RateLimitMonitor, RateLimitSource, RateLimitStatus};
pub use transport::{ChatTransport, ChunkStream, TransportError, TurnRequest};
