use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Engine(#[from] dinnercam_core::EngineError),

    #[error("a turn is already streaming")]
    TurnInProgress,

    #[error("ingredient confirmation is pending")]
    ConfirmationPending,

    #[error("conversation has not been loaded yet")]
    NotSynced,

    #[error("API error: {0}")]
    Api(String),
}
