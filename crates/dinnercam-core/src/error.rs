use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("line buffer exceeded maximum size of {max} bytes")]
    LineBufferOverflow { max: usize },

    #[error("cannot confirm an empty ingredient selection")]
    NoIngredientsSelected,

    #[error("no ingredient confirmation is open")]
    NoConfirmationPending,
}

/// Failure reported by a persistence collaborator. Persistence is best
/// effort: these are logged, never surfaced to the user.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PersistError(pub String);
