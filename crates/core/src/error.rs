//! Error types for dotfield.

use thiserror::Error;

/// Errors produced by animation, sampling and routing operations.
#[derive(Debug, Error)]
pub enum AnimationError {
    /// No drawing surface could be obtained. Fatal, never retried.
    #[error("initialization failure: {0}")]
    InitializationFailure(String),

    /// A shape image could not be read, decoded, or arrived too late.
    #[error("failed to load asset '{source_id}': {reason}")]
    AssetLoadFailure { source_id: String, reason: String },

    /// Navigation to a path with no configured animation.
    #[error("no route found for \"{0}\"")]
    NoTargetRoute(String),

    /// An animation name was not recognized by the registry.
    #[error("unknown animation: {0}")]
    UnknownAnimation(String),

    /// Width or height was zero, or their product overflowed.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A params object or seed file was structurally wrong.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Simulation state that should be impossible (non-finite positions etc).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// File-system failure (snapshot writing, route table reading).
    #[error("i/o error: {0}")]
    Io(String),
}

impl AnimationError {
    /// Shorthand for building an [`AnimationError::AssetLoadFailure`].
    pub fn asset(source_id: impl Into<String>, reason: impl ToString) -> Self {
        AnimationError::AssetLoadFailure {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}
