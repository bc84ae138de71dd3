use crate::machine::{Action, State};

pub type LomoResult<T> = Result<T, LomoError>;

#[derive(thiserror::Error, Debug)]
pub enum LomoError {
    /// The caller's view of the store is stale. Recoverable by re-reading the
    /// current state and retrying.
    #[error("state mismatch: expected '{expected}', found '{found}'")]
    StateMismatch { expected: State, found: State },

    /// No row in the transition table for this (state, action) pair.
    #[error("invalid transition: no transition from '{state}' with action '{action}'")]
    InvalidTransition { state: State, action: Action },

    /// An operation needed a loaded surface and none was available.
    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LomoError {
    pub fn surface_unavailable(msg: impl Into<String>) -> Self {
        Self::SurfaceUnavailable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
