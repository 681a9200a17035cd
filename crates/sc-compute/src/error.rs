use crate::protocol::ProtocolError;
use std::time::Duration;
use thiserror::Error;

/// Why a background task did not produce a primary result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task timed out after {0:?}")]
    Timeout(Duration),
    #[error("background worker is unavailable")]
    Unavailable,
    #[error("worker reported an error: {0}")]
    Worker(String),
    #[error("worker fault: {0}")]
    Fault(String),
    #[error("could not decode task result: {0}")]
    Decode(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("bridge was disposed")]
    Disposed,
}

impl TaskError {
    /// Errors that take the whole bridge down rather than one task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Unavailable | TaskError::Fault(_) | TaskError::Disposed)
    }
}
