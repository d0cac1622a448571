//! Error types for the toolkit
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Toolkit Error Enum ==
/// Errors raised while constructing toolkit components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolkitError {
    /// A constructor received parameters it cannot work with
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Task Error Enum ==
/// Outcome of a queued task that did not produce a value.
///
/// Only the task that failed sees this error; its siblings and the queue
/// itself keep running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError<E> {
    /// The task ran and returned its own error
    #[error("Task failed: {0}")]
    Failed(E),

    /// The task was cleared from the queue before it started, or was
    /// aborted before producing a result
    #[error("Task discarded before completion")]
    Discarded,
}

impl<E> TaskError<E> {
    /// Returns the task's own error, if it ran and failed.
    pub fn into_failure(self) -> Option<E> {
        match self {
            TaskError::Failed(err) => Some(err),
            TaskError::Discarded => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the toolkit.
pub type Result<T> = std::result::Result<T, ToolkitError>;
