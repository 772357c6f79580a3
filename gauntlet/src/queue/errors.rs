//! Queue error types.

use thiserror::Error;

use super::models::ParticipantId;

/// Queue errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("participant {0} is already queued")]
    AlreadyQueued(ParticipantId),

    #[error("fee pool overflow")]
    FeePoolOverflow,

    #[error("queue index inconsistent: {0}")]
    Inconsistent(String),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
