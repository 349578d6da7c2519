use std::str::FromStr;

use thiserror::Error;

/// Boxed error used at the collaborator seams (queue client and handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for SQS consumer operations.
///
/// Configuration errors are raised while building a
/// consumer. Handler and queue operation errors are caught per message or per
/// batch and handed to the error callbacks of the
/// [`MessageHandler`](crate::handler::MessageHandler). Receive and callback
/// errors end the consumer loop.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The consumer configuration is invalid.
    #[error("invalid consumer configuration: {0}")]
    Configuration(String),

    /// Receiving from the queue failed. This stops the loop.
    #[error("failed to receive messages: {0}")]
    Receive(#[source] BoxError),

    /// The user handler returned an error.
    #[error("message handler failed: {0}")]
    Handler(#[source] BoxError),

    /// The user handler panicked.
    #[error("message handler panicked: {0}")]
    HandlerPanicked(String),

    /// The queue rejected the acknowledgment of processed messages.
    #[error(transparent)]
    QueueOperation(#[from] QueueOperationError),

    /// An error callback itself failed. This stops the loop.
    #[error("error callback failed: {0}")]
    Callback(#[source] BoxError),

    #[error("consumer is already running")]
    AlreadyRunning,

    /// The background worker did not finish normally.
    #[error("consumer worker terminated abnormally: {0}")]
    Worker(String),
}

/// Failures of delete operations issued after successful processing.
#[derive(Debug, Error)]
pub enum QueueOperationError {
    #[error("failed to delete message {message_id}: {source}")]
    Delete {
        message_id: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to delete message batch of {size}: {source}")]
    DeleteBatch {
        size: usize,
        #[source]
        source: BoxError,
    },

    /// The batch request went through but some entries were rejected.
    #[error("failed to delete {} of {size} messages in batch", failed.len())]
    PartialBatchDelete {
        size: usize,
        failed: Vec<BatchDeleteFailure>,
    },
}

/// One rejected entry of a batch delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeleteFailure {
    /// The entry id, which is the message id of the rejected message.
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    /// Whether the caller (rather than the service) is at fault.
    pub sender_fault: bool,
}

/// Generic error type handlers can return for ad hoc failures.
#[derive(Debug, Error)]
pub struct GenericError(String);

impl GenericError {
    /// Creates a new `GenericError` with the provided message.
    pub fn new(message: impl Into<String>) -> Self {
        GenericError(message.into())
    }
}

impl std::fmt::Display for GenericError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenericError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(GenericError::new(s))
    }
}

impl From<String> for GenericError {
    fn from(s: String) -> Self {
        GenericError::new(s)
    }
}

impl From<&str> for GenericError {
    fn from(s: &str) -> Self {
        GenericError::new(s)
    }
}
