//! The transport seam between the consumer loop and the remote queue.

use async_trait::async_trait;

use crate::errors::{BatchDeleteFailure, BoxError};
use crate::message::Message;

/// Parameters of a single receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    pub queue_url: String,
    /// System attribute names to return with each message.
    pub attribute_names: Vec<String>,
    /// User defined message attribute names to return with each message.
    pub message_attribute_names: Vec<String>,
    /// Between 1 and 10.
    pub max_number_of_messages: i32,
    /// Long polling wait time.
    pub wait_time_seconds: i32,
    /// Overrides the queue's visibility timeout for the received messages.
    pub visibility_timeout_seconds: Option<i32>,
}

/// One entry of a batch delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBatchEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl From<&Message> for DeleteBatchEntry {
    fn from(message: &Message) -> Self {
        DeleteBatchEntry {
            id: message.message_id.clone(),
            receipt_handle: message.receipt_handle.clone(),
        }
    }
}

/// Per-entry result of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteOutcome {
    /// Ids of the deleted entries.
    pub successful: Vec<String>,
    pub failed: Vec<BatchDeleteFailure>,
}

impl BatchDeleteOutcome {
    /// An outcome where every entry was deleted.
    pub fn all_successful(entries: &[DeleteBatchEntry]) -> Self {
        BatchDeleteOutcome {
            successful: entries.iter().map(|e| e.id.clone()).collect(),
            failed: Vec::new(),
        }
    }
}

/// Queue operations the consumer needs.
///
/// Implemented for [`aws_sdk_sqs::Client`]; other implementations can be used
/// for testing or for SQS compatible transports.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Receives up to `request.max_number_of_messages` messages. An empty
    /// vector means the long poll timed out.
    async fn receive(&self, request: &ReceiveRequest) -> Result<Vec<Message>, BoxError>;

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BoxError>;

    /// Deletes all entries in one request. An `Err` means the request itself
    /// failed; rejected entries are reported in the outcome.
    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: &[DeleteBatchEntry],
    ) -> Result<BatchDeleteOutcome, BoxError>;
}

#[async_trait]
impl<T> QueueClient for std::sync::Arc<T>
where
    T: QueueClient + ?Sized,
{
    async fn receive(&self, request: &ReceiveRequest) -> Result<Vec<Message>, BoxError> {
        (**self).receive(request).await
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BoxError> {
        (**self).delete(queue_url, receipt_handle).await
    }

    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: &[DeleteBatchEntry],
    ) -> Result<BatchDeleteOutcome, BoxError> {
        (**self).delete_batch(queue_url, entries).await
    }
}
