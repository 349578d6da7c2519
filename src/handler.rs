use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::errors::{BoxError, ConsumerError};
use crate::message::Message;

/// User logic invoked by the consumer.
///
/// With a batch size of 1 the consumer calls [`handle_message`] for every
/// received message, otherwise it calls [`handle_message_batch`] once per
/// receive. A message (or batch) is deleted only after the handler returns
/// `Ok`.
///
/// Failures, including a failed delete, are passed to [`on_message_error`] /
/// [`on_batch_error`]. The default implementations log the error and let the
/// consumer continue. Returning `Err` from a callback stops the consumer.
///
/// [`handle_message`]: MessageHandler::handle_message
/// [`handle_message_batch`]: MessageHandler::handle_message_batch
/// [`on_message_error`]: MessageHandler::on_message_error
/// [`on_batch_error`]: MessageHandler::on_batch_error
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use sqs_consumer::{errors::BoxError, handler::MessageHandler, message::Message};
///
/// struct PrintHandler;
///
/// #[async_trait]
/// impl MessageHandler for PrintHandler {
///     async fn handle_message(&self, message: &Message) -> Result<(), BoxError> {
///         println!("received {}", message.body);
///         Ok(())
///     }
///
///     async fn handle_message_batch(&self, messages: &[Message]) -> Result<(), BoxError> {
///         println!("received {} messages", messages.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Called for each message when the batch size is 1.
    async fn handle_message(&self, message: &Message) -> Result<(), BoxError>;

    /// Called with every received message when the batch size is greater than 1.
    async fn handle_message_batch(&self, messages: &[Message]) -> Result<(), BoxError>;

    /// Called when handling or deleting a single message failed.
    async fn on_message_error(
        &self,
        message: &Message,
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        error!(
            message_id = %message.message_id,
            error = %error,
            "failed to process message"
        );
        Ok(())
    }

    /// Called when handling or deleting a message batch failed.
    async fn on_batch_error(
        &self,
        messages: &[Message],
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        error!(
            batch_size = messages.len(),
            error = %error,
            "failed to process message batch"
        );
        Ok(())
    }
}

#[async_trait]
impl<T> MessageHandler for Arc<T>
where
    T: MessageHandler + ?Sized,
{
    async fn handle_message(&self, message: &Message) -> Result<(), BoxError> {
        (**self).handle_message(message).await
    }

    async fn handle_message_batch(&self, messages: &[Message]) -> Result<(), BoxError> {
        (**self).handle_message_batch(messages).await
    }

    async fn on_message_error(
        &self,
        message: &Message,
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        (**self).on_message_error(message, error).await
    }

    async fn on_batch_error(
        &self,
        messages: &[Message],
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        (**self).on_batch_error(messages, error).await
    }
}

#[async_trait]
impl<T> MessageHandler for Box<T>
where
    T: MessageHandler + ?Sized,
{
    async fn handle_message(&self, message: &Message) -> Result<(), BoxError> {
        (**self).handle_message(message).await
    }

    async fn handle_message_batch(&self, messages: &[Message]) -> Result<(), BoxError> {
        (**self).handle_message_batch(messages).await
    }

    async fn on_message_error(
        &self,
        message: &Message,
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        (**self).on_message_error(message, error).await
    }

    async fn on_batch_error(
        &self,
        messages: &[Message],
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        (**self).on_batch_error(messages, error).await
    }
}
