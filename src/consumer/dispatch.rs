//! Hands received messages to the handler and acknowledges them.
//!
//! Deletion only follows a successful handler call. Every failure of one unit
//! of work (a message, or a batch) ends up in the matching error callback, so
//! the loop keeps going. Only an error returned by a callback is propagated.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::errors::{BoxError, ConsumerError, QueueOperationError};
use crate::handler::MessageHandler;
use crate::message::Message;
use crate::queue::{DeleteBatchEntry, QueueClient};

pub(crate) async fn process_message<C, H>(
    client: &C,
    handler: &H,
    queue_url: &str,
    message: &Message,
) -> Result<(), ConsumerError>
where
    C: QueueClient + ?Sized,
    H: MessageHandler + ?Sized,
{
    let outcome = match isolate(handler.handle_message(message)).await {
        Ok(()) => delete_message(client, queue_url, message).await,
        Err(e) => Err(e),
    };

    if let Err(error) = outcome {
        handler
            .on_message_error(message, error)
            .await
            .map_err(ConsumerError::Callback)?;
    }
    Ok(())
}

pub(crate) async fn process_message_batch<C, H>(
    client: &C,
    handler: &H,
    queue_url: &str,
    messages: &[Message],
) -> Result<(), ConsumerError>
where
    C: QueueClient + ?Sized,
    H: MessageHandler + ?Sized,
{
    let outcome = match isolate(handler.handle_message_batch(messages)).await {
        Ok(()) => delete_message_batch(client, queue_url, messages).await,
        Err(e) => Err(e),
    };

    if let Err(error) = outcome {
        handler
            .on_batch_error(messages, error)
            .await
            .map_err(ConsumerError::Callback)?;
    }
    Ok(())
}

async fn delete_message<C>(
    client: &C,
    queue_url: &str,
    message: &Message,
) -> Result<(), ConsumerError>
where
    C: QueueClient + ?Sized,
{
    client
        .delete(queue_url, &message.receipt_handle)
        .await
        .map_err(|source| QueueOperationError::Delete {
            message_id: message.message_id.clone(),
            source,
        })?;
    debug!(message_id = %message.message_id, "deleted message");
    Ok(())
}

async fn delete_message_batch<C>(
    client: &C,
    queue_url: &str,
    messages: &[Message],
) -> Result<(), ConsumerError>
where
    C: QueueClient + ?Sized,
{
    let size = messages.len();
    let entries: Vec<DeleteBatchEntry> = messages.iter().map(DeleteBatchEntry::from).collect();

    let outcome = client
        .delete_batch(queue_url, &entries)
        .await
        .map_err(|source| QueueOperationError::DeleteBatch { size, source })?;

    if !outcome.failed.is_empty() {
        warn!(
            successful = outcome.successful.len(),
            failed = outcome.failed.len(),
            "partial batch delete failure"
        );
        return Err(QueueOperationError::PartialBatchDelete {
            size,
            failed: outcome.failed,
        }
        .into());
    }

    debug!(batch_size = size, "deleted message batch");
    Ok(())
}

/// Runs a handler future, turning both returned errors and panics into
/// [`ConsumerError`]s.
async fn isolate<F>(handler_call: F) -> Result<(), ConsumerError>
where
    F: Future<Output = Result<(), BoxError>>,
{
    match AssertUnwindSafe(handler_call).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ConsumerError::Handler(e)),
        Err(payload) => Err(ConsumerError::HandlerPanicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
