use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, MessageSystemAttributeName};
use tracing::{debug, warn};

use crate::errors::{BatchDeleteFailure, BoxError, ConsumerError};
use crate::message::Message;
use crate::queue::{BatchDeleteOutcome, DeleteBatchEntry, QueueClient, ReceiveRequest};

/// Creates an AWS SQS client using credentials and configuration from the environment.
///
/// This function loads AWS configuration from environment variables such as:
/// - `AWS_ACCESS_KEY_ID`
/// - `AWS_SECRET_ACCESS_KEY`
/// - `AWS_REGION`
/// - `AWS_PROFILE`
///
/// # Example
///
/// ```rust,no_run
/// use sqs_consumer::client::create_sqs_client_from_env;
///
/// #[tokio::main]
/// async fn main() {
///     let client = create_sqs_client_from_env().await;
///     // Use the client...
/// }
/// ```
pub async fn create_sqs_client_from_env() -> aws_sdk_sqs::Client {
    let config = aws_config::load_from_env().await;
    aws_sdk_sqs::Client::new(&config)
}

/// Creates an AWS SQS client for a region, with credentials from the environment.
///
/// When `region` is `None` the region is taken from `AWS_DEFAULT_REGION` or
/// `AWS_REGION`. If neither is set a [`ConsumerError::Configuration`] is
/// returned instead of silently falling back to a profile lookup.
pub async fn create_sqs_client_for_region(
    region: Option<&str>,
) -> Result<aws_sdk_sqs::Client, ConsumerError> {
    let region = resolve_region(region)?;
    let config = aws_config::from_env()
        .region(Region::new(region))
        .load()
        .await;
    Ok(aws_sdk_sqs::Client::new(&config))
}

/// Resolves the region to connect to: the explicit value first, then
/// `AWS_DEFAULT_REGION`, then `AWS_REGION`.
pub fn resolve_region(region: Option<&str>) -> Result<String, ConsumerError> {
    resolve_region_with(region, |key| std::env::var(key).ok())
}

fn resolve_region_with<F>(region: Option<&str>, lookup: F) -> Result<String, ConsumerError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(region) = region.filter(|r| !r.trim().is_empty()) {
        return Ok(region.to_string());
    }

    ["AWS_DEFAULT_REGION", "AWS_REGION"]
        .into_iter()
        .filter_map(lookup)
        .find(|r| !r.trim().is_empty())
        .ok_or_else(|| {
            ConsumerError::Configuration(
                "no region given; set the region or AWS_DEFAULT_REGION".to_string(),
            )
        })
}

#[async_trait]
impl QueueClient for aws_sdk_sqs::Client {
    async fn receive(&self, request: &ReceiveRequest) -> Result<Vec<Message>, BoxError> {
        let system_attributes = request
            .attribute_names
            .iter()
            .map(|name| MessageSystemAttributeName::from(name.as_str()))
            .collect::<Vec<_>>();

        let output = self
            .receive_message()
            .queue_url(&request.queue_url)
            .set_message_system_attribute_names(Some(system_attributes))
            .set_message_attribute_names(Some(request.message_attribute_names.clone()))
            .max_number_of_messages(request.max_number_of_messages)
            .wait_time_seconds(request.wait_time_seconds)
            .set_visibility_timeout(request.visibility_timeout_seconds)
            .send()
            .await?;

        let messages = output
            .messages()
            .iter()
            .cloned()
            .filter_map(|raw| match Message::try_from(raw) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(queue_url = %request.queue_url, error = %e, "skipping malformed message");
                    None
                }
            })
            .collect();

        Ok(messages)
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BoxError> {
        self.delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: &[DeleteBatchEntry],
    ) -> Result<BatchDeleteOutcome, BoxError> {
        let request_entries = entries
            .iter()
            .map(|entry| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(&entry.id)
                    .receipt_handle(&entry.receipt_handle)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .delete_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(request_entries))
            .send()
            .await?;

        let outcome = BatchDeleteOutcome {
            successful: output
                .successful()
                .iter()
                .map(|entry| entry.id().to_string())
                .collect(),
            failed: output
                .failed()
                .iter()
                .map(|entry| BatchDeleteFailure {
                    id: entry.id().to_string(),
                    code: entry.code().to_string(),
                    message: entry.message().map(str::to_string),
                    sender_fault: entry.sender_fault(),
                })
                .collect(),
        };
        debug!(
            queue_url,
            successful = outcome.successful.len(),
            failed = outcome.failed.len(),
            "batch delete completed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn explicit_region_wins() {
        let region = resolve_region_with(Some("eu-west-1"), env(&[("AWS_DEFAULT_REGION", "us-east-1")]));
        assert_eq!(region.unwrap(), "eu-west-1");
    }

    #[test]
    fn falls_back_to_default_region_then_region() {
        let region = resolve_region_with(
            None,
            env(&[("AWS_DEFAULT_REGION", "us-east-2"), ("AWS_REGION", "us-west-2")]),
        );
        assert_eq!(region.unwrap(), "us-east-2");

        let region = resolve_region_with(Some(""), env(&[("AWS_REGION", "us-west-2")]));
        assert_eq!(region.unwrap(), "us-west-2");
    }

    #[test]
    fn missing_region_is_a_configuration_error() {
        let err = resolve_region_with(None, env(&[])).unwrap_err();
        assert!(matches!(err, ConsumerError::Configuration(_)));
    }
}
