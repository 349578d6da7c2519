use std::collections::HashMap;

use aws_sdk_sqs::types::Message as SqsMessage;
use thiserror::Error;

/// A message received from the queue.
///
/// `attributes` and `message_attributes` are only populated when the
/// corresponding names were requested in the consumer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message ID, unique per receive. Used as the batch delete entry id.
    pub message_id: String,
    /// The receipt handle used to delete the message.
    pub receipt_handle: String,
    /// The message body. Empty when the queue returned no body.
    pub body: String,
    /// System attributes such as `SentTimestamp` or `ApproximateReceiveCount`.
    pub attributes: HashMap<String, String>,
    /// User defined message attributes.
    pub message_attributes: HashMap<String, MessageAttribute>,
}

/// A user defined message attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttribute {
    /// `String`, `Number`, `Binary` or a custom `Type.Label`.
    pub data_type: String,
    pub string_value: Option<String>,
    pub binary_value: Option<Vec<u8>>,
}

impl Message {
    pub fn new(
        message_id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Message {
            message_id: message_id.into(),
            receipt_handle: receipt_handle.into(),
            body: body.into(),
            attributes: HashMap::new(),
            message_attributes: HashMap::new(),
        }
    }

    /// Returns a system attribute value, e.g. `ApproximateReceiveCount`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the string value of a user defined message attribute.
    pub fn message_attribute_str(&self, name: &str) -> Option<&str> {
        self.message_attributes
            .get(name)
            .and_then(|attr| attr.string_value.as_deref())
    }
}

/// A raw SQS record that cannot be acknowledged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedMessage {
    #[error("message has no message id")]
    MissingMessageId,

    #[error("message {0} has no receipt handle")]
    MissingReceiptHandle(String),
}

impl TryFrom<SqsMessage> for Message {
    type Error = MalformedMessage;

    fn try_from(msg: SqsMessage) -> Result<Self, Self::Error> {
        let message_id = msg
            .message_id()
            .ok_or(MalformedMessage::MissingMessageId)?
            .to_string();
        let receipt_handle = msg
            .receipt_handle()
            .ok_or_else(|| MalformedMessage::MissingReceiptHandle(message_id.clone()))?
            .to_string();

        let attributes = msg
            .attributes()
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(key, value)| (key.as_str().to_string(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let message_attributes = msg
            .message_attributes()
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(key, value)| {
                        let attr = MessageAttribute {
                            data_type: value.data_type().to_string(),
                            string_value: value.string_value().map(str::to_string),
                            binary_value: value.binary_value().map(|blob| blob.as_ref().to_vec()),
                        };
                        (key.clone(), attr)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Message {
            message_id,
            receipt_handle,
            body: msg.body().unwrap_or_default().to_string(),
            attributes,
            message_attributes,
        })
    }
}
