//! # SQS Consumer
//!
//! A polling AWS SQS consumer. It receives messages in batches, dispatches
//! them to a user supplied [`MessageHandler`](handler::MessageHandler),
//! deletes them once they were handled successfully and keeps going when a
//! single message or batch fails.
//!
//! ## Features
//!
//! - Per-message or per-batch handling, selected by the configured batch size
//! - Delete after successful handling only (at-least-once processing)
//! - Overridable error callbacks; handler errors and panics never stop the loop
//! - Inline or background execution with cooperative start/stop
//! - Scoped shutdown through [`StopGuard`](consumer::StopGuard)
//! - Long polling, visibility timeout override and a configurable poll interval
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use sqs_consumer::consumer::{ConsumerConfig, ExecutionMode, SqsConsumer};
//! use sqs_consumer::{errors::BoxError, handler::MessageHandler, message::Message};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl MessageHandler for Printer {
//!     async fn handle_message(&self, message: &Message) -> Result<(), BoxError> {
//!         println!("Processing message: {}", message.body);
//!         Ok(())
//!     }
//!
//!     async fn handle_message_batch(&self, messages: &[Message]) -> Result<(), BoxError> {
//!         for message in messages {
//!             println!("Processing message: {}", message.body);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConsumerConfig::new("https://sqs.region.amazonaws.com/account/queue-name")
//!         .with_batch_size(10)
//!         .with_wait_time_seconds(20)
//!         .with_execution(ExecutionMode::Inline);
//!
//!     let consumer = SqsConsumer::from_config(config, Printer).await?;
//!     consumer.start_consumer().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod consumer;
pub mod errors;
pub mod handler;
pub mod message;
pub mod queue;

pub use consumer::{Consumer, ConsumerConfig, ExecutionMode, SqsConsumer, StopGuard, StopHandle};
pub use errors::{BoxError, ConsumerError, GenericError, QueueOperationError};
pub use handler::MessageHandler;
pub use message::Message;
pub use queue::QueueClient;
