use crate::errors::ConsumerError;
use crate::queue::ReceiveRequest;

/// Largest batch SQS returns from a single receive.
pub const MAX_BATCH_SIZE: i32 = 10;

/// Longest long-poll wait SQS accepts.
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

/// Where the consumer loop runs when started with
/// [`Consumer::start_consumer`](crate::consumer::Consumer::start_consumer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// On the caller's task; `start_consumer` returns once the consumer stops.
    Inline,
    /// On a dedicated tokio task; `start_consumer` returns immediately.
    #[default]
    Background,
}

/// Configuration for the SQS consumer.
///
/// # Fields
/// - `queue_url`: The URL of the queue to poll.
/// - `region`: The AWS region, used when the consumer builds its own client.
/// - `attribute_names`: System attributes to return with each message.
/// - `message_attribute_names`: User defined attributes to return with each message.
/// - `batch_size`: Messages per receive, 1 to 10. 1 selects per-message handling.
/// - `wait_time_seconds`: The wait time for long polling, in seconds.
/// - `visibility_timeout_seconds`: Optional visibility timeout override.
/// - `polling_wait_time_ms`: Pause after every poll, in milliseconds.
/// - `execution`: Inline or background execution.
/// - `daemon`: When `false`, `stop()` waits for the background worker to exit.
/// - `worker_name_prefix`: Prefix of the generated background worker name.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub queue_url: String,
    pub region: Option<String>,
    pub attribute_names: Vec<String>,
    pub message_attribute_names: Vec<String>,
    pub batch_size: i32,
    pub wait_time_seconds: i32,
    pub visibility_timeout_seconds: Option<i32>,
    pub polling_wait_time_ms: u64,
    pub execution: ExecutionMode,
    pub daemon: bool,
    pub worker_name_prefix: String,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            queue_url: String::new(),
            region: None,
            attribute_names: Vec::new(),
            message_attribute_names: Vec::new(),
            batch_size: 1,
            wait_time_seconds: 1,
            visibility_timeout_seconds: None,
            polling_wait_time_ms: 0,
            execution: ExecutionMode::Background,
            daemon: true,
            worker_name_prefix: "consumer".to_string(),
        }
    }
}

impl ConsumerConfig {
    pub fn new(queue_url: impl Into<String>) -> Self {
        ConsumerConfig {
            queue_url: queue_url.into(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_message_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.message_attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_wait_time_seconds(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = seconds;
        self
    }

    pub fn with_visibility_timeout_seconds(mut self, seconds: i32) -> Self {
        self.visibility_timeout_seconds = Some(seconds);
        self
    }

    pub fn with_polling_wait_time_ms(mut self, millis: u64) -> Self {
        self.polling_wait_time_ms = millis;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_daemon(mut self, daemon: bool) -> Self {
        self.daemon = daemon;
        self
    }

    pub fn with_worker_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_name_prefix = prefix.into();
        self
    }

    /// Checks the values SQS would reject or the consumer cannot honour.
    pub fn validate(&self) -> Result<(), ConsumerError> {
        if self.queue_url.trim().is_empty() {
            return Err(ConsumerError::Configuration(
                "queue url must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ConsumerError::Configuration(format!(
                "batch size should be between 1 and {MAX_BATCH_SIZE}, both inclusive, got {}",
                self.batch_size
            )));
        }
        if !(0..=MAX_WAIT_TIME_SECONDS).contains(&self.wait_time_seconds) {
            return Err(ConsumerError::Configuration(format!(
                "wait time should be between 0 and {MAX_WAIT_TIME_SECONDS} seconds, got {}",
                self.wait_time_seconds
            )));
        }
        if let Some(timeout) = self.visibility_timeout_seconds {
            if timeout < 0 {
                return Err(ConsumerError::Configuration(format!(
                    "visibility timeout must not be negative, got {timeout}"
                )));
            }
        }
        Ok(())
    }

    /// Whether received messages go to `handle_message_batch`.
    pub fn is_batch(&self) -> bool {
        self.batch_size > 1
    }

    pub(crate) fn receive_request(&self) -> ReceiveRequest {
        ReceiveRequest {
            queue_url: self.queue_url.clone(),
            attribute_names: self.attribute_names.clone(),
            message_attribute_names: self.message_attribute_names.clone(),
            max_number_of_messages: self.batch_size,
            wait_time_seconds: self.wait_time_seconds,
            visibility_timeout_seconds: self.visibility_timeout_seconds,
        }
    }
}
