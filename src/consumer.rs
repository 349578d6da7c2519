use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::client::create_sqs_client_for_region;
use crate::errors::ConsumerError;
use crate::handler::MessageHandler;
use crate::queue::QueueClient;

mod config;
mod dispatch;
mod lifecycle;

pub use config::{ConsumerConfig, ExecutionMode, MAX_BATCH_SIZE, MAX_WAIT_TIME_SECONDS};
pub use lifecycle::{StopGuard, StopHandle};

use lifecycle::{ActiveLoop, RunState};

/// A consumer backed by the AWS SDK client.
pub type SqsConsumer<H> = Consumer<aws_sdk_sqs::Client, H>;

/// Polls a queue and dispatches received messages to a [`MessageHandler`].
///
/// Every iteration receives up to `batch_size` messages, hands them to the
/// handler, deletes them once the handler succeeded and then waits
/// `polling_wait_time_ms`. The loop runs until [`stop`](Consumer::stop) is
/// called, the consumer is dropped, a receive fails, or an error callback
/// returns an error.
///
/// A consumer runs at most one loop at a time, either inline via
/// [`start`](Consumer::start) or on a background task via
/// [`start_background`](Consumer::start_background). It can be started
/// again once the previous loop has returned.
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use sqs_consumer::consumer::{ConsumerConfig, SqsConsumer};
/// use sqs_consumer::{errors::BoxError, handler::MessageHandler, message::Message};
///
/// struct Orders;
///
/// #[async_trait]
/// impl MessageHandler for Orders {
///     async fn handle_message(&self, message: &Message) -> Result<(), BoxError> {
///         println!("order: {}", message.body);
///         Ok(())
///     }
///
///     async fn handle_message_batch(&self, messages: &[Message]) -> Result<(), BoxError> {
///         println!("{} orders", messages.len());
///         Ok(())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ConsumerConfig::new("https://sqs.us-east-1.amazonaws.com/123456789012/orders")
///         .with_region("us-east-1")
///         .with_daemon(false);
///     let consumer = SqsConsumer::from_config(config, Orders).await?;
///
///     consumer.start_consumer().await?;
///     tokio::signal::ctrl_c().await?;
///     consumer.stop().await?;
///     Ok(())
/// }
/// ```
pub struct Consumer<C, H>
where
    C: QueueClient + 'static,
    H: MessageHandler + 'static,
{
    shared: Arc<ConsumerShared<C, H>>,
    worker: Mutex<Option<Worker>>,
}

struct ConsumerShared<C, H> {
    config: ConsumerConfig,
    client: C,
    handler: H,
    state: Arc<RunState>,
    queue_url: Arc<str>,
}

struct Worker {
    name: String,
    handle: JoinHandle<Result<(), ConsumerError>>,
}

impl<H> Consumer<aws_sdk_sqs::Client, H>
where
    H: MessageHandler + 'static,
{
    /// Builds a consumer with its own SQS client for `config.region`
    /// (or `AWS_DEFAULT_REGION` / `AWS_REGION`).
    pub async fn from_config(config: ConsumerConfig, handler: H) -> Result<Self, ConsumerError> {
        config.validate()?;
        let client = create_sqs_client_for_region(config.region.as_deref()).await?;
        Self::new(config, client, handler)
    }
}

impl<C, H> Consumer<C, H>
where
    C: QueueClient + 'static,
    H: MessageHandler + 'static,
{
    /// Creates a stopped consumer. Fails if the configuration is invalid.
    pub fn new(config: ConsumerConfig, client: C, handler: H) -> Result<Self, ConsumerError> {
        config.validate()?;
        let queue_url = Arc::from(config.queue_url.as_str());
        Ok(Consumer {
            shared: Arc::new(ConsumerShared {
                config,
                client,
                handler,
                state: Arc::new(RunState::default()),
                queue_url,
            }),
            worker: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.shared.config
    }

    pub fn client(&self) -> &C {
        &self.shared.client
    }

    pub fn handler(&self) -> &H {
        &self.shared.handler
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.is_running()
    }

    /// Name of the most recently started background worker.
    pub fn worker_name(&self) -> Option<String> {
        self.lock_worker().as_ref().map(|worker| worker.name.clone())
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(
            Arc::clone(&self.shared.state),
            Arc::clone(&self.shared.queue_url),
        )
    }

    /// Returns a guard that requests a stop when dropped.
    pub fn stop_on_drop(&self) -> StopGuard {
        self.stop_handle().into_guard()
    }

    /// Runs the consumer loop on the current task until it is stopped.
    ///
    /// Returns `Ok(())` after a requested stop, or the error that ended the
    /// loop (a failed receive or a failed error callback).
    pub async fn start(&self) -> Result<(), ConsumerError> {
        if !self.shared.state.try_start() {
            return Err(ConsumerError::AlreadyRunning);
        }
        let active = ActiveLoop(Arc::clone(&self.shared.state));
        info!(queue_url = %self.shared.queue_url, "starting consumer");

        let result = self.shared.run_loop().await;
        drop(active);
        result
    }

    /// Starts the consumer as configured by [`ConsumerConfig::execution`].
    ///
    /// In [`ExecutionMode::Inline`] this is [`start`](Consumer::start); in
    /// [`ExecutionMode::Background`] it spawns the loop and returns at once.
    pub async fn start_consumer(&self) -> Result<(), ConsumerError> {
        match self.shared.config.execution {
            ExecutionMode::Inline => self.start().await,
            ExecutionMode::Background => self.start_background(),
        }
    }

    /// Spawns the consumer loop on a tokio task with a generated worker name.
    ///
    /// Must be called within a tokio runtime, otherwise
    /// [`ConsumerError::Worker`] is returned.
    pub fn start_background(&self) -> Result<(), ConsumerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConsumerError::Worker(format!("cannot spawn consumer worker: {e}")))?;
        let mut worker = self.lock_worker();
        if !self.shared.state.try_start() {
            return Err(ConsumerError::AlreadyRunning);
        }
        let active = ActiveLoop(Arc::clone(&self.shared.state));

        let name = format!("{}-{}", self.shared.config.worker_name_prefix, Uuid::new_v4());
        let span = info_span!("sqs_consumer", worker = %name);
        let shared = Arc::clone(&self.shared);

        let handle = runtime.spawn(
            async move {
                let _active = active;
                let result = shared.run_loop().await;
                if let Err(e) = &result {
                    error!(error = %e, "consumer loop terminated");
                }
                result
            }
            .instrument(span),
        );

        info!(worker = %name, queue_url = %self.shared.queue_url, "started background consumer");
        *worker = Some(Worker { name, handle });
        Ok(())
    }

    /// Requests the loop to stop.
    ///
    /// When the consumer is not a daemon and a background worker was started,
    /// waits until the worker has finished its current iteration and returns
    /// the loop's result. Otherwise only the flag is cleared. Calling it again
    /// is a no-op.
    pub async fn stop(&self) -> Result<(), ConsumerError> {
        self.stop_handle().stop();

        if self.shared.config.daemon {
            return Ok(());
        }
        let Some(worker) = self.lock_worker().take() else {
            return Ok(());
        };

        debug!(worker = %worker.name, "waiting for consumer worker to exit");
        Self::join(worker).await
    }

    /// Waits for the background worker to finish without requesting a stop.
    pub async fn wait(&self) -> Result<(), ConsumerError> {
        let Some(worker) = self.lock_worker().take() else {
            return Ok(());
        };
        Self::join(worker).await
    }

    async fn join(worker: Worker) -> Result<(), ConsumerError> {
        match worker.handle.await {
            Ok(result) => result,
            Err(e) => Err(ConsumerError::Worker(format!("{}: {e}", worker.name))),
        }
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C, H> Drop for Consumer<C, H>
where
    C: QueueClient + 'static,
    H: MessageHandler + 'static,
{
    fn drop(&mut self) {
        if self.shared.state.request_stop() {
            debug!(queue_url = %self.shared.queue_url, "consumer dropped, stopping loop");
        }
    }
}

impl<C, H> ConsumerShared<C, H>
where
    C: QueueClient,
    H: MessageHandler,
{
    async fn run_loop(&self) -> Result<(), ConsumerError> {
        let request = self.config.receive_request();

        while self.state.is_running() {
            let messages = self
                .client
                .receive(&request)
                .await
                .map_err(ConsumerError::Receive)?;

            if messages.is_empty() {
                debug!("no messages received");
                self.polling_wait().await;
                continue;
            }
            debug!(count = messages.len(), "received messages");

            if self.config.is_batch() {
                dispatch::process_message_batch(
                    &self.client,
                    &self.handler,
                    &self.queue_url,
                    &messages,
                )
                .await?;
            } else {
                for message in &messages {
                    dispatch::process_message(&self.client, &self.handler, &self.queue_url, message)
                        .await?;
                }
            }

            self.polling_wait().await;
        }

        info!(queue_url = %self.queue_url, "consumer stopped");
        Ok(())
    }

    async fn polling_wait(&self) {
        if self.config.polling_wait_time_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.polling_wait_time_ms)).await;
        }
    }
}
