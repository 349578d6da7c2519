#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqs_consumer::errors::{BatchDeleteFailure, BoxError, ConsumerError, GenericError};
use sqs_consumer::queue::{BatchDeleteOutcome, DeleteBatchEntry, ReceiveRequest};
use sqs_consumer::{Message, MessageHandler, QueueClient, StopHandle};

pub const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/test-queue";

pub fn message(n: usize) -> Message {
    Message::new(format!("id-{n}"), format!("rh-{n}"), format!("body-{n}"))
}

pub fn messages(range: std::ops::RangeInclusive<usize>) -> Vec<Message> {
    range.map(message).collect()
}

/// What the fake queue does for each batch delete.
#[derive(Debug, Clone, Default)]
pub enum BatchDeleteBehavior {
    #[default]
    Succeed,
    Fail,
    Reject(Vec<String>),
}

#[derive(Default)]
struct FakeQueueState {
    responses: VecDeque<Result<Vec<Message>, String>>,
    requests: Vec<ReceiveRequest>,
    deleted: Vec<(String, String)>,
    batch_deleted: Vec<(String, Vec<DeleteBatchEntry>)>,
    fail_delete: bool,
    batch_delete: BatchDeleteBehavior,
    stop_when_drained: Option<StopHandle>,
}

/// An in-memory queue that replays scripted receive responses.
///
/// Once the script is drained every receive returns no messages; if a stop
/// handle was registered it is triggered on the first drained receive.
#[derive(Clone, Default)]
pub struct FakeQueue {
    state: Arc<Mutex<FakeQueueState>>,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_messages(&self, messages: Vec<Message>) -> &Self {
        self.state.lock().unwrap().responses.push_back(Ok(messages));
        self
    }

    pub fn push_error(&self, error: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(error.to_string()));
        self
    }

    pub fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }

    pub fn set_batch_delete(&self, behavior: BatchDeleteBehavior) {
        self.state.lock().unwrap().batch_delete = behavior;
    }

    pub fn stop_when_drained(&self, handle: StopHandle) {
        self.state.lock().unwrap().stop_when_drained = Some(handle);
    }

    pub fn receive_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<ReceiveRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// `(queue_url, receipt_handle)` of every single delete.
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn batch_deleted(&self) -> Vec<(String, Vec<DeleteBatchEntry>)> {
        self.state.lock().unwrap().batch_deleted.clone()
    }
}

#[async_trait]
impl QueueClient for FakeQueue {
    async fn receive(&self, request: &ReceiveRequest) -> Result<Vec<Message>, BoxError> {
        let next = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            let next = state.responses.pop_front();
            if next.is_none() {
                if let Some(handle) = &state.stop_when_drained {
                    handle.stop();
                }
            }
            next
        };

        match next {
            Some(Ok(messages)) => Ok(messages),
            Some(Err(e)) => Err(Box::new(GenericError::new(e))),
            None => {
                // Stands in for an empty long poll.
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BoxError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            return Err(Box::new(GenericError::new("ReceiptHandleIsInvalid")));
        }
        state
            .deleted
            .push((queue_url.to_string(), receipt_handle.to_string()));
        Ok(())
    }

    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: &[DeleteBatchEntry],
    ) -> Result<BatchDeleteOutcome, BoxError> {
        let mut state = self.state.lock().unwrap();
        match state.batch_delete.clone() {
            BatchDeleteBehavior::Succeed => {
                state
                    .batch_deleted
                    .push((queue_url.to_string(), entries.to_vec()));
                Ok(BatchDeleteOutcome::all_successful(entries))
            }
            BatchDeleteBehavior::Fail => Err(Box::new(GenericError::new("AccessDenied"))),
            BatchDeleteBehavior::Reject(ids) => {
                state
                    .batch_deleted
                    .push((queue_url.to_string(), entries.to_vec()));
                let (failed, successful): (Vec<_>, Vec<_>) =
                    entries.iter().partition(|entry| ids.contains(&entry.id));
                Ok(BatchDeleteOutcome {
                    successful: successful.into_iter().map(|e| e.id.clone()).collect(),
                    failed: failed
                        .into_iter()
                        .map(|e| BatchDeleteFailure {
                            id: e.id.clone(),
                            code: "ReceiptHandleIsInvalid".to_string(),
                            message: None,
                            sender_fault: true,
                        })
                        .collect(),
                })
            }
        }
    }
}

/// What the recording handler does with a message or batch.
#[derive(Debug, Clone, Default)]
pub enum Behavior {
    #[default]
    Succeed,
    /// Fails when the (first) message id matches.
    FailOn(String),
    PanicOn(String),
    /// Sleeps before succeeding.
    Slow(Duration),
}

#[derive(Default)]
pub struct HandlerLog {
    pub handled: Vec<Message>,
    pub batches: Vec<Vec<Message>>,
    pub message_errors: Vec<(Message, ConsumerError)>,
    pub batch_errors: Vec<(Vec<Message>, ConsumerError)>,
    pub started: usize,
    pub finished: usize,
    stop_after_handling: Option<StopHandle>,
}

/// A handler that records every call.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    log: Arc<Mutex<HandlerLog>>,
    behavior: Behavior,
    failing_callback: bool,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        RecordingHandler {
            behavior,
            ..Self::default()
        }
    }

    pub fn with_failing_callback(mut self) -> Self {
        self.failing_callback = true;
        self
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, HandlerLog> {
        self.log.lock().unwrap()
    }

    /// Requests a stop after every handled message or batch.
    pub fn stop_after_handling(&self, handle: StopHandle) {
        self.log().stop_after_handling = Some(handle);
    }

    async fn apply(&self, first_id: &str) -> Result<(), BoxError> {
        self.log().started += 1;
        let result: Result<(), BoxError> = match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::FailOn(id) if id == first_id => {
                Err(Box::new(GenericError::new(format!("cannot handle {id}"))))
            }
            Behavior::PanicOn(id) if id == first_id => panic!("handler blew up on {id}"),
            Behavior::Slow(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            _ => Ok(()),
        };
        let mut log = self.log();
        log.finished += 1;
        if let Some(handle) = &log.stop_after_handling {
            handle.stop();
        }
        drop(log);
        result
    }

    fn callback_result(&self) -> Result<(), BoxError> {
        if self.failing_callback {
            Err(Box::new(GenericError::new("dead letter queue unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle_message(&self, message: &Message) -> Result<(), BoxError> {
        self.log().handled.push(message.clone());
        self.apply(&message.message_id).await
    }

    async fn handle_message_batch(&self, messages: &[Message]) -> Result<(), BoxError> {
        self.log().batches.push(messages.to_vec());
        let first_id = messages
            .first()
            .map(|m| m.message_id.clone())
            .unwrap_or_default();
        self.apply(&first_id).await
    }

    async fn on_message_error(
        &self,
        message: &Message,
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        self.log().message_errors.push((message.clone(), error));
        self.callback_result()
    }

    async fn on_batch_error(
        &self,
        messages: &[Message],
        error: ConsumerError,
    ) -> Result<(), BoxError> {
        self.log().batch_errors.push((messages.to_vec(), error));
        self.callback_result()
    }
}
