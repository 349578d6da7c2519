use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, info};

const RUNNING: u8 = 0b01;
const ACTIVE: u8 = 0b10;

/// Run state shared between a consumer, its loop and its stop handles.
///
/// `RUNNING` is the stop flag checked at the top of every iteration.
/// `ACTIVE` is set while a loop exists, so a stopped consumer cannot be
/// restarted before its previous loop has returned. Both live in one atomic
/// so starting sets them together and a concurrent stop sees either none or
/// both.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    bits: AtomicU8,
}

impl RunState {
    pub(crate) fn is_running(&self) -> bool {
        self.bits.load(Ordering::Acquire) & RUNNING != 0
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.bits.load(Ordering::Acquire) & ACTIVE != 0
    }

    /// Claims the single loop slot and sets the flag. Returns `false` if a
    /// loop is still active.
    pub(crate) fn try_start(&self) -> bool {
        self.bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (bits & ACTIVE == 0).then_some(ACTIVE | RUNNING)
            })
            .is_ok()
    }

    /// Returns whether the flag was set before.
    pub(crate) fn request_stop(&self) -> bool {
        self.bits.fetch_and(!RUNNING, Ordering::AcqRel) & RUNNING != 0
    }

    fn finish(&self) {
        self.bits.store(0, Ordering::Release);
    }
}

/// Releases the loop slot when the loop returns, errors, panics or is dropped.
pub(crate) struct ActiveLoop(pub(crate) Arc<RunState>);

impl Drop for ActiveLoop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// A cloneable handle that asks a consumer to stop.
///
/// The loop observes the request before its next receive; an in-flight
/// receive or handler call is not interrupted. Unlike
/// [`Consumer::stop`](crate::consumer::Consumer::stop) it never waits for a
/// background worker, so it can be used from signal handlers or from inside
/// a message handler.
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<RunState>,
    queue_url: Arc<str>,
}

impl StopHandle {
    pub(crate) fn new(state: Arc<RunState>, queue_url: Arc<str>) -> Self {
        StopHandle { state, queue_url }
    }

    pub fn stop(&self) {
        if self.state.request_stop() {
            info!(queue_url = %self.queue_url, "consumer stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Converts the handle into a guard that stops the consumer when dropped.
    pub fn into_guard(self) -> StopGuard {
        StopGuard {
            handle: self,
            armed: true,
        }
    }
}

/// Stops the consumer when it goes out of scope.
///
/// Hold one per consumer in the scope that owns it (typically `main`) so a
/// background loop does not outlive that scope even if `stop()` is never
/// called. Dropping the guard only requests the stop.
#[must_use = "the consumer is stopped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct StopGuard {
    handle: StopHandle,
    armed: bool,
}

impl StopGuard {
    /// Releases the guard without stopping the consumer.
    pub fn disarm(mut self) -> StopHandle {
        self.armed = false;
        self.handle.clone()
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!(queue_url = %self.handle.queue_url, "stop guard dropped");
            self.handle.stop();
        }
    }
}
