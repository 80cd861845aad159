//! Delayed-send timer source.
//!
//! The scheduler is the timer half of the coordination layer: it accepts
//! `(delay, from, to, mid, message)` requests and delivers the envelope
//! when the deadline passes. One worker thread per system drains a deadline
//! heap, started lazily on the first request; delivery to an actor that has
//! meanwhile gone away is dropped like any other send to a dead actor.

// Layer 1: Standard library imports
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};
use tracing::{trace, warn};

// Layer 3: Internal module imports
use crate::actor::Address;
use crate::message::{Envelope, Message, MessageId};

struct TimerEntry {
    due: Instant,
    /// Insertion tiebreak so equal deadlines fire in request order.
    seq: u64,
    from: Address,
    to: Address,
    mid: MessageId,
    message: Message,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest deadline is on
        // top, with the lower sequence winning ties.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct SchedulerState {
    queue: BinaryHeap<TimerEntry>,
    next_seq: u64,
    shutdown: bool,
    worker: Option<JoinHandle<()>>,
}

struct SchedulerShared {
    state: Mutex<SchedulerState>,
    signal: Condvar,
    thread_name: String,
}

/// Process-wide timer for delayed sends.
pub(crate) struct Scheduler {
    shared: Arc<SchedulerShared>,
}

impl Scheduler {
    pub(crate) fn new(thread_name: String) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                state: Mutex::new(SchedulerState {
                    queue: BinaryHeap::new(),
                    next_seq: 0,
                    shutdown: false,
                    worker: None,
                }),
                signal: Condvar::new(),
                thread_name,
            }),
        }
    }

    /// Schedule `message` for delivery to `to` after `delay`, sent as
    /// `from` and carrying `mid` (which also fixes the priority class).
    pub(crate) fn delayed_send(
        &self,
        delay: Duration,
        from: Address,
        to: Address,
        mid: MessageId,
        message: Message,
    ) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            warn!("scheduler already shut down, dropping delayed send");
            return;
        }
        self.ensure_worker(&mut state);
        state.next_seq += 1;
        let entry = TimerEntry {
            due: Instant::now() + delay,
            seq: state.next_seq,
            from,
            to,
            mid,
            message,
        };
        state.queue.push(entry);
        drop(state);
        self.shared.signal.notify_one();
    }

    /// Number of timers not yet fired.
    pub(crate) fn pending(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    fn ensure_worker(&self, state: &mut SchedulerState) {
        if state.worker.is_some() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.shared.thread_name.clone())
            .spawn(move || worker_loop(&shared));
        match spawned {
            Ok(handle) => state.worker = Some(handle),
            // The entry stays queued; the next request retries the spawn.
            Err(err) => warn!(%err, "failed to start scheduler worker thread"),
        }
    }

    /// Stop the worker and discard pending timers. Idempotent.
    pub(crate) fn shutdown(&self) {
        let worker = {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.queue.clear();
            state.worker.take()
        };
        self.shared.signal.notify_all();
        if let Some(handle) = worker {
            // Shutdown can be triggered from the worker itself when the
            // last delivery drops the final system handle; the flag alone
            // stops the loop in that case.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn worker_loop(shared: &SchedulerShared) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        match state.queue.peek().map(|entry| entry.due) {
            None => shared.signal.wait(&mut state),
            Some(due) => {
                if due <= Instant::now() {
                    if let Some(entry) = state.queue.pop() {
                        // Deliver without holding the scheduler lock.
                        drop(state);
                        deliver(entry);
                        state = shared.state.lock();
                    }
                } else {
                    let _ = shared.signal.wait_until(&mut state, due);
                }
            }
        }
    }
}

fn deliver(entry: TimerEntry) {
    match entry.to.upgrade() {
        Some(target) => {
            target.enqueue(Envelope::new(entry.from, entry.mid, entry.message));
        }
        None => trace!("delayed send target gone, dropping"),
    }
}
