// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::time::Instant;

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};
use tracing::{trace, warn};

// Layer 3: Internal module imports
use crate::message::Envelope;

/// Outcome of a blocking dequeue.
#[derive(Debug)]
pub enum DequeueOutcome {
    /// An envelope was taken off the queue.
    Message(Envelope),
    /// The deadline passed with no envelope available.
    TimedOut,
    /// The mailbox was closed; no envelope will ever arrive again.
    Closed,
}

struct Inner {
    high: VecDeque<Envelope>,
    normal: VecDeque<Envelope>,
    closed: bool,
    depth_warned: bool,
}

impl Inner {
    fn pop(&mut self) -> Option<Envelope> {
        // High-priority envelopes preempt the normal class; both classes
        // stay FIFO internally.
        self.high.pop_front().or_else(|| self.normal.pop_front())
    }

    fn len(&self) -> usize {
        self.high.len() + self.normal.len()
    }
}

/// Unbounded multi-producer single-consumer queue of envelopes.
///
/// Two FIFO classes: envelopes whose id carries the high-priority flag are
/// dequeued before all normal-priority envelopes but never reorder among
/// themselves. Per-sender FIFO holds because every producer appends under
/// the same lock. The single consumer blocks on a condition variable; a
/// deadline turns the wait into the behavior-timeout mechanism.
///
/// Once closed (during actor cleanup) the queue drops every enqueue
/// silently; a send racing actor termination is indistinguishable from a
/// send to an already-dead actor and must not fail the sender.
pub struct Mailbox {
    inner: Mutex<Inner>,
    signal: Condvar,
    depth_warn_threshold: usize,
}

impl Mailbox {
    /// Create an empty, open mailbox.
    ///
    /// `depth_warn_threshold` is the queue length at which a single warning
    /// is logged for this mailbox; the queue itself never rejects on depth.
    pub fn new(depth_warn_threshold: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                high: VecDeque::new(),
                normal: VecDeque::new(),
                closed: false,
                depth_warned: false,
            }),
            signal: Condvar::new(),
            depth_warn_threshold,
        }
    }

    /// Append an envelope to its priority class.
    ///
    /// Returns `false` if the mailbox is closed (the envelope is dropped).
    pub fn enqueue(&self, envelope: Envelope) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            trace!(mid = %envelope.mid, "dropping envelope for closed mailbox");
            return false;
        }
        if envelope.is_high_priority() {
            inner.high.push_back(envelope);
        } else {
            inner.normal.push_back(envelope);
        }
        if !inner.depth_warned && inner.len() >= self.depth_warn_threshold {
            inner.depth_warned = true;
            warn!(
                depth = inner.len(),
                threshold = self.depth_warn_threshold,
                "mailbox depth exceeded warn threshold"
            );
        }
        drop(inner);
        self.signal.notify_one();
        true
    }

    /// Take the next envelope without blocking.
    pub fn try_dequeue(&self) -> Option<Envelope> {
        self.inner.lock().pop()
    }

    /// Take the next envelope, waiting until one arrives, the optional
    /// deadline passes, or the mailbox is closed.
    pub fn dequeue(&self, deadline: Option<Instant>) -> DequeueOutcome {
        let mut inner = self.inner.lock();
        loop {
            if let Some(envelope) = inner.pop() {
                return DequeueOutcome::Message(envelope);
            }
            if inner.closed {
                return DequeueOutcome::Closed;
            }
            match deadline {
                Some(deadline) => {
                    if self.signal.wait_until(&mut inner, deadline).timed_out() {
                        // One more look: the producer may have slipped in
                        // between the timeout and reacquiring the lock.
                        return match inner.pop() {
                            Some(envelope) => DequeueOutcome::Message(envelope),
                            None => DequeueOutcome::TimedOut,
                        };
                    }
                }
                None => self.signal.wait(&mut inner),
            }
        }
    }

    /// Close the mailbox and discard everything still queued.
    ///
    /// Returns the number of discarded envelopes. Idempotent.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.closed = true;
        let discarded = inner.len();
        inner.high.clear();
        inner.normal.clear();
        drop(inner);
        self.signal.notify_all();
        discarded
    }

    /// Current queue depth across both classes.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether both classes are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
