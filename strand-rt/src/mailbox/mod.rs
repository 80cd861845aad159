//! Mailbox: per-actor envelope queue with blocking dequeue.
//!
//! Every actor owns exactly one [`Mailbox`]. Producers are arbitrary
//! threads; the consumer is the actor's own thread. Delivery is FIFO per
//! priority class, with the high-priority class always drained first; the
//! two-class scheme is the only priority mechanism in the runtime.

pub mod queue;

pub use queue::{DequeueOutcome, Mailbox};
