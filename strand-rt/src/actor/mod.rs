//! Actor core: addressing, behaviors, the blocking receive engine.
//!
//! # Components
//!
//! - [`Address`] / [`ActorRef`] - weak and strong actor handles
//! - [`LocalActor`] - send/reply/forward/observe surface of a local actor
//! - [`BlockingActor`] - thread-per-actor receive combinators
//! - [`Behavior`] / [`Pattern`] / [`Matcher`] - message matching
//! - [`ReceiveContext`] - handler-side scope over the current envelope
//! - [`ResponsePromise`] / [`ResponseHandle`] - request/response plumbing
//! - [`ActorError`] / [`ActorExited`] / [`ActorResult`] - error surface
//!
//! # Execution model
//!
//! A blocking actor occupies one OS thread; its body runs to completion
//! there. Only the dequeue inside a receive combinator suspends. Everything
//! shared with other threads (mailbox, observers, exit state) lives in the
//! internal cell; handles keep the cell alive, addresses do not.

pub mod address;
pub(crate) mod attachable;
pub mod behavior;
pub mod blocking;
pub(crate) mod cell;
pub mod context;
pub mod error;
pub mod local;

pub use address::{ActorRef, Address};
pub use behavior::{Behavior, Matcher, Pattern};
pub use blocking::{BlockingActor, DoReceive, IntoAct, ResponseHandle};
pub use context::ReceiveContext;
pub use error::{ActorError, ActorExited, ActorResult};
pub use local::{LocalActor, ResponsePromise};
