//! # strand-rt - Blocking Actor Runtime Core
//!
//! Thread-per-actor runtime with dynamically typed message tuples,
//! two-class priority mailboxes, monitors/links/groups, and synchronous
//! request/response correlation with timeouts.
//!
//! # Quick Start
//!
//! ```rust
//! use strand_rt::prelude::*;
//!
//! fn main() -> Result<(), SystemError> {
//!     let system = ActorSystem::new(SystemConfig::default())?;
//!
//!     // An echo actor: replies to one integer message with its successor.
//!     let echo = system.spawn(|actor: &mut BlockingActor| {
//!         actor.receive(Behavior::new().on(|ctx: &mut ReceiveContext<'_>, x: i64| {
//!             ctx.reply(x + 1);
//!         }))
//!     })?;
//!
//!     // A client that issues a synchronous request and awaits the answer.
//!     let echo_addr = echo.address();
//!     system.spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
//!         let handle = match actor.sync_send(&echo_addr, 41i64) {
//!             Ok(handle) => handle,
//!             Err(_) => return Ok(()),
//!         };
//!         handle.receive(Behavior::new().on(|_ctx: &mut ReceiveContext<'_>, answer: i64| {
//!             assert_eq!(answer, 42);
//!         }))
//!     })?;
//!
//!     system.await_all_actors_done();
//!     Ok(())
//! }
//! ```
//!
//! # Execution Model
//!
//! Two kinds of code run in a system: blocking actors, each on one OS
//! thread driven by a user `act` procedure, and the timer thread behind
//! delayed sends. The only suspension point is the dequeue inside a
//! receive combinator; everything else is non-blocking. Message delivery
//! guarantees are local: FIFO per (sender, recipient) pair within a
//! priority class, with high-priority envelopes dequeued first.
//!
//! # Module Organization
//!
//! ## Core
//! - [`actor`] - actor handles, behaviors, blocking receive, sync requests
//! - [`message`] - payload tuples, correlation ids, envelopes, exit reasons
//! - [`mailbox`] - two-class MPSC queue with blocking dequeue
//!
//! ## Infrastructure
//! - [`system`] - `ActorSystem`, configuration, spawn, await-all-done
//! - [`group`] - local named broadcast groups
//! - [`util`] - identifiers
//!
//! # Matching and the Skip Buffer
//!
//! A receive combinator matches envelopes against a [`Behavior`]: ordered
//! pattern/handler clauses plus an optional timeout. Envelopes that do not
//! match are stashed in arrival order and reconsidered by the next
//! combinator; response envelopes are resolved against the pending-sync
//! map installed by the `sync_send` family instead.

pub mod actor;
pub mod group;
pub mod mailbox;
pub mod message;
pub mod prelude;
pub(crate) mod scheduler;
pub mod system;
pub mod util;

// Re-export commonly used types
pub use actor::{
    ActorError, ActorExited, ActorRef, ActorResult, Address, Behavior, BlockingActor, DoReceive,
    IntoAct, LocalActor, Matcher, Pattern, ReceiveContext, ResponseHandle, ResponsePromise,
};
pub use group::Group;
pub use mailbox::{DequeueOutcome, Mailbox};
pub use message::{
    atom, Atom, DownMsg, Envelope, ExitMsg, ExitReason, Extract, IntoMessage, IntoMsgValue,
    Message, MessageId, MessagePriority, MsgValue, SyncTimeoutMsg, TypeTag,
};
pub use system::{ActorSystem, SystemConfig, SystemError};
pub use util::ActorId;
