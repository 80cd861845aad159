//! Convenience re-exports for typical use.
//!
//! ```rust
//! use strand_rt::prelude::*;
//! ```

pub use crate::actor::{
    ActorError, ActorExited, ActorRef, ActorResult, Address, Behavior, BlockingActor, Pattern,
    ReceiveContext, ResponsePromise,
};
pub use crate::group::Group;
pub use crate::message::{
    atom, Atom, DownMsg, ExitMsg, ExitReason, IntoMessage, Message, MessagePriority, MsgValue,
    SyncTimeoutMsg,
};
pub use crate::system::{ActorSystem, SystemConfig, SystemError};
pub use crate::util::ActorId;
