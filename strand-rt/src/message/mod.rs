//! Message model: dynamic payload tuples, correlation ids and envelopes.
//!
//! # Components
//!
//! - [`Message`] / [`MsgValue`] / [`Atom`] - immutable dynamically typed tuples
//! - [`IntoMessage`] / [`IntoMsgValue`] / [`Extract`] - conversion traits
//! - [`MessageId`] / [`MessagePriority`] - packed correlation tag and priority class
//! - [`Envelope`] - payload plus routing metadata, uniquely owned
//! - [`ExitReason`], [`ExitMsg`], [`DownMsg`], [`SyncTimeoutMsg`] - system payloads

pub mod envelope;
pub mod id;
pub mod system;
pub mod value;

pub use envelope::Envelope;
pub use id::{MessageId, MessagePriority};
pub use system::{DownMsg, ExitMsg, ExitReason, SyncTimeoutMsg};
pub use value::{atom, Atom, Extract, IntoMessage, IntoMsgValue, Message, MsgValue, TypeTag};
