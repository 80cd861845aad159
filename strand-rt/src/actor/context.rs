//! Handler-side view of the actor and the envelope being processed.
//!
//! Every behavior clause receives a [`ReceiveContext`], the explicit scope
//! for "the message I am handling right now". Reply, forward and promise
//! operate on that envelope; everything else is the actor's regular send
//! and observation surface. Keeping the envelope reachable only through
//! the context makes "no current message" states (after a forward, or in a
//! timeout action) explicit instead of ambient.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::address::Address;
use super::blocking::{BlockingActor, ResponseHandle};
use super::error::ActorError;
use super::local::ResponsePromise;
use crate::group::Group;
use crate::message::{Extract, ExitReason, IntoMessage, Message, MessagePriority};
use crate::system::ActorSystem;
use crate::util::ActorId;

/// Scope handed to behavior clause handlers and timeout actions.
pub struct ReceiveContext<'a> {
    pub(crate) actor: &'a mut BlockingActor,
}

impl ReceiveContext<'_> {
    // --- the current envelope ---

    /// The payload currently being handled.
    ///
    /// Fails after the envelope was forwarded away, and inside timeout
    /// actions (which run without an envelope).
    pub fn message(&self) -> Result<Message, ActorError> {
        self.actor.last_dequeued().cloned()
    }

    /// The sender of the current envelope.
    pub fn sender(&self) -> Result<Address, ActorError> {
        self.actor.last_sender()
    }

    /// Reply to the current envelope; see
    /// [`LocalActor::reply_message`](super::local::LocalActor::reply_message).
    pub fn reply(&mut self, message: impl IntoMessage) {
        self.actor.reply_message(message);
    }

    /// Forward the current envelope, sender preserved; see
    /// [`LocalActor::forward_message`](super::local::LocalActor::forward_message).
    pub fn forward_to(&mut self, dest: &Address, priority: MessagePriority) {
        self.actor.forward_message(dest, priority);
    }

    /// Capture the current request for a later reply.
    pub fn make_response_promise(&mut self) -> ResponsePromise {
        self.actor.make_response_promise()
    }

    /// Quiet typed peek at one element of the current payload; used by the
    /// extraction wrappers, absent rather than failing.
    pub(crate) fn message_value<T: Extract>(&self, index: usize) -> Option<T> {
        self.actor
            .core
            .current_message()
            .and_then(|message| message.value::<T>(index))
    }

    pub(crate) fn message_snapshot(&self) -> Option<Message> {
        self.actor.core.current_message().cloned()
    }

    // --- actor identity and lifecycle ---

    /// This actor's id.
    pub fn id(&self) -> ActorId {
        self.actor.id()
    }

    /// This actor's address (hand it out so others can reach us).
    pub fn self_address(&self) -> Address {
        self.actor.address()
    }

    /// Handle to the owning system.
    pub fn system(&self) -> ActorSystem {
        self.actor.system()
    }

    /// Plan the actor's exit. The current handler runs to completion; the
    /// receive machinery then picks the planned reason up at the next
    /// clause boundary and returns the exit sentinel instead of dequeuing
    /// further envelopes.
    pub fn quit(&mut self, reason: ExitReason) {
        let _ = self.actor.quit(reason);
    }

    // --- sends ---

    /// Asynchronous send.
    pub fn send(&self, target: &Address, message: impl IntoMessage) {
        self.actor.send(target, message);
    }

    /// Asynchronous send in an explicit priority class.
    pub fn send_with_priority(
        &self,
        priority: MessagePriority,
        target: &Address,
        message: impl IntoMessage,
    ) {
        self.actor.send_with_priority(priority, target, message);
    }

    /// Demand an exit from another actor.
    pub fn send_exit(&self, target: &Address, reason: ExitReason) {
        self.actor.send_exit(target, reason);
    }

    /// Timer-driven send.
    pub fn delayed_send(&self, delay: Duration, target: &Address, message: impl IntoMessage) {
        self.actor.delayed_send(delay, target, message);
    }

    /// Issue a request from inside a handler; chain
    /// [`then`](ResponseHandle::then) to install the continuation.
    pub fn sync_send(
        &mut self,
        dest: &Address,
        message: impl IntoMessage,
    ) -> Result<ResponseHandle<'_>, ActorError> {
        self.actor.sync_send(dest, message)
    }

    /// Issue a request with a timeout from inside a handler.
    pub fn timed_sync_send(
        &mut self,
        dest: &Address,
        timeout: Duration,
        message: impl IntoMessage,
    ) -> Result<ResponseHandle<'_>, ActorError> {
        self.actor.timed_sync_send(dest, timeout, message)
    }

    // --- observers and groups ---

    /// Observe another actor's exit.
    pub fn monitor(&self, target: &Address) {
        self.actor.monitor(target);
    }

    /// Remove a monitor.
    pub fn demonitor(&self, target: &Address) {
        self.actor.demonitor(target);
    }

    /// Link to a peer actor.
    pub fn link_to(&self, peer: &Address) {
        self.actor.link_to(peer);
    }

    /// Remove a link.
    pub fn unlink_from(&self, peer: &Address) {
        self.actor.unlink_from(peer);
    }

    /// Subscribe to a group, idempotently.
    pub fn join(&self, group: &Group) {
        self.actor.join(group);
    }

    /// Unsubscribe from a group.
    pub fn leave(&self, group: &Group) {
        self.actor.leave(group);
    }

    /// Escape hatch to the full actor, e.g. for a nested receive inside a
    /// handler.
    pub fn actor(&mut self) -> &mut BlockingActor {
        self.actor
    }
}
