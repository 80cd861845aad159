//! Local actor base: addressing, sends, replies, observers, exit bookkeeping.
//!
//! [`LocalActor`] owns the thread-local half of an actor; the shared half
//! lives in the cell. Handlers never see this type directly; they go through
//! [`ReceiveContext`](super::context::ReceiveContext), and the blocking
//! receive machinery composes on top in [`super::blocking`].

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tracing::{error, trace};

// Layer 3: Internal module imports
use super::address::Address;
use super::attachable::{AttachToken, Attachable};
use super::cell::ActorCell;
use super::error::{ActorError, ActorExited};
use crate::group::Group;
use crate::message::{
    Envelope, ExitMsg, ExitReason, IntoMessage, Message, MessageId, MessagePriority,
};
use crate::system::ActorSystem;
use crate::util::ActorId;

/// The execution-side state of one local actor.
pub struct LocalActor {
    cell: Arc<ActorCell>,
    /// The envelope currently being handled, if any. Non-empty exactly
    /// while a handler runs; forwarding consumes it.
    current: Option<Envelope>,
}

impl LocalActor {
    pub(crate) fn new(cell: Arc<ActorCell>) -> Self {
        Self {
            cell,
            current: None,
        }
    }

    pub(crate) fn cell(&self) -> &Arc<ActorCell> {
        &self.cell
    }

    pub(crate) fn set_current(&mut self, envelope: Envelope) {
        self.current = Some(envelope);
    }

    pub(crate) fn take_current(&mut self) -> Option<Envelope> {
        self.current.take()
    }

    pub(crate) fn current_message(&self) -> Option<&Message> {
        self.current.as_ref().map(|envelope| &envelope.message)
    }

    /// This actor's stable id.
    pub fn id(&self) -> ActorId {
        self.cell.id()
    }

    /// This actor's weak address.
    pub fn address(&self) -> Address {
        self.cell.address()
    }

    /// Handle to the owning actor system.
    pub fn system(&self) -> ActorSystem {
        ActorSystem::from_core(Arc::clone(self.cell.system()))
    }

    /// Asynchronous send. Drops silently when the target is invalid or
    /// gone; never fails, never blocks.
    pub fn send(&self, target: &Address, message: impl IntoMessage) {
        self.send_with_priority(MessagePriority::Normal, target, message);
    }

    /// Asynchronous send in an explicit priority class.
    pub fn send_with_priority(
        &self,
        priority: MessagePriority,
        target: &Address,
        message: impl IntoMessage,
    ) {
        let Some(dest) = target.upgrade() else {
            trace!("send target invalid or gone, dropping message");
            return;
        };
        dest.enqueue(Envelope::new(
            self.address(),
            MessageId::make(priority),
            message.into_message(),
        ));
    }

    /// Reply to the envelope currently being handled.
    ///
    /// With no current envelope or an anonymous sender this drops. When the
    /// current id is invalid or itself a response the reply degenerates to
    /// a plain asynchronous send. Otherwise the reply carries the request's
    /// response id and marks the request answered, which suppresses any
    /// further reply for it, so replying twice produces one response.
    pub fn reply_message(&mut self, message: impl IntoMessage) {
        let Some(current) = self.current.as_mut() else {
            trace!("reply with no current message, dropping");
            return;
        };
        if !current.sender.is_valid() {
            trace!("reply to anonymous sender, dropping");
            return;
        }
        let mid = current.mid;
        if !mid.is_valid() || mid.is_response() {
            if let Some(dest) = current.sender.upgrade() {
                let sender = self.cell.address();
                dest.enqueue(Envelope::new(
                    sender,
                    MessageId::default(),
                    message.into_message(),
                ));
            }
        } else if !mid.is_answered() {
            if let Some(dest) = current.sender.upgrade() {
                let sender = self.cell.address();
                dest.enqueue(Envelope::new(
                    sender,
                    mid.response_id(),
                    message.into_message(),
                ));
            }
            current.mid = mid.mark_as_answered();
        }
    }

    /// Forward the current envelope to another actor, sender preserved.
    ///
    /// The envelope's priority class is rewritten to `priority`. Consumes
    /// the current envelope: afterwards (and for the rest of the handler)
    /// there is no current message. An invalid destination leaves the
    /// envelope in place and does nothing.
    pub fn forward_message(&mut self, dest: &Address, priority: MessagePriority) {
        let Some(target) = dest.upgrade() else {
            trace!("forward target invalid or gone, keeping message");
            return;
        };
        let Some(mut envelope) = self.current.take() else {
            trace!("forward with no current message");
            return;
        };
        envelope.mid = envelope.mid.with_priority(priority);
        target.enqueue(envelope);
    }

    /// Observe another actor: when it exits, a down notification carrying
    /// its exit reason is enqueued here. No-op for invalid or gone targets.
    pub fn monitor(&self, target: &Address) {
        let Some(observed) = target.upgrade() else {
            return;
        };
        observed.cell().attach(Attachable::Monitor {
            observer: self.address(),
        });
    }

    /// Remove a monitor previously installed on `target`.
    pub fn demonitor(&self, target: &Address) {
        let Some(observed) = target.upgrade() else {
            return;
        };
        observed
            .cell()
            .detach(&AttachToken::Monitor(self.address()));
    }

    /// Link this actor and `peer`: whichever exits first sends the other a
    /// high-priority exit notification.
    pub fn link_to(&self, peer: &Address) {
        let Some(other) = peer.upgrade() else {
            return;
        };
        other.cell().attach(Attachable::Link {
            peer: self.address(),
        });
        self.cell.attach(Attachable::Link { peer: peer.clone() });
    }

    /// Remove a link in both directions.
    pub fn unlink_from(&self, peer: &Address) {
        self.cell.detach(&AttachToken::Link(peer.clone()));
        if let Some(other) = peer.upgrade() {
            other.cell().detach(&AttachToken::Link(self.address()));
        }
    }

    /// Subscribe to a group. Joining a group this actor is already
    /// subscribed to is a no-op.
    pub fn join(&self, group: &Group) {
        self.cell.join_group(group);
    }

    /// Unsubscribe from a group.
    pub fn leave(&self, group: &Group) {
        self.cell.leave_group(group);
    }

    /// Groups this actor is currently subscribed to.
    pub fn joined_groups(&self) -> Vec<Group> {
        self.cell.joined_groups()
    }

    /// Demand an exit from another actor (high-priority exit message).
    pub fn send_exit(&self, target: &Address, reason: ExitReason) {
        self.send_with_priority(
            MessagePriority::High,
            target,
            ExitMsg {
                source: self.address(),
                reason,
            },
        );
    }

    /// Send `message` to `target` after `delay`, via the system timer.
    pub fn delayed_send(&self, delay: Duration, target: &Address, message: impl IntoMessage) {
        self.delayed_send_with_priority(MessagePriority::Normal, delay, target, message);
    }

    /// Delayed send in an explicit priority class.
    pub fn delayed_send_with_priority(
        &self,
        priority: MessagePriority,
        delay: Duration,
        target: &Address,
        message: impl IntoMessage,
    ) {
        self.cell.system().scheduler().delayed_send(
            delay,
            self.address(),
            target.clone(),
            MessageId::make(priority),
            message.into_message(),
        );
    }

    /// Capture the current request so it can be answered later, possibly
    /// from another thread.
    ///
    /// Marks the request answered immediately (fulfilling the promise is
    /// now the only reply). With no current envelope the returned promise
    /// is empty and drops fulfillment silently.
    pub fn make_response_promise(&mut self) -> ResponsePromise {
        let Some(current) = self.current.as_mut() else {
            return ResponsePromise::empty();
        };
        let promise = ResponsePromise {
            state: Some(PromiseState {
                from: self.cell.address(),
                to: current.sender.clone(),
                id: current.mid.response_id(),
            }),
        };
        current.mid = current.mid.mark_as_answered();
        promise
    }

    /// Record the exit reason this actor will terminate with.
    ///
    /// Returns the control-flow token; `return Err(...)` it (or let the
    /// receive machinery pick the planned reason up at the next clause
    /// boundary) to unwind the actor body.
    pub fn quit(&self, reason: ExitReason) -> ActorExited {
        self.cell.set_planned_exit_reason(reason);
        ActorExited::new(reason)
    }

    /// The payload of the envelope currently being handled.
    pub fn last_dequeued(&self) -> Result<&Message, ActorError> {
        match self.current.as_ref() {
            Some(envelope) => Ok(&envelope.message),
            None => {
                error!("last_dequeued called after forward or outside a handler");
                Err(ActorError::NoCurrentMessage)
            }
        }
    }

    /// The sender of the envelope currently being handled.
    pub fn last_sender(&self) -> Result<Address, ActorError> {
        match self.current.as_ref() {
            Some(envelope) => Ok(envelope.sender.clone()),
            None => {
                error!("last_sender called after forward or outside a handler");
                Err(ActorError::NoCurrentMessage)
            }
        }
    }

    /// Issue a request: allocate the next request id, stamp the priority,
    /// enqueue on `dest`, and hand back the id the response will carry.
    pub(crate) fn sync_send_impl(
        &self,
        priority: MessagePriority,
        dest: &Address,
        message: Message,
    ) -> Result<MessageId, ActorError> {
        let target = dest.upgrade().ok_or(ActorError::InvalidTarget)?;
        let request_id = self.cell.new_request_id().with_priority(priority);
        target.enqueue(Envelope::new(self.address(), request_id, message));
        Ok(request_id.response_id())
    }

    /// As [`Self::sync_send_impl`], plus a timeout envelope scheduled to
    /// this actor carrying the same response id. Whichever of the response
    /// and the timeout is dequeued first wins; the other is dropped by the
    /// correlator.
    pub(crate) fn timed_sync_send_impl(
        &self,
        priority: MessagePriority,
        dest: &Address,
        timeout: Duration,
        message: Message,
    ) -> Result<MessageId, ActorError> {
        let response_id = self.sync_send_impl(priority, dest, message)?;
        self.cell.system().scheduler().delayed_send(
            timeout,
            self.address(),
            self.address(),
            response_id,
            crate::message::SyncTimeoutMsg.into_message(),
        );
        Ok(response_id)
    }

    /// Terminate this actor now. Safe to call more than once; only the
    /// first call does anything.
    pub(crate) fn cleanup(&mut self, reason: ExitReason) {
        self.current = None;
        self.cell.cleanup(reason);
    }
}

struct PromiseState {
    from: Address,
    to: Address,
    id: MessageId,
}

/// A captured reply slot for the request being handled.
///
/// Fulfilling the promise enqueues a response envelope on the original
/// requester; an empty promise (made outside a handler) drops fulfillment
/// silently. The promise is `Send`, so a handler can park the obligation
/// and fulfill it from wherever the answer eventually materializes.
pub struct ResponsePromise {
    state: Option<PromiseState>,
}

impl ResponsePromise {
    pub(crate) fn empty() -> Self {
        Self { state: None }
    }

    /// Whether fulfilling this promise can still deliver anything.
    pub fn is_pending(&self) -> bool {
        self.state.is_some()
    }

    /// Deliver the response. Consumes the promise.
    pub fn deliver(mut self, message: impl IntoMessage) {
        let Some(state) = self.state.take() else {
            trace!("delivering empty response promise, dropping");
            return;
        };
        let Some(target) = state.to.upgrade() else {
            trace!("response promise target gone, dropping");
            return;
        };
        target.enqueue(Envelope::new(state.from, state.id, message.into_message()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::system::{SystemConfig, SystemCore};

    fn fixture() -> (LocalActor, Arc<ActorCell>) {
        let core = SystemCore::new(SystemConfig::default());
        let actor = LocalActor::new(ActorCell::new(Arc::clone(&core), None));
        let peer = ActorCell::new(core, None);
        (actor, peer)
    }

    fn request_from(peer: &Arc<ActorCell>, seq: u64) -> Envelope {
        Envelope::new(
            peer.address(),
            MessageId::from_request_number(seq),
            crate::message::IntoMessage::into_message(10i64),
        )
    }

    #[test]
    fn test_reply_carries_response_id_and_marks_answered() {
        let (mut actor, peer) = fixture();
        actor.set_current(request_from(&peer, 1));
        actor.reply_message(11i64);

        let response = peer.mailbox().try_dequeue().unwrap();
        assert!(response.mid.is_response());
        assert_eq!(response.mid.request_number(), 1);
        assert_eq!(response.message.value::<i64>(0), Some(11));
        assert_eq!(response.sender.id(), actor.id());

        assert!(actor.take_current().unwrap().mid.is_answered());
    }

    #[test]
    fn test_double_reply_produces_one_response() {
        let (mut actor, peer) = fixture();
        actor.set_current(request_from(&peer, 2));
        actor.reply_message(1i64);
        actor.reply_message(2i64);

        let first = peer.mailbox().try_dequeue().unwrap();
        assert_eq!(first.message.value::<i64>(0), Some(1));
        assert!(peer.mailbox().try_dequeue().is_none());
    }

    #[test]
    fn test_reply_to_response_mid_degenerates_to_async_send() {
        let (mut actor, peer) = fixture();
        let envelope = Envelope::new(
            peer.address(),
            MessageId::from_request_number(3).response_id(),
            Message::empty(),
        );
        actor.set_current(envelope);
        actor.reply_message(7i64);
        actor.reply_message(8i64);

        // Both replies go out as plain async sends; the answered flag only
        // guards the valid-request path.
        let first = peer.mailbox().try_dequeue().unwrap();
        assert!(!first.mid.is_response());
        assert!(!first.mid.is_valid());
        let second = peer.mailbox().try_dequeue().unwrap();
        assert_eq!(second.message.value::<i64>(0), Some(8));
    }

    #[test]
    fn test_reply_without_sender_or_current_drops() {
        let (mut actor, peer) = fixture();
        // No current element at all.
        actor.reply_message(1i64);
        // Anonymous sender.
        actor.set_current(Envelope::new(
            Address::invalid(),
            MessageId::from_request_number(4),
            Message::empty(),
        ));
        actor.reply_message(2i64);
        assert!(peer.mailbox().try_dequeue().is_none());
    }

    #[test]
    fn test_forward_rewrites_priority_and_consumes_current() {
        let (mut actor, peer) = fixture();
        let third = ActorCell::new(Arc::clone(peer.system()), None);
        actor.set_current(request_from(&peer, 5));
        actor.forward_message(&third.address(), MessagePriority::High);

        let forwarded = third.mailbox().try_dequeue().unwrap();
        // Sender preserved, priority rewritten, correlation untouched.
        assert_eq!(forwarded.sender.id(), peer.id());
        assert!(forwarded.mid.is_high_priority());
        assert_eq!(forwarded.mid.request_number(), 5);

        assert!(actor.last_dequeued().is_err());
        assert!(actor.last_sender().is_err());
    }

    #[test]
    fn test_forward_to_invalid_keeps_current() {
        let (mut actor, peer) = fixture();
        actor.set_current(request_from(&peer, 6));
        actor.forward_message(&Address::invalid(), MessagePriority::Normal);
        assert!(actor.last_dequeued().is_ok());
    }

    #[test]
    fn test_last_accessors_fail_outside_handler() {
        let (actor, _peer) = fixture();
        assert_eq!(actor.last_dequeued().unwrap_err(), ActorError::NoCurrentMessage);
        assert_eq!(actor.last_sender().unwrap_err(), ActorError::NoCurrentMessage);
    }

    #[test]
    fn test_response_promise_marks_answered_and_delivers() {
        let (mut actor, peer) = fixture();
        actor.set_current(request_from(&peer, 7));
        let promise = actor.make_response_promise();
        assert!(promise.is_pending());
        assert!(actor.take_current().unwrap().mid.is_answered());

        promise.deliver(21i64);
        let response = peer.mailbox().try_dequeue().unwrap();
        assert!(response.mid.is_response());
        assert_eq!(response.mid.request_number(), 7);
        assert_eq!(response.message.value::<i64>(0), Some(21));
    }

    #[test]
    fn test_empty_promise_drops_fulfillment() {
        let (mut actor, peer) = fixture();
        let promise = actor.make_response_promise();
        assert!(!promise.is_pending());
        promise.deliver(1i64);
        assert!(peer.mailbox().try_dequeue().is_none());
    }

    #[test]
    fn test_sync_send_to_invalid_target_fails() {
        let (actor, _peer) = fixture();
        let outcome =
            actor.sync_send_impl(MessagePriority::Normal, &Address::invalid(), Message::empty());
        assert_eq!(outcome.unwrap_err(), ActorError::InvalidTarget);
    }

    #[test]
    fn test_sync_send_stamps_priority_and_returns_response_id() {
        let (actor, peer) = fixture();
        let response_id = actor
            .sync_send_impl(MessagePriority::High, &peer.address(), Message::empty())
            .unwrap();
        assert!(response_id.is_response());
        assert!(response_id.is_high_priority());

        let request = peer.mailbox().try_dequeue().unwrap();
        assert!(!request.mid.is_response());
        assert!(request.mid.is_high_priority());
        assert_eq!(request.mid.response_id(), response_id);
    }

    #[test]
    fn test_send_to_invalid_target_is_silent() {
        let (actor, _peer) = fixture();
        actor.send(&Address::invalid(), 1i64);
        actor.monitor(&Address::invalid());
        actor.demonitor(&Address::invalid());
    }

    #[test]
    fn test_quit_records_planned_reason() {
        let (actor, _peer) = fixture();
        let exited = actor.quit(ExitReason::user(3));
        assert_eq!(exited.reason, ExitReason::user(3));
        assert_eq!(actor.cell().planned_exit_reason(), ExitReason::user(3));
    }
}
