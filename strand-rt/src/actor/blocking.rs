//! Blocking actors: cooperative receive loops on a dedicated OS thread.
//!
//! A blocking actor runs a user-supplied `act` procedure to completion on
//! its own thread. The procedure drives message processing through the
//! receive combinator family: [`receive`](BlockingActor::receive),
//! [`receive_loop`](BlockingActor::receive_loop),
//! [`receive_for`](BlockingActor::receive_for),
//! [`receive_while`](BlockingActor::receive_while) and
//! [`do_receive`](BlockingActor::do_receive), each of which blocks until
//! an envelope matches the supplied behavior.
//!
//! Envelopes that do not match are stashed in a per-actor skip buffer and
//! reconsidered, in arrival order, by the next dequeue with a fresh
//! behavior. Response envelopes are correlated against the pending-sync map
//! instead of the behavior; a response nobody waits for anymore is dropped.

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use super::address::Address;
use super::behavior::Behavior;
use super::cell::ActorCell;
use super::context::ReceiveContext;
use super::error::{ActorError, ActorExited, ActorResult};
use super::local::{LocalActor, ResponsePromise};
use crate::group::Group;
use crate::mailbox::DequeueOutcome;
use crate::message::{
    Envelope, ExitMsg, ExitReason, IntoMessage, Message, MessageId, MessagePriority,
};
use crate::system::ActorSystem;
use crate::util::ActorId;

/// What the matching engine decided to do with one envelope.
enum Selection {
    /// Run the behavior clause at this index.
    Clause(usize),
    /// This is the response a targeted dequeue is waiting for.
    AwaitedResponse,
    /// This response resolves an installed continuation.
    PendingSync,
    /// Nobody wants this envelope anymore; drop it.
    Discard,
    /// Keep it in the skip buffer for a later behavior.
    Stash,
    /// An exit demand no clause traps; terminate with its reason.
    ExitUnhandled(ExitReason),
}

/// A blocking actor: [`LocalActor`] plus the receive-loop state.
pub struct BlockingActor {
    pub(crate) core: LocalActor,
    /// Envelopes that arrived but did not match the behavior in force.
    skip_buffer: VecDeque<Envelope>,
    /// Installed continuations: response id to run against.
    pending_sync: HashMap<MessageId, Behavior>,
}

impl BlockingActor {
    pub(crate) fn new(cell: Arc<ActorCell>) -> Self {
        Self {
            core: LocalActor::new(cell),
            skip_buffer: VecDeque::new(),
            pending_sync: HashMap::new(),
        }
    }

    // --- addressing and plain sends (delegated to the core) ---

    /// This actor's stable id.
    pub fn id(&self) -> ActorId {
        self.core.id()
    }

    /// This actor's weak address.
    pub fn address(&self) -> Address {
        self.core.address()
    }

    /// Handle to the owning actor system.
    pub fn system(&self) -> ActorSystem {
        self.core.system()
    }

    /// Asynchronous send; see [`LocalActor::send`].
    pub fn send(&self, target: &Address, message: impl IntoMessage) {
        self.core.send(target, message);
    }

    /// Asynchronous send in an explicit priority class.
    pub fn send_with_priority(
        &self,
        priority: MessagePriority,
        target: &Address,
        message: impl IntoMessage,
    ) {
        self.core.send_with_priority(priority, target, message);
    }

    /// Demand an exit from another actor; see [`LocalActor::send_exit`].
    pub fn send_exit(&self, target: &Address, reason: ExitReason) {
        self.core.send_exit(target, reason);
    }

    /// Timer-driven send; see [`LocalActor::delayed_send`].
    pub fn delayed_send(&self, delay: Duration, target: &Address, message: impl IntoMessage) {
        self.core.delayed_send(delay, target, message);
    }

    /// Timer-driven send in an explicit priority class.
    pub fn delayed_send_with_priority(
        &self,
        priority: MessagePriority,
        delay: Duration,
        target: &Address,
        message: impl IntoMessage,
    ) {
        self.core
            .delayed_send_with_priority(priority, delay, target, message);
    }

    /// Reply to the current envelope; see [`LocalActor::reply_message`].
    pub fn reply_message(&mut self, message: impl IntoMessage) {
        self.core.reply_message(message);
    }

    /// Forward the current envelope; see [`LocalActor::forward_message`].
    pub fn forward_message(&mut self, dest: &Address, priority: MessagePriority) {
        self.core.forward_message(dest, priority);
    }

    /// Capture a reply slot; see [`LocalActor::make_response_promise`].
    pub fn make_response_promise(&mut self) -> ResponsePromise {
        self.core.make_response_promise()
    }

    /// Observe another actor's exit; see [`LocalActor::monitor`].
    pub fn monitor(&self, target: &Address) {
        self.core.monitor(target);
    }

    /// Remove a monitor; see [`LocalActor::demonitor`].
    pub fn demonitor(&self, target: &Address) {
        self.core.demonitor(target);
    }

    /// Link to a peer actor; see [`LocalActor::link_to`].
    pub fn link_to(&self, peer: &Address) {
        self.core.link_to(peer);
    }

    /// Remove a link; see [`LocalActor::unlink_from`].
    pub fn unlink_from(&self, peer: &Address) {
        self.core.unlink_from(peer);
    }

    /// Subscribe to a group, idempotently; see [`LocalActor::join`].
    pub fn join(&self, group: &Group) {
        self.core.join(group);
    }

    /// Unsubscribe from a group; see [`LocalActor::leave`].
    pub fn leave(&self, group: &Group) {
        self.core.leave(group);
    }

    /// Current group subscriptions.
    pub fn joined_groups(&self) -> Vec<Group> {
        self.core.joined_groups()
    }

    /// Payload of the envelope currently being handled.
    pub fn last_dequeued(&self) -> Result<&Message, ActorError> {
        self.core.last_dequeued()
    }

    /// Sender of the envelope currently being handled.
    pub fn last_sender(&self) -> Result<Address, ActorError> {
        self.core.last_sender()
    }

    /// Record the exit reason and obtain the control-flow token to return.
    pub fn quit(&self, reason: ExitReason) -> ActorExited {
        self.core.quit(reason)
    }

    // --- synchronous requests ---

    /// Issue a request and obtain the handle for installing or awaiting
    /// its continuation. Fails on an invalid or vanished target.
    pub fn sync_send(
        &mut self,
        dest: &Address,
        message: impl IntoMessage,
    ) -> Result<ResponseHandle<'_>, ActorError> {
        self.sync_send_with_priority(MessagePriority::Normal, dest, message)
    }

    /// As [`Self::sync_send`] with an explicit priority class.
    pub fn sync_send_with_priority(
        &mut self,
        priority: MessagePriority,
        dest: &Address,
        message: impl IntoMessage,
    ) -> Result<ResponseHandle<'_>, ActorError> {
        let id = self
            .core
            .sync_send_impl(priority, dest, message.into_message())?;
        Ok(ResponseHandle { actor: self, id })
    }

    /// Issue a request with a timeout: whichever of the response and the
    /// timeout notification arrives first resolves the continuation, and
    /// the loser is dropped.
    pub fn timed_sync_send(
        &mut self,
        dest: &Address,
        timeout: Duration,
        message: impl IntoMessage,
    ) -> Result<ResponseHandle<'_>, ActorError> {
        self.timed_sync_send_with_priority(MessagePriority::Normal, dest, timeout, message)
    }

    /// As [`Self::timed_sync_send`] with an explicit priority class.
    pub fn timed_sync_send_with_priority(
        &mut self,
        priority: MessagePriority,
        dest: &Address,
        timeout: Duration,
        message: impl IntoMessage,
    ) -> Result<ResponseHandle<'_>, ActorError> {
        let id = self
            .core
            .timed_sync_send_impl(priority, dest, timeout, message.into_message())?;
        Ok(ResponseHandle { actor: self, id })
    }

    // --- receive combinator family ---

    /// Dequeue the next envelope matched by `behavior` and run its handler.
    pub fn receive(&mut self, mut behavior: Behavior) -> ActorResult<()> {
        self.dequeue(&mut behavior)
    }

    /// Receive forever with one behavior, built once. Returns only through
    /// the exit path.
    pub fn receive_loop(&mut self, mut behavior: Behavior) -> ActorResult<()> {
        loop {
            self.dequeue(&mut behavior)?;
        }
    }

    /// Receive while `*counter != end`, incrementing the caller's counter
    /// after each successful dequeue.
    pub fn receive_for(
        &mut self,
        counter: &mut usize,
        end: usize,
        mut behavior: Behavior,
    ) -> ActorResult<()> {
        while *counter != end {
            self.dequeue(&mut behavior)?;
            *counter += 1;
        }
        Ok(())
    }

    /// Receive while the predicate holds, checked before each iteration.
    pub fn receive_while<P>(&mut self, mut predicate: P, mut behavior: Behavior) -> ActorResult<()>
    where
        P: FnMut() -> bool,
    {
        while predicate() {
            self.dequeue(&mut behavior)?;
        }
        Ok(())
    }

    /// Receive at least once, stopping when the predicate first holds
    /// *after* a dequeue: `do_receive(b).until(p)`.
    pub fn do_receive(&mut self, behavior: Behavior) -> DoReceive<'_> {
        DoReceive {
            actor: self,
            behavior,
        }
    }

    /// Block until every other actor in the system has finished.
    pub fn await_all_other_actors_done(&self) {
        let id = self.id();
        self.core
            .cell()
            .system()
            .registry()
            .wait_until_zero_other(&id);
    }

    // --- matching engine ---

    pub(crate) fn dequeue(&mut self, behavior: &mut Behavior) -> ActorResult<()> {
        self.dequeue_response(behavior, None)
    }

    /// One full dequeue: scan the skip buffer, then block on the mailbox
    /// until something matches, the behavior timeout fires, or the actor
    /// exits. `awaited` narrows matching to a single response id.
    fn dequeue_response(
        &mut self,
        behavior: &mut Behavior,
        awaited: Option<MessageId>,
    ) -> ActorResult<()> {
        // Once an exit reason is planned, no further handlers may run.
        self.check_not_exited()?;

        let mut index = 0;
        while index < self.skip_buffer.len() {
            match self.classify(&self.skip_buffer[index], behavior, awaited) {
                Selection::Stash => index += 1,
                Selection::Discard => {
                    let _ = self.skip_buffer.remove(index);
                }
                selection => {
                    let Some(envelope) = self.skip_buffer.remove(index) else {
                        break;
                    };
                    return self.consume(envelope, selection, behavior);
                }
            }
        }

        let deadline = behavior
            .timeout_duration()
            .map(|timeout| Instant::now() + timeout);
        loop {
            match self.core.cell().mailbox().dequeue(deadline) {
                DequeueOutcome::Message(envelope) => {
                    match self.classify(&envelope, behavior, awaited) {
                        Selection::Stash => self.skip_buffer.push_back(envelope),
                        Selection::Discard => drop(envelope),
                        selection => return self.consume(envelope, selection, behavior),
                    }
                }
                DequeueOutcome::TimedOut => {
                    {
                        let mut ctx = ReceiveContext { actor: self };
                        behavior.invoke_timeout(&mut ctx);
                    }
                    return self.check_not_exited();
                }
                DequeueOutcome::Closed => {
                    debug!(actor = %self.id(), "mailbox closed during receive");
                    let planned = self.core.cell().planned_exit_reason();
                    let reason = if planned.is_exited() {
                        planned
                    } else {
                        ExitReason::NORMAL
                    };
                    return Err(ActorExited::new(reason));
                }
            }
        }
    }

    fn classify(
        &self,
        envelope: &Envelope,
        behavior: &Behavior,
        awaited: Option<MessageId>,
    ) -> Selection {
        if envelope.mid.is_response() {
            if awaited == Some(envelope.mid) {
                return Selection::AwaitedResponse;
            }
            if self.pending_sync.contains_key(&envelope.mid) {
                return Selection::PendingSync;
            }
            // The request was already resolved (usually by the other side
            // of a response/timeout race); the loser is dropped.
            trace!(mid = %envelope.mid, "dropping response nobody awaits");
            return Selection::Discard;
        }
        if awaited.is_none() {
            if let Some(index) = behavior.first_match(&envelope.message) {
                return Selection::Clause(index);
            }
        }
        // An exit demand nobody traps: normal exits are dropped, everything
        // else takes the actor down.
        if envelope.message.len() == 1 {
            if let Some(exit) = envelope.message.value::<ExitMsg>(0) {
                if exit.reason.is_normal() {
                    return Selection::Discard;
                }
                return Selection::ExitUnhandled(exit.reason);
            }
        }
        Selection::Stash
    }

    fn consume(
        &mut self,
        envelope: Envelope,
        selection: Selection,
        behavior: &mut Behavior,
    ) -> ActorResult<()> {
        match selection {
            Selection::Clause(index) => self.invoke(envelope, behavior, index),
            Selection::AwaitedResponse => match behavior.first_match(&envelope.message) {
                Some(index) => self.invoke(envelope, behavior, index),
                None => {
                    warn!(mid = %envelope.mid, "awaited response did not match the continuation, dropping");
                    self.check_not_exited()
                }
            },
            Selection::PendingSync => {
                let Some(mut continuation) = self.pending_sync.remove(&envelope.mid) else {
                    return self.check_not_exited();
                };
                match continuation.first_match(&envelope.message) {
                    Some(index) => self.invoke(envelope, &mut continuation, index),
                    None => {
                        warn!(mid = %envelope.mid, "sync response did not match the installed continuation, dropping");
                        self.check_not_exited()
                    }
                }
            }
            Selection::ExitUnhandled(reason) => {
                debug!(actor = %self.id(), %reason, "untrapped exit demand");
                Err(self.quit(reason))
            }
            // classify never hands these to consume; treat defensively.
            Selection::Stash | Selection::Discard => self.check_not_exited(),
        }
    }

    /// Run one matched clause with the envelope as the current element,
    /// then settle the reply obligation and the exit check.
    fn invoke(
        &mut self,
        envelope: Envelope,
        behavior: &mut Behavior,
        index: usize,
    ) -> ActorResult<()> {
        self.core.set_current(envelope);
        {
            let mut ctx = ReceiveContext { actor: self };
            behavior.invoke_clause(index, &mut ctx);
        }
        if let Some(envelope) = self.core.take_current() {
            self.autoreply(&envelope);
        }
        self.check_not_exited()
    }

    /// Synchronous requests always receive a response: if the handler
    /// neither replied nor captured a promise nor forwarded the envelope,
    /// answer with the empty message. The answered flag is the sole
    /// suppressor.
    fn autoreply(&self, envelope: &Envelope) {
        let mid = envelope.mid;
        if !envelope.sender.is_valid()
            || !mid.is_valid()
            || mid.is_response()
            || mid.is_answered()
        {
            return;
        }
        let Some(target) = envelope.sender.upgrade() else {
            return;
        };
        target.enqueue(Envelope::new(
            self.address(),
            mid.response_id(),
            Message::empty(),
        ));
    }

    fn check_not_exited(&self) -> ActorResult<()> {
        let planned = self.core.cell().planned_exit_reason();
        if planned.is_exited() {
            Err(ActorExited::new(planned))
        } else {
            Ok(())
        }
    }
}

/// Builder returned by [`BlockingActor::do_receive`].
#[must_use = "call until() to actually receive"]
pub struct DoReceive<'a> {
    actor: &'a mut BlockingActor,
    behavior: Behavior,
}

impl DoReceive<'_> {
    /// Dequeue repeatedly until the predicate first returns true after a
    /// dequeue. Always dequeues at least once.
    pub fn until<P>(mut self, mut predicate: P) -> ActorResult<()>
    where
        P: FnMut() -> bool,
    {
        loop {
            self.actor.dequeue(&mut self.behavior)?;
            if predicate() {
                return Ok(());
            }
        }
    }
}

/// Handle to an issued request, returned by the `sync_send` family.
///
/// Either install the continuation and keep going ([`Self::then`]) or block
/// on it right away ([`Self::receive`]).
#[must_use = "a request without a continuation can never be resolved"]
pub struct ResponseHandle<'a> {
    actor: &'a mut BlockingActor,
    id: MessageId,
}

impl ResponseHandle<'_> {
    /// The id the response will carry.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Install `continuation` in the pending-sync map; it runs (at most
    /// once) when a later dequeue pulls the matching response.
    pub fn then(self, continuation: Behavior) {
        self.actor.pending_sync.insert(self.id, continuation);
    }

    /// Block until the response (or its timeout notification) arrives and
    /// run it against `continuation`. Non-matching envelopes arriving in
    /// the meantime are stashed as usual.
    pub fn receive(self, mut continuation: Behavior) -> ActorResult<()> {
        self.actor.dequeue_response(&mut continuation, Some(self.id))
    }
}

/// Boxed actor body, as bound by [`IntoAct`].
#[doc(hidden)]
pub type ActFn = Box<dyn FnOnce(&mut BlockingActor) -> ActorResult<()> + Send + 'static>;

#[doc(hidden)]
pub struct WithActorMarker;
#[doc(hidden)]
pub struct WithActorUnitMarker;
#[doc(hidden)]
pub struct NoActorMarker;
#[doc(hidden)]
pub struct NoActorUnitMarker;

/// Conversion of user callables into actor bodies.
///
/// Spawn accepts closures that take the actor as their first argument or
/// not, and that return [`ActorResult`] or nothing; the marker parameter
/// lets the compiler pick the right binding.
pub trait IntoAct<Marker> {
    #[doc(hidden)]
    fn into_act(self) -> ActFn;
}

impl<F> IntoAct<WithActorMarker> for F
where
    F: FnOnce(&mut BlockingActor) -> ActorResult<()> + Send + 'static,
{
    fn into_act(self) -> ActFn {
        Box::new(self)
    }
}

impl<F> IntoAct<WithActorUnitMarker> for F
where
    F: FnOnce(&mut BlockingActor) + Send + 'static,
{
    fn into_act(self) -> ActFn {
        Box::new(move |actor| {
            self(actor);
            Ok(())
        })
    }
}

impl<F> IntoAct<NoActorMarker> for F
where
    F: FnOnce() -> ActorResult<()> + Send + 'static,
{
    fn into_act(self) -> ActFn {
        Box::new(move |_actor| self())
    }
}

impl<F> IntoAct<NoActorUnitMarker> for F
where
    F: FnOnce() + Send + 'static,
{
    fn into_act(self) -> ActFn {
        Box::new(move |_actor| {
            self();
            Ok(())
        })
    }
}

/// Run one blocking actor to completion on the current thread.
///
/// Converts the three ways out of `act` into a final exit reason: a clean
/// return uses the planned reason (or normal), the control-flow error
/// carries its own, and a panic becomes `UNHANDLED_EXCEPTION`. Cleanup
/// runs exactly once in all cases.
pub(crate) fn run_actor(mut actor: BlockingActor, act: ActFn) {
    let id = actor.id();
    debug!(actor = %id, "blocking actor started");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| act(&mut actor)));
    let reason = match outcome {
        Ok(Ok(())) => {
            let planned = actor.core.cell().planned_exit_reason();
            if planned.is_exited() {
                planned
            } else {
                ExitReason::NORMAL
            }
        }
        Ok(Err(exited)) => exited.reason,
        Err(_) => {
            warn!(actor = %id, "actor body panicked");
            ExitReason::UNHANDLED_EXCEPTION
        }
    };
    actor.core.cleanup(reason);
    debug!(actor = %id, %reason, "blocking actor finished");
}
