//! Shared per-actor state.
//!
//! The cell is the part of an actor that other threads can reach: the
//! mailbox, the attachable list, the request-id counter and the exit
//! bookkeeping. Strong handles ([`ActorRef`](super::address::ActorRef))
//! hold the cell alive; addresses hold it weakly. Everything the owning
//! thread keeps to itself (current envelope, skip buffer, pending sync map)
//! lives outside the cell.

// Layer 1: Standard library imports
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use super::address::Address;
use super::attachable::{AttachToken, Attachable};
use crate::group::Group;
use crate::mailbox::Mailbox;
use crate::message::{Envelope, ExitReason, MessageId};
use crate::system::SystemCore;
use crate::util::ActorId;

struct CellState {
    attachables: Vec<Attachable>,
    registered: bool,
    cleaned: bool,
}

pub(crate) struct ActorCell {
    id: ActorId,
    name: Option<String>,
    mailbox: Mailbox,
    /// Next request sequence number; zero is reserved for async ids.
    request_seq: AtomicU64,
    /// Deferred exit reason recorded by `quit`, applied at cleanup.
    planned_exit: AtomicU32,
    /// Final exit reason, written exactly once by `cleanup`.
    final_exit: AtomicU32,
    state: Mutex<CellState>,
    self_weak: Weak<ActorCell>,
    system: Arc<SystemCore>,
}

impl ActorCell {
    /// Create a fresh cell wired to the given system.
    ///
    /// The returned `Arc` is the actor's initial reference; spawn hands out
    /// further strong handles (registry, caller) from it. Creating the cell
    /// before anything else runs means publishing the address from actor
    /// setup code can never race the actor's own destruction.
    pub(crate) fn new(system: Arc<SystemCore>, name: Option<String>) -> Arc<Self> {
        let warn_threshold = system.config().mailbox_warn_threshold;
        Arc::new_cyclic(|self_weak| Self {
            id: ActorId::new(),
            name,
            mailbox: Mailbox::new(warn_threshold),
            request_seq: AtomicU64::new(1),
            planned_exit: AtomicU32::new(ExitReason::NOT_EXITED.code()),
            final_exit: AtomicU32::new(ExitReason::NOT_EXITED.code()),
            state: Mutex::new(CellState {
                attachables: Vec::new(),
                registered: false,
                cleaned: false,
            }),
            self_weak: self_weak.clone(),
            system,
        })
    }

    pub(crate) fn id(&self) -> ActorId {
        self.id
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn address(&self) -> Address {
        Address::new(self.id, self.self_weak.clone())
    }

    pub(crate) fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub(crate) fn system(&self) -> &Arc<SystemCore> {
        &self.system
    }

    /// Allocate the next request id (monotonic, per actor).
    pub(crate) fn new_request_id(&self) -> MessageId {
        MessageId::from_request_number(self.request_seq.fetch_add(1, Ordering::Relaxed))
    }

    /// Deliver an envelope, dropping it silently if the actor is gone.
    pub(crate) fn enqueue(&self, envelope: Envelope) -> bool {
        if self.is_cleaned_up() {
            trace!(actor = %self.id, "dropping envelope for terminated actor");
            return false;
        }
        self.mailbox.enqueue(envelope)
    }

    pub(crate) fn planned_exit_reason(&self) -> ExitReason {
        ExitReason::from_code(self.planned_exit.load(Ordering::Acquire))
    }

    pub(crate) fn set_planned_exit_reason(&self, reason: ExitReason) {
        self.planned_exit.store(reason.code(), Ordering::Release);
    }

    /// The final exit reason, or `NOT_EXITED` while the actor still runs.
    pub(crate) fn exit_reason(&self) -> ExitReason {
        ExitReason::from_code(self.final_exit.load(Ordering::Acquire))
    }

    pub(crate) fn is_cleaned_up(&self) -> bool {
        self.exit_reason().is_exited()
    }

    pub(crate) fn set_registered(&self, registered: bool) {
        self.state.lock().registered = registered;
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.state.lock().registered
    }

    /// Install a lifecycle observer.
    ///
    /// When the actor is already cleaned up the observer fires immediately
    /// with the final exit reason instead of being stored.
    pub(crate) fn attach(&self, attachable: Attachable) {
        {
            let mut state = self.state.lock();
            if !state.cleaned {
                state.attachables.push(attachable);
                return;
            }
        }
        attachable.on_exit(&self.address(), self.exit_reason());
    }

    /// Remove every attachable the token names; returns how many.
    pub(crate) fn detach(&self, token: &AttachToken) -> usize {
        let mut state = self.state.lock();
        Self::detach_from(&mut state.attachables, token, false, false)
    }

    /// Core removal walk over an attachable list.
    ///
    /// `dry_run` counts without removing; `stop_on_first` returns after the
    /// first hit. The dry-run/stop-on-first combination is what makes
    /// membership checks cheap without a second bookkeeping structure.
    fn detach_from(
        list: &mut Vec<Attachable>,
        token: &AttachToken,
        dry_run: bool,
        stop_on_first: bool,
    ) -> usize {
        let mut count = 0;
        let mut index = 0;
        while index < list.len() {
            if list[index].matches(token) {
                count += 1;
                if !dry_run {
                    list.remove(index);
                } else {
                    index += 1;
                }
                if stop_on_first {
                    break;
                }
            } else {
                index += 1;
            }
        }
        count
    }

    /// Subscribe to a group, once.
    ///
    /// A subscription token for the group already present in the list makes
    /// this a no-op, so repeated joins never double-subscribe.
    pub(crate) fn join_group(&self, group: &Group) {
        let address = self.address();
        let token = AttachToken::Subscription(group.clone());
        let mut state = self.state.lock();
        if state.cleaned {
            return;
        }
        if Self::detach_from(&mut state.attachables, &token, true, true) == 0
            && group.subscribe(address)
        {
            state.attachables.push(Attachable::Subscription {
                group: group.clone(),
            });
        }
    }

    /// Drop a group membership if present.
    pub(crate) fn leave_group(&self, group: &Group) {
        if self.detach(&AttachToken::Subscription(group.clone())) > 0 {
            group.unsubscribe(&self.id);
        }
    }

    /// Groups this actor is currently subscribed to.
    pub(crate) fn joined_groups(&self) -> Vec<Group> {
        let state = self.state.lock();
        state
            .attachables
            .iter()
            .filter_map(|attachable| match attachable {
                Attachable::Subscription { group } => Some(group.clone()),
                _ => None,
            })
            .collect()
    }

    /// Terminate the actor: record the final reason, close the mailbox,
    /// fire every attachable in attach order and deregister.
    ///
    /// Returns `false` when a previous call already ran; everything past
    /// the first call is a no-op.
    pub(crate) fn cleanup(&self, reason: ExitReason) -> bool {
        let attachables = {
            let mut state = self.state.lock();
            if state.cleaned {
                return false;
            }
            state.cleaned = true;
            self.final_exit.store(reason.code(), Ordering::Release);
            std::mem::take(&mut state.attachables)
        };
        let discarded = self.mailbox.close();
        debug!(actor = %self.id, %reason, discarded, "actor cleanup");
        let address = self.address();
        for attachable in attachables {
            // An observer callback must not take the remaining observers
            // down with it.
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| attachable.on_exit(&address, reason)));
            if outcome.is_err() {
                warn!(actor = %self.id, "attachable exit callback panicked, continuing");
            }
        }
        let was_registered = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.registered, false)
        };
        if was_registered {
            self.system.registry().unregister(&self.id);
        }
        true
    }
}
