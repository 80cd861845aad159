//! Process-wide actor registry.
//!
//! Tracks every live actor by id (and by name, when one was given), keeps
//! the running count, and provides the condition-variable wait behind
//! await-all-done. The registry holds one strong handle per actor, which
//! keeps the actor's cell alive while it runs even if every user handle is
//! dropped; cleanup releases it.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

// Layer 3: Internal module imports
use crate::actor::ActorRef;
use crate::util::ActorId;

#[derive(Default)]
pub(crate) struct Registry {
    actors: DashMap<ActorId, ActorRef>,
    names: DashMap<String, ActorId>,
    running: Mutex<usize>,
    zero: Condvar,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add an actor; called by spawn before the actor thread starts.
    pub(crate) fn register(&self, actor: ActorRef) {
        let id = actor.id();
        if let Some(name) = actor.name() {
            self.names.insert(name.to_owned(), id);
        }
        self.actors.insert(id, actor);
        let mut running = self.running.lock();
        *running += 1;
        debug!(actor = %id, running = *running, "actor registered");
    }

    /// Remove an actor; called exactly once from cleanup.
    pub(crate) fn unregister(&self, id: &ActorId) {
        let Some((_, actor)) = self.actors.remove(id) else {
            return;
        };
        if let Some(name) = actor.name() {
            self.names.remove_if(name, |_, named_id| named_id == id);
        }
        let mut running = self.running.lock();
        *running = running.saturating_sub(1);
        debug!(actor = %id, running = *running, "actor unregistered");
        drop(running);
        self.zero.notify_all();
    }

    /// Number of currently registered actors.
    pub(crate) fn count(&self) -> usize {
        *self.running.lock()
    }

    /// Strong handle by id, while the actor is registered.
    pub(crate) fn find(&self, id: &ActorId) -> Option<ActorRef> {
        self.actors.get(id).map(|entry| entry.value().clone())
    }

    /// Strong handle by registered name.
    pub(crate) fn find_named(&self, name: &str) -> Option<ActorRef> {
        let id = *self.names.get(name)?;
        self.find(&id)
    }

    /// Block until no actor other than `me` is registered.
    pub(crate) fn wait_until_zero_other(&self, me: &ActorId) {
        let mut running = self.running.lock();
        loop {
            let own = usize::from(self.actors.contains_key(me));
            if *running <= own {
                return;
            }
            self.zero.wait(&mut running);
        }
    }

    /// Block until no actor is registered at all.
    pub(crate) fn wait_until_zero(&self) {
        let mut running = self.running.lock();
        while *running > 0 {
            self.zero.wait(&mut running);
        }
    }
}
