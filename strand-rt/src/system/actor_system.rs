//! The actor system: spawning, groups, registry and timer ownership.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::thread;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tracing::debug;

// Layer 3: Internal module imports
use super::config::SystemConfig;
use super::errors::SystemError;
use super::registry::Registry;
use crate::actor::blocking::{run_actor, ActFn, IntoAct};
use crate::actor::cell::ActorCell;
use crate::actor::{ActorRef, BlockingActor};
use crate::group::Group;
use crate::scheduler::Scheduler;
use crate::util::ActorId;

/// Shared backbone of one actor system: configuration, registry, timer and
/// the group table. Injected into every actor cell, so the core carries no
/// process-wide singletons and systems stay independently testable.
pub(crate) struct SystemCore {
    config: SystemConfig,
    registry: Registry,
    scheduler: Scheduler,
    groups: DashMap<String, Group>,
}

impl SystemCore {
    pub(crate) fn new(config: SystemConfig) -> Arc<Self> {
        let scheduler = Scheduler::new(format!("{}/timer", config.name));
        Arc::new(Self {
            config,
            registry: Registry::new(),
            scheduler,
            groups: DashMap::new(),
        })
    }

    pub(crate) fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl Drop for SystemCore {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}

/// Handle to an actor system.
///
/// Cloning is cheap and every clone refers to the same system. The system
/// itself stays alive while any handle or any running actor exists; the
/// timer thread stops when the last of those goes away.
///
/// # Example
///
/// ```rust,ignore
/// let system = ActorSystem::new(SystemConfig::default())?;
/// let echo = system.spawn(|actor: &mut BlockingActor| {
///     actor.receive(Behavior::new().on(|ctx, x: i64| ctx.reply(x + 1)))
/// })?;
/// system.await_all_actors_done();
/// ```
#[derive(Clone)]
pub struct ActorSystem {
    core: Arc<SystemCore>,
}

impl ActorSystem {
    /// Create a system from a validated configuration.
    pub fn new(config: SystemConfig) -> Result<Self, SystemError> {
        config.validate().map_err(SystemError::InvalidConfig)?;
        debug!(system = %config.name, "actor system created");
        Ok(Self {
            core: SystemCore::new(config),
        })
    }

    pub(crate) fn from_core(core: Arc<SystemCore>) -> Self {
        Self { core }
    }

    /// The system's configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.core.config
    }

    /// Spawn an anonymous blocking actor running `act` on its own thread.
    ///
    /// `act` may take the actor as its first argument or not, and may
    /// return [`ActorResult`](crate::actor::ActorResult) or nothing.
    pub fn spawn<F, Marker>(&self, act: F) -> Result<ActorRef, SystemError>
    where
        F: IntoAct<Marker>,
    {
        self.spawn_impl(None, act.into_act())
    }

    /// Spawn a named blocking actor; the name is registered for
    /// [`Self::find_named`] lookup and used in the thread name.
    pub fn spawn_named<F, Marker>(
        &self,
        name: impl Into<String>,
        act: F,
    ) -> Result<ActorRef, SystemError>
    where
        F: IntoAct<Marker>,
    {
        self.spawn_impl(Some(name.into()), act.into_act())
    }

    fn spawn_impl(&self, name: Option<String>, act: ActFn) -> Result<ActorRef, SystemError> {
        let cell = ActorCell::new(Arc::clone(&self.core), name);
        let actor_ref = ActorRef::from_cell(Arc::clone(&cell));
        // Registration happens before the thread exists so the running
        // count already covers this actor when spawn returns.
        cell.set_registered(true);
        self.core.registry.register(actor_ref.clone());

        let thread_name = match cell.name() {
            Some(name) => format!("{}/{}", self.core.config.name, name),
            None => format!("{}/{}", self.core.config.name, cell.id()),
        };
        let spawned = thread::Builder::new().name(thread_name).spawn(move || {
            let actor = BlockingActor::new(cell);
            run_actor(actor, act);
        });
        match spawned {
            Ok(_handle) => Ok(actor_ref),
            Err(err) => {
                actor_ref.cell().set_registered(false);
                self.core.registry.unregister(&actor_ref.id());
                Err(SystemError::SpawnFailed(err))
            }
        }
    }

    /// The group registered under `name`, created on first use.
    pub fn group(&self, name: &str) -> Group {
        self.core
            .groups
            .entry(name.to_owned())
            .or_insert_with(|| Group::new(name))
            .clone()
    }

    /// Strong handle to a registered actor by id.
    pub fn find(&self, id: &ActorId) -> Option<ActorRef> {
        self.core.registry.find(id)
    }

    /// Strong handle to a registered actor by name.
    pub fn find_named(&self, name: &str) -> Option<ActorRef> {
        self.core.registry.find_named(name)
    }

    /// Number of actors currently registered (spawned and not yet cleaned
    /// up).
    pub fn running_actors(&self) -> usize {
        self.core.registry.count()
    }

    /// Block the calling (non-actor) thread until every actor has
    /// finished. Actors use
    /// [`await_all_other_actors_done`](BlockingActor::await_all_other_actors_done)
    /// instead.
    pub fn await_all_actors_done(&self) {
        self.core.registry.wait_until_zero();
    }
}

impl std::fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.core.config.name)
            .field("running_actors", &self.running_actors())
            .finish()
    }
}
