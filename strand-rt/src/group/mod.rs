//! Local named groups.
//!
//! A group is an in-process broadcast channel: actors subscribe through
//! [`join`](crate::actor::LocalActor::join), and anything published to the
//! group is enqueued on every current member's mailbox. Group identity is
//! the shared allocation, not the name; two systems can both own a group
//! called `"workers"` without interfering. Membership transport beyond the
//! local process is out of scope here.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tracing::trace;

// Layer 3: Internal module imports
use crate::actor::Address;
use crate::message::{Envelope, IntoMessage, MessageId, MessagePriority};
use crate::util::ActorId;

struct GroupInner {
    name: String,
    members: Mutex<HashMap<ActorId, Address>>,
}

/// Handle to a local group. Cheap to clone; equality is identity.
#[derive(Clone)]
pub struct Group {
    inner: Arc<GroupInner>,
}

impl Group {
    /// Create a fresh group with the given display name.
    ///
    /// Usually obtained via [`ActorSystem::group`](crate::system::ActorSystem::group),
    /// which interns groups by name per system.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(GroupInner {
                name: name.into(),
                members: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The group's display name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of current members.
    pub fn len(&self) -> usize {
        self.inner.members.lock().len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.inner.members.lock().is_empty()
    }

    /// Add a member. Returns `false` if the address was already subscribed.
    pub(crate) fn subscribe(&self, member: Address) -> bool {
        let mut members = self.inner.members.lock();
        let inserted = members.insert(member.id(), member).is_none();
        if inserted {
            trace!(group = %self.inner.name, "subscribed member");
        }
        inserted
    }

    /// Remove a member. Returns `false` if it was not subscribed.
    pub(crate) fn unsubscribe(&self, member: &ActorId) -> bool {
        let removed = self.inner.members.lock().remove(member).is_some();
        if removed {
            trace!(group = %self.inner.name, "unsubscribed member");
        }
        removed
    }

    /// Broadcast a message to every current member.
    ///
    /// Members whose actor has gone away are pruned on the fly. The sender
    /// address may be the invalid sentinel for anonymous publishes.
    pub fn publish(&self, sender: Address, message: impl IntoMessage) {
        self.publish_with_priority(MessagePriority::Normal, sender, message);
    }

    /// Broadcast with an explicit priority class.
    pub fn publish_with_priority(
        &self,
        priority: MessagePriority,
        sender: Address,
        message: impl IntoMessage,
    ) {
        let message = message.into_message();
        let mut members = self.inner.members.lock();
        members.retain(|_, member| match member.upgrade() {
            Some(target) => {
                target.enqueue(Envelope::new(
                    sender.clone(),
                    MessageId::make(priority),
                    message.clone(),
                ));
                true
            }
            None => false,
        });
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Group {}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.inner.name)
            .field("members", &self.len())
            .finish()
    }
}
