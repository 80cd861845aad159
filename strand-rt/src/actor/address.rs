// Layer 1: Standard library imports
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Weak};

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::cell::ActorCell;
use crate::message::{Envelope, IntoMessage, MessageId, MessagePriority};
use crate::util::ActorId;

/// Weak, stable handle to an actor.
///
/// An address identifies an actor for its whole lifetime but never keeps it
/// alive: the actor object lives as long as strong [`ActorRef`] handles
/// exist. Equality, ordering and hashing use the id only: identity, not
/// state. [`Address::invalid`] is the sentinel used for anonymous senders
/// and unresolvable targets.
#[derive(Clone)]
pub struct Address {
    id: ActorId,
    cell: Weak<ActorCell>,
}

impl Address {
    pub(crate) fn new(id: ActorId, cell: Weak<ActorCell>) -> Self {
        Self { id, cell }
    }

    /// The invalid sentinel address.
    pub fn invalid() -> Self {
        Self {
            id: ActorId::invalid(),
            cell: Weak::new(),
        }
    }

    /// The actor id this address names.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Whether this address names an actor at all (it may still be dead).
    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }

    /// Checked upcast to a strong handle.
    ///
    /// Fails once the actor has been cleaned up. Holding an address of a
    /// dead actor is normal and common (monitors do it), so this returns an
    /// empty option rather than an error.
    pub fn upgrade(&self) -> Option<ActorRef> {
        let cell = self.cell.upgrade()?;
        if cell.is_cleaned_up() {
            return None;
        }
        Some(ActorRef { cell })
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Address {}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Address({})", self.id)
        } else {
            write!(f, "Address(invalid)")
        }
    }
}

/// Strong handle to an actor.
///
/// Each live `ActorRef` contributes one reference to the actor's refcount;
/// the actor object is freed when the last strong handle (including the
/// registry's) goes away. The handle can enqueue messages directly, which
/// is how non-actor threads talk to actors.
#[derive(Clone)]
pub struct ActorRef {
    cell: Arc<ActorCell>,
}

impl ActorRef {
    pub(crate) fn from_cell(cell: Arc<ActorCell>) -> Self {
        Self { cell }
    }

    pub(crate) fn cell(&self) -> &Arc<ActorCell> {
        &self.cell
    }

    /// The actor id.
    pub fn id(&self) -> ActorId {
        self.cell.id()
    }

    /// The actor's optional registered name.
    pub fn name(&self) -> Option<&str> {
        self.cell.name()
    }

    /// The weak address of this actor.
    pub fn address(&self) -> Address {
        self.cell.address()
    }

    /// Whether the actor has already been cleaned up.
    pub fn is_terminated(&self) -> bool {
        self.cell.is_cleaned_up()
    }

    /// Anonymous asynchronous send: the envelope carries the invalid
    /// sender address, so the receiver cannot reply.
    pub fn tell(&self, message: impl IntoMessage) {
        self.tell_with_priority(MessagePriority::Normal, message);
    }

    /// Anonymous send with an explicit priority class.
    pub fn tell_with_priority(&self, priority: MessagePriority, message: impl IntoMessage) {
        self.enqueue(Envelope::new(
            Address::invalid(),
            MessageId::make(priority),
            message.into_message(),
        ));
    }

    /// Deliver an envelope to this actor's mailbox.
    ///
    /// Returns `false` if the actor is gone and the envelope was dropped.
    pub(crate) fn enqueue(&self, envelope: Envelope) -> bool {
        self.cell.enqueue(envelope)
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for ActorRef {}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ActorRef({name}@{})", self.id()),
            None => write!(f, "ActorRef({})", self.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address() {
        let addr = Address::invalid();
        assert!(!addr.is_valid());
        assert!(addr.upgrade().is_none());
        assert_eq!(addr, Address::invalid());
    }

    #[test]
    fn test_address_equality_is_identity() {
        let a = Address::invalid();
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_address_ordering_total() {
        let mut addrs = vec![Address::invalid(), Address::invalid()];
        addrs.sort();
        assert_eq!(addrs[0], addrs[1]);
    }

    #[test]
    fn test_address_debug_formats() {
        assert_eq!(format!("{:?}", Address::invalid()), "Address(invalid)");
    }
}
