// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Unique identifier for actors in the system.
///
/// Stable for the lifetime of the actor; identity never changes even as the
/// actor's state does. Ids are totally ordered and hashable so they can key
/// registries and be compared across threads. The nil UUID is reserved as
/// the invalid sentinel.
///
/// # Example
/// ```rust
/// use strand_rt::util::ActorId;
///
/// let id1 = ActorId::new();
/// let id2 = ActorId::new();
/// assert_ne!(id1, id2); // Globally unique
/// assert!(id1.is_valid());
/// assert!(!ActorId::invalid().is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Generate a new random ActorId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The invalid sentinel id (nil UUID).
    pub const fn invalid() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `false` for the invalid sentinel.
    pub fn is_valid(&self) -> bool {
        !self.0.is_nil()
    }

    /// Create an ActorId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_creation() {
        let id1 = ActorId::new();
        let id2 = ActorId::new();

        assert_ne!(id1, id2); // Should be unique
    }

    #[test]
    fn test_actor_id_invalid_sentinel() {
        let invalid = ActorId::invalid();
        assert!(!invalid.is_valid());
        assert_eq!(invalid, ActorId::invalid());
        assert!(ActorId::new().is_valid());
    }

    #[test]
    fn test_actor_id_ordering() {
        let mut ids = vec![ActorId::new(), ActorId::new(), ActorId::new()];
        ids.sort();
        assert!(ids[0] <= ids[1] && ids[1] <= ids[2]);
        // The sentinel sorts first of all.
        assert!(ActorId::invalid() <= ids[0]);
    }

    #[test]
    fn test_actor_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ActorId::from_uuid(uuid);

        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn test_actor_id_display() {
        let id = ActorId::new();
        let display = format!("{id}");

        assert!(!display.is_empty());
        assert!(display.contains('-')); // UUID format
    }
}
