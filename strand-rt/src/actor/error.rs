// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::message::ExitReason;

/// Errors reported to callers of actor operations.
///
/// Only genuinely caller-visible failures live here. Asynchronous sends to
/// invalid or vanished targets are *not* errors: a send racing actor
/// termination is indistinguishable from a send to a long-dead actor, and
/// crashing the sender for that race would make every send fallible. Those
/// paths drop silently instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActorError {
    /// A synchronous request was aimed at the invalid sentinel or an actor
    /// that no longer resolves.
    #[error("cannot send a request to an invalid actor")]
    InvalidTarget,

    /// An operation that needs the current envelope ran outside a handler,
    /// or after the envelope was forwarded away.
    #[error("no message is currently being processed")]
    NoCurrentMessage,
}

/// Control-flow signal that terminates a blocking actor.
///
/// Produced when [`quit`](crate::actor::LocalActor::quit) is called; the
/// receive combinators return it and `?` carries it out of the actor body,
/// where the runner turns it into cleanup with the carried reason. This is
/// deliberately an explicit early-return value, not an unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("actor exited: {reason}")]
pub struct ActorExited {
    /// The exit reason cleanup will run with.
    pub reason: ExitReason,
}

impl ActorExited {
    /// Wrap an exit reason.
    pub fn new(reason: ExitReason) -> Self {
        Self { reason }
    }
}

/// Result type threaded through actor bodies and receive combinators.
pub type ActorResult<T> = Result<T, ActorExited>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ActorError::InvalidTarget.to_string(),
            "cannot send a request to an invalid actor"
        );
        assert_eq!(
            ActorError::NoCurrentMessage.to_string(),
            "no message is currently being processed"
        );
    }

    #[test]
    fn test_exited_carries_reason() {
        let exited = ActorExited::new(ExitReason::USER_SHUTDOWN);
        assert_eq!(exited.reason, ExitReason::USER_SHUTDOWN);
        assert_eq!(exited.to_string(), "actor exited: user_shutdown");
    }
}
