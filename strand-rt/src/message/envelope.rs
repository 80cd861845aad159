// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
use super::id::MessageId;
use super::value::Message;
use crate::actor::Address;

/// One unit of delivery: a payload plus its routing metadata.
///
/// Envelopes are uniquely owned. They live in exactly one place at a time
/// (a mailbox, a skip buffer, or the handler currently processing them),
/// and forwarding transfers that ownership wholesale, sender included. The
/// type is deliberately not `Clone`.
#[derive(Debug)]
pub struct Envelope {
    /// Who sent this (the invalid address for anonymous sends).
    pub sender: Address,

    /// Correlation id and flag bits.
    pub mid: MessageId,

    /// The payload tuple.
    pub message: Message,

    /// When the envelope was created.
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Create an envelope stamped with the current time.
    pub fn new(sender: Address, mid: MessageId, message: Message) -> Self {
        Self {
            sender,
            mid,
            message,
            timestamp: Utc::now(),
        }
    }

    /// Whether this envelope carries a response to an earlier request.
    pub fn is_response(&self) -> bool {
        self.mid.is_response()
    }

    /// Whether this envelope rides in the high-priority class.
    pub fn is_high_priority(&self) -> bool {
        self.mid.is_high_priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{IntoMessage, MessagePriority};

    #[test]
    fn test_envelope_creation() {
        let env = Envelope::new(
            Address::invalid(),
            MessageId::default(),
            (1i64,).into_message(),
        );
        assert!(!env.is_response());
        assert!(!env.is_high_priority());
        assert_eq!(env.message.value::<i64>(0), Some(1));
    }

    #[test]
    fn test_envelope_priority_tracks_mid() {
        let env = Envelope::new(
            Address::invalid(),
            MessageId::make(MessagePriority::High),
            ().into_message(),
        );
        assert!(env.is_high_priority());
    }

    #[test]
    fn test_envelope_response_tracks_mid() {
        let env = Envelope::new(
            Address::invalid(),
            MessageId::from_request_number(5).response_id(),
            ().into_message(),
        );
        assert!(env.is_response());
    }
}
