// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// Delivery priority of a message.
///
/// The runtime knows exactly two classes: high-priority envelopes are
/// dequeued before all normal-priority envelopes, FIFO within each class.
///
/// # Example
/// ```rust
/// use strand_rt::message::MessagePriority;
///
/// assert!(MessagePriority::High > MessagePriority::Normal);
/// assert_eq!(MessagePriority::default(), MessagePriority::Normal);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum MessagePriority {
    /// Default priority for regular messages.
    #[default]
    Normal = 0,

    /// Urgent delivery, ahead of all queued normal-priority messages.
    High = 1,
}

/// Correlation tag carried by every envelope, packed into 64 bits.
///
/// Layout: bit 63 = response flag, bit 62 = answered flag, bit 61 =
/// high-priority flag, bits 0..=60 = request sequence number. A sequence of
/// zero means "asynchronous, no correlation". A request and its response
/// share the sequence number and differ only in the response flag, so
/// correlating a reply to its request is an equality lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

const RESPONSE_FLAG: u64 = 0x8000_0000_0000_0000;
const ANSWERED_FLAG: u64 = 0x4000_0000_0000_0000;
const HIGH_PRIORITY_FLAG: u64 = 0x2000_0000_0000_0000;
const REQUEST_MASK: u64 = 0x1FFF_FFFF_FFFF_FFFF;

impl MessageId {
    /// An asynchronous id with the given priority and no request sequence.
    pub fn make(priority: MessagePriority) -> Self {
        match priority {
            MessagePriority::Normal => Self(0),
            MessagePriority::High => Self(HIGH_PRIORITY_FLAG),
        }
    }

    /// Wrap a raw request sequence number (flags all clear).
    ///
    /// Sequence numbers are allocated per actor; values above the 61-bit
    /// range are truncated.
    pub(crate) fn from_request_number(seq: u64) -> Self {
        Self(seq & REQUEST_MASK)
    }

    /// This id with the high-priority flag set.
    pub fn with_high_priority(self) -> Self {
        Self(self.0 | HIGH_PRIORITY_FLAG)
    }

    /// This id with the high-priority flag cleared.
    pub fn with_normal_priority(self) -> Self {
        Self(self.0 & !HIGH_PRIORITY_FLAG)
    }

    /// This id rewritten to the given priority class.
    pub fn with_priority(self, priority: MessagePriority) -> Self {
        match priority {
            MessagePriority::Normal => self.with_normal_priority(),
            MessagePriority::High => self.with_high_priority(),
        }
    }

    /// The id a response to this request must carry: the response flag is
    /// set, the sequence number (and priority class) stay untouched.
    pub fn response_id(self) -> Self {
        Self(self.0 | RESPONSE_FLAG)
    }

    /// Whether this id tags a response envelope.
    pub fn is_response(self) -> bool {
        self.0 & RESPONSE_FLAG != 0
    }

    /// Whether a reply has already been produced for this id.
    pub fn is_answered(self) -> bool {
        self.0 & ANSWERED_FLAG != 0
    }

    /// This id with the answered flag set.
    ///
    /// Setting the flag is what suppresses any further reply for the
    /// envelope, including the automatic empty response to sync requests.
    pub fn mark_as_answered(self) -> Self {
        Self(self.0 | ANSWERED_FLAG)
    }

    /// Whether this id carries a request sequence (zero means asynchronous).
    pub fn is_valid(self) -> bool {
        self.0 & REQUEST_MASK != 0
    }

    /// Whether the high-priority flag is set.
    pub fn is_high_priority(self) -> bool {
        self.0 & HIGH_PRIORITY_FLAG != 0
    }

    /// The priority class encoded in this id.
    pub fn priority(self) -> MessagePriority {
        if self.is_high_priority() {
            MessagePriority::High
        } else {
            MessagePriority::Normal
        }
    }

    /// The request sequence number (zero for asynchronous ids).
    pub fn request_number(self) -> u64 {
        self.0 & REQUEST_MASK
    }
}

impl Default for MessageId {
    /// The asynchronous, normal-priority id.
    fn default() -> Self {
        Self(0)
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}#{}",
            if self.is_response() { "r" } else { "" },
            if self.is_answered() { "a" } else { "" },
            if self.is_high_priority() { "h" } else { "" },
            self.request_number()
        )
    }
}
