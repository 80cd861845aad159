//! Built-in message shapes and exit reason codes.
//!
//! These are the payloads the runtime itself produces: exit notifications
//! sent along links, down notifications delivered to monitors, and the
//! timeout marker for timed synchronous requests. The numeric exit reason
//! codes are stable wire values.

// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::actor::Address;

/// Reason an actor exited, as a stable 32-bit code.
///
/// Values below [`ExitReason::USER_DEFINED_BASE`] are reserved for the
/// runtime; everything at or above it is free for applications.
///
/// # Example
/// ```rust
/// use strand_rt::message::ExitReason;
///
/// assert!(ExitReason::NORMAL.is_normal());
/// assert!(!ExitReason::USER_SHUTDOWN.is_normal());
/// let custom = ExitReason::user(7);
/// assert_eq!(custom.code(), 0x10000 + 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExitReason(u32);

impl ExitReason {
    /// The actor has not exited (initial state of the planned reason).
    pub const NOT_EXITED: Self = Self(0);
    /// Voluntary, regular termination.
    pub const NORMAL: Self = Self(1);
    /// A panic escaped the actor body or a handler.
    pub const UNHANDLED_EXCEPTION: Self = Self(2);
    /// An operation was invoked that this actor kind does not allow.
    pub const UNALLOWED_FUNCTION_CALL: Self = Self(3);
    /// Shutdown requested by the user or the hosting system.
    pub const USER_SHUTDOWN: Self = Self(4);
    /// A linked remote actor became unreachable.
    pub const REMOTE_LINK_UNREACHABLE: Self = Self(5);

    /// First code of the user-defined range.
    pub const USER_DEFINED_BASE: u32 = 0x10000;

    /// A user-defined reason; `offset` is added to the user range base.
    pub const fn user(offset: u32) -> Self {
        Self(Self::USER_DEFINED_BASE + offset)
    }

    /// Wrap a raw wire code.
    pub const fn from_code(code: u32) -> Self {
        Self(code)
    }

    /// The raw wire code.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Whether this is the regular-termination reason.
    pub fn is_normal(self) -> bool {
        self == Self::NORMAL
    }

    /// Whether an exit has been recorded at all.
    pub fn is_exited(self) -> bool {
        self != Self::NOT_EXITED
    }
}

impl Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NOT_EXITED => write!(f, "not_exited"),
            Self::NORMAL => write!(f, "normal"),
            Self::UNHANDLED_EXCEPTION => write!(f, "unhandled_exception"),
            Self::UNALLOWED_FUNCTION_CALL => write!(f, "unallowed_function_call"),
            Self::USER_SHUTDOWN => write!(f, "user_shutdown"),
            Self::REMOTE_LINK_UNREACHABLE => write!(f, "remote_link_unreachable"),
            Self(code) => write!(f, "user({code:#x})"),
        }
    }
}

/// Exit notification, delivered high-priority to linked actors and by
/// [`send_exit`](crate::actor::LocalActor::send_exit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitMsg {
    /// The actor that exited (or demands the exit).
    pub source: Address,
    /// Why it exited.
    pub reason: ExitReason,
}

/// Down notification, delivered to monitors when the observed actor exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownMsg {
    /// The actor that went down.
    pub source: Address,
    /// Its final exit reason.
    pub reason: ExitReason,
}

/// Marker payload delivered to the issuer of a timed synchronous request
/// when the timeout fires before the response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncTimeoutMsg;
