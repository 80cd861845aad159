//! Lifecycle observers attached to an actor.
//!
//! Monitors, links and group subscriptions all hang off the owning actor as
//! attachables. Each one fires exactly once, in attach order, when the
//! actor is cleaned up. Attachables hold weak addresses only; observing an
//! actor never keeps it (or the observer) alive, so monitor cycles cannot
//! leak. Resolution to a strong handle happens at fire time and may fail.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use tracing::trace;

// Layer 3: Internal module imports
use super::address::Address;
use crate::group::Group;
use crate::message::{
    DownMsg, Envelope, ExitMsg, ExitReason, IntoMessage, MessageId, MessagePriority,
};

/// One lifecycle observer.
#[derive(Debug, Clone)]
pub(crate) enum Attachable {
    /// Deliver a down notification to `observer` when this actor exits.
    Monitor { observer: Address },
    /// Deliver a high-priority exit notification to `peer` on exit.
    Link { peer: Address },
    /// Drop the group membership on exit.
    Subscription { group: Group },
}

/// Discriminator used to find and remove attachables.
#[derive(Debug, Clone)]
pub(crate) enum AttachToken {
    /// Monitor installed by the given observer.
    Monitor(Address),
    /// Link to the given peer.
    Link(Address),
    /// Subscription to the given group (identity comparison).
    Subscription(Group),
}

impl Attachable {
    /// Whether this node is the one a token names.
    pub(crate) fn matches(&self, token: &AttachToken) -> bool {
        match (self, token) {
            (Self::Monitor { observer }, AttachToken::Monitor(addr)) => observer == addr,
            (Self::Link { peer }, AttachToken::Link(addr)) => peer == addr,
            (Self::Subscription { group }, AttachToken::Subscription(g)) => group == g,
            _ => false,
        }
    }

    /// Fire the exit action. `source` is the exiting actor.
    pub(crate) fn on_exit(&self, source: &Address, reason: ExitReason) {
        match self {
            Self::Monitor { observer } => {
                let Some(target) = observer.upgrade() else {
                    trace!("monitor observer gone, dropping down notification");
                    return;
                };
                target.enqueue(Envelope::new(
                    source.clone(),
                    MessageId::default(),
                    DownMsg {
                        source: source.clone(),
                        reason,
                    }
                    .into_message(),
                ));
            }
            Self::Link { peer } => {
                let Some(target) = peer.upgrade() else {
                    trace!("link peer gone, dropping exit notification");
                    return;
                };
                target.enqueue(Envelope::new(
                    source.clone(),
                    MessageId::make(MessagePriority::High),
                    ExitMsg {
                        source: source.clone(),
                        reason,
                    }
                    .into_message(),
                ));
            }
            Self::Subscription { group } => {
                group.unsubscribe(&source.id());
            }
        }
    }
}
