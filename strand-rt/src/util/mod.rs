//! Shared utility types.
//!
//! # Components
//!
//! - [`ActorId`] - Stable unique identifier for actors

pub mod ids;

pub use ids::ActorId;
