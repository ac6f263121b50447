#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! World model for the daneel motion core.
//!
//! Holds the named bodies the robot plans around, services the
//! synchronous update operations (add / remove / remove-all / detach),
//! and answers per-link closest-point queries that feed the collision
//! avoidance constraints each tick.

mod body;
mod closest;
mod world;

#[cfg(test)]
mod world_tests;

pub use body::{Aabb, BodyShape, Primitive, WorldBody};
pub use closest::{
    closest_contact, publish_clear, publish_contact, Contact, NarrowPhase, PrimitiveNarrowPhase,
    CLEAR_DISTANCE,
};
pub use world::{BodyState, World, WorldOp};

/// Typed response codes of the world update service. These are returned
/// to the caller only; they never abort a motion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("body `{0}` already exists")]
    DuplicateBody(String),

    #[error("body `{0}` does not exist")]
    MissingBody(String),

    #[error("shape of body `{0}` is corrupt or unsupported")]
    CorruptShape(String),

    #[error("body `{0}` is not of a known attachable/loadable kind")]
    UnknownBody(String),
}

/// Result type for world operations.
pub type Result<T> = std::result::Result<T, WorldError>;
