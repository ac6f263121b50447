#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for the daneel motion core.
//!
//! The central piece is the [`Blackboard`]: a hierarchical typed store that
//! every component reads from and publishes to. Symbolic expressions never
//! embed numeric values; they reference blackboard paths through interned
//! [`Symbol`]s, and the numeric snapshot is materialized once per tick via
//! [`Blackboard::resolve`].

mod blackboard;
mod interner;
mod path;
mod state;
mod value;

#[cfg(test)]
mod blackboard_tests;

pub use blackboard::{Blackboard, Snapshot};
pub use interner::{Symbol, SymbolTable};
pub use path::{Path, PathKey};
pub use state::{JointStates, SingleJointState, TickState, Trajectory, Universe};
pub use value::{LazyValue, Pose, Value};

/// Errors produced by blackboard access.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// An intermediate or terminal key was absent on `get`.
    #[error("path `{path}` missing (resolved up to `{prefix}`)")]
    PathMissing { path: String, prefix: String },

    /// A symbol resolved to a leaf that is not a scalar.
    #[error("value at `{path}` is not a scalar")]
    NonScalar { path: String },

    /// A symbol was passed that this blackboard never issued.
    #[error("unknown symbol {0:?}")]
    UnknownSymbol(Symbol),
}

/// Result type for blackboard operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Well-known blackboard paths shared across components.
pub mod paths {
    use crate::{Path, PathKey};

    /// Joint states as read by perception (or the kinematic sim).
    pub fn joint_states() -> Path {
        Path::from_names(["joint_states"])
    }

    /// Position leaf of a single joint.
    pub fn joint_position(joint: &str) -> Path {
        joint_states().child(PathKey::name(joint)).child(PathKey::name("position"))
    }

    /// Velocity command written by the solver, keyed by joint name.
    pub fn motor_cmd() -> Path {
        Path::from_names(["motor_cmd"])
    }

    /// Current tick time in seconds.
    pub fn time() -> Path {
        Path::from_names(["tick", "time"])
    }

    /// Monotonic tick counter.
    pub fn tick_index() -> Path {
        Path::from_names(["tick", "index"])
    }

    /// Trajectory accumulated during planning.
    pub fn trajectory() -> Path {
        Path::from_names(["trajectory"])
    }

    /// Root for the parameters of one installed goal.
    pub fn goal(goal_id: &str) -> Path {
        Path::from_names(["goals"]).child(PathKey::name(goal_id))
    }

    /// Root for the closest-point record of one link.
    pub fn collision(link: &str) -> Path {
        Path::from_names(["collision"]).child(PathKey::name(link))
    }

    /// Evaluated FK pose of a `(root, tip)` pair, fed back each tick.
    pub fn fk_evaluated(root: &str, tip: &str) -> Path {
        Path::from_names(["fk"]).child(PathKey::pair(root, tip))
    }

    /// Gravity direction in the root frame.
    pub fn gravity() -> Path {
        Path::from_names(["world", "gravity"])
    }

    /// Error record left behind by a failing behaviour.
    pub fn motion_error() -> Path {
        Path::from_names(["motion", "error"])
    }
}
