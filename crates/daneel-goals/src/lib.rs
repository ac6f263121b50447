#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Declarative goal library.
//!
//! A goal converts a user-level intent ("this joint at 1.0 rad", "tip
//! 20 cm forward", "stay away from everything") into named
//! [`SoftConstraint`]s over blackboard symbols. `install` writes the
//! goal's numeric parameters under `goals/<goal-id>/…` once;
//! `soft_constraints` builds expressions that reference those parameters
//! through symbols, so parameter updates between ticks never trigger
//! recompilation.

mod align;
mod avoidance;
mod cartesian;
mod input;
mod joint;
mod manipulation;
mod registry;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod avoidance_tests;
#[cfg(test)]
mod registry_tests;

use indexmap::IndexMap;

use daneel_core::Blackboard;
use daneel_expr::Robot;
use daneel_qp::SoftConstraint;

pub use align::{AlignPlanes, Pointing};
pub use avoidance::{fit_reciprocal, LinkToAnyAvoidance};
pub use cartesian::{CartesianOrientationSlerp, CartesianParams, CartesianPosition};
pub use input::PoseParam;
pub use joint::{GravityJoint, JointPosition, JointPositionList};
pub use manipulation::{MoveToPose, OpenCloseDoor, OpenCloseDrawer, TurnRotaryKnob};
pub use registry::goal_from_json;

/// Weight presets shared by the goal formulations.
pub const MAX_WEIGHT: f64 = 10.0;
pub const HIGH_WEIGHT: f64 = 5.0;
pub const MID_WEIGHT: f64 = 1.0;
pub const LOW_WEIGHT: f64 = 0.5;
pub const ZERO_WEIGHT: f64 = 0.0;

/// Errors from goal construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GoalError {
    #[error(transparent)]
    Chain(#[from] daneel_expr::ChainError),

    #[error("invalid parameters for `{goal}`: {message}")]
    InvalidParams { goal: String, message: String },

    #[error("unknown goal type `{0}`")]
    UnknownType(String),
}

/// Result type for goal operations.
pub type Result<T> = std::result::Result<T, GoalError>;

/// A declarative goal.
///
/// Implementations must be pure expression builders: all numeric state
/// lives in the blackboard, all cross-references go through paths.
pub trait Goal: std::fmt::Debug {
    /// Stable unique id; also the `goals/<id>` parameter root.
    fn name(&self) -> String;

    /// Write the goal's numeric parameters. Runs once on submission.
    fn install(&self, blackboard: &mut Blackboard) -> Result<()>;

    /// Build this goal's soft constraints against the robot.
    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>>;

    /// `(root, tip)` pairs whose evaluated FK this goal reads back each
    /// tick (see the `fk/(root,tip)` blackboard leaves).
    fn fk_pairs(&self, _robot: &Robot) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Links whose closest-point records this goal consumes.
    fn collision_links(&self) -> Vec<String> {
        Vec::new()
    }
}
