#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! daneel: whole-body constraint-based motion control.
//!
//! Given a set of declarative goals (joint targets, Cartesian pose
//! targets, alignment, pointing, collision avoidance) and the current
//! robot state, the core compiles the goals' symbolic constraints into a
//! fast numeric evaluator and, tick by tick, solves a QP for joint
//! velocities that drive toward all goals simultaneously while
//! respecting joint limits and collision constraints. Planning happens
//! over a blackboard snapshot; only the planned trajectory escapes the
//! universe.
//!
//! This crate is the facade: motion commands, the executive
//! (action-server style goal handling), the world update service, and
//! configuration. The heavy machinery lives in the sibling crates.

mod command;
mod config;
mod executive;
mod robot_file;

#[cfg(test)]
mod command_tests;

pub use command::{
    CartesianConstraintKind, CartesianConstraintSpec, CollisionEntry, CollisionEntryKind,
    ConstraintSpec, JointConstraintSpec, MoveCmd, MoveGoal, MoveResult, MoveResultCode,
    PoseStamped,
};
pub use config::Config;
pub use executive::MotionExecutive;
pub use robot_file::RobotFile;

pub use daneel_core::{JointStates, SingleJointState, Trajectory};
pub use daneel_goals::PoseParam;
pub use daneel_tree::{CancelHandle, MailboxSender};
pub use daneel_world::{Primitive, World, WorldBody, WorldError, WorldOp};

/// Motion-level failures, aggregated from every subsystem.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error(transparent)]
    Goal(#[from] daneel_goals::GoalError),

    #[error(transparent)]
    Qp(#[from] daneel_qp::QpError),

    #[error(transparent)]
    Tree(#[from] daneel_tree::TreeError),

    #[error("robot model error: {0}")]
    Chain(#[from] daneel_expr::ChainError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for executive operations.
pub type Result<T> = std::result::Result<T, MotionError>;
