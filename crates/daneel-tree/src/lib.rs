#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Behaviour-tree scheduler for the daneel motion core.
//!
//! One real tick runs `perceive → plan → execute`. The plan subtree is
//! re-ticked inside a **planning universe**: the blackboard is
//! snapshotted, the kinematic integrator stands in for the real
//! joint-state source, and the same collision/evaluate/solve pipeline
//! runs until the goal is reached or a terminating condition fires. On
//! exit the snapshot is restored and only the planned trajectory
//! survives, which the executor then streams out.

mod behavior;
mod context;
mod leaves;
mod mailbox;
mod scheduler;
mod sink;

#[cfg(test)]
pub(crate) mod test_ctx;

#[cfg(test)]
mod scheduler_tests;

pub use behavior::{Behavior, Parallel, Selector, Sequence, Status};
pub use context::{CancelHandle, FkTable, MotionCtx};
pub use leaves::{
    CollisionQuery, DispatchTrajectory, EvaluateConstraints, IntegrateAndLog, JointStateIngest,
    PlanningGuard, SolveQp, WorldStateIngest,
};
pub use mailbox::{Mailbox, MailboxSender};
pub use scheduler::{required_fk_pairs, MotionScheduler, SchedulerSettings};
pub use sink::{CollectSink, TrajectorySink};

/// Failures a tick (or a whole motion) can end with. Leaves report these
/// through the context and return `Failure`; the scheduler aggregates at
/// the root and the executive translates them for the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TreeError {
    #[error("blackboard path missing: {0}")]
    PathMissing(String),

    #[error("constraint compilation failed: {0}")]
    Compile(String),

    #[error("QP infeasible: {0}")]
    QpInfeasible(String),

    #[error("QP working-set budget exhausted")]
    MaxWorkingSetReached,

    #[error("motion timed out")]
    Timeout,

    #[error("motion cancelled")]
    Cancelled,

    #[error("oscillation detected during planning")]
    Wiggle,

    #[error("trajectory dispatch failed: {0}")]
    Execution(String),
}

impl From<daneel_qp::QpError> for TreeError {
    fn from(e: daneel_qp::QpError) -> Self {
        match e {
            daneel_qp::QpError::Compile(inner) => Self::Compile(inner.to_string()),
            daneel_qp::QpError::Blackboard(inner) => Self::PathMissing(inner.to_string()),
            daneel_qp::QpError::MaxWorkingSetReached => Self::MaxWorkingSetReached,
            daneel_qp::QpError::Infeasible(msg) => Self::QpInfeasible(msg),
        }
    }
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, TreeError>;
