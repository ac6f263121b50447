#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Constraint aggregation and QP velocity solving.
//!
//! Per tick the motion core solves
//!
//! ```text
//!   min  xᵀ·H·x      with x = [q̇ ; s]
//!   s.t. lb  ≤  x  ≤ ub
//!        lbA ≤ A·x ≤ ubA
//! ```
//!
//! where `q̇` are the controlled joint velocities and `s` the slack of
//! every scalar soft constraint. [`QpProblemBuilder`] merges joint
//! limits, hard constraints, and the active goals' soft constraints into
//! one compiled tape; [`QpSolver`] wraps the dense backend with warm
//! starting and a rounding retry for numerically noisy Jacobians.

mod backend;
mod constraints;
mod problem;
mod solver;

#[cfg(test)]
mod solver_tests;

pub use backend::{AdmmBackend, BackendError, BackendSettings};
pub use constraints::{HardConstraint, JointConstraint, SoftConstraint};
pub use problem::{QpMatrices, QpProblem, QpProblemBuilder};
pub use solver::QpSolver;

/// Errors from QP assembly and solving.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QpError {
    /// Expression compilation failed (fatal for the current motion).
    #[error("constraint compilation failed: {0}")]
    Compile(#[from] daneel_expr::ExprError),

    /// A bound symbol could not be resolved against the blackboard.
    #[error("blackboard resolution failed: {0}")]
    Blackboard(#[from] daneel_core::CoreError),

    /// The backend hit its working-set budget during initialization.
    #[error("QP solver exceeded its working-set budget")]
    MaxWorkingSetReached,

    /// The backend failed after the rounding retries were exhausted.
    #[error("QP infeasible: {0}")]
    Infeasible(String),
}

/// Result type for QP operations.
pub type Result<T> = std::result::Result<T, QpError>;
