#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Symbolic algebra for daneel constraint expressions.
//!
//! Expressions are immutable, reference-counted DAGs over a fixed scalar
//! algebra; shaped collections of scalars ([`ExprMatrix`]) cover frames,
//! vectors, and quaternions. Goals build expressions once against
//! blackboard symbols; [`compile`] lowers them (with common-subexpression
//! elimination) to a [`daneel_tape::Tape`] that is re-evaluated every tick
//! against the live blackboard.
//!
//! Differentiation is symbolic. Non-smooth operations (`abs`, `min`,
//! `max`, `sign`, piecewise selection) may appear in bounds and weight
//! expressions, which are only ever evaluated; differentiating one is a
//! compile error. The [`smooth`] module provides the surrogate forms to
//! use inside differentiated expressions.

mod chain;
mod compile;
mod diff;
mod matrix;
mod scalar;
pub mod smooth;
pub mod spatial;

#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(test)]
mod chain_tests;
#[cfg(test)]
mod compile_tests;
#[cfg(test)]
mod diff_tests;
#[cfg(test)]
mod scalar_tests;

pub use chain::{ChainError, ChainSpec, CollisionSphere, JointKind, JointSpec, Robot, RobotJoint};
pub use compile::{canonical_bytes, compile, compile_cached, jacobian};
pub use matrix::ExprMatrix;
pub use scalar::{BinaryOp, Expr, SelectKind, UnaryOp};

/// Errors from expression construction and compilation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExprError {
    /// A non-smooth operation was differentiated.
    #[error("cannot differentiate non-smooth operation `{0}`")]
    NonSmooth(&'static str),

    /// The expression references a symbol missing from the evaluator's
    /// ordered symbol list.
    #[error("expression references unbound symbol {0:?}")]
    UnboundSymbol(daneel_core::Symbol),
}

/// Result type for expression operations.
pub type Result<T> = std::result::Result<T, ExprError>;
