//! Smooth surrogates for non-smooth operations.
//!
//! The QP needs a Jacobian of every constraint expression, so anything
//! that gets differentiated must be built from these instead of `abs`,
//! `min`, `max`, `sign`, or piecewise selection. The surrogates degrade
//! near the kink (within ~1e-100 of zero for the sign family) and the
//! fast min/max lose precision outside roughly ±1e7; both are acceptable
//! at the scales joint velocities and distances live at.

use crate::{Expr, SelectKind};

/// `|x|` as `√(x²)`.
pub fn smooth_abs(x: &Expr) -> Expr {
    (x * x).sqrt()
}

/// `sign(x)` as a saturated `tanh`. Exact outside a vanishing
/// neighbourhood of zero; garbage inside it.
pub fn smooth_sign(x: &Expr) -> Expr {
    (x * 1.0e105).tanh()
}

/// `max(x, y)` as `((x+y) + |x−y|)/2`.
pub fn smooth_max(x: &Expr, y: &Expr) -> Expr {
    ((x + y) + smooth_abs(&(x - y))) / 2.0
}

/// `min(x, y)` as `((x+y) − |x−y|)/2`.
pub fn smooth_min(x: &Expr, y: &Expr) -> Expr {
    ((x + y) - smooth_abs(&(x - y))) / 2.0
}

/// Clamp `x` into `[lo, hi]`.
pub fn smooth_clamp(x: &Expr, lo: &Expr, hi: &Expr) -> Expr {
    smooth_max(&smooth_min(x, hi), lo)
}

/// `if cond > 0 { a } else { b }`, differentiably.
pub fn smooth_if_greater_zero(cond: &Expr, a: &Expr, b: &Expr) -> Expr {
    let s = smooth_sign(cond); // 1, -1, or 0
    let if_part = smooth_max(&Expr::constant(0.0), &s) * a;
    let else_part = -smooth_min(&Expr::constant(0.0), &s) * b;
    // The third term routes the exact-zero case to the else branch.
    if_part + else_part + (1.0 - smooth_abs(&s)) * b
}

/// `if cond >= 0 { a } else { b }`, differentiably.
pub fn smooth_if_greater_eq_zero(cond: &Expr, a: &Expr, b: &Expr) -> Expr {
    smooth_if_greater_zero(&(-cond), b, a)
}

/// `if cond == 0 { a } else { b }`, differentiably.
///
/// Misbehaves if `cond` is very close to but not equal to zero.
pub fn smooth_if_eq_zero(cond: &Expr, a: &Expr, b: &Expr) -> Expr {
    let c = smooth_abs(&smooth_sign(cond));
    (1.0 - &c) * a + c * b
}

/// `n / d`, with the whole quotient forced to zero where `d == 0`.
///
/// Uses exact (non-smooth) selection: intended for bound and weight
/// expressions that are evaluated, never differentiated.
pub fn safe_division(n: &Expr, d: &Expr) -> Expr {
    let safe_d = Expr::select(
        SelectKind::EqZero,
        d.clone(),
        Expr::constant(1.0),
        d.clone(),
    );
    let gate = Expr::select(
        SelectKind::EqZero,
        d.clone(),
        Expr::constant(0.0),
        Expr::constant(1.0),
    );
    n * &gate / safe_d
}
