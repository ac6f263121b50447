use approx::assert_relative_eq;

use crate::smooth::{smooth_abs, smooth_max};
use crate::test_utils::{eval_scalar, sym};
use crate::{jacobian, Expr, ExprError, SelectKind};

fn d(expr: &Expr, at: f64) -> f64 {
    let de = crate::diff::diff(expr, sym(0)).unwrap();
    eval_scalar(&de, &[(sym(0), at)])
}

#[test]
fn polynomial_derivative() {
    let x = Expr::symbol(sym(0));
    // d/dx (3x² + 2x + 7) = 6x + 2
    let e = 3.0 * x.powi(2) + 2.0 * &x + 7.0;
    assert_relative_eq!(d(&e, 2.0), 14.0);
}

#[test]
fn trig_derivatives() {
    let x = Expr::symbol(sym(0));
    assert_relative_eq!(d(&x.sin(), 0.3), 0.3f64.cos());
    assert_relative_eq!(d(&x.cos(), 0.3), -(0.3f64.sin()));
    assert_relative_eq!(d(&x.tan(), 0.3), 1.0 / 0.3f64.cos().powi(2), epsilon = 1e-12);
}

#[test]
fn quotient_rule() {
    let x = Expr::symbol(sym(0));
    // d/dx (x / (x + 1)) = 1 / (x+1)²
    let e = &x / (&x + 1.0);
    assert_relative_eq!(d(&e, 2.0), 1.0 / 9.0, epsilon = 1e-12);
}

#[test]
fn atan2_derivative() {
    let y = Expr::symbol(sym(0));
    let e = y.atan2(&Expr::constant(2.0));
    // d/dy atan2(y, 2) = 2 / (y² + 4)
    assert_relative_eq!(d(&e, 1.0), 2.0 / 5.0, epsilon = 1e-12);
}

#[test]
fn sqrt_and_chain_rule() {
    let x = Expr::symbol(sym(0));
    // d/dx sqrt(x² + 1) = x / sqrt(x² + 1)
    let e = (x.powi(2) + 1.0).sqrt();
    assert_relative_eq!(d(&e, 3.0), 3.0 / 10.0f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn smooth_abs_is_differentiable() {
    let x = Expr::symbol(sym(0));
    let e = smooth_abs(&x);
    assert_relative_eq!(d(&e, 2.0), 1.0, epsilon = 1e-12);
    assert_relative_eq!(d(&e, -2.0), -1.0, epsilon = 1e-12);
}

#[test]
fn smooth_max_is_differentiable() {
    let x = Expr::symbol(sym(0));
    let e = smooth_max(&x, &Expr::constant(0.0));
    assert_relative_eq!(d(&e, 3.0), 1.0, epsilon = 1e-12);
    assert_relative_eq!(d(&e, -3.0), 0.0, epsilon = 1e-12);
}

#[test]
fn non_smooth_ops_refuse_differentiation() {
    let x = Expr::symbol(sym(0));
    assert!(matches!(
        crate::diff::diff(&x.abs(), sym(0)),
        Err(ExprError::NonSmooth("abs"))
    ));
    assert!(matches!(
        crate::diff::diff(&x.min(&Expr::constant(0.0)), sym(0)),
        Err(ExprError::NonSmooth("min"))
    ));
    assert!(matches!(
        crate::diff::diff(&x.sign(), sym(0)),
        Err(ExprError::NonSmooth("sign"))
    ));
    let sel = Expr::select(
        SelectKind::GtZero,
        x.clone(),
        Expr::constant(1.0),
        Expr::constant(2.0),
    );
    assert!(matches!(
        crate::diff::diff(&sel, sym(0)),
        Err(ExprError::NonSmooth("select"))
    ));
}

#[test]
fn derivative_wrt_other_symbol_is_zero() {
    let x = Expr::symbol(sym(0));
    let e = x.sin() * 3.0;
    let de = crate::diff::diff(&e, sym(1)).unwrap();
    assert_eq!(de.as_const(), Some(0.0));
}

#[test]
fn jacobian_shape_and_entries() {
    let x = Expr::symbol(sym(0));
    let y = Expr::symbol(sym(1));
    // rows: [x·y, x + y]; J = [[y, x], [1, 1]]
    let j = jacobian(&[&x * &y, &x + &y], &[sym(0), sym(1)]).unwrap();
    assert_eq!(j.shape(), (2, 2));
    let vals = crate::test_utils::eval_matrix(&j, &[(sym(0), 2.0), (sym(1), 5.0)]);
    assert_eq!(vals, vec![5.0, 2.0, 1.0, 1.0]);
}
