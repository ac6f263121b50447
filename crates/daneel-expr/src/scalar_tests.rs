use approx::assert_relative_eq;

use crate::smooth::{smooth_abs, smooth_clamp, smooth_if_greater_zero, smooth_max, smooth_min, smooth_sign};
use crate::test_utils::{eval_scalar, sym};
use crate::{Expr, SelectKind};

#[test]
fn constant_folding_collapses_literals() {
    let e = Expr::constant(2.0) * Expr::constant(3.0) + Expr::constant(1.0);
    assert_eq!(e.as_const(), Some(7.0));
}

#[test]
fn identity_folds() {
    let x = Expr::symbol(sym(0));
    assert_eq!(format!("{}", &x + 0.0), "s0");
    assert_eq!(format!("{}", &x * 1.0), "s0");
    assert_eq!(format!("{}", &x * 0.0), "0");
    assert_eq!(format!("{}", &x / 1.0), "s0");
}

#[test]
fn mixed_arithmetic_evaluates() {
    let x = Expr::symbol(sym(0));
    let e = (2.0 * &x + 1.0) / (&x - 5.0);
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), 7.0)]), 7.5);
}

#[test]
fn powi_builds_multiplication_chain() {
    let x = Expr::symbol(sym(0));
    assert_relative_eq!(eval_scalar(&x.powi(4), &[(sym(0), 3.0)]), 81.0);
    assert_eq!(x.powi(0).as_const(), Some(1.0));
}

#[test]
fn free_symbols_in_first_visit_order() {
    let a = Expr::symbol(sym(3));
    let b = Expr::symbol(sym(1));
    let e = &a * &b + &a;
    assert_eq!(e.free_symbols(), vec![sym(3), sym(1)]);
}

#[test]
fn select_folds_on_constant_condition() {
    let taken = Expr::select(
        SelectKind::GtZero,
        Expr::constant(1.0),
        Expr::symbol(sym(0)),
        Expr::symbol(sym(1)),
    );
    assert_eq!(format!("{taken}"), "s0");
}

#[test]
fn smooth_abs_matches_abs_away_from_zero() {
    let x = Expr::symbol(sym(0));
    let e = smooth_abs(&x);
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), -3.25)]), 3.25);
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), 4.5)]), 4.5);
}

#[test]
fn smooth_sign_saturates() {
    let x = Expr::symbol(sym(0));
    let e = smooth_sign(&x);
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), 0.3)]), 1.0);
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), -1e-6)]), -1.0);
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), 0.0)]), 0.0);
}

#[test]
fn smooth_min_max_agree_with_exact() {
    let x = Expr::symbol(sym(0));
    let y = Expr::symbol(sym(1));
    let bindings = [(sym(0), 2.5), (sym(1), -1.0)];
    assert_relative_eq!(eval_scalar(&smooth_max(&x, &y), &bindings), 2.5);
    assert_relative_eq!(eval_scalar(&smooth_min(&x, &y), &bindings), -1.0);
}

#[test]
fn smooth_clamp_caps_both_sides() {
    let x = Expr::symbol(sym(0));
    let clamped = smooth_clamp(&x, &Expr::constant(-1.0), &Expr::constant(1.0));
    assert_relative_eq!(eval_scalar(&clamped, &[(sym(0), 10.0)]), 1.0);
    assert_relative_eq!(eval_scalar(&clamped, &[(sym(0), -10.0)]), -1.0);
    assert_relative_eq!(eval_scalar(&clamped, &[(sym(0), 0.5)]), 0.5);
}

#[test]
fn smooth_if_greater_zero_selects_branches() {
    let c = Expr::symbol(sym(0));
    let e = smooth_if_greater_zero(&c, &Expr::constant(10.0), &Expr::constant(20.0));
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), 1.0)]), 10.0);
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), -1.0)]), 20.0);
    // Exact zero routes to the else branch.
    assert_relative_eq!(eval_scalar(&e, &[(sym(0), 0.0)]), 20.0);
}
