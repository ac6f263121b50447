use approx::assert_relative_eq;
use daneel_tape::{TapeCache, TapeScratch};

use crate::test_utils::{eval_matrix, sym};
use crate::{canonical_bytes, compile, compile_cached, Expr, ExprError, ExprMatrix};

#[test]
fn unbound_symbol_is_an_error() {
    let e = ExprMatrix::column(vec![Expr::symbol(sym(0)) + Expr::symbol(sym(1))]);
    let err = compile(&e, &[sym(0)]).unwrap_err();
    assert!(matches!(err, ExprError::UnboundSymbol(s) if s == sym(1)));
}

#[test]
fn extra_symbols_are_allowed() {
    let e = ExprMatrix::column(vec![Expr::symbol(sym(0)) * 2.0]);
    let tape = compile(&e, &[sym(5), sym(0), sym(9)]).unwrap();
    assert_eq!(tape.input_len(), 3);

    let mut scratch = TapeScratch::new();
    tape.eval(&[0.0, 3.0, 0.0], &mut scratch);
    assert_eq!(scratch.output(), &[6.0]);
}

#[test]
fn shared_subexpressions_are_deduplicated() {
    let x = Expr::symbol(sym(0));
    // sin(x) appears four times but should be computed once.
    let s = x.sin();
    let shared = ExprMatrix::column(vec![&s + &s, &s * &s]);
    let tape_shared = compile(&shared, &[sym(0)]).unwrap();

    // The same structure built without sharing still collapses.
    let rebuilt = ExprMatrix::column(vec![x.sin() + x.sin(), x.sin() * x.sin()]);
    let tape_rebuilt = compile(&rebuilt, &[sym(0)]).unwrap();

    assert_eq!(tape_shared.op_count(), tape_rebuilt.op_count());
    // sin, add, mul: three ops, not six.
    assert_eq!(tape_shared.op_count(), 3);
}

#[test]
fn fk_style_product_shares_rotation_blocks() {
    let q = Expr::symbol(sym(0));
    let axis = crate::spatial::vector3(
        Expr::constant(0.0),
        Expr::constant(0.0),
        Expr::constant(1.0),
    );
    let rot = crate::spatial::rotation_axis_angle(&axis, &q);
    let frame = rot.matmul(&crate::spatial::translation(
        Expr::constant(1.0),
        Expr::constant(0.0),
        Expr::constant(0.0),
    ));
    let tape = compile(&frame, &[sym(0)]).unwrap();
    // cos(q)/sin(q) are shared across the matrix entries.
    let vals = eval_matrix(&frame, &[(sym(0), std::f64::consts::FRAC_PI_2)]);
    assert_relative_eq!(vals[3], 0.0, epsilon = 1e-12); // x translation rotated
    assert_relative_eq!(vals[7], 1.0, epsilon = 1e-12);
    assert!(tape.op_count() < 40);
}

#[test]
fn canonical_bytes_stable_under_rebuild() {
    let build = || {
        let x = Expr::symbol(sym(0));
        ExprMatrix::column(vec![x.sin() * 2.0 + x.cos()])
    };
    assert_eq!(canonical_bytes(&build()), canonical_bytes(&build()));

    let other = ExprMatrix::column(vec![Expr::symbol(sym(0)).sin() * 3.0]);
    assert_ne!(canonical_bytes(&build()), canonical_bytes(&other));
}

#[test]
fn compile_cached_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TapeCache::open(dir.path()).unwrap();
    let e = ExprMatrix::column(vec![Expr::symbol(sym(0)).sin()]);

    let first = compile_cached(&e, &[sym(0)], &cache).unwrap();
    let second = compile_cached(&e, &[sym(0)], &cache).unwrap();
    assert_eq!(first, second);

    let mut scratch = TapeScratch::new();
    second.eval(&[1.0], &mut scratch);
    assert_relative_eq!(scratch.output()[0], 1.0f64.sin());
}

#[test]
fn compiled_evaluator_is_deterministic() {
    let x = Expr::symbol(sym(0));
    let y = Expr::symbol(sym(1));
    let e = ExprMatrix::column(vec![
        (&x * &y).sin() + (&x / &y).sqrt(),
        (&x - &y).atan2(&(&x + &y)),
    ]);
    let tape = compile(&e, &[sym(0), sym(1)]).unwrap();
    let mut scratch = TapeScratch::new();

    tape.eval(&[0.7, 1.9], &mut scratch);
    let reference: Vec<u64> = scratch.output().iter().map(|v| v.to_bits()).collect();
    for _ in 0..20 {
        tape.eval(&[0.7, 1.9], &mut scratch);
        let bits: Vec<u64> = scratch.output().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits, reference);
    }
}
