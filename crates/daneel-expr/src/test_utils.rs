//! Helpers for evaluating symbolic expressions numerically in tests.

use daneel_core::Symbol;
use daneel_tape::TapeScratch;

use crate::{compile, Expr, ExprMatrix};

pub fn sym(i: u32) -> Symbol {
    Symbol::from_raw(i)
}

/// Evaluate a scalar expression with the given symbol bindings.
pub fn eval_scalar(expr: &Expr, bindings: &[(Symbol, f64)]) -> f64 {
    eval_matrix(&ExprMatrix::column(vec![expr.clone()]), bindings)[0]
}

/// Evaluate a matrix expression, returning its elements row-major.
pub fn eval_matrix(matrix: &ExprMatrix, bindings: &[(Symbol, f64)]) -> Vec<f64> {
    let symbols: Vec<Symbol> = bindings.iter().map(|(s, _)| *s).collect();
    let values: Vec<f64> = bindings.iter().map(|(_, v)| *v).collect();
    let tape = compile(matrix, &symbols).expect("test expression should compile");
    let mut scratch = TapeScratch::new();
    tape.eval(&values, &mut scratch);
    scratch.output().to_vec()
}
