//! Symbolic differentiation.

use daneel_core::Symbol;

use crate::scalar::{BinaryOp, Node, UnaryOp};
use crate::{Expr, ExprError, Result};

/// Partial derivative of `expr` with respect to `wrt`.
///
/// Non-smooth operations are rejected: only the constraint `expression`
/// column is ever differentiated, and goals are required to build it from
/// the smooth surrogates in [`crate::smooth`].
pub fn diff(expr: &Expr, wrt: Symbol) -> Result<Expr> {
    match &*expr.0 {
        Node::Const(_) => Ok(Expr::constant(0.0)),
        Node::Sym(s) => Ok(Expr::constant(if *s == wrt { 1.0 } else { 0.0 })),
        Node::Unary(op, a) => {
            let da = diff(a, wrt)?;
            if da.as_const() == Some(0.0) && !matches!(op, UnaryOp::Abs | UnaryOp::Sign) {
                return Ok(Expr::constant(0.0));
            }
            match op {
                UnaryOp::Neg => Ok(-da),
                UnaryOp::Sqrt => Ok(da / (2.0 * a.sqrt())),
                UnaryOp::Sin => Ok(a.cos() * da),
                UnaryOp::Cos => Ok(-(a.sin()) * da),
                UnaryOp::Tan => {
                    let c = a.cos();
                    Ok(da / (&c * &c))
                }
                UnaryOp::Acos => Ok(-(&da) / (1.0 - a * a).sqrt()),
                UnaryOp::Asin => Ok(da / (1.0 - a * a).sqrt()),
                UnaryOp::Atan => Ok(da / (1.0 + a * a)),
                UnaryOp::Tanh => {
                    let t = a.tanh();
                    Ok((1.0 - &t * &t) * da)
                }
                // Piecewise constant: zero slope almost everywhere.
                UnaryOp::Floor => Ok(Expr::constant(0.0)),
                UnaryOp::Abs => Err(ExprError::NonSmooth("abs")),
                UnaryOp::Sign => Err(ExprError::NonSmooth("sign")),
            }
        }
        Node::Binary(op, a, b) => {
            match op {
                BinaryOp::Min => return Err(ExprError::NonSmooth("min")),
                BinaryOp::Max => return Err(ExprError::NonSmooth("max")),
                _ => {}
            }
            let da = diff(a, wrt)?;
            let db = diff(b, wrt)?;
            match op {
                BinaryOp::Add => Ok(da + db),
                BinaryOp::Sub => Ok(da - db),
                BinaryOp::Mul => Ok(da * b + a * db),
                BinaryOp::Div => Ok((da * b - a * db) / (b * b)),
                BinaryOp::Atan2 => {
                    // d atan2(y, x) = (x·dy − y·dx) / (x² + y²)
                    let denom = a * a + b * b;
                    Ok((b * da - a * db) / denom)
                }
                BinaryOp::Min | BinaryOp::Max => unreachable!(),
            }
        }
        Node::Select(_, _, _, _) => Err(ExprError::NonSmooth("select")),
    }
}
