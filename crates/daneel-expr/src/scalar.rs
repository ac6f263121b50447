//! Scalar expression nodes and builders.

use std::fmt;
use std::ops;
use std::rc::Rc;

use daneel_core::Symbol;

/// Unary operation kinds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Acos,
    Asin,
    Atan,
    Tanh,
    Floor,
    /// Non-smooth; see [`crate::smooth::smooth_abs`].
    Abs,
    /// Non-smooth; see [`crate::smooth::smooth_sign`].
    Sign,
}

impl UnaryOp {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Sqrt => "sqrt",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Acos => "acos",
            Self::Asin => "asin",
            Self::Atan => "atan",
            Self::Tanh => "tanh",
            Self::Floor => "floor",
            Self::Abs => "abs",
            Self::Sign => "sign",
        }
    }

    fn fold(self, a: f64) -> f64 {
        match self {
            Self::Neg => -a,
            Self::Sqrt => a.sqrt(),
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Acos => a.acos(),
            Self::Asin => a.asin(),
            Self::Atan => a.atan(),
            Self::Tanh => a.tanh(),
            Self::Floor => a.floor(),
            Self::Abs => a.abs(),
            Self::Sign => {
                if a > 0.0 {
                    1.0
                } else if a < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Binary operation kinds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Atan2,
    /// Non-smooth; see [`crate::smooth::smooth_min`].
    Min,
    /// Non-smooth; see [`crate::smooth::smooth_max`].
    Max,
}

impl BinaryOp {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Atan2 => "atan2",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    fn fold(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Atan2 => a.atan2(b),
            Self::Min => a.min(b),
            Self::Max => a.max(b),
        }
    }
}

/// Piecewise selection kinds, all non-smooth. The condition is the first
/// operand; selection compares it against zero.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectKind {
    LeZero,
    GtZero,
    EqZero,
}

#[derive(Debug)]
pub(crate) enum Node {
    Const(f64),
    Sym(Symbol),
    Unary(UnaryOp, Expr),
    Binary(BinaryOp, Expr, Expr),
    Select(SelectKind, Expr, Expr, Expr),
}

/// An immutable scalar expression.
///
/// Cloning is cheap (a reference-count bump); shared subexpressions stay
/// shared through the DAG, and the compiler deduplicates structurally
/// equal nodes that were built independently.
#[derive(Clone, Debug)]
pub struct Expr(pub(crate) Rc<Node>);

impl Expr {
    pub fn constant(v: f64) -> Self {
        Self(Rc::new(Node::Const(v)))
    }

    pub fn symbol(s: Symbol) -> Self {
        Self(Rc::new(Node::Sym(s)))
    }

    /// The constant payload, if this node is a literal.
    pub fn as_const(&self) -> Option<f64> {
        match &*self.0 {
            Node::Const(v) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn unary(op: UnaryOp, a: Expr) -> Self {
        if let Some(av) = a.as_const() {
            return Self::constant(op.fold(av));
        }
        Self(Rc::new(Node::Unary(op, a)))
    }

    pub(crate) fn binary(op: BinaryOp, a: Expr, b: Expr) -> Self {
        if let (Some(av), Some(bv)) = (a.as_const(), b.as_const()) {
            return Self::constant(op.fold(av, bv));
        }
        // Identity folds keep FK products from drowning in `* 1` noise.
        match op {
            BinaryOp::Add => {
                if a.is_zero() {
                    return b;
                }
                if b.is_zero() {
                    return a;
                }
            }
            BinaryOp::Sub => {
                if b.is_zero() {
                    return a;
                }
            }
            BinaryOp::Mul => {
                if a.is_zero() || b.is_zero() {
                    return Self::constant(0.0);
                }
                if a.is_one() {
                    return b;
                }
                if b.is_one() {
                    return a;
                }
            }
            BinaryOp::Div => {
                if b.is_one() {
                    return a;
                }
            }
            _ => {}
        }
        Self(Rc::new(Node::Binary(op, a, b)))
    }

    /// Piecewise selection on the sign of `cond` (non-smooth).
    pub fn select(kind: SelectKind, cond: Expr, then: Expr, otherwise: Expr) -> Self {
        if let Some(c) = cond.as_const() {
            let hit = match kind {
                SelectKind::LeZero => c <= 0.0,
                SelectKind::GtZero => c > 0.0,
                SelectKind::EqZero => c == 0.0,
            };
            return if hit { then } else { otherwise };
        }
        Self(Rc::new(Node::Select(kind, cond, then, otherwise)))
    }

    fn is_zero(&self) -> bool {
        self.as_const() == Some(0.0)
    }

    fn is_one(&self) -> bool {
        self.as_const() == Some(1.0)
    }

    pub fn sqrt(&self) -> Self {
        Self::unary(UnaryOp::Sqrt, self.clone())
    }

    pub fn sin(&self) -> Self {
        Self::unary(UnaryOp::Sin, self.clone())
    }

    pub fn cos(&self) -> Self {
        Self::unary(UnaryOp::Cos, self.clone())
    }

    pub fn tan(&self) -> Self {
        Self::unary(UnaryOp::Tan, self.clone())
    }

    pub fn acos(&self) -> Self {
        Self::unary(UnaryOp::Acos, self.clone())
    }

    pub fn asin(&self) -> Self {
        Self::unary(UnaryOp::Asin, self.clone())
    }

    pub fn atan(&self) -> Self {
        Self::unary(UnaryOp::Atan, self.clone())
    }

    pub fn atan2(&self, x: &Expr) -> Self {
        Self::binary(BinaryOp::Atan2, self.clone(), x.clone())
    }

    pub fn tanh(&self) -> Self {
        Self::unary(UnaryOp::Tanh, self.clone())
    }

    pub fn floor(&self) -> Self {
        Self::unary(UnaryOp::Floor, self.clone())
    }

    /// Non-smooth absolute value.
    pub fn abs(&self) -> Self {
        Self::unary(UnaryOp::Abs, self.clone())
    }

    /// Non-smooth sign.
    pub fn sign(&self) -> Self {
        Self::unary(UnaryOp::Sign, self.clone())
    }

    /// Non-smooth minimum.
    pub fn min(&self, other: &Expr) -> Self {
        Self::binary(BinaryOp::Min, self.clone(), other.clone())
    }

    /// Non-smooth maximum.
    pub fn max(&self, other: &Expr) -> Self {
        Self::binary(BinaryOp::Max, self.clone(), other.clone())
    }

    /// Integer power as a multiplication chain.
    pub fn powi(&self, n: u32) -> Self {
        match n {
            0 => Self::constant(1.0),
            _ => {
                let mut acc = self.clone();
                for _ in 1..n {
                    acc = acc * self.clone();
                }
                acc
            }
        }
    }

    /// Symbols referenced by this expression, in first-visit order.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let Node::Sym(s) = node {
                if seen.insert(*s) {
                    out.push(*s);
                }
            }
        });
        out
    }

    pub(crate) fn visit(&self, f: &mut impl FnMut(&Node)) {
        f(&self.0);
        match &*self.0 {
            Node::Const(_) | Node::Sym(_) => {}
            Node::Unary(_, a) => a.visit(f),
            Node::Binary(_, a, b) => {
                a.visit(f);
                b.visit(f);
            }
            Node::Select(_, c, t, e) => {
                c.visit(f);
                t.visit(f);
                e.visit(f);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Node::Const(v) => write!(f, "{v}"),
            Node::Sym(s) => write!(f, "s{}", s.as_u32()),
            Node::Unary(op, a) => write!(f, "{}({a})", op.name()),
            Node::Binary(op, a, b) => write!(f, "{}({a}, {b})", op.name()),
            Node::Select(kind, c, t, e) => {
                write!(f, "select[{kind:?}]({c}, {t}, {e})")
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Self::constant(v)
    }
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        Self::symbol(s)
    }
}

macro_rules! binop {
    ($trait:ident, $method:ident, $op:expr) => {
        impl ops::$trait for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl ops::$trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, self, rhs.clone())
            }
        }

        impl ops::$trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self.clone(), rhs)
            }
        }

        impl ops::$trait for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, self.clone(), rhs.clone())
            }
        }

        impl ops::$trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, self, Expr::constant(rhs))
            }
        }

        impl ops::$trait<f64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, self.clone(), Expr::constant(rhs))
            }
        }

        impl ops::$trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, Expr::constant(self), rhs)
            }
        }

        impl ops::$trait<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, Expr::constant(self), rhs.clone())
            }
        }
    };
}

binop!(Add, add, BinaryOp::Add);
binop!(Sub, sub, BinaryOp::Sub);
binop!(Mul, mul, BinaryOp::Mul);
binop!(Div, div, BinaryOp::Div);

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl ops::Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self.clone())
    }
}
