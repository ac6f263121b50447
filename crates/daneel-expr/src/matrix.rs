//! Shaped collections of scalar expressions.
//!
//! Frames are 4×4, points and vectors 4×1 (homogeneous), quaternions 4×1
//! (x, y, z, w). Shapes are validated with assertions: a mismatch is a
//! programming error in goal construction, not a runtime condition.

use std::ops;

use crate::{Expr, Result};
use daneel_core::Symbol;

/// A `rows × cols` matrix of scalar expressions, row-major.
#[derive(Clone, Debug)]
pub struct ExprMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Expr>,
}

impl ExprMatrix {
    pub fn from_rows(rows: Vec<Vec<Expr>>) -> Self {
        let r = rows.len();
        let c = rows.first().map_or(0, Vec::len);
        assert!(rows.iter().all(|row| row.len() == c), "ragged matrix rows");
        Self {
            rows: r,
            cols: c,
            data: rows.into_iter().flatten().collect(),
        }
    }

    /// Column vector from scalar expressions.
    pub fn column(entries: Vec<Expr>) -> Self {
        Self {
            rows: entries.len(),
            cols: 1,
            data: entries,
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Expr::constant(0.0); rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = Expr::constant(1.0);
        }
        m
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major element slice.
    #[inline]
    pub fn as_slice(&self) -> &[Expr] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expr> {
        self.data.iter()
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self[(r, c)].clone());
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Matrix product.
    #[must_use]
    pub fn matmul(&self, rhs: &Self) -> Self {
        assert_eq!(
            self.cols, rhs.rows,
            "matmul shape mismatch: {:?} × {:?}",
            self.shape(),
            rhs.shape()
        );
        let mut out = Self::zeros(self.rows, rhs.cols);
        for r in 0..self.rows {
            for c in 0..rhs.cols {
                let mut acc = Expr::constant(0.0);
                for k in 0..self.cols {
                    acc = acc + &self[(r, k)] * &rhs[(k, c)];
                }
                out[(r, c)] = acc;
            }
        }
        out
    }

    /// Apply `f` element-wise.
    #[must_use]
    pub fn map(&self, f: impl Fn(&Expr) -> Expr) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Scale every element.
    #[must_use]
    pub fn scale(&self, factor: &Expr) -> Self {
        self.map(|e| e * factor)
    }

    /// Sub-block copy.
    #[must_use]
    pub fn block(&self, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        assert!(row + rows <= self.rows && col + cols <= self.cols, "block out of range");
        let mut data = Vec::with_capacity(rows * cols);
        for r in row..row + rows {
            for c in col..col + cols {
                data.push(self[(r, c)].clone());
            }
        }
        Self { rows, cols, data }
    }

    /// Euclidean norm over all entries.
    pub fn norm(&self) -> Expr {
        let mut acc = Expr::constant(0.0);
        for e in &self.data {
            acc = acc + e * e;
        }
        acc.sqrt()
    }

    /// Dot product of two equal-shape matrices (entry-wise sum).
    pub fn dot(&self, rhs: &Self) -> Expr {
        assert_eq!(self.shape(), rhs.shape(), "dot shape mismatch");
        let mut acc = Expr::constant(0.0);
        for (a, b) in self.data.iter().zip(&rhs.data) {
            acc = acc + a * b;
        }
        acc
    }

    /// Free symbols over all entries, in first-visit order.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for e in &self.data {
            for s in e.free_symbols() {
                if seen.insert(s) {
                    out.push(s);
                }
            }
        }
        out
    }

    /// Element-wise differentiation of a column vector against symbols,
    /// producing the `rows × |symbols|` Jacobian.
    pub fn jacobian(&self, symbols: &[Symbol]) -> Result<Self> {
        assert_eq!(self.cols, 1, "jacobian expects a column vector");
        let mut data = Vec::with_capacity(self.rows * symbols.len());
        for e in &self.data {
            for &s in symbols {
                data.push(crate::diff::diff(e, s)?);
            }
        }
        Ok(Self {
            rows: self.rows,
            cols: symbols.len(),
            data,
        })
    }
}

impl ops::Index<(usize, usize)> for ExprMatrix {
    type Output = Expr;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &Expr {
        assert!(r < self.rows && c < self.cols, "matrix index out of range");
        &self.data[r * self.cols + c]
    }
}

impl ops::IndexMut<(usize, usize)> for ExprMatrix {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut Expr {
        assert!(r < self.rows && c < self.cols, "matrix index out of range");
        &mut self.data[r * self.cols + c]
    }
}

/// Linear index into column vectors.
impl ops::Index<usize> for ExprMatrix {
    type Output = Expr;

    #[inline]
    fn index(&self, i: usize) -> &Expr {
        &self.data[i]
    }
}

impl ops::Add for &ExprMatrix {
    type Output = ExprMatrix;

    fn add(self, rhs: &ExprMatrix) -> ExprMatrix {
        assert_eq!(self.shape(), rhs.shape(), "add shape mismatch");
        ExprMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a + b).collect(),
        }
    }
}

impl ops::Sub for &ExprMatrix {
    type Output = ExprMatrix;

    fn sub(self, rhs: &ExprMatrix) -> ExprMatrix {
        assert_eq!(self.shape(), rhs.shape(), "sub shape mismatch");
        ExprMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a - b).collect(),
        }
    }
}

/// Matrix product; element-wise scaling goes through [`ExprMatrix::scale`].
impl ops::Mul for &ExprMatrix {
    type Output = ExprMatrix;

    fn mul(self, rhs: &ExprMatrix) -> ExprMatrix {
        self.matmul(rhs)
    }
}
