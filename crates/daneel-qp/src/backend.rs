//! Dense ADMM backend for the per-tick QP.
//!
//! Solves `min ½xᵀPx + gᵀx` subject to `l ≤ Cx ≤ u` where `C` stacks an
//! identity block (variable box) on top of the general constraint rows.
//! `P` is diagonal positive, so the KKT system is SPD and a Cholesky
//! factorization per call suffices. A terminal polish step solves the
//! active-set KKT equalities exactly, so converged solutions are exact up
//! to factorization error rather than first-order tolerance.
//!
//! The iteration budget is expressed in working-set recalculations to
//! match the sequential-QP driver contract; one recalculation is worth
//! [`ITERATIONS_PER_WSR`] ADMM sweeps.

use nalgebra::{DMatrix, DVector};

use crate::QpMatrices;

/// ADMM sweeps charged per working-set recalculation of the budget.
pub const ITERATIONS_PER_WSR: usize = 25;

const RHO: f64 = 1.0;
const SIGMA: f64 = 1e-6;
const ALPHA: f64 = 1.6;
// First-order tolerance; the polish step restores exactness once the
// active set has settled.
const EPS_ABS: f64 = 1e-6;
const EPS_REL: f64 = 1e-6;
const ACTIVE_TOL: f64 = 1e-6;
const POLISH_FEAS_TOL: f64 = 1e-7;
/// Polish regularization: small enough not to bias unconstrained
/// directions beyond factorization noise.
const POLISH_SIGMA: f64 = 1e-12;

/// Backend tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct BackendSettings {
    pub rho: f64,
    pub sigma: f64,
    pub alpha: f64,
    pub eps_abs: f64,
    pub eps_rel: f64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            rho: RHO,
            sigma: SIGMA,
            alpha: ALPHA,
            eps_abs: EPS_ABS,
            eps_rel: EPS_REL,
        }
    }
}

/// Backend failure modes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The working-set budget ran out while the iterate was still moving.
    #[error("working-set budget exhausted")]
    MaxWorkingSetReached,

    /// The iterate stopped making progress far from feasibility.
    #[error("no feasible point found")]
    Infeasible,

    /// Non-finite data entered the solve.
    #[error("non-finite problem data")]
    NumericalIssue,
}

/// Dense ADMM solver with warm-start state.
#[derive(Debug)]
pub struct AdmmBackend {
    settings: BackendSettings,
    x: DVector<f64>,
    z: DVector<f64>,
    y: DVector<f64>,
}

impl Default for AdmmBackend {
    fn default() -> Self {
        Self::new(BackendSettings::default())
    }
}

impl AdmmBackend {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            settings,
            x: DVector::zeros(0),
            z: DVector::zeros(0),
            y: DVector::zeros(0),
        }
    }

    /// Drop warm-start state (hotstart becomes a cold init).
    pub fn reset(&mut self) {
        self.x = DVector::zeros(0);
        self.z = DVector::zeros(0);
        self.y = DVector::zeros(0);
    }

    /// Solve from scratch.
    pub fn init(&mut self, qp: &QpMatrices, nwsr: usize) -> Result<DVector<f64>, BackendError> {
        self.reset();
        self.run(qp, nwsr)
    }

    /// Solve reusing the previous iterate as a warm start.
    pub fn hotstart(&mut self, qp: &QpMatrices, nwsr: usize) -> Result<DVector<f64>, BackendError> {
        self.run(qp, nwsr)
    }

    fn run(&mut self, qp: &QpMatrices, nwsr: usize) -> Result<DVector<f64>, BackendError> {
        if !qp.is_finite() {
            return Err(BackendError::NumericalIssue);
        }

        let n = qp.h.len();
        let m_rows = qp.a.nrows();
        let m_total = n + m_rows;

        // C = [I; A], bounds stacked to match.
        let mut c = DMatrix::zeros(m_total, n);
        for i in 0..n {
            c[(i, i)] = 1.0;
        }
        c.view_mut((n, 0), (m_rows, n)).copy_from(&qp.a);

        let mut l = DVector::zeros(m_total);
        let mut u = DVector::zeros(m_total);
        l.rows_mut(0, n).copy_from(&qp.lb);
        u.rows_mut(0, n).copy_from(&qp.ub);
        l.rows_mut(n, m_rows).copy_from(&qp.lba);
        u.rows_mut(n, m_rows).copy_from(&qp.uba);

        for i in 0..m_total {
            if l[i] > u[i] {
                return Err(BackendError::Infeasible);
            }
        }

        let s = self.settings;

        // KKT matrix: diag(h) + σI + ρ CᵀC.
        let mut kkt = &c.transpose() * &c * s.rho;
        for i in 0..n {
            kkt[(i, i)] += qp.h[i] + s.sigma;
        }
        let chol = kkt
            .cholesky()
            .ok_or(BackendError::NumericalIssue)?;

        if self.x.len() != n {
            self.x = DVector::zeros(n);
        }
        if self.z.len() != m_total || self.y.len() != m_total {
            self.z = DVector::zeros(m_total);
            self.y = DVector::zeros(m_total);
        }

        let budget = nwsr.max(1) * ITERATIONS_PER_WSR;
        let mut converged = false;
        let mut last_prim_res = f64::INFINITY;

        for _ in 0..budget {
            // x-update.
            let rhs = &self.x * s.sigma - &qp.g
                + c.transpose() * (&self.z * s.rho - &self.y);
            let x_next = chol.solve(&rhs);

            // Relaxed z/y updates.
            let cx = &c * &x_next;
            let cx_relaxed = &cx * s.alpha + &self.z * (1.0 - s.alpha);
            let mut z_next = &cx_relaxed + &self.y / s.rho;
            for i in 0..m_total {
                z_next[i] = z_next[i].clamp(l[i], u[i]);
            }
            self.y += (&cx_relaxed - &z_next) * s.rho;
            self.x = x_next;
            self.z = z_next;

            // Residuals.
            let prim_res = (&cx - &self.z).amax();
            let dual =
                &self.x.component_mul(&qp.h) + &qp.g + c.transpose() * &self.y;
            let dual_res = dual.amax();
            last_prim_res = prim_res;

            let prim_tol = s.eps_abs + s.eps_rel * cx.amax().max(self.z.amax());
            let dual_tol = s.eps_abs
                + s.eps_rel
                    * self
                        .x
                        .component_mul(&qp.h)
                        .amax()
                        .max((c.transpose() * &self.y).amax());
            if prim_res <= prim_tol && dual_res <= dual_tol {
                converged = true;
                break;
            }
        }

        if !converged {
            // A large stuck primal residual means the constraints are in
            // conflict; a small one means the budget was just too tight.
            return if last_prim_res > 1e-3 {
                Err(BackendError::Infeasible)
            } else {
                Err(BackendError::MaxWorkingSetReached)
            };
        }

        if let Some(polished) = self.polish(qp, &c, &l, &u) {
            self.x = polished;
        }
        Ok(self.x.clone())
    }

    /// Exact KKT solve on the detected active set.
    fn polish(
        &self,
        qp: &QpMatrices,
        c: &DMatrix<f64>,
        l: &DVector<f64>,
        u: &DVector<f64>,
    ) -> Option<DVector<f64>> {
        let n = qp.h.len();
        let m_total = c.nrows();

        let mut active_rows = Vec::new();
        let mut active_vals = Vec::new();
        for i in 0..m_total {
            let span = 1.0 + l[i].abs().min(u[i].abs());
            if (self.z[i] - l[i]).abs() <= ACTIVE_TOL * span {
                active_rows.push(i);
                active_vals.push(l[i]);
            } else if (u[i] - self.z[i]).abs() <= ACTIVE_TOL * span {
                active_rows.push(i);
                active_vals.push(u[i]);
            }
        }
        let k = active_rows.len();

        // [P  Gᵀ] [x] = [-g]
        // [G  0 ] [ν]   [ b]
        let mut kkt = DMatrix::zeros(n + k, n + k);
        let mut rhs = DVector::zeros(n + k);
        for i in 0..n {
            kkt[(i, i)] = qp.h[i] + POLISH_SIGMA;
            rhs[i] = -qp.g[i];
        }
        for (row_idx, &row) in active_rows.iter().enumerate() {
            for col in 0..n {
                kkt[(n + row_idx, col)] = c[(row, col)];
                kkt[(col, n + row_idx)] = c[(row, col)];
            }
            rhs[n + row_idx] = active_vals[row_idx];
        }

        let solution = kkt.lu().solve(&rhs)?;
        let x = solution.rows(0, n).into_owned();

        // Reject the polish if it violates any inactive constraint.
        let cx = c * &x;
        for i in 0..m_total {
            if cx[i] < l[i] - POLISH_FEAS_TOL || cx[i] > u[i] + POLISH_FEAS_TOL {
                return None;
            }
        }
        Some(x)
    }
}
