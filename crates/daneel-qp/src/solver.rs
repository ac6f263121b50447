//! Sequential-QP driver: init/hotstart state machine plus the rounding
//! retry that papers over tiny Jacobian noise.

use nalgebra::DVector;

use crate::{AdmmBackend, BackendError, BackendSettings, QpError, QpMatrices, Result};

/// Decimal places `A` is rounded to on a retry. Active-set style
/// backends occasionally refuse near-identical transitions over 1e-6
/// scale Jacobian noise; discretization restores determinism.
const RETRY_ROUND_DECIMALS: i32 = 5;

/// Wraps the backend with the sequential-QP contract: the first call
/// initializes, subsequent calls warm-start from the previous working
/// set, and transient failures retry twice with a rounded `A`.
#[derive(Debug, Default)]
pub struct QpSolver {
    backend: AdmmBackend,
    started: bool,
}

impl QpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: BackendSettings) -> Self {
        Self {
            backend: AdmmBackend::new(settings),
            started: false,
        }
    }

    /// Drop hotstart state. Call on any goal-set change.
    pub fn reset(&mut self) {
        self.backend.reset();
        self.started = false;
    }

    /// Solve for the full variable vector `[q̇; s]`.
    ///
    /// `nwsr` overrides the working-set budget; the default is
    /// `2 · (rows + cols of A)`.
    pub fn solve(&mut self, qp: &QpMatrices, nwsr: Option<usize>) -> Result<DVector<f64>> {
        let mut qp = qp.clone();
        let mut nwsr = nwsr;
        let mut retries = 2u32;
        let mut last_error: BackendError;

        loop {
            let budget = nwsr.take().unwrap_or(2 * (qp.a.nrows() + qp.a.ncols()));

            let attempt = if self.started {
                self.backend.hotstart(&qp, budget)
            } else {
                self.backend.init(&qp, budget)
            };

            match attempt {
                Ok(x) => {
                    self.started = true;
                    return Ok(x);
                }
                Err(BackendError::MaxWorkingSetReached) => {
                    self.started = false;
                    return Err(QpError::MaxWorkingSetReached);
                }
                Err(e) => {
                    last_error = e;
                }
            }

            if retries == 0 {
                self.started = false;
                return Err(QpError::Infeasible(last_error.to_string()));
            }
            retries -= 1;
            tracing::warn!(
                error = %last_error,
                "QP solve failed; retrying with A rounded to {RETRY_ROUND_DECIMALS} decimal places"
            );
            round_matrix(&mut qp, RETRY_ROUND_DECIMALS);
        }
    }
}

fn round_matrix(qp: &mut QpMatrices, decimals: i32) {
    let scale = 10f64.powi(decimals);
    for v in qp.a.iter_mut() {
        *v = (*v * scale).round() / scale;
    }
}
