use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};

use crate::{QpError, QpMatrices, QpSolver};

fn tracking_qp(bound: f64) -> QpMatrices {
    QpMatrices {
        h: DVector::from_row_slice(&[1e-4, 1.0]),
        g: DVector::zeros(2),
        a: DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
        lb: DVector::from_row_slice(&[-1.0, -1e9]),
        ub: DVector::from_row_slice(&[1.0, 1e9]),
        lba: DVector::from_row_slice(&[bound]),
        uba: DVector::from_row_slice(&[bound]),
    }
}

#[test]
fn solve_then_hotstart() {
    let mut solver = QpSolver::new();
    let x1 = solver.solve(&tracking_qp(0.5), None).unwrap();
    assert_relative_eq!(x1[0], 0.5, epsilon = 1e-3);

    // Second call hotstarts; result still tracks the new bound.
    let x2 = solver.solve(&tracking_qp(0.4), None).unwrap();
    assert_relative_eq!(x2[0], 0.4, epsilon = 1e-3);
}

#[test]
fn infeasible_after_retries() {
    let mut solver = QpSolver::new();
    let mut qp = tracking_qp(0.5);
    qp.lb[0] = 2.0; // box lower above box upper
    qp.ub[0] = -2.0;
    assert!(matches!(
        solver.solve(&qp, None),
        Err(QpError::Infeasible(_))
    ));
}

#[test]
fn non_finite_matrices_map_to_infeasible() {
    let mut solver = QpSolver::new();
    let mut qp = tracking_qp(0.5);
    qp.a[(0, 0)] = f64::NAN;
    assert!(matches!(
        solver.solve(&qp, None),
        Err(QpError::Infeasible(_))
    ));
}

#[test]
fn reset_forgets_hotstart_state() {
    let mut solver = QpSolver::new();
    solver.solve(&tracking_qp(0.5), None).unwrap();
    solver.reset();
    let x = solver.solve(&tracking_qp(0.3), None).unwrap();
    assert_relative_eq!(x[0], 0.3, epsilon = 1e-3);
}

#[test]
fn explicit_nwsr_overrides_default() {
    let mut solver = QpSolver::new();
    let x = solver.solve(&tracking_qp(0.5), Some(500)).unwrap();
    assert_relative_eq!(x[0], 0.5, epsilon = 1e-3);
}
