//! QP matrix assembly from one compiled evaluator.
//!
//! The builder stacks, in a fixed layout, every per-tick number the QP
//! needs (weights, velocity boxes, hard and soft bounds, and the dense
//! Jacobian) into a single column expression, compiled once per goal-set
//! change. Per tick, assembly is: resolve symbols, run the tape, scatter
//! slices into matrices.

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};

use daneel_core::{Blackboard, Symbol};
use daneel_expr::{compile, compile_cached, Expr, ExprMatrix, Robot};
use daneel_tape::{Tape, TapeCache, TapeScratch};

use crate::{HardConstraint, JointConstraint, Result, SoftConstraint};

/// Slack bounds: effectively unconstrained.
const SLACK_LIMIT: f64 = 1e9;

/// Numeric matrices handed to the solver, in the backend's notation.
#[derive(Clone, Debug, PartialEq)]
pub struct QpMatrices {
    /// Diagonal of `H`, length `N + M`.
    pub h: DVector<f64>,
    /// Linear term, zero.
    pub g: DVector<f64>,
    /// Constraint matrix, `(H_hard + M) × (N + M)`.
    pub a: DMatrix<f64>,
    pub lb: DVector<f64>,
    pub ub: DVector<f64>,
    pub lba: DVector<f64>,
    pub uba: DVector<f64>,
}

impl QpMatrices {
    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.h.iter().all(|v| v.is_finite())
            && self.a.iter().all(|v| v.is_finite())
            && self.lb.iter().all(|v| v.is_finite())
            && self.ub.iter().all(|v| v.is_finite())
            && self.lba.iter().all(|v| v.is_finite())
            && self.uba.iter().all(|v| v.is_finite())
    }
}

/// Collects constraints and compiles them into a [`QpProblem`].
#[derive(Debug, Default)]
pub struct QpProblemBuilder {
    joint_names: Vec<String>,
    joint_constraints: Vec<JointConstraint>,
    hard_constraints: Vec<(String, HardConstraint)>,
    soft_constraints: IndexMap<String, SoftConstraint>,
    controlled_symbols: Vec<Symbol>,
}

impl QpProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed joint boxes and linearized position limits from the robot.
    ///
    /// Position limits are scaled by the tick period so one tick cannot
    /// overshoot a limit by more than `vel_limit · Δt`.
    pub fn with_robot(mut self, robot: &Robot, sample_period: f64) -> Self {
        for joint in robot.controlled_joints() {
            let name = joint.name().to_owned();
            self.joint_names.push(name.clone());
            self.controlled_symbols.push(joint.symbol);

            let limit = Expr::constant(joint.velocity_limit);
            self.joint_constraints.push(JointConstraint {
                lower: -(&limit),
                upper: limit,
                weight: Expr::constant(joint.weight),
            });

            if let Some((lower, upper)) = joint.position_limits() {
                let q = Expr::symbol(joint.symbol);
                self.hard_constraints.push((
                    name,
                    HardConstraint {
                        lower: (Expr::constant(lower) - &q) / sample_period,
                        upper: (Expr::constant(upper) - &q) / sample_period,
                        expression: q,
                    },
                ));
            }
        }
        self
    }

    /// Append the soft constraints of one goal, keyed by constraint name.
    pub fn add_soft_constraints(
        &mut self,
        constraints: impl IntoIterator<Item = (String, SoftConstraint)>,
    ) {
        for (name, c) in constraints {
            self.soft_constraints.insert(name, c);
        }
    }

    pub fn soft_constraint_names(&self) -> Vec<&str> {
        self.soft_constraints.keys().map(String::as_str).collect()
    }

    /// Compile the aggregated problem into one evaluator.
    pub fn build(self, cache: Option<&TapeCache>) -> Result<QpProblem> {
        let n = self.joint_constraints.len();
        let n_hard = self.hard_constraints.len();
        let m = self.soft_constraints.len();

        // Jacobian rows: hard expressions first, then soft.
        let mut jac_rows = Vec::with_capacity(n_hard + m);
        for (_, hc) in &self.hard_constraints {
            jac_rows.push(hc.expression.clone());
        }
        for sc in self.soft_constraints.values() {
            jac_rows.push(sc.expression.clone());
        }
        let jacobian =
            ExprMatrix::column(jac_rows).jacobian(&self.controlled_symbols)?;

        // Stacked output column; the order here is the slicing order in
        // `assemble`.
        let mut stacked = Vec::new();
        for jc in &self.joint_constraints {
            stacked.push(jc.weight.clone());
        }
        for sc in self.soft_constraints.values() {
            stacked.push(sc.weight.clone());
        }
        for jc in &self.joint_constraints {
            stacked.push(jc.lower.clone());
        }
        for jc in &self.joint_constraints {
            stacked.push(jc.upper.clone());
        }
        for (_, hc) in &self.hard_constraints {
            stacked.push(hc.lower.clone());
        }
        for (_, hc) in &self.hard_constraints {
            stacked.push(hc.upper.clone());
        }
        for sc in self.soft_constraints.values() {
            stacked.push(sc.lower.clone());
        }
        for sc in self.soft_constraints.values() {
            stacked.push(sc.upper.clone());
        }
        stacked.extend(jacobian.iter().cloned());

        let column = ExprMatrix::column(stacked);
        let mut symbols = column.free_symbols();
        // The Jacobian may be constant in some joints; keep every
        // controlled symbol bound anyway so assembly can read positions.
        for &s in &self.controlled_symbols {
            if !symbols.contains(&s) {
                symbols.push(s);
            }
        }

        let tape = match cache {
            Some(cache) => compile_cached(&column, &symbols, cache)?,
            None => compile(&column, &symbols)?,
        };

        tracing::debug!(
            joints = n,
            hard = n_hard,
            soft = m,
            ops = tape.op_count(),
            "compiled QP evaluator"
        );

        Ok(QpProblem {
            tape,
            symbols,
            joint_names: self.joint_names,
            soft_names: self.soft_constraints.keys().cloned().collect(),
            n,
            n_hard,
            m,
        })
    }
}

/// A compiled, ready-to-evaluate QP. Immutable after compilation; the
/// same problem serves both universes.
#[derive(Clone, Debug)]
pub struct QpProblem {
    tape: Tape,
    symbols: Vec<Symbol>,
    joint_names: Vec<String>,
    soft_names: Vec<String>,
    n: usize,
    n_hard: usize,
    m: usize,
}

impl QpProblem {
    /// Controlled joint names, in QP column order.
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    /// Soft constraint names, in row order.
    pub fn soft_names(&self) -> &[String] {
        &self.soft_names
    }

    pub fn joint_count(&self) -> usize {
        self.n
    }

    pub fn soft_count(&self) -> usize {
        self.m
    }

    pub fn hard_count(&self) -> usize {
        self.n_hard
    }

    /// Instruction count of the compiled evaluator.
    pub fn op_count(&self) -> usize {
        self.tape.op_count()
    }

    /// Number of bound symbols.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Evaluate the compiled tape against the blackboard and scatter the
    /// outputs into solver matrices.
    ///
    /// Non-finite evaluator output is not an error here; it surfaces as
    /// non-finite matrices, which the solver driver maps to
    /// [`crate::QpError::Infeasible`] after its retry pass.
    pub fn assemble(
        &self,
        blackboard: &Blackboard,
        inputs: &mut Vec<f64>,
        scratch: &mut TapeScratch,
    ) -> Result<QpMatrices> {
        let (n, n_hard, m) = (self.n, self.n_hard, self.m);

        inputs.resize(self.symbols.len(), 0.0);
        blackboard.resolve(&self.symbols, inputs)?;
        let report = self.tape.eval(inputs, scratch);
        if !report.is_finite() {
            tracing::warn!(
                non_finite = report.non_finite,
                "QP evaluator produced non-finite values"
            );
        }
        let out = scratch.output();

        let mut cursor = 0usize;
        let mut take = |len: usize| {
            let slice = &out[cursor..cursor + len];
            cursor += len;
            slice
        };

        let joint_weights = take(n).to_vec();
        let soft_weights = take(m).to_vec();
        let lb_j = take(n).to_vec();
        let ub_j = take(n).to_vec();
        let lba_h = take(n_hard).to_vec();
        let uba_h = take(n_hard).to_vec();
        let lba_s = take(m).to_vec();
        let uba_s = take(m).to_vec();
        let jac = take((n_hard + m) * n);

        // H diagonal: joint weights as-is, soft weights squared. The
        // squaring is this implementation's weight-unit convention.
        let mut h = DVector::zeros(n + m);
        for (i, w) in joint_weights.iter().enumerate() {
            h[i] = *w;
        }
        for (j, w) in soft_weights.iter().enumerate() {
            h[n + j] = w * w;
        }

        // A = [A_hard 0; J_soft I].
        let mut a = DMatrix::zeros(n_hard + m, n + m);
        for r in 0..n_hard {
            for c in 0..n {
                a[(r, c)] = jac[r * n + c];
            }
        }
        for j in 0..m {
            for c in 0..n {
                a[(n_hard + j, c)] = jac[(n_hard + j) * n + c];
            }
            a[(n_hard + j, n + j)] = 1.0;
        }

        let mut lb = DVector::from_element(n + m, -SLACK_LIMIT);
        let mut ub = DVector::from_element(n + m, SLACK_LIMIT);
        for i in 0..n {
            lb[i] = lb_j[i];
            ub[i] = ub_j[i];
        }

        let mut lba = DVector::zeros(n_hard + m);
        let mut uba = DVector::zeros(n_hard + m);
        for r in 0..n_hard {
            lba[r] = lba_h[r];
            uba[r] = uba_h[r];
        }
        for j in 0..m {
            lba[n_hard + j] = lba_s[j];
            uba[n_hard + j] = uba_s[j];
        }

        Ok(QpMatrices {
            h,
            g: DVector::zeros(n + m),
            a,
            lb,
            ub,
            lba,
            uba,
        })
    }
}
