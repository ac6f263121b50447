//! Collision avoidance constraints.

use indexmap::IndexMap;

use daneel_core::{paths, Blackboard};
use daneel_expr::spatial::frame_inverse;
use daneel_expr::{Expr, Robot, SelectKind};
use daneel_qp::SoftConstraint;

use crate::input::{frame_input, point_input, scalar_input, vector_input};
use crate::{Goal, GoalError, Result, LOW_WEIGHT, MAX_WEIGHT, ZERO_WEIGHT};

/// Fit `y = a/(x + c) + b` exactly through three anchor points.
///
/// Three unknowns, three anchors: the fit is closed-form, no iterative
/// optimizer involved. Fails when the anchors are degenerate (collinear
/// in the reciprocal sense).
pub fn fit_reciprocal(x: [f64; 3], y: [f64; 3]) -> Option<(f64, f64, f64)> {
    let num = (y[0] - y[1]) * (x[2] - x[1]);
    let den = (y[1] - y[2]) * (x[1] - x[0]);
    if den.abs() < 1e-12 {
        return None;
    }
    let r = num / den;
    if (1.0 - r).abs() < 1e-12 {
        return None;
    }
    let c = (r * x[0] - x[2]) / (1.0 - r);
    let inv0 = 1.0 / (x[0] + c);
    let inv1 = 1.0 / (x[1] + c);
    if !(inv0 - inv1).is_finite() || (inv0 - inv1).abs() < 1e-12 {
        return None;
    }
    let a = (y[0] - y[1]) / (inv0 - inv1);
    let b = y[0] - a * inv0;
    (a.is_finite() && b.is_finite() && c.is_finite()).then_some((a, b, c))
}

/// Push one link away from whatever is closest to it.
///
/// The signed distance `n·((T_cur·T_eval⁻¹)·a − b)` is built over the
/// per-link closest-point leaves the collision module publishes each
/// tick. The weight decays from [`MAX_WEIGHT`] at `max_weight_distance`
/// to zero at `zero_weight_distance` along a reciprocal curve fit at
/// install time, so the constraint fades out instead of snapping off.
#[derive(Clone, Debug)]
pub struct LinkToAnyAvoidance {
    pub link_name: String,
    pub repel_speed: f64,
    pub max_weight_distance: f64,
    pub low_weight_distance: f64,
    pub zero_weight_distance: f64,
}

impl LinkToAnyAvoidance {
    pub fn new(link_name: impl Into<String>) -> Self {
        Self {
            link_name: link_name.into(),
            repel_speed: 0.1,
            max_weight_distance: 0.0,
            low_weight_distance: 0.02,
            zero_weight_distance: 0.05,
        }
    }
}

impl Goal for LinkToAnyAvoidance {
    fn name(&self) -> String {
        format!("LinkToAnyAvoidance/{}", self.link_name)
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        let (a, b, c) = fit_reciprocal(
            [
                self.max_weight_distance,
                self.low_weight_distance,
                self.zero_weight_distance,
            ],
            [MAX_WEIGHT, LOW_WEIGHT, ZERO_WEIGHT],
        )
        .ok_or_else(|| GoalError::InvalidParams {
            goal: self.name(),
            message: "degenerate weight-distance anchors".to_owned(),
        })?;
        tracing::debug!(link = %self.link_name, a, b, c, "fitted avoidance weight curve");

        let root = paths::goal(&self.name());
        blackboard.set(&root.child("repel_speed"), self.repel_speed);
        blackboard.set(&root.child("max_weight_distance"), self.max_weight_distance);
        blackboard.set(&root.child("low_weight_distance"), self.low_weight_distance);
        blackboard.set(&root.child("zero_weight_distance"), self.zero_weight_distance);
        blackboard.set(&root.child("A"), a);
        blackboard.set(&root.child("B"), b);
        blackboard.set(&root.child("C"), c);
        Ok(())
    }

    fn fk_pairs(&self, robot: &Robot) -> Vec<(String, String)> {
        vec![(robot.root_link().to_owned(), self.link_name.clone())]
    }

    fn collision_links(&self) -> Vec<String> {
        vec![self.link_name.clone()]
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let root = paths::goal(&self.name());
        let collision = paths::collision(&self.link_name);

        let current_pose = robot.fk(robot.root_link(), &self.link_name)?;
        let root_link = robot.root_link().to_owned();
        let evaluated = frame_input(
            blackboard,
            &paths::fk_evaluated(&root_link, &self.link_name),
        );
        let point_on_link = point_input(blackboard, &collision.child("position_on_a"));
        let other_point = point_input(blackboard, &collision.child("position_on_b"));
        let contact_normal = vector_input(blackboard, &collision.child("contact_normal"));

        let repel_speed = scalar_input(blackboard, &root.child("repel_speed"));
        let max_weight_distance = scalar_input(blackboard, &root.child("max_weight_distance"));
        let zero_weight_distance = scalar_input(blackboard, &root.child("zero_weight_distance"));
        let a = scalar_input(blackboard, &root.child("A"));
        let b = scalar_input(blackboard, &root.child("B"));
        let c = scalar_input(blackboard, &root.child("C"));

        // Point on the link, routed through the live FK so the Jacobian
        // sees the joints even though the collision module publishes
        // world-frame numbers.
        let controllable_point = current_pose
            .matmul(&frame_inverse(&evaluated))
            .matmul(&point_on_link);

        let dist = contact_normal
            .transpose()
            .matmul(&(&controllable_point - &other_point))[(0, 0)]
            .clone();

        // MAX below the near threshold, zero past the far one, the
        // fitted reciprocal in between. Weight expressions are evaluated
        // only, so the exact piecewise form is fine here.
        let weight = Expr::select(
            SelectKind::LeZero,
            &dist - &max_weight_distance,
            Expr::constant(MAX_WEIGHT),
            Expr::select(
                SelectKind::GtZero,
                &dist - &zero_weight_distance,
                Expr::constant(ZERO_WEIGHT),
                a / (&dist + c) + b,
            ),
        );

        let mut constraints = IndexMap::new();
        constraints.insert(
            self.name(),
            SoftConstraint {
                lower: repel_speed.clone(),
                upper: repel_speed,
                weight,
                expression: dist,
            },
        );
        Ok(constraints)
    }
}
