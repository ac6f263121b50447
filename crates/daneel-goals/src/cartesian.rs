//! Cartesian pose goals.

use indexmap::IndexMap;

use daneel_core::{paths, Blackboard};
use daneel_expr::smooth::{safe_division, smooth_abs, smooth_min};
use daneel_expr::spatial::{
    axis_angle_from_quaternion, axis_angle_from_rotation, position_of, quaternion_diff,
    quaternion_from_rotation, rotation_axis_angle, rotation_of, slerp, vector3,
};
use daneel_expr::{Expr, Robot};
use daneel_qp::SoftConstraint;

use crate::input::{frame_input, scalar_input, set_pose, PoseParam};
use crate::{Goal, Result, HIGH_WEIGHT};

/// Shared parameter block of the Cartesian goals.
#[derive(Clone, Debug)]
pub struct CartesianParams {
    pub root_link: String,
    pub tip_link: String,
    pub goal: PoseParam,
    pub weight: f64,
    pub gain: f64,
    pub max_speed: f64,
}

impl CartesianParams {
    fn install(&self, kind: &str, blackboard: &mut Blackboard) {
        let root = paths::goal(&format!("{kind}/{}/{}", self.root_link, self.tip_link));
        set_pose(blackboard, &root.child("goal"), &self.goal.normalized());
        blackboard.set(&root.child("weight"), self.weight);
        blackboard.set(&root.child("gain"), self.gain);
        blackboard.set(&root.child("max_speed"), self.max_speed);
    }
}

/// Move the tip position toward the goal position.
///
/// The control vector is the position error rescaled to
/// `min(gain · ‖err‖, max_speed)`; its three components bound three
/// tracking constraints on the FK position.
#[derive(Clone, Debug)]
pub struct CartesianPosition {
    pub params: CartesianParams,
}

impl CartesianPosition {
    pub fn new(root: impl Into<String>, tip: impl Into<String>, goal: PoseParam) -> Self {
        Self {
            params: CartesianParams {
                root_link: root.into(),
                tip_link: tip.into(),
                goal,
                weight: HIGH_WEIGHT,
                gain: 3.0,
                max_speed: 0.1,
            },
        }
    }
}

impl Goal for CartesianPosition {
    fn name(&self) -> String {
        format!(
            "CartesianPosition/{}/{}",
            self.params.root_link, self.params.tip_link
        )
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        self.params.install("CartesianPosition", blackboard);
        Ok(())
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let root = paths::goal(&self.name());
        let goal_position = position_of(&frame_input(blackboard, &root.child("goal")));
        let weight = scalar_input(blackboard, &root.child("weight"));
        let gain = scalar_input(blackboard, &root.child("gain"));
        let max_speed = scalar_input(blackboard, &root.child("max_speed"));

        let fk = robot.fk(&self.params.root_link, &self.params.tip_link)?;
        let current_position = position_of(&fk);

        let error_vector = &goal_position - &current_position;
        let error = error_vector.norm();
        let scale = smooth_min(&(error.clone() * gain), &max_speed);
        let control = error_vector.map(|e| safe_division(e, &error) * &scale);

        let mut constraints = IndexMap::new();
        for (i, suffix) in ["x", "y", "z"].iter().enumerate() {
            constraints.insert(
                format!("{}/{suffix}", self.name()),
                SoftConstraint::tracking(
                    control[i].clone(),
                    weight.clone(),
                    current_position[i].clone(),
                ),
            );
        }
        Ok(constraints)
    }
}

/// Rotate the tip toward the goal orientation along the slerp arc.
///
/// The commanded rotation is the axis-angle of `q_cur⁻¹ · q_mid`, where
/// `q_mid` sits a capped fraction along the slerp from the current to
/// the goal orientation. The constraint expressions measure the current
/// rotation against its per-tick evaluated copy perturbed by a small
/// yaw, which keeps the Jacobian defined at zero error.
#[derive(Clone, Debug)]
pub struct CartesianOrientationSlerp {
    pub params: CartesianParams,
}

impl CartesianOrientationSlerp {
    pub fn new(root: impl Into<String>, tip: impl Into<String>, goal: PoseParam) -> Self {
        Self {
            params: CartesianParams {
                root_link: root.into(),
                tip_link: tip.into(),
                goal,
                weight: HIGH_WEIGHT,
                gain: 3.0,
                max_speed: 0.5,
            },
        }
    }
}

impl Goal for CartesianOrientationSlerp {
    fn name(&self) -> String {
        format!(
            "CartesianOrientationSlerp/{}/{}",
            self.params.root_link, self.params.tip_link
        )
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        self.params.install("CartesianOrientationSlerp", blackboard);
        Ok(())
    }

    fn fk_pairs(&self, _robot: &Robot) -> Vec<(String, String)> {
        vec![(self.params.root_link.clone(), self.params.tip_link.clone())]
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let root = paths::goal(&self.name());
        let goal_rotation = rotation_of(&frame_input(blackboard, &root.child("goal")));
        let weight = scalar_input(blackboard, &root.child("weight"));
        let gain = scalar_input(blackboard, &root.child("gain"));
        let max_speed = scalar_input(blackboard, &root.child("max_speed"));

        let fk = robot.fk(&self.params.root_link, &self.params.tip_link)?;
        let current_rotation = rotation_of(&fk);
        let evaluated = frame_input(
            blackboard,
            &paths::fk_evaluated(&self.params.root_link, &self.params.tip_link),
        );
        let current_evaluated_rotation = rotation_of(&evaluated);

        // Capped slerp fraction toward the goal.
        let (_, angle) =
            axis_angle_from_rotation(&current_rotation.transpose().matmul(&goal_rotation));
        let angle = smooth_abs(&angle);
        let capped = smooth_min(&safe_division(&max_speed, &(gain * angle)), &Expr::constant(1.0));

        let q1 = quaternion_from_rotation(&current_rotation);
        let q2 = quaternion_from_rotation(&goal_rotation);
        let intermediate = slerp(&q1, &q2, &capped);
        let diff = quaternion_diff(&q1, &intermediate);
        let (axis, angle) = axis_angle_from_quaternion(&diff[0], &diff[1], &diff[2], &diff[3]);
        let control = axis.scale(&angle);

        // Perturbed current-vs-evaluated axis-angle as the expression.
        let hack = rotation_axis_angle(
            &vector3(Expr::constant(0.0), Expr::constant(0.0), Expr::constant(1.0)),
            &Expr::constant(1e-4),
        );
        let measured = current_rotation
            .transpose()
            .matmul(&current_evaluated_rotation.matmul(&hack))
            .transpose();
        let (axis, angle) = axis_angle_from_rotation(&measured);
        let expression = axis.scale(&angle);

        let mut constraints = IndexMap::new();
        for i in 0..3 {
            constraints.insert(
                format!("{}/{i}", self.name()),
                SoftConstraint::tracking(
                    control[i].clone(),
                    weight.clone(),
                    expression[i].clone(),
                ),
            );
        }
        Ok(constraints)
    }
}
