//! Direction alignment goals.

use indexmap::IndexMap;

use daneel_core::{paths, Blackboard};
use daneel_expr::smooth::{safe_division, smooth_clamp};
use daneel_expr::spatial::{position_of, rotation_of};
use daneel_expr::{Expr, Robot};
use daneel_qp::SoftConstraint;

use crate::input::{scalar_input, set_vec3, vector_input};
use crate::{Goal, GoalError, Result};

fn normalized_or_err(goal: &str, v: [f64; 3]) -> Result<[f64; 3]> {
    let n = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if n < 1e-12 {
        return Err(GoalError::InvalidParams {
            goal: goal.to_owned(),
            message: "zero-length direction".to_owned(),
        });
    }
    Ok([v[0] / n, v[1] / n, v[2] / n])
}

/// Rotate a tip-fixed plane normal onto a root-frame goal normal.
#[derive(Clone, Debug)]
pub struct AlignPlanes {
    pub root_link: String,
    pub tip_link: String,
    /// Goal normal in the root frame.
    pub root_normal: [f64; 3],
    /// Plane normal fixed in the tip frame.
    pub tip_normal: [f64; 3],
    pub weight: f64,
    pub gain: f64,
    pub max_speed: f64,
}

impl AlignPlanes {
    pub fn new(
        root: impl Into<String>,
        tip: impl Into<String>,
        root_normal: [f64; 3],
        tip_normal: [f64; 3],
    ) -> Self {
        Self {
            root_link: root.into(),
            tip_link: tip.into(),
            root_normal,
            tip_normal,
            weight: crate::HIGH_WEIGHT,
            gain: 3.0,
            max_speed: 0.5,
        }
    }
}

impl Goal for AlignPlanes {
    fn name(&self) -> String {
        format!("AlignPlanes/{}/{}", self.root_link, self.tip_link)
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        let name = self.name();
        let root = paths::goal(&name);
        set_vec3(
            blackboard,
            &root.child("root_normal"),
            normalized_or_err(&name, self.root_normal)?,
        );
        set_vec3(
            blackboard,
            &root.child("tip_normal"),
            normalized_or_err(&name, self.tip_normal)?,
        );
        blackboard.set(&root.child("weight"), self.weight);
        blackboard.set(&root.child("gain"), self.gain);
        blackboard.set(&root.child("max_speed"), self.max_speed);
        Ok(())
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let root = paths::goal(&self.name());
        let goal_normal = vector_input(blackboard, &root.child("root_normal"));
        let tip_normal = vector_input(blackboard, &root.child("tip_normal"));
        let weight = scalar_input(blackboard, &root.child("weight"));
        let gain = scalar_input(blackboard, &root.child("gain"));
        let max_speed = scalar_input(blackboard, &root.child("max_speed"));

        let rotation = rotation_of(&robot.fk(&self.root_link, &self.tip_link)?);
        let current_normal = rotation.matmul(&tip_normal);

        let mut constraints = IndexMap::new();
        for i in 0..3 {
            let error = &goal_normal[i] - &current_normal[i];
            let bound = smooth_clamp(&(&gain * error), &(-(&max_speed)), &max_speed);
            constraints.insert(
                format!("{}/{i}", self.name()),
                SoftConstraint::tracking(bound, weight.clone(), current_normal[i].clone()),
            );
        }
        Ok(constraints)
    }
}

/// Point a tip-fixed axis at a root-frame target point.
#[derive(Clone, Debug)]
pub struct Pointing {
    pub root_link: String,
    pub tip_link: String,
    /// Target point in the root frame.
    pub goal_point: [f64; 3],
    /// Pointing axis fixed in the tip frame.
    pub pointing_axis: [f64; 3],
    pub weight: f64,
    pub gain: f64,
    pub max_speed: f64,
}

impl Pointing {
    pub fn new(
        root: impl Into<String>,
        tip: impl Into<String>,
        goal_point: [f64; 3],
        pointing_axis: [f64; 3],
    ) -> Self {
        Self {
            root_link: root.into(),
            tip_link: tip.into(),
            goal_point,
            pointing_axis,
            weight: crate::HIGH_WEIGHT,
            gain: 3.0,
            max_speed: 0.5,
        }
    }
}

impl Goal for Pointing {
    fn name(&self) -> String {
        format!("Pointing/{}/{}", self.root_link, self.tip_link)
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        let name = self.name();
        let root = paths::goal(&name);
        set_vec3(blackboard, &root.child("goal_point"), self.goal_point);
        set_vec3(
            blackboard,
            &root.child("pointing_axis"),
            normalized_or_err(&name, self.pointing_axis)?,
        );
        blackboard.set(&root.child("weight"), self.weight);
        blackboard.set(&root.child("gain"), self.gain);
        blackboard.set(&root.child("max_speed"), self.max_speed);
        Ok(())
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let root = paths::goal(&self.name());
        let goal_point = point_like(vector_input(blackboard, &root.child("goal_point")));
        let axis = vector_input(blackboard, &root.child("pointing_axis"));
        let weight = scalar_input(blackboard, &root.child("weight"));
        let gain = scalar_input(blackboard, &root.child("gain"));
        let max_speed = scalar_input(blackboard, &root.child("max_speed"));

        let fk = robot.fk(&self.root_link, &self.tip_link)?;
        let current_axis = rotation_of(&fk).matmul(&axis);
        let to_goal = &goal_point - &position_of(&fk);
        let norm = to_goal.norm();
        let goal_dir = to_goal.map(|e| safe_division(e, &norm));

        let mut constraints = IndexMap::new();
        for i in 0..3 {
            let error = &goal_dir[i] - &current_axis[i];
            let bound = smooth_clamp(&(&gain * error), &(-(&max_speed)), &max_speed);
            constraints.insert(
                format!("{}/{i}", self.name()),
                SoftConstraint::tracking(bound, weight.clone(), current_axis[i].clone()),
            );
        }
        Ok(constraints)
    }
}

// A direction used as a position: flip w to 1 so frame subtraction
// yields a direction again.
fn point_like(mut v: daneel_expr::ExprMatrix) -> daneel_expr::ExprMatrix {
    v[(3, 0)] = Expr::constant(1.0);
    v
}
