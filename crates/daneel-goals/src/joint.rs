//! Joint-space goals.

use indexmap::IndexMap;

use daneel_core::{paths, Blackboard};
use daneel_expr::smooth::{smooth_max, smooth_min};
use daneel_expr::spatial::shortest_angular_distance;
use daneel_expr::{Expr, Robot};
use daneel_qp::SoftConstraint;

use crate::input::scalar_input;
use crate::{Goal, Result};

/// Drive one joint to a target position.
///
/// The error is shortest-angular-distance for continuous joints and a
/// plain difference otherwise; the commanded velocity is the gain-scaled
/// error clipped to `±max_speed`.
#[derive(Clone, Debug)]
pub struct JointPosition {
    pub joint_name: String,
    pub goal: f64,
    pub weight: f64,
    pub gain: f64,
    pub max_speed: f64,
}

impl JointPosition {
    pub fn new(joint_name: impl Into<String>, goal: f64) -> Self {
        Self {
            joint_name: joint_name.into(),
            goal,
            weight: 1.0,
            gain: 10.0,
            max_speed: 1.0,
        }
    }
}

impl Goal for JointPosition {
    fn name(&self) -> String {
        format!("JointPosition/{}", self.joint_name)
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        let root = paths::goal(&self.name());
        blackboard.set(&root.child("goal"), self.goal);
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
        let current = Expr::symbol(robot.joint(&self.joint_name)?.symbol);
        let goal = scalar_input(blackboard, &root.child("goal"));
        let weight = scalar_input(blackboard, &root.child("weight"));
        let gain = scalar_input(blackboard, &root.child("gain"));
        let max_speed = scalar_input(blackboard, &root.child("max_speed"));

        let err = if robot.is_joint_continuous(&self.joint_name)? {
            shortest_angular_distance(&current, &goal)
        } else {
            goal - &current
        };
        let capped = smooth_max(&smooth_min(&(gain * err), &max_speed), &(-(&max_speed)));

        let mut constraints = IndexMap::new();
        constraints.insert(
            self.name(),
            SoftConstraint::tracking(capped, weight, current),
        );
        Ok(constraints)
    }
}

/// Joint targets for several joints at once.
#[derive(Clone, Debug)]
pub struct JointPositionList {
    goals: Vec<JointPosition>,
}

impl JointPositionList {
    pub fn new(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            goals: entries
                .into_iter()
                .map(|(name, position)| JointPosition::new(name, position))
                .collect(),
        }
    }

    pub fn with_settings(mut self, weight: f64, gain: f64, max_speed: f64) -> Self {
        for g in &mut self.goals {
            g.weight = weight;
            g.gain = gain;
            g.max_speed = max_speed;
        }
        self
    }
}

impl Goal for JointPositionList {
    fn name(&self) -> String {
        "JointPositionList".to_owned()
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        for g in &self.goals {
            g.install(blackboard)?;
        }
        Ok(())
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let mut constraints = IndexMap::new();
        for g in &self.goals {
            constraints.extend(g.soft_constraints(blackboard, robot)?);
        }
        Ok(constraints)
    }
}

/// Keep a joint aligned with the gravity direction.
///
/// The goal angle is the projection of the `world/gravity` leaf onto the
/// joint's motion plane, tracked with the JointPosition skeleton; the
/// gravity vector can be re-published between ticks without touching the
/// compiled program.
#[derive(Clone, Debug)]
pub struct GravityJoint {
    pub joint_name: String,
    /// Gravity components spanning the joint plane (indices into the
    /// gravity vector): the goal angle is `atan2(g[plane.1], g[plane.0])`.
    pub plane: (usize, usize),
    pub weight: f64,
    pub gain: f64,
    pub max_speed: f64,
}

impl GravityJoint {
    pub fn new(joint_name: impl Into<String>, plane: (usize, usize)) -> Self {
        Self {
            joint_name: joint_name.into(),
            plane,
            weight: 1.0,
            gain: 10.0,
            max_speed: 1.0,
        }
    }
}

impl Goal for GravityJoint {
    fn name(&self) -> String {
        format!("GravityJoint/{}", self.joint_name)
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        let root = paths::goal(&self.name());
        blackboard.set(&root.child("weight"), self.weight);
        blackboard.set(&root.child("gain"), self.gain);
        blackboard.set(&root.child("max_speed"), self.max_speed);
        // Default gravity points down; perception may overwrite it.
        if !blackboard.contains(&paths::gravity().child(0usize)) {
            let g = paths::gravity();
            blackboard.set(&g.child(0usize), 0.0);
            blackboard.set(&g.child(1usize), 0.0);
            blackboard.set(&g.child(2usize), -1.0);
        }
        Ok(())
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let root = paths::goal(&self.name());
        let current = Expr::symbol(robot.joint(&self.joint_name)?.symbol);
        let weight = scalar_input(blackboard, &root.child("weight"));
        let gain = scalar_input(blackboard, &root.child("gain"));
        let max_speed = scalar_input(blackboard, &root.child("max_speed"));

        let g = paths::gravity();
        let ga = scalar_input(blackboard, &g.child(self.plane.0));
        let gb = scalar_input(blackboard, &g.child(self.plane.1));
        let goal_angle = gb.atan2(&ga);

        let err = shortest_angular_distance(&current, &goal_angle);
        let capped = smooth_max(&smooth_min(&(gain * err), &max_speed), &(-(&max_speed)));

        let mut constraints = IndexMap::new();
        constraints.insert(
            self.name(),
            SoftConstraint::tracking(capped, weight, current),
        );
        Ok(constraints)
    }
}
