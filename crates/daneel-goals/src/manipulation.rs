//! Manipulation compositions: door, drawer, and knob motions built from
//! the Cartesian primitives.
//!
//! Each composition derives a target pose from the articulated part's
//! geometry at install time and delegates constraint emission to
//! [`CartesianPosition`] and [`CartesianOrientationSlerp`]. The approach
//! path is left to the avoidance constraints; what matters here is where
//! the grasp frame has to end up.

use indexmap::IndexMap;
use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};

use daneel_core::Blackboard;
use daneel_expr::Robot;
use daneel_qp::SoftConstraint;

use crate::input::PoseParam;
use crate::{CartesianOrientationSlerp, CartesianPosition, Goal, Result};

fn to_isometry(pose: &PoseParam) -> Isometry3<f64> {
    let p = pose.normalized();
    Isometry3::from_parts(
        Translation3::new(p.position[0], p.position[1], p.position[2]),
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
            p.orientation[3],
            p.orientation[0],
            p.orientation[1],
            p.orientation[2],
        )),
    )
}

fn to_pose_param(iso: &Isometry3<f64>) -> PoseParam {
    let q = iso.rotation;
    PoseParam {
        position: [iso.translation.x, iso.translation.y, iso.translation.z],
        orientation: [q.i, q.j, q.k, q.w],
    }
}

/// Full-pose target: position plus slerp orientation toward one pose.
#[derive(Clone, Debug)]
pub struct MoveToPose {
    position: CartesianPosition,
    orientation: CartesianOrientationSlerp,
}

impl MoveToPose {
    pub fn new(root: impl Into<String>, tip: impl Into<String>, goal: PoseParam) -> Self {
        let root = root.into();
        let tip = tip.into();
        Self {
            position: CartesianPosition::new(root.clone(), tip.clone(), goal),
            orientation: CartesianOrientationSlerp::new(root, tip, goal),
        }
    }
}

impl Goal for MoveToPose {
    fn name(&self) -> String {
        format!(
            "MoveToPose/{}/{}",
            self.position.params.root_link, self.position.params.tip_link
        )
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        self.position.install(blackboard)?;
        self.orientation.install(blackboard)
    }

    fn fk_pairs(&self, robot: &Robot) -> Vec<(String, String)> {
        self.orientation.fk_pairs(robot)
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        let mut constraints = self.position.soft_constraints(blackboard, robot)?;
        constraints.extend(self.orientation.soft_constraints(blackboard, robot)?);
        Ok(constraints)
    }
}

/// Slide a grasped drawer handle along its extraction axis.
///
/// `action` is the signed fraction of `travel` to move: positive opens,
/// negative closes.
#[derive(Clone, Debug)]
pub struct OpenCloseDrawer {
    delegate: MoveToPose,
}

impl OpenCloseDrawer {
    pub fn new(
        root: impl Into<String>,
        tip: impl Into<String>,
        handle_pose: PoseParam,
        axis: [f64; 3],
        travel: f64,
        action: f64,
    ) -> Self {
        let handle = to_isometry(&handle_pose);
        let direction = handle.rotation * Vector3::new(axis[0], axis[1], axis[2]);
        let target = Isometry3::from_parts(
            Translation3::from(handle.translation.vector + direction * (travel * action)),
            handle.rotation,
        );
        Self {
            delegate: MoveToPose::new(root, tip, to_pose_param(&target)),
        }
    }
}

impl Goal for OpenCloseDrawer {
    fn name(&self) -> String {
        self.delegate.name()
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        self.delegate.install(blackboard)
    }

    fn fk_pairs(&self, robot: &Robot) -> Vec<(String, String)> {
        self.delegate.fk_pairs(robot)
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        self.delegate.soft_constraints(blackboard, robot)
    }
}

/// Swing a grasped door handle along the hinge arc.
///
/// The target is the handle pose rotated about the hinge axis by the
/// `action`-signed opening angle.
#[derive(Clone, Debug)]
pub struct OpenCloseDoor {
    delegate: MoveToPose,
}

impl OpenCloseDoor {
    pub fn new(
        root: impl Into<String>,
        tip: impl Into<String>,
        handle_pose: PoseParam,
        hinge_pose: PoseParam,
        hinge_axis: [f64; 3],
        opening_angle: f64,
        action: f64,
    ) -> Self {
        let handle = to_isometry(&handle_pose);
        let hinge = to_isometry(&hinge_pose);
        let axis_world =
            Unit::new_normalize(hinge.rotation * Vector3::new(hinge_axis[0], hinge_axis[1], hinge_axis[2]));
        let swing = Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&axis_world, opening_angle * action),
        );
        // Rotate the handle about the hinge anchor.
        let anchor = Isometry3::from_parts(hinge.translation, UnitQuaternion::identity());
        let target = anchor * swing * anchor.inverse() * handle;
        Self {
            delegate: MoveToPose::new(root, tip, to_pose_param(&target)),
        }
    }
}

impl Goal for OpenCloseDoor {
    fn name(&self) -> String {
        self.delegate.name()
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        self.delegate.install(blackboard)
    }

    fn fk_pairs(&self, robot: &Robot) -> Vec<(String, String)> {
        self.delegate.fk_pairs(robot)
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        self.delegate.soft_constraints(blackboard, robot)
    }
}

/// Twist a grasped rotary knob about its face axis, holding position.
#[derive(Clone, Debug)]
pub struct TurnRotaryKnob {
    delegate: MoveToPose,
}

impl TurnRotaryKnob {
    pub fn new(
        root: impl Into<String>,
        tip: impl Into<String>,
        knob_pose: PoseParam,
        knob_axis: [f64; 3],
        turn_angle: f64,
        action: f64,
    ) -> Self {
        let knob = to_isometry(&knob_pose);
        let axis_world =
            Unit::new_normalize(knob.rotation * Vector3::new(knob_axis[0], knob_axis[1], knob_axis[2]));
        let twist = UnitQuaternion::from_axis_angle(&axis_world, turn_angle * action);
        let target = Isometry3::from_parts(knob.translation, twist * knob.rotation);
        Self {
            delegate: MoveToPose::new(root, tip, to_pose_param(&target)),
        }
    }
}

impl Goal for TurnRotaryKnob {
    fn name(&self) -> String {
        self.delegate.name()
    }

    fn install(&self, blackboard: &mut Blackboard) -> Result<()> {
        self.delegate.install(blackboard)
    }

    fn fk_pairs(&self, robot: &Robot) -> Vec<(String, String)> {
        self.delegate.fk_pairs(robot)
    }

    fn soft_constraints(
        &self,
        blackboard: &mut Blackboard,
        robot: &Robot,
    ) -> Result<IndexMap<String, SoftConstraint>> {
        self.delegate.soft_constraints(blackboard, robot)
    }
}
