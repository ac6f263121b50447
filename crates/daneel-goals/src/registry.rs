//! Goal construction from type strings and JSON parameter blobs.
//!
//! This is the escape hatch of the motion command surface: anything not
//! expressible through the fixed joint/cartesian fields arrives as
//! `(type, params)` and is built here.

use serde::Deserialize;
use serde_json::Value;

use crate::input::PoseParam;
use crate::{
    AlignPlanes, CartesianOrientationSlerp, CartesianPosition, Goal, GoalError, GravityJoint,
    JointPosition, JointPositionList, LinkToAnyAvoidance, MoveToPose, OpenCloseDoor,
    OpenCloseDrawer, Pointing, Result, TurnRotaryKnob,
};

fn invalid(goal: &str, err: impl std::fmt::Display) -> GoalError {
    GoalError::InvalidParams {
        goal: goal.to_owned(),
        message: err.to_string(),
    }
}

fn parse<T: serde::de::DeserializeOwned>(goal: &str, params: &Value) -> Result<T> {
    serde_json::from_value(params.clone()).map_err(|e| invalid(goal, e))
}

#[derive(Deserialize)]
struct JointPositionParams {
    joint_name: String,
    #[serde(alias = "goal_position")]
    goal: f64,
    weight: Option<f64>,
    gain: Option<f64>,
    max_speed: Option<f64>,
}

#[derive(Deserialize)]
struct JointListParams {
    goal_state: GoalState,
    weight: Option<f64>,
    gain: Option<f64>,
    max_speed: Option<f64>,
}

#[derive(Deserialize)]
struct GoalState {
    name: Vec<String>,
    position: Vec<f64>,
}

#[derive(Deserialize)]
struct CartesianGoalParams {
    #[serde(alias = "root")]
    root_link: String,
    #[serde(alias = "tip")]
    tip_link: String,
    #[serde(alias = "goal_pose", alias = "goal_position")]
    goal: PoseParam,
    weight: Option<f64>,
    gain: Option<f64>,
    max_speed: Option<f64>,
}

#[derive(Deserialize)]
struct AvoidanceParams {
    link_name: String,
    repel_speed: Option<f64>,
    max_weight_distance: Option<f64>,
    low_weight_distance: Option<f64>,
    zero_weight_distance: Option<f64>,
}

#[derive(Deserialize)]
struct AlignPlanesParams {
    root_link: String,
    tip_link: String,
    root_normal: [f64; 3],
    tip_normal: [f64; 3],
}

#[derive(Deserialize)]
struct PointingParams {
    root_link: String,
    tip_link: String,
    goal_point: [f64; 3],
    pointing_axis: [f64; 3],
}

#[derive(Deserialize)]
struct GravityParams {
    joint_name: String,
    #[serde(default = "default_plane")]
    plane: (usize, usize),
}

fn default_plane() -> (usize, usize) {
    (0, 2)
}

#[derive(Deserialize)]
struct DrawerParams {
    root_link: String,
    tip_link: String,
    handle_pose: PoseParam,
    axis: [f64; 3],
    travel: f64,
    action: f64,
}

#[derive(Deserialize)]
struct DoorParams {
    root_link: String,
    tip_link: String,
    handle_pose: PoseParam,
    hinge_pose: PoseParam,
    hinge_axis: [f64; 3],
    opening_angle: f64,
    action: f64,
}

#[derive(Deserialize)]
struct KnobParams {
    root_link: String,
    tip_link: String,
    knob_pose: PoseParam,
    knob_axis: [f64; 3],
    turn_angle: f64,
    action: f64,
}

/// Construct a goal from its type string and JSON parameter blob.
pub fn goal_from_json(goal_type: &str, params: &Value) -> Result<Box<dyn Goal>> {
    match goal_type {
        "JointPosition" => {
            let p: JointPositionParams = parse(goal_type, params)?;
            let mut goal = JointPosition::new(p.joint_name, p.goal);
            if let Some(w) = p.weight {
                goal.weight = w;
            }
            if let Some(g) = p.gain {
                goal.gain = g;
            }
            if let Some(v) = p.max_speed {
                goal.max_speed = v;
            }
            Ok(Box::new(goal))
        }
        "JointPositionList" => {
            let p: JointListParams = parse(goal_type, params)?;
            if p.goal_state.name.len() != p.goal_state.position.len() {
                return Err(invalid(goal_type, "name/position length mismatch"));
            }
            let mut goal = JointPositionList::new(
                p.goal_state.name.into_iter().zip(p.goal_state.position),
            );
            if let (Some(w), Some(g), Some(v)) = (p.weight, p.gain, p.max_speed) {
                goal = goal.with_settings(w, g, v);
            }
            Ok(Box::new(goal))
        }
        "CartesianPosition" => {
            let p: CartesianGoalParams = parse(goal_type, params)?;
            let mut goal = CartesianPosition::new(p.root_link, p.tip_link, p.goal);
            apply_cartesian_overrides(&mut goal.params, p.weight, p.gain, p.max_speed);
            Ok(Box::new(goal))
        }
        "CartesianOrientationSlerp" => {
            let p: CartesianGoalParams = parse(goal_type, params)?;
            let mut goal = CartesianOrientationSlerp::new(p.root_link, p.tip_link, p.goal);
            apply_cartesian_overrides(&mut goal.params, p.weight, p.gain, p.max_speed);
            Ok(Box::new(goal))
        }
        "LinkToAnyAvoidance" => {
            let p: AvoidanceParams = parse(goal_type, params)?;
            let mut goal = LinkToAnyAvoidance::new(p.link_name);
            if let Some(v) = p.repel_speed {
                goal.repel_speed = v;
            }
            if let Some(v) = p.max_weight_distance {
                goal.max_weight_distance = v;
            }
            if let Some(v) = p.low_weight_distance {
                goal.low_weight_distance = v;
            }
            if let Some(v) = p.zero_weight_distance {
                goal.zero_weight_distance = v;
            }
            Ok(Box::new(goal))
        }
        "AlignPlanes" => {
            let p: AlignPlanesParams = parse(goal_type, params)?;
            Ok(Box::new(AlignPlanes::new(
                p.root_link,
                p.tip_link,
                p.root_normal,
                p.tip_normal,
            )))
        }
        "Pointing" => {
            let p: PointingParams = parse(goal_type, params)?;
            Ok(Box::new(Pointing::new(
                p.root_link,
                p.tip_link,
                p.goal_point,
                p.pointing_axis,
            )))
        }
        "GravityJoint" => {
            let p: GravityParams = parse(goal_type, params)?;
            Ok(Box::new(GravityJoint::new(p.joint_name, p.plane)))
        }
        "MoveToPoseConstraint" => {
            let p: CartesianGoalParams = parse(goal_type, params)?;
            Ok(Box::new(MoveToPose::new(p.root_link, p.tip_link, p.goal)))
        }
        "OpenCloseDrawerConstraint" => {
            let p: DrawerParams = parse(goal_type, params)?;
            Ok(Box::new(OpenCloseDrawer::new(
                p.root_link,
                p.tip_link,
                p.handle_pose,
                p.axis,
                p.travel,
                p.action,
            )))
        }
        "OpenCloseDoorConstraint" => {
            let p: DoorParams = parse(goal_type, params)?;
            Ok(Box::new(OpenCloseDoor::new(
                p.root_link,
                p.tip_link,
                p.handle_pose,
                p.hinge_pose,
                p.hinge_axis,
                p.opening_angle,
                p.action,
            )))
        }
        "TurnRotaryKnobConstraint" => {
            let p: KnobParams = parse(goal_type, params)?;
            Ok(Box::new(TurnRotaryKnob::new(
                p.root_link,
                p.tip_link,
                p.knob_pose,
                p.knob_axis,
                p.turn_angle,
                p.action,
            )))
        }
        other => Err(GoalError::UnknownType(other.to_owned())),
    }
}

fn apply_cartesian_overrides(
    params: &mut crate::CartesianParams,
    weight: Option<f64>,
    gain: Option<f64>,
    max_speed: Option<f64>,
) {
    if let Some(w) = weight {
        params.weight = w;
    }
    if let Some(g) = gain {
        params.gain = g;
    }
    if let Some(v) = max_speed {
        params.max_speed = v;
    }
}
