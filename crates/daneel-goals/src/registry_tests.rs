use serde_json::json;

use crate::{goal_from_json, GoalError};

#[test]
fn joint_position_from_blob() {
    let goal = goal_from_json(
        "JointPosition",
        &json!({
            "joint_name": "torso_lift_joint",
            "goal_position": 0.3,
            "gain": 5,
            "max_speed": 0.5
        }),
    )
    .unwrap();
    assert_eq!(goal.name(), "JointPosition/torso_lift_joint");
}

#[test]
fn joint_position_list_from_blob() {
    let goal = goal_from_json(
        "JointPositionList",
        &json!({
            "goal_state": {
                "name": ["a", "b"],
                "position": [0.1, 0.2]
            }
        }),
    )
    .unwrap();
    assert_eq!(goal.name(), "JointPositionList");
}

#[test]
fn list_length_mismatch_is_invalid() {
    let err = goal_from_json(
        "JointPositionList",
        &json!({
            "goal_state": { "name": ["a"], "position": [0.1, 0.2] }
        }),
    )
    .unwrap_err();
    assert!(matches!(err, GoalError::InvalidParams { .. }));
}

#[test]
fn cartesian_from_blob_with_aliases() {
    let goal = goal_from_json(
        "CartesianPosition",
        &json!({
            "root": "base_footprint",
            "tip": "r_gripper_tool_frame",
            "goal_pose": {
                "position": [0.2, 0.0, 0.6],
                "orientation": [0.0, 0.0, 0.0, 1.0]
            },
            "max_speed": 0.3
        }),
    )
    .unwrap();
    assert_eq!(
        goal.name(),
        "CartesianPosition/base_footprint/r_gripper_tool_frame"
    );
}

#[test]
fn avoidance_from_blob() {
    let goal = goal_from_json(
        "LinkToAnyAvoidance",
        &json!({
            "link_name": "gripper",
            "zero_weight_distance": 0.1
        }),
    )
    .unwrap();
    assert_eq!(goal.name(), "LinkToAnyAvoidance/gripper");
    assert_eq!(goal.collision_links(), vec!["gripper".to_owned()]);
}

#[test]
fn move_to_pose_from_blob() {
    let goal = goal_from_json(
        "MoveToPoseConstraint",
        &json!({
            "root_link": "base",
            "tip_link": "tool",
            "goal": {
                "position": [0.5, 0.0, 0.3],
                "orientation": [0.0, 0.0, 0.0, 1.0]
            }
        }),
    )
    .unwrap();
    assert_eq!(goal.name(), "MoveToPose/base/tool");
}

#[test]
fn missing_required_field_is_invalid() {
    let err = goal_from_json("JointPosition", &json!({ "goal": 1.0 })).unwrap_err();
    assert!(matches!(err, GoalError::InvalidParams { .. }));
}

#[test]
fn unknown_type_is_reported() {
    let err = goal_from_json("LevitateConstraint", &json!({})).unwrap_err();
    assert!(matches!(err, GoalError::UnknownType(t) if t == "LevitateConstraint"));
}
