use serde_json::json;

use crate::command::{
    CartesianConstraintKind, CartesianConstraintSpec, CollisionEntry, ConstraintSpec,
    JointConstraintSpec, MoveCmd, MoveGoal, PoseStamped,
};
use crate::PoseParam;

#[test]
fn move_goal_json_roundtrip() {
    let goal = MoveGoal {
        cmds: vec![MoveCmd {
            joint_constraints: vec![JointConstraintSpec {
                joint_name: "torso_lift_joint".to_owned(),
                goal_position: 0.3,
                weight: None,
                max_velocity: Some(0.02),
            }],
            cartesian_constraints: vec![CartesianConstraintSpec {
                kind: CartesianConstraintKind::Translation3d,
                root_link: "base_footprint".to_owned(),
                tip_link: "r_gripper_tool_frame".to_owned(),
                goal: PoseStamped {
                    frame_id: "base_footprint".to_owned(),
                    pose: PoseParam {
                        position: [0.2, 0.0, 0.6],
                        orientation: [0.0, 0.0, 0.0, 1.0],
                    },
                },
            }],
            constraints: vec![ConstraintSpec {
                kind: "LinkToAnyAvoidance".to_owned(),
                parameters: json!({ "link_name": "r_gripper_tool_frame" }),
            }],
            collisions: vec![CollisionEntry::avoid_all()],
        }],
    };

    let text = serde_json::to_string(&goal).unwrap();
    let back: MoveGoal = serde_json::from_str(&text).unwrap();
    assert_eq!(back, goal);
}

#[test]
fn cartesian_kind_uses_wire_names() {
    let text = serde_json::to_string(&CartesianConstraintKind::Translation3d).unwrap();
    assert_eq!(text, "\"TRANSLATION_3D\"");
    let text = serde_json::to_string(&CartesianConstraintKind::Rotation3d).unwrap();
    assert_eq!(text, "\"ROTATION_3D\"");
}

#[test]
fn constraint_spec_type_field_is_renamed() {
    let spec: ConstraintSpec = serde_json::from_value(json!({
        "type": "JointPosition",
        "parameters": { "joint_name": "j0", "goal": 1.0 }
    }))
    .unwrap();
    assert_eq!(spec.kind, "JointPosition");
}

#[test]
fn omitted_cmd_fields_default_to_empty() {
    let cmd: MoveCmd = serde_json::from_value(json!({})).unwrap();
    assert!(cmd.joint_constraints.is_empty());
    assert!(cmd.collisions.is_empty());
}
