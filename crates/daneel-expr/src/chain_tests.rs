use approx::assert_relative_eq;
use daneel_core::Symbol;

use crate::test_utils::eval_matrix;
use crate::{ChainError, ChainSpec, JointKind, JointSpec, Robot};

fn joint(name: &str, kind: JointKind, parent: &str, child: &str) -> JointSpec {
    JointSpec {
        name: name.to_owned(),
        kind,
        parent_link: parent.to_owned(),
        child_link: child.to_owned(),
        axis: [0.0, 0.0, 1.0],
        origin_xyz: [0.0, 0.0, 0.0],
        origin_quat: [0.0, 0.0, 0.0, 1.0],
        lower: None,
        upper: None,
        velocity_limit: None,
        weight: None,
        collision: None,
    }
}

fn planar_two_link() -> ChainSpec {
    let mut shoulder = joint("shoulder", JointKind::Revolute, "base", "upper_arm");
    shoulder.lower = Some(-3.0);
    shoulder.upper = Some(3.0);
    let mut elbow = joint("elbow", JointKind::Revolute, "upper_arm", "forearm");
    elbow.origin_xyz = [1.0, 0.0, 0.0];
    elbow.lower = Some(-3.0);
    elbow.upper = Some(3.0);
    let mut wrist = joint("wrist_fixed", JointKind::Fixed, "forearm", "tool");
    wrist.origin_xyz = [1.0, 0.0, 0.0];
    ChainSpec {
        root_link: "base".to_owned(),
        joints: vec![shoulder, elbow, wrist],
    }
}

fn build(spec: &ChainSpec) -> Robot {
    let mut next = 0u32;
    Robot::from_spec(spec, 1.0, 0.001, |_| {
        let s = Symbol::from_raw(next);
        next += 1;
        s
    })
    .unwrap()
}

#[test]
fn controlled_joints_exclude_fixed() {
    let robot = build(&planar_two_link());
    assert_eq!(robot.controlled_joint_names(), ["shoulder", "elbow"]);
    assert_eq!(robot.controlled_symbols().len(), 2);
}

#[test]
fn fk_matches_planar_geometry() {
    let robot = build(&planar_two_link());
    let fk = robot.fk("base", "tool").unwrap();
    let symbols = robot.controlled_symbols();

    // Straight arm along +x: tool at (2, 0).
    let vals = eval_matrix(&fk, &[(symbols[0], 0.0), (symbols[1], 0.0)]);
    assert_relative_eq!(vals[3], 2.0, epsilon = 1e-12);
    assert_relative_eq!(vals[7], 0.0, epsilon = 1e-12);

    // Shoulder 90°: tool at (0, 2).
    let vals = eval_matrix(
        &fk,
        &[(symbols[0], std::f64::consts::FRAC_PI_2), (symbols[1], 0.0)],
    );
    assert_relative_eq!(vals[3], 0.0, epsilon = 1e-12);
    assert_relative_eq!(vals[7], 2.0, epsilon = 1e-12);

    // Elbow 90°: tool at (1, 1).
    let vals = eval_matrix(
        &fk,
        &[(symbols[0], 0.0), (symbols[1], std::f64::consts::FRAC_PI_2)],
    );
    assert_relative_eq!(vals[3], 1.0, epsilon = 1e-12);
    assert_relative_eq!(vals[7], 1.0, epsilon = 1e-12);
}

#[test]
fn fk_of_partial_chain() {
    let robot = build(&planar_two_link());
    let fk = robot.fk("upper_arm", "forearm").unwrap();
    let symbols = robot.controlled_symbols();
    let vals = eval_matrix(&fk, &[(symbols[0], 1.0), (symbols[1], 0.0)]);
    // Only the elbow offset; the shoulder angle is outside this chain.
    assert_relative_eq!(vals[3], 1.0, epsilon = 1e-12);
}

#[test]
fn unknown_links_are_rejected() {
    let robot = build(&planar_two_link());
    assert!(matches!(
        robot.fk("base", "nope"),
        Err(ChainError::UnknownLink(_))
    ));
    assert!(matches!(
        robot.fk("tool", "base"),
        Err(ChainError::NoPath { .. })
    ));
}

#[test]
fn planar_base_composes_translation_and_yaw() {
    let spec = ChainSpec {
        root_link: "odom".to_owned(),
        joints: vec![
            joint("base_x", JointKind::BaseX, "odom", "base_x_link"),
            joint("base_y", JointKind::BaseY, "base_x_link", "base_y_link"),
            joint("base_yaw", JointKind::BaseYaw, "base_y_link", "base_link"),
        ],
    };
    let robot = build(&spec);
    assert!(robot.is_joint_continuous("base_yaw").unwrap());
    assert!(!robot.is_joint_continuous("base_x").unwrap());

    let fk = robot.fk("odom", "base_link").unwrap();
    let s = robot.controlled_symbols();
    let vals = eval_matrix(
        &fk,
        &[
            (s[0], 1.5),
            (s[1], -0.5),
            (s[2], std::f64::consts::FRAC_PI_2),
        ],
    );
    assert_relative_eq!(vals[3], 1.5, epsilon = 1e-12);
    assert_relative_eq!(vals[7], -0.5, epsilon = 1e-12);
    // Rotated x axis points along +y.
    assert_relative_eq!(vals[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(vals[4], 1.0, epsilon = 1e-12);
}

#[test]
fn position_limits_only_for_bounded_joints() {
    let robot = build(&planar_two_link());
    assert_eq!(
        robot.joint("shoulder").unwrap().position_limits(),
        Some((-3.0, 3.0))
    );

    let spec = ChainSpec {
        root_link: "a".to_owned(),
        joints: vec![joint("spin", JointKind::Continuous, "a", "b")],
    };
    let robot = build(&spec);
    assert_eq!(robot.joint("spin").unwrap().position_limits(), None);
}

#[test]
fn duplicate_joint_names_rejected() {
    let spec = ChainSpec {
        root_link: "a".to_owned(),
        joints: vec![
            joint("j", JointKind::Revolute, "a", "b"),
            joint("j", JointKind::Revolute, "b", "c"),
        ],
    };
    let mut next = 0u32;
    let result = Robot::from_spec(&spec, 1.0, 0.001, |_| {
        let s = Symbol::from_raw(next);
        next += 1;
        s
    });
    assert!(matches!(result, Err(ChainError::DuplicateJoint(_))));
}
