//! Shared fixtures for the end-to-end motion scenarios.

use nalgebra::Point3;

use daneel_expr::{ChainSpec, CollisionSphere, JointKind, JointSpec};
use daneel_lib::{Config, JointStates, MotionExecutive};

pub fn revolute(
    name: &str,
    parent: &str,
    child: &str,
    axis: [f64; 3],
    origin: [f64; 3],
) -> JointSpec {
    JointSpec {
        name: name.to_owned(),
        kind: JointKind::Revolute,
        parent_link: parent.to_owned(),
        child_link: child.to_owned(),
        axis,
        origin_xyz: origin,
        origin_quat: [0.0, 0.0, 0.0, 1.0],
        lower: Some(-2.9),
        upper: Some(2.9),
        velocity_limit: Some(1.0),
        weight: Some(1e-4),
        collision: None,
    }
}

/// One revolute joint with the scenario limits: `[-π, π]`, 1 rad/s.
pub fn one_joint_chain() -> ChainSpec {
    let mut joint = revolute("j0", "base", "link0", [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]);
    joint.lower = Some(-std::f64::consts::PI);
    joint.upper = Some(std::f64::consts::PI);
    ChainSpec {
        root_link: "base".to_owned(),
        joints: vec![joint],
    }
}

/// 6-DoF arm, z-up, reaching along +x: pan, lift, elbow, wrist pitch,
/// wrist yaw, wrist roll. Tool link carries a 2 cm collision sphere.
pub fn six_dof_chain() -> ChainSpec {
    let mut wrist_roll = revolute(
        "wrist_roll",
        "wrist2",
        "tool",
        [1.0, 0.0, 0.0],
        [0.05, 0.0, 0.0],
    );
    wrist_roll.collision = Some(CollisionSphere {
        center: [0.0, 0.0, 0.0],
        radius: 0.02,
    });
    ChainSpec {
        root_link: "base".to_owned(),
        joints: vec![
            revolute(
                "shoulder_pan",
                "base",
                "shoulder_link",
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 0.2],
            ),
            revolute(
                "shoulder_lift",
                "shoulder_link",
                "upper_arm",
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.1],
            ),
            revolute(
                "elbow",
                "upper_arm",
                "forearm",
                [0.0, 1.0, 0.0],
                [0.5, 0.0, 0.0],
            ),
            revolute(
                "wrist_pitch",
                "forearm",
                "wrist1",
                [0.0, 1.0, 0.0],
                [0.5, 0.0, 0.0],
            ),
            revolute(
                "wrist_yaw",
                "wrist1",
                "wrist2",
                [0.0, 0.0, 1.0],
                [0.1, 0.0, 0.0],
            ),
            wrist_roll,
        ],
    }
}

/// Elbow-bent home configuration for the 6-DoF arm.
pub fn six_dof_home() -> [(&'static str, f64); 6] {
    [
        ("shoulder_pan", 0.0),
        ("shoulder_lift", 0.9),
        ("elbow", -1.8),
        ("wrist_pitch", 0.9),
        ("wrist_yaw", 0.0),
        ("wrist_roll", 0.0),
    ]
}

pub fn seed_home(executive: &mut MotionExecutive) {
    for (name, position) in six_dof_home() {
        executive.set_joint_position(name, position);
    }
}

/// Numeric tool position for a joint-state sample, computed through an
/// independent FK evaluation of the same chain.
pub fn tool_position(chain: &ChainSpec, states: &JointStates) -> Point3<f64> {
    use daneel_core::{paths, Blackboard};
    use daneel_tape::TapeScratch;

    let mut bb = Blackboard::new();
    let robot = daneel_expr::Robot::from_spec(chain, 1.0, 1e-4, |name| {
        bb.to_symbol(&paths::joint_position(name))
    })
    .unwrap();
    for (name, state) in states.iter() {
        bb.set(&paths::joint_position(name), state.position);
    }

    let frame = robot.fk("base", "tool").unwrap();
    let symbols = frame.free_symbols();
    let tape = daneel_expr::compile(&frame, &symbols).unwrap();
    let mut inputs = vec![0.0; symbols.len()];
    bb.resolve(&symbols, &mut inputs).unwrap();
    let mut scratch = TapeScratch::new();
    tape.eval(&inputs, &mut scratch);
    let out = scratch.output();
    Point3::new(out[3], out[7], out[11])
}

pub fn default_config() -> Config {
    Config::default()
}
