//! Shared fixtures for goal tests.

use daneel_core::{paths, Blackboard};
use daneel_expr::{compile, ChainSpec, Expr, ExprMatrix, JointKind, JointSpec, Robot};
use daneel_tape::TapeScratch;

pub fn revolute(name: &str, parent: &str, child: &str, origin_x: f64) -> JointSpec {
    JointSpec {
        name: name.to_owned(),
        kind: JointKind::Revolute,
        parent_link: parent.to_owned(),
        child_link: child.to_owned(),
        axis: [0.0, 0.0, 1.0],
        origin_xyz: [origin_x, 0.0, 0.0],
        origin_quat: [0.0, 0.0, 0.0, 1.0],
        lower: Some(-3.1),
        upper: Some(3.1),
        velocity_limit: Some(1.0),
        weight: Some(1e-4),
        collision: None,
    }
}

/// Two-revolute planar arm with 1 m links: base → upper_arm → forearm,
/// tool frame fixed at the forearm tip. Straight arm puts the tool at
/// `(2, 0)`.
pub fn planar_robot(blackboard: &mut Blackboard) -> Robot {
    let mut wrist = revolute("wrist_fixed", "forearm", "tool", 1.0);
    wrist.kind = JointKind::Fixed;
    let spec = ChainSpec {
        root_link: "base".to_owned(),
        joints: vec![
            revolute("shoulder", "base", "upper_arm", 0.0),
            revolute("elbow", "upper_arm", "forearm", 1.0),
            wrist,
        ],
    };
    Robot::from_spec(&spec, 1.0, 1e-4, |name| {
        blackboard.to_symbol(&paths::joint_position(name))
    })
    .unwrap()
}

pub fn set_joint(blackboard: &mut Blackboard, name: &str, position: f64) {
    blackboard.set(&paths::joint_position(name), position);
}

/// Evaluate one scalar expression against live blackboard values.
pub fn eval(blackboard: &Blackboard, expr: &Expr) -> f64 {
    let symbols = expr.free_symbols();
    let matrix = ExprMatrix::column(vec![expr.clone()]);
    let tape = compile(&matrix, &symbols).expect("test expression should compile");
    let mut inputs = vec![0.0; symbols.len()];
    blackboard
        .resolve(&symbols, &mut inputs)
        .expect("all symbols should resolve");
    let mut scratch = TapeScratch::new();
    tape.eval(&inputs, &mut scratch);
    scratch.output()[0]
}

/// Publish an identity evaluated-FK pose for a pair.
pub fn publish_identity_fk(blackboard: &mut Blackboard, root: &str, tip: &str) {
    publish_fk(blackboard, root, tip, [0.0; 3], [0.0, 0.0, 0.0, 1.0]);
}

/// Publish an evaluated-FK pose for a pair.
pub fn publish_fk(
    blackboard: &mut Blackboard,
    root: &str,
    tip: &str,
    position: [f64; 3],
    orientation: [f64; 4],
) {
    let base = paths::fk_evaluated(root, tip);
    let pos = base.child("position");
    for (k, v) in ["x", "y", "z"].iter().zip(position) {
        blackboard.set(&pos.child(*k), v);
    }
    let rot = base.child("orientation");
    for (k, v) in ["x", "y", "z", "w"].iter().zip(orientation) {
        blackboard.set(&rot.child(*k), v);
    }
}
