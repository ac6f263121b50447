//! Context fixtures for scheduler and composite tests.

use daneel_core::{paths, Blackboard};
use daneel_expr::{ChainSpec, JointKind, JointSpec, Robot};
use daneel_goals::{Goal, JointPosition};
use daneel_qp::QpProblemBuilder;
use daneel_world::World;

use crate::context::{FkTable, MotionCtx};
use crate::scheduler::SchedulerSettings;

pub fn one_joint_spec() -> ChainSpec {
    ChainSpec {
        root_link: "base".to_owned(),
        joints: vec![JointSpec {
            name: "j0".to_owned(),
            kind: JointKind::Revolute,
            parent_link: "base".to_owned(),
            child_link: "link0".to_owned(),
            axis: [0.0, 0.0, 1.0],
            origin_xyz: [0.0, 0.0, 0.0],
            origin_quat: [0.0, 0.0, 0.0, 1.0],
            lower: Some(-std::f64::consts::PI),
            upper: Some(std::f64::consts::PI),
            velocity_limit: Some(1.0),
            weight: Some(1e-4),
            collision: None,
        }],
    }
}

/// One-joint context tracking `q* = goal` with gain 10, max speed 1.
pub fn tracking_ctx(goal: f64, settings: &SchedulerSettings) -> MotionCtx {
    let mut bb = Blackboard::new();
    let robot = Robot::from_spec(&one_joint_spec(), 1.0, 1e-4, |name| {
        bb.to_symbol(&paths::joint_position(name))
    })
    .unwrap();
    bb.set(&paths::joint_position("j0"), 0.0);

    let goal = JointPosition::new("j0", goal);
    goal.install(&mut bb).unwrap();
    let constraints = goal.soft_constraints(&mut bb, &robot).unwrap();

    let mut builder = QpProblemBuilder::new().with_robot(&robot, settings.sample_period());
    builder.add_soft_constraints(constraints.into_iter());
    let problem = builder.build(None).unwrap();

    let fk = FkTable::new(&robot, []).unwrap();
    MotionCtx::new(
        bb,
        robot,
        World::new(),
        problem,
        fk,
        Vec::new(),
        settings.sample_period(),
    )
}
