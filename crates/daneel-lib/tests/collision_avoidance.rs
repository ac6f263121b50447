//! End-to-end: the arm reroutes around a box in its path.

mod common;

use nalgebra::{Isometry3, Point3};

use daneel_lib::{
    CartesianConstraintKind, CartesianConstraintSpec, CollisionEntry, MotionExecutive, MoveCmd,
    MoveGoal, MoveResultCode, PoseParam, PoseStamped, Primitive, WorldBody, WorldOp,
};

const SPHERE_RADIUS: f64 = 0.02;
const BOX_SIZE: f64 = 0.05;

fn box_distance(tip: Point3<f64>, center: Point3<f64>) -> f64 {
    let half = BOX_SIZE / 2.0;
    let local = tip - center;
    let clamped = nalgebra::Vector3::new(
        local.x.clamp(-half, half),
        local.y.clamp(-half, half),
        local.z.clamp(-half, half),
    );
    (local - clamped).norm() - SPHERE_RADIUS
}

#[test]
fn tip_goes_around_the_box() {
    let chain = common::six_dof_chain();
    let mut executive = MotionExecutive::new(&chain, common::default_config()).unwrap();
    common::seed_home(&mut executive);

    let start = {
        let states: daneel_lib::JointStates = common::six_dof_home()
            .into_iter()
            .map(|(n, q)| daneel_lib::SingleJointState::new(n, q))
            .collect();
        common::tool_position(&chain, &states)
    };

    // Box 0.03 m in front of the tool sphere, sitting slightly below the
    // approach line; goal 0.2 m beyond the box.
    let box_center = Point3::new(
        start.x + SPHERE_RADIUS + 0.03 + BOX_SIZE / 2.0,
        start.y,
        start.z - 0.03,
    );
    executive
        .update_world(WorldOp::Add {
            body: WorldBody::primitive("obstacle", Primitive::Box {
                size: [BOX_SIZE; 3],
            }),
            pose: Isometry3::translation(box_center.x, box_center.y, box_center.z),
            rigidly_attached: false,
            frame_id: None,
        })
        .unwrap();

    let goal = Point3::new(box_center.x + 0.2, start.y, start.z);
    let move_goal = MoveGoal {
        cmds: vec![MoveCmd {
            cartesian_constraints: vec![CartesianConstraintSpec {
                kind: CartesianConstraintKind::Translation3d,
                root_link: "base".to_owned(),
                tip_link: "tool".to_owned(),
                goal: PoseStamped {
                    frame_id: "base".to_owned(),
                    pose: PoseParam {
                        position: [goal.x, goal.y, goal.z],
                        orientation: [0.0, 0.0, 0.0, 1.0],
                    },
                },
            }],
            collisions: vec![CollisionEntry::avoid_all()],
            ..Default::default()
        }],
    };

    let result = executive.execute(&move_goal);
    assert_eq!(result.code, MoveResultCode::Success, "{:?}", result.message);

    let trajectory = &result.trajectories[0];
    let mut min_observed = f64::INFINITY;
    for (_, states) in trajectory.iter() {
        let tip = common::tool_position(&chain, states);
        min_observed = min_observed.min(box_distance(tip, box_center));
    }
    assert!(
        min_observed >= 0.0,
        "tool sphere penetrated the box: min distance {min_observed}"
    );

    let (_, last) = trajectory.last().unwrap();
    let tip = common::tool_position(&chain, last);
    let error = (tip - goal).norm();
    assert!(error < 5e-3, "final tip error {error}");
}

#[test]
fn allow_entry_disables_avoidance() {
    let chain = common::six_dof_chain();
    let mut executive = MotionExecutive::new(&chain, common::default_config()).unwrap();
    common::seed_home(&mut executive);

    // Avoid-all followed by allow-all leaves no avoidance goals, so a
    // goal straight through free space is unaffected.
    let move_goal = MoveGoal {
        cmds: vec![MoveCmd {
            cartesian_constraints: vec![CartesianConstraintSpec {
                kind: CartesianConstraintKind::Translation3d,
                root_link: "base".to_owned(),
                tip_link: "tool".to_owned(),
                goal: PoseStamped {
                    frame_id: "base".to_owned(),
                    pose: PoseParam {
                        position: [0.8, 0.0, 0.35],
                        orientation: [0.0, 0.0, 0.0, 1.0],
                    },
                },
            }],
            collisions: vec![CollisionEntry::avoid_all(), CollisionEntry::allow_all()],
            ..Default::default()
        }],
    };
    let result = executive.execute(&move_goal);
    assert_eq!(result.code, MoveResultCode::Success, "{:?}", result.message);
}
