use std::time::Duration;

use daneel_core::paths;

use crate::context::CancelHandle;
use crate::mailbox::Mailbox;
use crate::scheduler::{MotionScheduler, SchedulerSettings};
use crate::sink::CollectSink;
use crate::test_ctx::tracking_ctx;
use crate::TreeError;

fn scheduler(settings: SchedulerSettings) -> MotionScheduler {
    MotionScheduler::new(
        settings,
        Mailbox::channel().1,
        Mailbox::channel().1,
        Box::new(CollectSink::new()),
    )
}

#[test]
fn joint_goal_reached_within_hundred_ticks() {
    let settings = SchedulerSettings::default();
    let mut ctx = tracking_ctx(1.0, &settings);
    let mut sched = scheduler(settings);
    let cancel = CancelHandle::new();

    let trajectory = sched.run_motion(&mut ctx, &cancel).unwrap();
    assert!(
        trajectory.len() <= 100,
        "took {} ticks to converge",
        trajectory.len()
    );

    // Final planned position within 1e-3 of the goal.
    let (_, last) = trajectory.last().unwrap();
    let q = last.position("j0").unwrap();
    assert!((q - 1.0).abs() < 1e-3, "final position {q}");

    // Early commands saturate at the 1 rad/s velocity limit while the
    // error is large.
    for (_, states) in trajectory.iter().take(20) {
        let v = states.get("j0").unwrap().velocity;
        assert!(v > 0.9, "expected saturated velocity, got {v}");
    }
}

#[test]
fn planning_universe_is_isolated() {
    let mut settings = SchedulerSettings::default();
    // Unreachable threshold: planning always runs to the tick cap.
    settings.goal_velocity_threshold = 0.0;
    settings.planning_tick_cap = 200;
    let mut ctx = tracking_ctx(1.0, &settings);
    let mut sched = scheduler(settings);

    let before = format!("{:?}", ctx.blackboard);
    let result = sched.plan_in_universe(&mut ctx, &CancelHandle::new());

    assert!(matches!(result, Err(TreeError::Timeout)));
    // Exactly the capped number of samples was collected.
    assert_eq!(ctx.last_trajectory.len(), 200);
    // The blackboard is bit-identical to before the universe.
    assert_eq!(format!("{:?}", ctx.blackboard), before);
}

#[test]
fn dispatched_trajectory_matches_plan() {
    let settings = SchedulerSettings::default();
    let mut ctx = tracking_ctx(0.5, &settings);
    let mut sched = scheduler(settings);

    let trajectory = sched.run_motion(&mut ctx, &CancelHandle::new()).unwrap();
    let dispatched = sched.dispatched().unwrap();
    assert_eq!(dispatched.len(), trajectory.len());
}

#[test]
fn cancellation_stops_planning_and_zeroes_command() {
    let settings = SchedulerSettings::default();
    let mut ctx = tracking_ctx(1.0, &settings);
    let mut sched = scheduler(settings);

    let cancel = CancelHandle::new();
    cancel.cancel();
    let result = sched.run_motion(&mut ctx, &cancel);
    assert!(matches!(result, Err(TreeError::Cancelled)));

    let cmd = ctx
        .blackboard
        .get_scalar(&paths::motor_cmd().child("j0"))
        .unwrap();
    assert_eq!(cmd, 0.0);
}

#[test]
fn wall_timeout_aborts_planning() {
    let mut settings = SchedulerSettings::default();
    settings.goal_velocity_threshold = 0.0;
    settings.wall_timeout = Duration::from_millis(1);
    let mut ctx = tracking_ctx(1.0, &settings);
    let mut sched = scheduler(settings);

    let result = sched.run_motion(&mut ctx, &CancelHandle::new());
    assert!(matches!(result, Err(TreeError::Timeout)));
}

#[test]
fn joint_limits_never_violated() {
    let settings = SchedulerSettings::default();
    // Goal beyond the π limit: the hard constraint must clamp the plan.
    let mut ctx = tracking_ctx(3.5, &settings);
    let mut sched = scheduler(settings);

    // Planning may end in a timeout (goal unreachable); the trajectory
    // still must respect limits.
    let _ = sched.run_motion(&mut ctx, &CancelHandle::new());
    let dt = settings.sample_period();
    for (_, states) in ctx.last_trajectory.iter() {
        let q = states.get("j0").unwrap().position;
        assert!(
            q <= std::f64::consts::PI + 1.0 * dt + 1e-9,
            "joint limit violated: {q}"
        );
    }
}
