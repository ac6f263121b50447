//! The motion scheduler: core tree wiring plus planning universes.

use std::time::{Duration, Instant};

use daneel_core::{paths, JointStates, TickState, Trajectory, Universe, Value};
use daneel_goals::Goal;
use daneel_world::WorldOp;

use crate::behavior::{Behavior, Parallel, Sequence, Status};
use crate::context::{CancelHandle, MotionCtx};
use crate::leaves::{
    CollisionQuery, DispatchTrajectory, EvaluateConstraints, IntegrateAndLog, JointStateIngest,
    PlanningGuard, SolveQp, WorldStateIngest,
};
use crate::mailbox::Mailbox;
use crate::sink::TrajectorySink;
use crate::{Result, TreeError};

/// Scheduler tuning.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerSettings {
    /// Tree tick rate in Hz; the planning integrator steps by its
    /// reciprocal.
    pub tick_rate: f64,
    /// Maximum ticks inside one planning universe.
    pub planning_tick_cap: u64,
    /// Wall-clock budget for one motion.
    pub wall_timeout: Duration,
    /// Below this commanded speed on every joint the goal counts as
    /// reached.
    pub goal_velocity_threshold: f64,
    /// Window and flip count of the oscillation detector.
    pub wiggle_window: usize,
    pub wiggle_flips: usize,
    /// Planning universes may nest up to this depth.
    pub universe_nesting_cap: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_rate: 50.0,
            planning_tick_cap: 10_000,
            wall_timeout: Duration::from_secs(60),
            goal_velocity_threshold: 1e-3,
            wiggle_window: 20,
            wiggle_flips: 16,
            universe_nesting_cap: 1,
        }
    }
}

impl SchedulerSettings {
    pub fn sample_period(&self) -> f64 {
        1.0 / self.tick_rate
    }
}

/// Ticks the core tree and owns the planning-universe machinery.
///
/// The tree is the one from the design:
///
/// ```text
/// root = sequence(
///   perceive = parallel(JointStateIngest, WorldStateIngest),
///   plan     = sequence(CollisionQuery, EvaluateConstraints, SolveQp,
///                       IntegrateAndLog, PlanningGuard),
///   execute  = DispatchTrajectory,
/// )
/// ```
///
/// `plan` is re-ticked inside a blackboard snapshot with the kinematic
/// integrator as the joint-state source; planning and execution share
/// every component, only the source differs.
pub struct MotionScheduler {
    settings: SchedulerSettings,
    perceive: Parallel,
    plan: Sequence,
    execute: DispatchTrajectory,
    universe_depth: usize,
}

impl MotionScheduler {
    pub fn new(
        settings: SchedulerSettings,
        joint_states: Mailbox<JointStates>,
        world_updates: Mailbox<WorldOp>,
        sink: Box<dyn TrajectorySink>,
    ) -> Self {
        let perceive = Parallel::new(
            "perceive",
            vec![
                Box::new(JointStateIngest::new(joint_states)),
                Box::new(WorldStateIngest::new(world_updates)),
            ],
        );
        Self {
            plan: build_plan(&settings),
            perceive,
            execute: DispatchTrajectory::new(sink),
            settings,
            universe_depth: 0,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Run one motion: perceive, plan in a parallel universe, execute.
    pub fn run_motion(
        &mut self,
        ctx: &mut MotionCtx,
        cancel: &CancelHandle,
    ) -> Result<Trajectory> {
        self.perceive.tick(ctx);
        if let Some(failure) = ctx.failure.take() {
            return Err(failure);
        }

        let trajectory = self.plan_in_universe(ctx, cancel)?;

        match self.execute.tick(ctx) {
            Status::Failure => Err(ctx
                .failure
                .take()
                .unwrap_or_else(|| TreeError::Execution("unreported".to_owned()))),
            _ => Ok(trajectory),
        }
    }

    /// Enter a planning universe and re-tick the plan subtree until a
    /// terminating condition.
    ///
    /// The blackboard is snapshotted on entry and restored on every exit
    /// path; the trajectory is rescued before the restore and is
    /// available through the returned value and [`MotionCtx::last_trajectory`]
    /// even when planning fails.
    pub fn plan_in_universe(
        &mut self,
        ctx: &mut MotionCtx,
        cancel: &CancelHandle,
    ) -> Result<Trajectory> {
        if self.universe_depth >= self.settings.universe_nesting_cap {
            tracing::warn!(
                depth = self.universe_depth,
                "planning universe nesting cap reached"
            );
            return Err(TreeError::Timeout);
        }
        self.universe_depth += 1;

        // Fresh plan subtree: the guard's oscillation history must not
        // leak across planning runs.
        self.plan = build_plan(&self.settings);

        let snapshot = ctx.blackboard.snapshot();
        ctx.tick = TickState {
            time: 0.0,
            tick_index: 0,
            universe: Universe::Planning,
        };
        ctx.blackboard
            .set(&paths::trajectory(), Value::Traj(Trajectory::new()));

        let started = Instant::now();
        let result = loop {
            if cancel.is_cancelled() {
                break Err(TreeError::Cancelled);
            }
            if started.elapsed() > self.settings.wall_timeout {
                break Err(TreeError::Timeout);
            }
            if ctx.tick.tick_index >= self.settings.planning_tick_cap {
                break Err(TreeError::Timeout);
            }
            match self.plan.tick(ctx) {
                Status::Failure => {
                    break Err(ctx
                        .failure
                        .take()
                        .unwrap_or_else(|| TreeError::QpInfeasible("unreported".to_owned())));
                }
                Status::Success => break Ok(()),
                Status::Running => {}
            }
        };

        // Rescue the trajectory, then roll the universe back.
        let trajectory = ctx
            .blackboard
            .get(&paths::trajectory())
            .ok()
            .and_then(|v| v.as_traj().cloned())
            .unwrap_or_default();
        ctx.last_trajectory = trajectory.clone();
        ctx.blackboard.restore(snapshot);
        ctx.tick.universe = Universe::Real;
        self.universe_depth -= 1;

        tracing::info!(
            ticks = trajectory.len(),
            ok = result.is_ok(),
            "planning universe finished"
        );

        if matches!(result, Err(TreeError::Cancelled)) {
            ctx.publish_zero_motor_cmd();
        }
        result.map(|()| trajectory)
    }

    /// The most recently dispatched trajectory.
    pub fn dispatched(&self) -> Option<&Trajectory> {
        self.execute.dispatched()
    }
}

fn build_plan(settings: &SchedulerSettings) -> Sequence {
    Sequence::new(
        "plan",
        vec![
            Box::new(CollisionQuery),
            Box::new(EvaluateConstraints),
            Box::new(SolveQp),
            Box::new(IntegrateAndLog),
            Box::new(PlanningGuard::new(
                settings.goal_velocity_threshold,
                settings.wiggle_window,
                settings.wiggle_flips,
            )),
        ],
    )
}

/// Collect the FK pairs a goal set needs: evaluated-FK feedback pairs
/// plus root-to-link pairs for every collision link.
pub fn required_fk_pairs(
    robot: &daneel_expr::Robot,
    goals: &[Box<dyn Goal>],
    collision_links: &[(String, daneel_expr::CollisionSphere)],
    attachment_frames: impl IntoIterator<Item = String>,
) -> Vec<(String, String)> {
    let root = robot.root_link().to_owned();
    let mut pairs = Vec::new();
    for goal in goals {
        pairs.extend(goal.fk_pairs(robot));
    }
    for (link, _) in collision_links {
        pairs.push((root.clone(), link.clone()));
    }
    for frame in attachment_frames {
        pairs.push((root.clone(), frame));
    }
    pairs.sort();
    pairs.dedup();
    pairs
}
