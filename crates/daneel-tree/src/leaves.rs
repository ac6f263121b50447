//! Tick leaves: perception, evaluation, solving, integration, guard,
//! and dispatch.

use daneel_core::{paths, JointStates, SingleJointState, Trajectory, Value};
use daneel_world::{closest_contact, publish_clear, publish_contact, WorldOp};

use crate::behavior::{Behavior, Status};
use crate::context::MotionCtx;
use crate::mailbox::Mailbox;
use crate::sink::TrajectorySink;
use crate::TreeError;

/// Drain the joint-state mailbox into per-joint blackboard leaves.
///
/// An empty mailbox keeps the previous values: the tick loop is
/// insensitive to sensor jitter.
pub struct JointStateIngest {
    mailbox: Mailbox<JointStates>,
}

impl JointStateIngest {
    pub fn new(mailbox: Mailbox<JointStates>) -> Self {
        Self { mailbox }
    }
}

impl Behavior for JointStateIngest {
    fn name(&self) -> &str {
        "joint_state_ingest"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        if let Some(states) = self.mailbox.take() {
            write_joint_states(ctx, &states);
        }
        Status::Success
    }
}

pub(crate) fn write_joint_states(ctx: &mut MotionCtx, states: &JointStates) {
    for (name, state) in states.iter() {
        ctx.blackboard
            .set(&paths::joint_position(name), state.position);
        ctx.blackboard.set(
            &paths::joint_states().child(name).child("velocity"),
            state.velocity,
        );
    }
}

/// Drain streamed world updates (perceived object poses and the like)
/// into the world model. Service-style calls with response codes go
/// through `World::apply` directly; this leaf is the fire-and-forget
/// perception path.
pub struct WorldStateIngest {
    mailbox: Mailbox<WorldOp>,
}

impl WorldStateIngest {
    pub fn new(mailbox: Mailbox<WorldOp>) -> Self {
        Self { mailbox }
    }
}

impl Behavior for WorldStateIngest {
    fn name(&self) -> &str {
        "world_state_ingest"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        if let Some(op) = self.mailbox.take() {
            if let Err(e) = ctx.world.apply(op) {
                tracing::warn!(error = %e, "streamed world update rejected");
            }
        }
        Status::Success
    }
}

/// Closest-point queries for every collision link, published under
/// `collision/<link>/…` before constraint evaluation runs.
pub struct CollisionQuery;

impl Behavior for CollisionQuery {
    fn name(&self) -> &str {
        "collision_query"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        let links = ctx.collision_links.clone();
        for (link, sphere) in links {
            let center = match ctx.link_sphere_center(&link, &sphere) {
                Ok(c) => c,
                Err(e) => return ctx.fail(e),
            };

            // Resolve world poses, skipping bodies attached to the
            // queried link itself.
            let mut resolved = Vec::new();
            let body_list: Vec<_> = ctx
                .world
                .iter()
                .map(|(name, state)| {
                    (name.to_owned(), state.clone())
                })
                .collect();
            for (name, state) in &body_list {
                if state.attached_to.as_deref() == Some(link.as_str()) {
                    continue;
                }
                let pose =
                    match ctx.body_world_pose(state.attached_to.as_deref(), state.pose) {
                        Ok(p) => p,
                        Err(e) => return ctx.fail(e),
                    };
                resolved.push((name.clone(), state.clone(), pose));
            }

            let contact = closest_contact(
                resolved.iter().map(|(n, s, p)| (n.as_str(), s, *p)),
                center,
                sphere.radius,
                &ctx.narrow_phase,
            );
            match contact {
                Some(c) => publish_contact(&mut ctx.blackboard, &link, &c),
                None => publish_clear(&mut ctx.blackboard, &link),
            }
        }
        Status::Success
    }
}

/// Publish evaluated FK feedback, then assemble the QP matrices from the
/// compiled constraint evaluator.
pub struct EvaluateConstraints;

impl Behavior for EvaluateConstraints {
    fn name(&self) -> &str {
        "evaluate_constraints"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        // Evaluated FK for every registered pair.
        let pairs: Vec<_> = ctx.fk.pairs().cloned().collect();
        for pair in pairs {
            let pose = match ctx.fk.eval(
                &pair,
                &ctx.blackboard,
                &mut ctx.inputs,
                &mut ctx.scratch,
            ) {
                Ok(p) => p,
                Err(e) => return ctx.fail(e),
            };
            let base = paths::fk_evaluated(&pair.0, &pair.1);
            let pos = base.child("position");
            let t = pose.translation;
            for (key, v) in [("x", t.x), ("y", t.y), ("z", t.z)] {
                ctx.blackboard.set(&pos.child(key), v);
            }
            let rot = base.child("orientation");
            let q = pose.rotation;
            for (key, v) in [("x", q.i), ("y", q.j), ("z", q.k), ("w", q.w)] {
                ctx.blackboard.set(&rot.child(key), v);
            }
        }

        match ctx
            .problem
            .assemble(&ctx.blackboard, &mut ctx.inputs, &mut ctx.scratch)
        {
            Ok(qp) => {
                ctx.latest_qp = Some(qp);
                Status::Success
            }
            Err(e) => ctx.fail(e.into()),
        }
    }
}

/// Run the QP and write the joint velocity command.
pub struct SolveQp;

impl Behavior for SolveQp {
    fn name(&self) -> &str {
        "solve_qp"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        let Some(qp) = ctx.latest_qp.take() else {
            return ctx.fail(TreeError::PathMissing("qp matrices".to_owned()));
        };
        match ctx.solver.solve(&qp, None) {
            Ok(x) => {
                let names = ctx.problem.joint_names().to_vec();
                for (i, name) in names.iter().enumerate() {
                    ctx.blackboard
                        .set(&paths::motor_cmd().child(name.as_str()), x[i]);
                }
                Status::Success
            }
            Err(e) => ctx.fail(e.into()),
        }
    }
}

/// Kinematic integration plus trajectory logging (planning universe).
///
/// Integrates the last motor command forward by one tick and appends the
/// resulting joint state to the trajectory. This leaf *is* the simulated
/// joint-state source: planning and execution share every other
/// component unchanged.
pub struct IntegrateAndLog;

impl Behavior for IntegrateAndLog {
    fn name(&self) -> &str {
        "integrate_and_log"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        let dt = ctx.sample_period;
        let names = ctx.problem.joint_names().to_vec();

        let mut states = JointStates::new();
        for name in &names {
            let cmd = ctx
                .blackboard
                .get_scalar(&paths::motor_cmd().child(name.as_str()))
                .unwrap_or(0.0);
            let position = match ctx.blackboard.get_scalar(&paths::joint_position(name)) {
                Ok(p) => p + cmd * dt,
                Err(e) => return ctx.fail(TreeError::PathMissing(e.to_string())),
            };
            let mut sjs = SingleJointState::new(name.clone(), position);
            sjs.velocity = cmd;
            states.insert(sjs);
        }
        write_joint_states(ctx, &states);

        ctx.tick.time += dt;
        ctx.tick.tick_index += 1;
        ctx.blackboard.set(&paths::time(), ctx.tick.time);
        ctx.blackboard
            .set(&paths::tick_index(), ctx.tick.tick_index as f64);

        let mut trajectory = ctx
            .blackboard
            .get(&paths::trajectory())
            .ok()
            .and_then(|v| v.as_traj().cloned())
            .unwrap_or_default();
        trajectory.push(ctx.tick.time, states);
        ctx.blackboard
            .set(&paths::trajectory(), Value::Traj(trajectory));

        Status::Success
    }
}

/// Terminates the planning loop: succeeds once every commanded velocity
/// is below the threshold, keeps running otherwise, and fails when the
/// command signs keep flipping (the wiggle detector).
pub struct PlanningGuard {
    velocity_threshold: f64,
    wiggle_window: usize,
    wiggle_flips: usize,
    history: Vec<Vec<f64>>,
}

/// Sign flips below this speed do not count as wiggling; small tugs
/// around a constraint equilibrium are normal and damped.
const WIGGLE_MIN_AMPLITUDE: f64 = 0.02;

impl PlanningGuard {
    pub fn new(velocity_threshold: f64, wiggle_window: usize, wiggle_flips: usize) -> Self {
        Self {
            velocity_threshold,
            wiggle_window,
            wiggle_flips,
            history: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn wiggling(&self) -> bool {
        if self.history.len() < self.wiggle_window {
            return false;
        }
        let recent = &self.history[self.history.len() - self.wiggle_window..];
        let joints = recent[0].len();
        for j in 0..joints {
            let mut flips = 0;
            for pair in recent.windows(2) {
                let (a, b) = (pair[0][j], pair[1][j]);
                if a * b < 0.0 && a.abs().min(b.abs()) > WIGGLE_MIN_AMPLITUDE {
                    flips += 1;
                }
            }
            if flips >= self.wiggle_flips {
                return true;
            }
        }
        false
    }
}

impl Behavior for PlanningGuard {
    fn name(&self) -> &str {
        "planning_guard"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        let names = ctx.problem.joint_names().to_vec();
        let cmds: Vec<f64> = names
            .iter()
            .map(|n| {
                ctx.blackboard
                    .get_scalar(&paths::motor_cmd().child(n.as_str()))
                    .unwrap_or(0.0)
            })
            .collect();

        let done = cmds.iter().all(|v| v.abs() < self.velocity_threshold);
        self.history.push(cmds);
        if self.history.len() > 4 * self.wiggle_window {
            self.history.drain(..self.history.len() - self.wiggle_window);
        }

        if self.wiggling() {
            return ctx.fail(TreeError::Wiggle);
        }
        if done {
            Status::Success
        } else {
            Status::Running
        }
    }
}

/// Stream the planned trajectory to the external controller.
pub struct DispatchTrajectory {
    sink: Box<dyn TrajectorySink>,
}

impl DispatchTrajectory {
    pub fn new(sink: Box<dyn TrajectorySink>) -> Self {
        Self { sink }
    }

    /// The most recently dispatched trajectory, for inspection.
    pub fn dispatched(&self) -> Option<&Trajectory> {
        self.sink.last()
    }
}

impl Behavior for DispatchTrajectory {
    fn name(&self) -> &str {
        "dispatch_trajectory"
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        let trajectory = ctx.last_trajectory.clone();
        match self.sink.dispatch(&trajectory) {
            Ok(()) => Status::Success,
            Err(message) => ctx.fail(TreeError::Execution(message)),
        }
    }
}
