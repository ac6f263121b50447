//! The motion executive: goal submission, world service, and the glue
//! between commands and the scheduler.

use std::mem;

use indexmap::IndexMap;

use daneel_core::{paths, Blackboard, JointStates};
use daneel_expr::ChainSpec;
use daneel_goals::{
    goal_from_json, CartesianOrientationSlerp, CartesianPosition, Goal, GoalError, JointPosition,
    LinkToAnyAvoidance,
};
use daneel_qp::QpProblemBuilder;
use daneel_tape::TapeCache;
use daneel_tree::{
    required_fk_pairs, CancelHandle, CollectSink, FkTable, Mailbox, MailboxSender, MotionCtx,
    MotionScheduler, TrajectorySink, TreeError,
};
use daneel_world::{World, WorldError, WorldOp};

use crate::command::{
    CartesianConstraintKind, CollisionEntryKind, MoveCmd, MoveGoal, MoveResult, MoveResultCode,
};
use crate::{Config, MotionError, Result, Trajectory};

/// Accepts `MoveGoal`s, owns the blackboard, robot model, world, and
/// scheduler, and reports typed results (action-server style, minus the
/// transport).
pub struct MotionExecutive {
    config: Config,
    blackboard: Blackboard,
    robot: daneel_expr::Robot,
    world: World,
    cache: Option<TapeCache>,
    scheduler: MotionScheduler,
    joint_tx: MailboxSender<JointStates>,
    world_tx: MailboxSender<WorldOp>,
}

impl MotionExecutive {
    /// Build an executive with the default (collecting) trajectory sink.
    pub fn new(chain: &ChainSpec, config: Config) -> Result<Self> {
        Self::with_sink(chain, config, Box::new(CollectSink::new()))
    }

    /// Build an executive streaming trajectories into `sink`.
    pub fn with_sink(
        chain: &ChainSpec,
        config: Config,
        sink: Box<dyn TrajectorySink>,
    ) -> Result<Self> {
        let mut blackboard = Blackboard::new();
        let robot = daneel_expr::Robot::from_spec(
            chain,
            config.default_joint_vel_limit,
            config.default_joint_weight,
            |name| blackboard.to_symbol(&paths::joint_position(name)),
        )?;

        // Seed joint states so planning can start before the first
        // perception message arrives.
        for name in robot.controlled_joint_names() {
            blackboard.set(&paths::joint_position(&name), 0.0);
        }

        let cache = match &config.cache_dir {
            Some(dir) => Some(
                TapeCache::open(dir)
                    .map_err(|e| MotionError::Config(format!("cache dir: {e}")))?,
            ),
            None => None,
        };

        let (joint_tx, joint_rx) = Mailbox::channel();
        let (world_tx, world_rx) = Mailbox::channel();
        let scheduler =
            MotionScheduler::new(config.scheduler_settings(), joint_rx, world_rx, sink);

        Ok(Self {
            config,
            blackboard,
            robot,
            world: World::new(),
            cache,
            scheduler,
            joint_tx,
            world_tx,
        })
    }

    /// Producer handle for the joint-state stream.
    pub fn joint_state_sender(&self) -> MailboxSender<JointStates> {
        self.joint_tx.clone()
    }

    /// Producer handle for streamed (fire-and-forget) world updates.
    pub fn world_update_sender(&self) -> MailboxSender<WorldOp> {
        self.world_tx.clone()
    }

    /// Synchronous world update service.
    pub fn update_world(&mut self, op: WorldOp) -> std::result::Result<(), WorldError> {
        self.world.apply(op)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current (blackboard) position of a joint.
    pub fn joint_position(&self, name: &str) -> Option<f64> {
        self.blackboard.get_scalar(&paths::joint_position(name)).ok()
    }

    /// Overwrite the current joint state directly (tests, simulators).
    pub fn set_joint_position(&mut self, name: &str, position: f64) {
        self.blackboard.set(&paths::joint_position(name), position);
    }

    /// Execute a goal to completion.
    pub fn execute(&mut self, goal: &MoveGoal) -> MoveResult {
        self.execute_with_cancel(goal, &CancelHandle::new())
    }

    /// Execute a goal, honoring an external cancel signal.
    pub fn execute_with_cancel(&mut self, goal: &MoveGoal, cancel: &CancelHandle) -> MoveResult {
        let mut trajectories = Vec::new();
        for (index, cmd) in goal.cmds.iter().enumerate() {
            match self.run_cmd(cmd, cancel) {
                Ok(trajectory) => trajectories.push(trajectory),
                Err(error) => {
                    tracing::warn!(cmd = index, error = %error, "motion command failed");
                    return MoveResult {
                        code: result_code(&error),
                        message: Some(error.to_string()),
                        trajectories,
                    };
                }
            }
        }
        MoveResult {
            code: MoveResultCode::Success,
            message: None,
            trajectories,
        }
    }

    fn run_cmd(&mut self, cmd: &MoveCmd, cancel: &CancelHandle) -> Result<Trajectory> {
        let goals = self.build_goals(cmd)?;
        let sample_period = self.config.scheduler_settings().sample_period();

        for goal in &goals {
            goal.install(&mut self.blackboard)?;
        }

        let mut builder = QpProblemBuilder::new().with_robot(&self.robot, sample_period);
        for goal in &goals {
            builder.add_soft_constraints(goal.soft_constraints(&mut self.blackboard, &self.robot)?);
        }
        let problem = builder.build(self.cache.as_ref())?;

        let collision_links: Vec<_> = goals
            .iter()
            .flat_map(|g| g.collision_links())
            .filter_map(|link| {
                self.robot
                    .link_collision(&link)
                    .map(|sphere| (link, sphere))
            })
            .collect();

        let attachment_frames: Vec<String> = self
            .world
            .iter()
            .filter_map(|(_, state)| state.attached_to.clone())
            .collect();
        let pairs = required_fk_pairs(&self.robot, &goals, &collision_links, attachment_frames);
        let fk = FkTable::new(&self.robot, pairs)?;

        let mut ctx = MotionCtx::new(
            mem::take(&mut self.blackboard),
            self.robot.clone(),
            mem::take(&mut self.world),
            problem,
            fk,
            collision_links,
            sample_period,
        );

        let outcome = self.scheduler.run_motion(&mut ctx, cancel);

        // A dispatched trajectory becomes the new current state: the
        // next command (or the next perception message) picks up there.
        if let Ok(trajectory) = &outcome {
            if let Some((_, last)) = trajectory.last() {
                for (name, state) in last.iter() {
                    ctx.blackboard
                        .set(&paths::joint_position(name), state.position);
                }
            }
        }

        // Goal lifecycle: parameters are removed when the motion ends.
        for goal in &goals {
            ctx.blackboard.remove(&paths::goal(&goal.name()));
        }

        self.blackboard = mem::take(&mut ctx.blackboard);
        self.world = mem::take(&mut ctx.world);

        outcome.map_err(Into::into)
    }

    fn build_goals(&self, cmd: &MoveCmd) -> Result<Vec<Box<dyn Goal>>> {
        let mut goals: Vec<Box<dyn Goal>> = Vec::new();

        for jc in &cmd.joint_constraints {
            let mut goal = JointPosition::new(jc.joint_name.clone(), jc.goal_position);
            if let Some(w) = jc.weight {
                goal.weight = w;
            }
            if let Some(v) = jc.max_velocity {
                goal.max_speed = v;
            }
            goals.push(Box::new(goal));
        }

        for cc in &cmd.cartesian_constraints {
            if cc.goal.frame_id != cc.root_link {
                return Err(GoalError::InvalidParams {
                    goal: format!("Cartesian/{}/{}", cc.root_link, cc.tip_link),
                    message: format!(
                        "goal pose must be expressed in the root link frame, got `{}`",
                        cc.goal.frame_id
                    ),
                }
                .into());
            }
            match cc.kind {
                CartesianConstraintKind::Translation3d => goals.push(Box::new(
                    CartesianPosition::new(cc.root_link.clone(), cc.tip_link.clone(), cc.goal.pose),
                )),
                CartesianConstraintKind::Rotation3d => {
                    goals.push(Box::new(CartesianOrientationSlerp::new(
                        cc.root_link.clone(),
                        cc.tip_link.clone(),
                        cc.goal.pose,
                    )))
                }
            }
        }

        for spec in &cmd.constraints {
            goals.push(goal_from_json(&spec.kind, &spec.parameters)?);
        }

        goals.extend(self.avoidance_goals(cmd)?);
        Ok(goals)
    }

    /// Resolve the collision entries into per-link avoidance goals.
    /// Later entries override earlier ones; an empty link list targets
    /// every collision-capable link.
    fn avoidance_goals(&self, cmd: &MoveCmd) -> Result<Vec<Box<dyn Goal>>> {
        let all_links: Vec<String> = self
            .robot
            .collision_links()
            .into_iter()
            .map(|(link, _)| link)
            .collect();

        let mut active: IndexMap<String, LinkToAnyAvoidance> = IndexMap::new();
        for entry in &cmd.collisions {
            let targets: &[String] = if entry.links.is_empty() {
                &all_links
            } else {
                &entry.links
            };
            match entry.kind {
                CollisionEntryKind::Avoid => {
                    for link in targets {
                        if self.robot.link_collision(link).is_none() {
                            tracing::warn!(link = %link, "no collision proxy; skipping avoidance");
                            continue;
                        }
                        let mut goal = LinkToAnyAvoidance::new(link.clone());
                        if let Some(d) = entry.min_distance {
                            goal.zero_weight_distance = d;
                        }
                        active.insert(link.clone(), goal);
                    }
                }
                CollisionEntryKind::Allow => {
                    for link in targets {
                        active.shift_remove(link);
                    }
                }
            }
        }

        Ok(active
            .into_values()
            .map(|g| Box::new(g) as Box<dyn Goal>)
            .collect())
    }
}

fn result_code(error: &MotionError) -> MoveResultCode {
    match error {
        MotionError::Goal(_) | MotionError::Chain(_) | MotionError::Config(_) => {
            MoveResultCode::InvalidGoal
        }
        MotionError::Qp(e) => match e {
            daneel_qp::QpError::Compile(_) => MoveResultCode::CompileError,
            daneel_qp::QpError::Blackboard(_) => MoveResultCode::PathMissing,
            daneel_qp::QpError::MaxWorkingSetReached => MoveResultCode::MaxWorkingSetReached,
            daneel_qp::QpError::Infeasible(_) => MoveResultCode::QpInfeasible,
        },
        MotionError::Tree(e) => match e {
            TreeError::PathMissing(_) => MoveResultCode::PathMissing,
            TreeError::Compile(_) => MoveResultCode::CompileError,
            TreeError::QpInfeasible(_) | TreeError::Wiggle => MoveResultCode::QpInfeasible,
            TreeError::MaxWorkingSetReached => MoveResultCode::MaxWorkingSetReached,
            TreeError::Timeout => MoveResultCode::Timeout,
            TreeError::Cancelled => MoveResultCode::Cancelled,
            TreeError::Execution(_) => MoveResultCode::ExecutionError,
        },
    }
}
