//! Shared per-motion context threaded through every tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion};

use daneel_core::{paths, Blackboard, Symbol, TickState, Trajectory};
use daneel_expr::{compile, CollisionSphere, ExprMatrix, Robot};
use daneel_qp::{QpMatrices, QpProblem, QpSolver};
use daneel_tape::{Tape, TapeScratch};
use daneel_world::{PrimitiveNarrowPhase, World};

use crate::{Result, TreeError};

/// External cancel signal. Cheap to clone and hand to another thread;
/// the scheduler checks it between ticks.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Compiled numeric FK evaluators for the `(root, tip)` pairs a motion
/// needs: evaluated-FK feedback for goals, link poses for collision
/// queries, and attachment frames. Read-only after construction.
#[derive(Debug, Default)]
pub struct FkTable {
    tapes: HashMap<(String, String), (Tape, Vec<Symbol>)>,
}

impl FkTable {
    /// Compile FK for each pair against the robot.
    pub fn new(
        robot: &Robot,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut tapes = HashMap::new();
        for pair in pairs {
            if tapes.contains_key(&pair) {
                continue;
            }
            let frame = robot
                .fk(&pair.0, &pair.1)
                .map_err(|e| TreeError::Compile(e.to_string()))?;
            let tape = compile_frame(&frame)?;
            tapes.insert(pair, tape);
        }
        Ok(Self { tapes })
    }

    pub fn pairs(&self) -> impl Iterator<Item = &(String, String)> {
        self.tapes.keys()
    }

    /// Evaluate one pair's FK against current blackboard values.
    pub fn eval(
        &self,
        pair: &(String, String),
        blackboard: &Blackboard,
        inputs: &mut Vec<f64>,
        scratch: &mut TapeScratch,
    ) -> Result<Isometry3<f64>> {
        let (tape, symbols) = self
            .tapes
            .get(pair)
            .ok_or_else(|| TreeError::PathMissing(format!("fk/({},{})", pair.0, pair.1)))?;
        inputs.resize(symbols.len(), 0.0);
        blackboard
            .resolve(symbols, inputs)
            .map_err(|e| TreeError::PathMissing(e.to_string()))?;
        tape.eval(inputs, scratch);
        Ok(isometry_from_row_major(scratch.output()))
    }
}

fn compile_frame(frame: &ExprMatrix) -> Result<(Tape, Vec<Symbol>)> {
    let symbols = frame.free_symbols();
    let tape =
        compile(frame, &symbols).map_err(|e| TreeError::Compile(e.to_string()))?;
    Ok((tape, symbols))
}

fn isometry_from_row_major(m: &[f64]) -> Isometry3<f64> {
    debug_assert_eq!(m.len(), 16);
    let rotation = Rotation3::from_matrix_unchecked(Matrix3::new(
        m[0], m[1], m[2], m[4], m[5], m[6], m[8], m[9], m[10],
    ));
    Isometry3::from_parts(
        Translation3::new(m[3], m[7], m[11]),
        UnitQuaternion::from_rotation_matrix(&rotation),
    )
}

/// Everything one motion needs, owned in one place and passed by
/// reference into each tick. The blackboard is the only part that
/// mutates between universes; compiled artifacts are immutable.
pub struct MotionCtx {
    pub blackboard: Blackboard,
    pub robot: Robot,
    pub world: World,
    pub problem: QpProblem,
    pub solver: QpSolver,
    pub fk: FkTable,
    /// Links queried for collisions, with their proxy spheres.
    pub collision_links: Vec<(String, CollisionSphere)>,
    pub narrow_phase: PrimitiveNarrowPhase,
    pub sample_period: f64,
    pub tick: TickState,
    /// Matrices assembled by the evaluate leaf for the solve leaf.
    pub latest_qp: Option<QpMatrices>,
    /// Failure reported by the last failing leaf.
    pub failure: Option<TreeError>,
    /// Trajectory rescued from the last planning universe.
    pub last_trajectory: Trajectory,
    pub(crate) inputs: Vec<f64>,
    pub(crate) scratch: TapeScratch,
}

impl MotionCtx {
    pub fn new(
        blackboard: Blackboard,
        robot: Robot,
        world: World,
        problem: QpProblem,
        fk: FkTable,
        collision_links: Vec<(String, CollisionSphere)>,
        sample_period: f64,
    ) -> Self {
        Self {
            blackboard,
            robot,
            world,
            problem,
            solver: QpSolver::new(),
            fk,
            collision_links,
            narrow_phase: PrimitiveNarrowPhase,
            sample_period,
            tick: TickState::default(),
            latest_qp: None,
            failure: None,
            last_trajectory: Trajectory::new(),
            inputs: Vec::new(),
            scratch: TapeScratch::new(),
        }
    }

    /// Record a failure and return `Failure` for the reporting leaf.
    pub(crate) fn fail(&mut self, error: TreeError) -> crate::Status {
        tracing::warn!(error = %error, "tick leaf failed");
        self.blackboard
            .set(&paths::motion_error(), error.to_string().as_str());
        self.failure = Some(error);
        crate::Status::Failure
    }

    /// World pose of a link's collision sphere center.
    pub(crate) fn link_sphere_center(
        &mut self,
        link: &str,
        sphere: &CollisionSphere,
    ) -> Result<Point3<f64>> {
        let pair = (self.robot.root_link().to_owned(), link.to_owned());
        let pose = self
            .fk
            .eval(&pair, &self.blackboard, &mut self.inputs, &mut self.scratch)?;
        Ok(pose.transform_point(&Point3::new(
            sphere.center[0],
            sphere.center[1],
            sphere.center[2],
        )))
    }

    /// Resolved world pose of a body, following one attachment hop.
    pub(crate) fn body_world_pose(
        &mut self,
        attached_to: Option<&str>,
        local: Isometry3<f64>,
    ) -> Result<Isometry3<f64>> {
        match attached_to {
            None => Ok(local),
            Some(frame) => {
                let pair = (self.robot.root_link().to_owned(), frame.to_owned());
                let link_pose = self.fk.eval(
                    &pair,
                    &self.blackboard,
                    &mut self.inputs,
                    &mut self.scratch,
                )?;
                Ok(link_pose * local)
            }
        }
    }

    /// Write a zero velocity command for every controlled joint.
    pub fn publish_zero_motor_cmd(&mut self) {
        for name in self.problem.joint_names().to_vec() {
            self.blackboard
                .set(&paths::motor_cmd().child(name.as_str()), 0.0);
        }
    }
}
