//! Motion command surface (action-server style).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use daneel_core::Trajectory;
use daneel_goals::PoseParam;

/// A pose tagged with the frame it is expressed in.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PoseStamped {
    pub frame_id: String,
    pub pose: PoseParam,
}

/// One joint target inside a command.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct JointConstraintSpec {
    pub joint_name: String,
    pub goal_position: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub max_velocity: Option<f64>,
}

/// Fixed-field Cartesian constraint kinds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartesianConstraintKind {
    Translation3d,
    Rotation3d,
}

/// One Cartesian target inside a command.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CartesianConstraintSpec {
    #[serde(rename = "type")]
    pub kind: CartesianConstraintKind,
    pub root_link: String,
    pub tip_link: String,
    pub goal: PoseStamped,
}

/// Free-form constraint: type string plus JSON parameter blob.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConstraintSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: Value,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionEntryKind {
    Avoid,
    Allow,
}

/// Collision policy entry; later entries override earlier ones.
///
/// An empty link list means "all collision-capable links".
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CollisionEntry {
    pub kind: CollisionEntryKind,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub min_distance: Option<f64>,
}

impl CollisionEntry {
    pub fn avoid_all() -> Self {
        Self {
            kind: CollisionEntryKind::Avoid,
            links: Vec::new(),
            min_distance: None,
        }
    }

    pub fn allow_all() -> Self {
        Self {
            kind: CollisionEntryKind::Allow,
            links: Vec::new(),
            min_distance: None,
        }
    }
}

/// One motion command: all constraints are pursued simultaneously.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct MoveCmd {
    #[serde(default)]
    pub joint_constraints: Vec<JointConstraintSpec>,
    #[serde(default)]
    pub cartesian_constraints: Vec<CartesianConstraintSpec>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    pub collisions: Vec<CollisionEntry>,
}

/// An ordered sequence of commands, executed one after another.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct MoveGoal {
    pub cmds: Vec<MoveCmd>,
}

/// Typed outcome codes reported to the client.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveResultCode {
    Success,
    QpInfeasible,
    MaxWorkingSetReached,
    Timeout,
    Cancelled,
    PathMissing,
    CompileError,
    ExecutionError,
    InvalidGoal,
}

/// Response of one `MoveGoal` execution.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MoveResult {
    pub code: MoveResultCode,
    #[serde(default)]
    pub message: Option<String>,
    /// One planned trajectory per completed command.
    pub trajectories: Vec<Trajectory>,
}

impl MoveResult {
    pub fn is_success(&self) -> bool {
        self.code == MoveResultCode::Success
    }
}
