//! File loading shared by the subcommands.

use std::path::Path;

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use daneel_lib::{MotionExecutive, MoveGoal, PoseParam, RobotFile, WorldBody, WorldOp};

/// One world file entry: the body plus its pose (and an optional
/// attachment link).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldFileBody {
    #[serde(flatten)]
    pub body: WorldBody,
    pub pose: PoseParam,
    #[serde(default)]
    pub attached_to: Option<String>,
}

pub fn load_robot(path: &Path) -> Result<RobotFile, String> {
    RobotFile::load(path).map_err(|e| e.to_string())
}

pub fn load_goal(path: &Path) -> Result<MoveGoal, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))
}

pub fn load_world_file(path: &Path) -> Result<Vec<WorldFileBody>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))
}

pub fn apply_world_file(
    executive: &mut MotionExecutive,
    bodies: Vec<WorldFileBody>,
) -> Result<(), String> {
    for entry in bodies {
        let pose = to_isometry(&entry.pose);
        let rigidly_attached = entry.attached_to.is_some();
        executive
            .update_world(WorldOp::Add {
                body: entry.body,
                pose,
                rigidly_attached,
                frame_id: entry.attached_to,
            })
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn to_isometry(pose: &PoseParam) -> Isometry3<f64> {
    let p = pose.normalized();
    Isometry3::from_parts(
        Translation3::new(p.position[0], p.position[1], p.position[2]),
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
            p.orientation[3],
            p.orientation[0],
            p.orientation[1],
            p.orientation[2],
        )),
    )
}
