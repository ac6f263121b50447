//! Late-bound inputs: helpers that write numeric parameters as scalar
//! leaves and read them back as symbol expressions.

use serde::{Deserialize, Serialize};

use daneel_core::{Blackboard, Path};
use daneel_expr::spatial::{frame_quaternion, point3, vector3};
use daneel_expr::{Expr, ExprMatrix};

/// A pose parameter as goals receive it (and as it appears in JSON
/// blobs). The quaternion is normalized on installation.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct PoseParam {
    pub position: [f64; 3],
    /// x, y, z, w.
    pub orientation: [f64; 4],
}

impl PoseParam {
    pub fn identity() -> Self {
        Self {
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Normalized copy; a zero quaternion is promoted to identity.
    pub fn normalized(mut self) -> Self {
        let q = self.orientation;
        let n = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        if n < 1e-12 {
            self.orientation = [0.0, 0.0, 0.0, 1.0];
        } else {
            for v in &mut self.orientation {
                *v /= n;
            }
        }
        self
    }
}

const POSITION_KEYS: [&str; 3] = ["x", "y", "z"];
const ORIENTATION_KEYS: [&str; 4] = ["x", "y", "z", "w"];

/// Write a pose as scalar leaves under `prefix/position/{x,y,z}` and
/// `prefix/orientation/{x,y,z,w}`.
pub(crate) fn set_pose(blackboard: &mut Blackboard, prefix: &Path, pose: &PoseParam) {
    let pos = prefix.child("position");
    for (key, value) in POSITION_KEYS.iter().zip(pose.position) {
        blackboard.set(&pos.child(*key), value);
    }
    let rot = prefix.child("orientation");
    for (key, value) in ORIENTATION_KEYS.iter().zip(pose.orientation) {
        blackboard.set(&rot.child(*key), value);
    }
}

/// Symbolic 4×4 frame over the pose leaves written by [`set_pose`].
pub(crate) fn frame_input(blackboard: &mut Blackboard, prefix: &Path) -> ExprMatrix {
    let pos = prefix.child("position");
    let rot = prefix.child("orientation");
    let p: Vec<Expr> = POSITION_KEYS
        .iter()
        .map(|k| Expr::symbol(blackboard.to_symbol(&pos.child(*k))))
        .collect();
    let q: Vec<Expr> = ORIENTATION_KEYS
        .iter()
        .map(|k| Expr::symbol(blackboard.to_symbol(&rot.child(*k))))
        .collect();
    frame_quaternion(
        p[0].clone(),
        p[1].clone(),
        p[2].clone(),
        &q[0],
        &q[1],
        &q[2],
        &q[3],
    )
}

/// Write a 3-vector as indexed scalar leaves.
pub(crate) fn set_vec3(blackboard: &mut Blackboard, prefix: &Path, v: [f64; 3]) {
    for (i, value) in v.into_iter().enumerate() {
        blackboard.set(&prefix.child(i), value);
    }
}

/// Symbolic direction vector (`w = 0`) over indexed scalar leaves.
pub(crate) fn vector_input(blackboard: &mut Blackboard, prefix: &Path) -> ExprMatrix {
    let c: Vec<Expr> = (0..3)
        .map(|i| Expr::symbol(blackboard.to_symbol(&prefix.child(i))))
        .collect();
    vector3(c[0].clone(), c[1].clone(), c[2].clone())
}

/// Symbolic point (`w = 1`) over indexed scalar leaves.
pub(crate) fn point_input(blackboard: &mut Blackboard, prefix: &Path) -> ExprMatrix {
    let c: Vec<Expr> = (0..3)
        .map(|i| Expr::symbol(blackboard.to_symbol(&prefix.child(i))))
        .collect();
    point3(c[0].clone(), c[1].clone(), c[2].clone())
}

/// Scalar symbol over one leaf.
pub(crate) fn scalar_input(blackboard: &mut Blackboard, path: &Path) -> Expr {
    Expr::symbol(blackboard.to_symbol(path))
}
