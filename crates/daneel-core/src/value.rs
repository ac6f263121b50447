//! Blackboard leaf values.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::state::{JointStates, Trajectory};
use crate::Blackboard;

/// A pose: position plus unit quaternion (x, y, z, w).
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f64; 3],
    pub orientation: [f64; 4],
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// A leaf closure, invoked on every `get`.
///
/// Closures must be pure with respect to other leaves: they may read the
/// blackboard but never mutate it, and two reads within one tick must
/// agree.
#[derive(Clone)]
pub struct LazyValue(Arc<dyn Fn(&Blackboard) -> Value + Send + Sync>);

impl LazyValue {
    pub fn new(f: impl Fn(&Blackboard) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, blackboard: &Blackboard) -> Value {
        (self.0)(blackboard)
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyValue(..)")
    }
}

/// A typed blackboard leaf.
#[derive(Clone, Debug)]
pub enum Value {
    Scalar(f64),
    Vec3([f64; 3]),
    Quat([f64; 4]),
    Pose(Pose),
    Joints(JointStates),
    Traj(Trajectory),
    Text(String),
    List(Vec<Value>),
    Lazy(LazyValue),
}

impl Value {
    /// Scalar payload, if this leaf is one.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_joints(&self) -> Option<&JointStates> {
        match self {
            Self::Joints(js) => Some(js),
            _ => None,
        }
    }

    pub fn as_traj(&self) -> Option<&Trajectory> {
        match self {
            Self::Traj(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_pose(&self) -> Option<&Pose> {
        match self {
            Self::Pose(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<Pose> for Value {
    fn from(p: Pose) -> Self {
        Self::Pose(p)
    }
}

impl From<JointStates> for Value {
    fn from(js: JointStates) -> Self {
        Self::Joints(js)
    }
}

impl From<Trajectory> for Value {
    fn from(t: Trajectory) -> Self {
        Self::Traj(t)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}
