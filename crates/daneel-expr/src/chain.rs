//! Kinematic chains: from a declarative joint list to symbolic FK.
//!
//! URDF ingestion is out of scope; a [`ChainSpec`] carries the same
//! information for the controlled part of the robot. [`Robot`] assigns
//! one position symbol per controllable joint and builds, for any
//! `(root, tip)` link pair, the 4×4 symbolic transform the goal library
//! differentiates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use daneel_core::Symbol;

use crate::spatial::{rotation_axis_angle, rotation_quaternion, translation, vector3};
use crate::{Expr, ExprMatrix};

/// Joint kinds. The planar base is modeled as two prismatic joints plus
/// one revolute joint about +z.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    Revolute,
    Continuous,
    Prismatic,
    BaseX,
    BaseY,
    BaseYaw,
    Fixed,
}

impl JointKind {
    /// Whether the joint contributes a column to the QP.
    pub fn is_controllable(self) -> bool {
        !matches!(self, Self::Fixed)
    }

    /// Whether position wraps (no position limits, shortest-distance
    /// error).
    pub fn is_continuous(self) -> bool {
        matches!(self, Self::Continuous | Self::BaseYaw)
    }
}

/// Collision proxy sphere attached to a link, in link-local coordinates.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct CollisionSphere {
    pub center: [f64; 3],
    pub radius: f64,
}

/// One joint connecting `parent_link` to `child_link`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct JointSpec {
    pub name: String,
    pub kind: JointKind,
    pub parent_link: String,
    pub child_link: String,
    /// Motion axis in the parent frame (ignored for base joints).
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    /// Fixed transform from parent link to the joint frame.
    #[serde(default)]
    pub origin_xyz: [f64; 3],
    #[serde(default = "identity_quat")]
    pub origin_quat: [f64; 4],
    /// Position limits; `None` for continuous and base joints.
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
    #[serde(default)]
    pub velocity_limit: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    /// Collision proxy for the child link.
    #[serde(default)]
    pub collision: Option<CollisionSphere>,
}

fn default_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

fn identity_quat() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

/// Declarative robot description: a root link plus an ordered joint list.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ChainSpec {
    pub root_link: String,
    pub joints: Vec<JointSpec>,
}

/// Errors from chain construction and FK queries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    #[error("unknown link `{0}`")]
    UnknownLink(String),

    #[error("unknown joint `{0}`")]
    UnknownJoint(String),

    #[error("no chain from `{root}` to `{tip}`")]
    NoPath { root: String, tip: String },

    #[error("duplicate joint name `{0}`")]
    DuplicateJoint(String),
}

/// A controllable joint with its resolved limits and position symbol.
#[derive(Clone, Debug)]
pub struct RobotJoint {
    pub spec: JointSpec,
    pub symbol: Symbol,
    pub velocity_limit: f64,
    pub weight: f64,
}

impl RobotJoint {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn position_limits(&self) -> Option<(f64, f64)> {
        if self.spec.kind.is_continuous() {
            return None;
        }
        match (self.spec.lower, self.spec.upper) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            _ => None,
        }
    }
}

/// The robot model: controlled joints in order, plus symbolic FK.
///
/// Joint order is the QP column order. Cross-references to live joint
/// positions go through the position symbols handed in at construction;
/// the robot never holds numeric state.
#[derive(Clone, Debug)]
pub struct Robot {
    root_link: String,
    joints: IndexMap<String, RobotJoint>,
    /// child link → joint name, for chain walking.
    link_parent: IndexMap<String, String>,
}

impl Robot {
    /// Build a robot from its spec.
    ///
    /// `symbol_for` maps a joint name to its position symbol (typically
    /// `blackboard.to_symbol(paths::joint_position(name))`). Defaults
    /// apply where the spec leaves velocity limits or weights out.
    pub fn from_spec(
        spec: &ChainSpec,
        default_velocity_limit: f64,
        default_weight: f64,
        mut symbol_for: impl FnMut(&str) -> Symbol,
    ) -> Result<Self, ChainError> {
        let mut joints = IndexMap::new();
        let mut link_parent = IndexMap::new();

        for joint in &spec.joints {
            if joints.contains_key(&joint.name) {
                return Err(ChainError::DuplicateJoint(joint.name.clone()));
            }
            link_parent.insert(joint.child_link.clone(), joint.name.clone());
            let symbol = symbol_for(&joint.name);
            joints.insert(
                joint.name.clone(),
                RobotJoint {
                    velocity_limit: joint.velocity_limit.unwrap_or(default_velocity_limit),
                    weight: joint.weight.unwrap_or(default_weight),
                    symbol,
                    spec: joint.clone(),
                },
            );
        }

        Ok(Self {
            root_link: spec.root_link.clone(),
            joints,
            link_parent,
        })
    }

    pub fn root_link(&self) -> &str {
        &self.root_link
    }

    pub fn joint(&self, name: &str) -> Result<&RobotJoint, ChainError> {
        self.joints
            .get(name)
            .ok_or_else(|| ChainError::UnknownJoint(name.to_owned()))
    }

    /// Controllable joints in spec order (the QP column order).
    pub fn controlled_joints(&self) -> impl Iterator<Item = &RobotJoint> {
        self.joints.values().filter(|j| j.spec.kind.is_controllable())
    }

    /// Names of the controllable joints, in order.
    pub fn controlled_joint_names(&self) -> Vec<String> {
        self.controlled_joints().map(|j| j.spec.name.clone()).collect()
    }

    /// Position symbols of the controllable joints, in order.
    pub fn controlled_symbols(&self) -> Vec<Symbol> {
        self.controlled_joints().map(|j| j.symbol).collect()
    }

    pub fn is_joint_continuous(&self, name: &str) -> Result<bool, ChainError> {
        Ok(self.joint(name)?.spec.kind.is_continuous())
    }

    /// All links, root first, in joint order.
    pub fn links(&self) -> Vec<String> {
        let mut links = vec![self.root_link.clone()];
        links.extend(self.link_parent.keys().cloned());
        links
    }

    /// Links that move with at least one controllable joint and carry a
    /// collision proxy.
    pub fn collision_links(&self) -> Vec<(String, CollisionSphere)> {
        self.joints
            .values()
            .filter(|j| j.spec.kind.is_controllable())
            .filter_map(|j| j.spec.collision.map(|c| (j.spec.child_link.clone(), c)))
            .collect()
    }

    /// Collision proxy of a link, if it has one.
    pub fn link_collision(&self, link: &str) -> Option<CollisionSphere> {
        let joint = self.link_parent.get(link)?;
        self.joints.get(joint)?.spec.collision
    }

    /// Joints on the chain from `root` up to `tip`, root-side first.
    fn chain_to(&self, root: &str, tip: &str) -> Result<Vec<&RobotJoint>, ChainError> {
        if !self.known_link(tip) {
            return Err(ChainError::UnknownLink(tip.to_owned()));
        }
        if !self.known_link(root) {
            return Err(ChainError::UnknownLink(root.to_owned()));
        }
        let mut chain = Vec::new();
        let mut link = tip;
        while link != root {
            let Some(joint_name) = self.link_parent.get(link) else {
                return Err(ChainError::NoPath {
                    root: root.to_owned(),
                    tip: tip.to_owned(),
                });
            };
            let joint = &self.joints[joint_name];
            link = &joint.spec.parent_link;
            chain.push(joint);
        }
        chain.reverse();
        Ok(chain)
    }

    fn known_link(&self, link: &str) -> bool {
        link == self.root_link || self.link_parent.contains_key(link)
    }

    /// Symbolic 4×4 transform from `root` to `tip`.
    pub fn fk(&self, root: &str, tip: &str) -> Result<ExprMatrix, ChainError> {
        let mut frame = ExprMatrix::identity(4);
        for joint in self.chain_to(root, tip)? {
            frame = frame.matmul(&joint_frame(joint));
        }
        Ok(frame)
    }
}

fn joint_frame(joint: &RobotJoint) -> ExprMatrix {
    let [ox, oy, oz] = joint.spec.origin_xyz;
    let [qx, qy, qz, qw] = joint.spec.origin_quat;
    let origin = translation(
        Expr::constant(ox),
        Expr::constant(oy),
        Expr::constant(oz),
    )
    .matmul(&rotation_quaternion(
        &Expr::constant(qx),
        &Expr::constant(qy),
        &Expr::constant(qz),
        &Expr::constant(qw),
    ));

    let q = Expr::symbol(joint.symbol);
    let [ax, ay, az] = joint.spec.axis;
    let motion = match joint.spec.kind {
        JointKind::Revolute | JointKind::Continuous => {
            let axis = vector3(
                Expr::constant(ax),
                Expr::constant(ay),
                Expr::constant(az),
            );
            rotation_axis_angle(&axis, &q)
        }
        JointKind::Prismatic => translation(
            Expr::constant(ax) * &q,
            Expr::constant(ay) * &q,
            Expr::constant(az) * &q,
        ),
        JointKind::BaseX => translation(q, Expr::constant(0.0), Expr::constant(0.0)),
        JointKind::BaseY => translation(Expr::constant(0.0), q, Expr::constant(0.0)),
        JointKind::BaseYaw => {
            let axis = vector3(
                Expr::constant(0.0),
                Expr::constant(0.0),
                Expr::constant(1.0),
            );
            rotation_axis_angle(&axis, &q)
        }
        JointKind::Fixed => ExprMatrix::identity(4),
    };

    origin.matmul(&motion)
}
