//! World body shapes.

use nalgebra::{Isometry3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Primitive solid kinds, mirroring the wire protocol. Cones are part of
/// the protocol but not supported by the collision pipeline; adding one
/// is rejected as a corrupt shape.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// Full extents along x, y, z.
    Box { size: [f64; 3] },
    Sphere { radius: f64 },
    /// Axis along local z.
    Cylinder { height: f64, radius: f64 },
    Cone { height: f64, radius: f64 },
}

impl Primitive {
    /// Whether the dimensions describe a usable solid.
    pub fn is_well_formed(&self) -> bool {
        match *self {
            Self::Box { size } => size.iter().all(|&d| d > 0.0),
            Self::Sphere { radius } => radius > 0.0,
            Self::Cylinder { height, radius } => height > 0.0 && radius > 0.0,
            // Protocol-expressible, pipeline-unsupported.
            Self::Cone { .. } => false,
        }
    }
}

/// Geometry of a world body.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyShape {
    Primitive(Primitive),
    /// Mesh resource reference; narrow-phase support requires an
    /// external [`crate::NarrowPhase`] provider.
    Mesh { resource: String },
    /// Articulated sub-world; not loadable without a URDF front-end.
    Urdf { description: String },
}

/// A named body in the world.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WorldBody {
    pub name: String,
    pub shape: BodyShape,
}

impl WorldBody {
    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        Self {
            name: name.into(),
            shape: BodyShape::Primitive(primitive),
        }
    }

    pub fn mesh(name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: BodyShape::Mesh {
                resource: resource.into(),
            },
        }
    }
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn around_point(center: Point3<f64>, radius: f64) -> Self {
        let r = Vector3::repeat(radius);
        Self {
            min: center - r,
            max: center + r,
        }
    }

    /// Conservative world-frame AABB of a posed primitive.
    pub fn of_primitive(primitive: &Primitive, pose: &Isometry3<f64>) -> Self {
        let radius = match *primitive {
            Primitive::Box { size } => {
                0.5 * (size[0].powi(2) + size[1].powi(2) + size[2].powi(2)).sqrt()
            }
            Primitive::Sphere { radius } => radius,
            Primitive::Cylinder { height, radius } | Primitive::Cone { height, radius } => {
                (radius.powi(2) + (height / 2.0).powi(2)).sqrt()
            }
        };
        Self::around_point(Point3::from(pose.translation.vector), radius)
    }

    pub fn grown(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }
}
