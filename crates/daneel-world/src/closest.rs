//! Closest-point queries and their blackboard publication.
//!
//! Broad phase: grown AABB overlap against the query sphere. Narrow
//! phase: analytic point-to-primitive distance behind the
//! [`NarrowPhase`] trait, so a mesh-capable collision library can be
//! slotted in without touching the query loop.

use nalgebra::{Isometry3, Point3, Vector3};

use daneel_core::{paths, Blackboard, PathKey};

use crate::{Aabb, BodyShape, BodyState, Primitive};

/// Distance published for links with no body in range. Far enough that
/// every avoidance weight evaluates to zero.
pub const CLEAR_DISTANCE: f64 = 100.0;

const BROAD_PHASE_MARGIN: f64 = 0.5;

/// One nearest-point pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Separation between the link sphere surface and the body.
    pub min_dist: f64,
    /// World-frame normal pointing from the body toward the link.
    pub normal: Vector3<f64>,
    /// Point on the robot link (world frame).
    pub on_link: Point3<f64>,
    /// Point on the body (world frame).
    pub on_body: Point3<f64>,
}

/// Narrow-phase provider: closest point of a body to a world-frame
/// point. Returns `None` for unsupported shapes.
pub trait NarrowPhase {
    fn closest_point(
        &self,
        shape: &BodyShape,
        pose: &Isometry3<f64>,
        point: Point3<f64>,
    ) -> Option<(Point3<f64>, f64, Vector3<f64>)>;
}

/// Built-in narrow phase for primitive solids. Meshes are skipped (an
/// external provider handles them).
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveNarrowPhase;

impl NarrowPhase for PrimitiveNarrowPhase {
    fn closest_point(
        &self,
        shape: &BodyShape,
        pose: &Isometry3<f64>,
        point: Point3<f64>,
    ) -> Option<(Point3<f64>, f64, Vector3<f64>)> {
        let BodyShape::Primitive(primitive) = shape else {
            return None;
        };
        let local = pose.inverse_transform_point(&point);
        let (on_surface_local, signed_dist, normal_local) = match *primitive {
            Primitive::Sphere { radius } => sphere_closest(local, radius),
            Primitive::Box { size } => box_closest(local, size),
            Primitive::Cylinder { height, radius } => cylinder_closest(local, height, radius),
            // Rejected at add time.
            Primitive::Cone { .. } => return None,
        };
        Some((
            pose.transform_point(&on_surface_local),
            signed_dist,
            pose.rotation.transform_vector(&normal_local),
        ))
    }
}

fn sphere_closest(p: Point3<f64>, radius: f64) -> (Point3<f64>, f64, Vector3<f64>) {
    let d = p.coords.norm();
    if d < 1e-12 {
        // Center coincides; pick an arbitrary direction.
        return (Point3::new(radius, 0.0, 0.0), -radius, Vector3::x());
    }
    let n = p.coords / d;
    (Point3::from(n * radius), d - radius, n)
}

fn box_closest(p: Point3<f64>, size: [f64; 3]) -> (Point3<f64>, f64, Vector3<f64>) {
    let half = Vector3::new(size[0] / 2.0, size[1] / 2.0, size[2] / 2.0);
    let clamped = Point3::new(
        p.x.clamp(-half.x, half.x),
        p.y.clamp(-half.y, half.y),
        p.z.clamp(-half.z, half.z),
    );
    let delta = p - clamped;
    let dist = delta.norm();
    if dist > 1e-12 {
        return (clamped, dist, delta / dist);
    }

    // Inside: push out through the nearest face.
    let mut best_axis = 0;
    let mut best_pen = f64::INFINITY;
    let mut best_sign = 1.0;
    for axis in 0..3 {
        for sign in [-1.0, 1.0] {
            let pen = half[axis] - sign * p[axis];
            if pen < best_pen {
                best_pen = pen;
                best_axis = axis;
                best_sign = sign;
            }
        }
    }
    let mut surface = p;
    surface[best_axis] = best_sign * half[best_axis];
    let mut normal = Vector3::zeros();
    normal[best_axis] = best_sign;
    (surface, -best_pen, normal)
}

fn cylinder_closest(p: Point3<f64>, height: f64, radius: f64) -> (Point3<f64>, f64, Vector3<f64>) {
    let half_h = height / 2.0;
    let radial = Vector3::new(p.x, p.y, 0.0);
    let r = radial.norm();
    let radial_dir = if r > 1e-12 {
        radial / r
    } else {
        Vector3::x()
    };

    if r <= radius && p.z.abs() <= half_h {
        // Inside: nearer of wall and cap.
        let wall_pen = radius - r;
        let cap_pen = half_h - p.z.abs();
        return if wall_pen < cap_pen {
            (
                Point3::from(radial_dir * radius + Vector3::new(0.0, 0.0, p.z)),
                -wall_pen,
                radial_dir,
            )
        } else {
            let sign = if p.z >= 0.0 { 1.0 } else { -1.0 };
            (
                Point3::new(p.x, p.y, sign * half_h),
                -cap_pen,
                Vector3::new(0.0, 0.0, sign),
            )
        };
    }

    // Outside: clamp to the wall/cap edge.
    let clamped_r = r.min(radius);
    let clamped_z = p.z.clamp(-half_h, half_h);
    let surface = Point3::from(radial_dir * clamped_r + Vector3::new(0.0, 0.0, clamped_z));
    let delta = p - surface;
    let dist = delta.norm();
    (surface, dist, delta / dist)
}

/// Closest contact of a link collision sphere against a set of bodies.
///
/// `link_center` is the sphere center in world coordinates. The caller
/// supplies each body with its resolved world pose and is expected to
/// filter out bodies attached to the queried link itself (a grasped
/// object never collides with its own gripper).
pub fn closest_contact<'w>(
    bodies: impl Iterator<Item = (&'w str, &'w BodyState, Isometry3<f64>)>,
    link_center: Point3<f64>,
    link_radius: f64,
    narrow: &dyn NarrowPhase,
) -> Option<Contact> {
    let query_box = Aabb::around_point(link_center, link_radius + BROAD_PHASE_MARGIN);
    let mut best: Option<Contact> = None;

    for (name, state, world_pose) in bodies {
        if let BodyShape::Primitive(p) = &state.body.shape {
            let body_box = Aabb::of_primitive(p, &world_pose).grown(BROAD_PHASE_MARGIN);
            if !body_box.intersects(&query_box) {
                continue;
            }
        }

        let Some((on_body, center_dist, normal)) =
            narrow.closest_point(&state.body.shape, &world_pose, link_center)
        else {
            tracing::trace!(body = name, "narrow phase skipped body");
            continue;
        };

        let min_dist = center_dist - link_radius;
        let on_link = link_center - normal * link_radius;
        let contact = Contact {
            min_dist,
            normal,
            on_link,
            on_body,
        };
        if best.is_none_or(|b| contact.min_dist < b.min_dist) {
            best = Some(contact);
        }
    }
    best
}

/// Publish one link's contact record for the constraint expressions.
pub fn publish_contact(blackboard: &mut Blackboard, link: &str, contact: &Contact) {
    let root = paths::collision(link);
    blackboard.set(&root.child("min_dist"), contact.min_dist);
    for (field, v) in [
        ("contact_normal", contact.normal.as_slice()),
        ("position_on_a", contact.on_link.coords.as_slice()),
        ("position_on_b", contact.on_body.coords.as_slice()),
    ] {
        let base = root.child(field);
        for (i, value) in v.iter().enumerate() {
            blackboard.set(&base.child(PathKey::Index(i)), *value);
        }
    }
}

/// Publish the no-contact sentinel for a link.
///
/// The phantom body point sits [`CLEAR_DISTANCE`] below the link point,
/// so the symbolic distance in the avoidance constraints evaluates far
/// outside every weight threshold.
pub fn publish_clear(blackboard: &mut Blackboard, link: &str) {
    publish_contact(
        blackboard,
        link,
        &Contact {
            min_dist: CLEAR_DISTANCE,
            normal: Vector3::z(),
            on_link: Point3::origin(),
            on_body: Point3::new(0.0, 0.0, -CLEAR_DISTANCE),
        },
    );
}
