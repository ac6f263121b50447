//! Spatial math over symbolic expressions.
//!
//! Frames are homogeneous 4×4 matrices; points and vectors are 4×1 with
//! `w = 1` and `w = 0` respectively; quaternions are 4×1 `(x, y, z, w)`.
//!
//! Functions come in two flavours where it matters: smooth forms safe to
//! differentiate, and exact piecewise forms for bound/weight expressions.

use crate::smooth::{
    safe_division, smooth_abs, smooth_if_eq_zero, smooth_if_greater_eq_zero,
    smooth_if_greater_zero, smooth_max, smooth_min,
};
use crate::{Expr, ExprMatrix, SelectKind};

pub const SMALL_NUMBER: f64 = 1e-10;

/// Direction vector (`w = 0`).
pub fn vector3(x: Expr, y: Expr, z: Expr) -> ExprMatrix {
    ExprMatrix::column(vec![x, y, z, Expr::constant(0.0)])
}

/// Position (`w = 1`).
pub fn point3(x: Expr, y: Expr, z: Expr) -> ExprMatrix {
    ExprMatrix::column(vec![x, y, z, Expr::constant(1.0)])
}

/// Cross product of two homogeneous vectors (`w` ignored, result `w = 0`).
pub fn cross(u: &ExprMatrix, v: &ExprMatrix) -> ExprMatrix {
    vector3(
        &u[1] * &v[2] - &u[2] * &v[1],
        &u[2] * &v[0] - &u[0] * &v[2],
        &u[0] * &v[1] - &u[1] * &v[0],
    )
}

/// Pure translation frame.
pub fn translation(x: Expr, y: Expr, z: Expr) -> ExprMatrix {
    let mut m = ExprMatrix::identity(4);
    m[(0, 3)] = x;
    m[(1, 3)] = y;
    m[(2, 3)] = z;
    m
}

/// Rotation frame from roll/pitch/yaw (Z·Y·X).
pub fn rotation_rpy(roll: &Expr, pitch: &Expr, yaw: &Expr) -> ExprMatrix {
    let (sr, cr) = (roll.sin(), roll.cos());
    let (sp, cp) = (pitch.sin(), pitch.cos());
    let (sy, cy) = (yaw.sin(), yaw.cos());
    let zero = Expr::constant(0.0);
    let one = Expr::constant(1.0);
    ExprMatrix::from_rows(vec![
        vec![
            &cy * &cp,
            &cy * &sp * &sr - &sy * &cr,
            &cy * &sp * &cr + &sy * &sr,
            zero.clone(),
        ],
        vec![
            &sy * &cp,
            &sy * &sp * &sr + &cy * &cr,
            &sy * &sp * &cr - &cy * &sr,
            zero.clone(),
        ],
        vec![-(&sp), &cp * &sr, &cp * &cr, zero.clone()],
        vec![zero.clone(), zero.clone(), zero, one],
    ])
}

/// Rotation frame from a unit axis and an angle.
pub fn rotation_axis_angle(axis: &ExprMatrix, angle: &Expr) -> ExprMatrix {
    let ct = angle.cos();
    let st = angle.sin();
    let vt = 1.0 - &ct;
    let m_vt_0 = &vt * &axis[0];
    let m_vt_1 = &vt * &axis[1];
    let m_vt_2 = &vt * &axis[2];
    let m_st_0 = &axis[0] * &st;
    let m_st_1 = &axis[1] * &st;
    let m_st_2 = &axis[2] * &st;
    let m_vt_0_1 = &m_vt_0 * &axis[1];
    let m_vt_0_2 = &m_vt_0 * &axis[2];
    let m_vt_1_2 = &m_vt_1 * &axis[2];
    let zero = Expr::constant(0.0);
    let one = Expr::constant(1.0);
    ExprMatrix::from_rows(vec![
        vec![
            &ct + &m_vt_0 * &axis[0],
            -(&m_st_2) + &m_vt_0_1,
            &m_st_1 + &m_vt_0_2,
            zero.clone(),
        ],
        vec![
            &m_st_2 + &m_vt_0_1,
            &ct + &m_vt_1 * &axis[1],
            -(&m_st_0) + &m_vt_1_2,
            zero.clone(),
        ],
        vec![
            -(&m_st_1) + &m_vt_0_2,
            &m_st_0 + &m_vt_1_2,
            &ct + &m_vt_2 * &axis[2],
            zero.clone(),
        ],
        vec![zero.clone(), zero.clone(), zero, one],
    ])
}

/// Rotation frame from a unit quaternion.
pub fn rotation_quaternion(x: &Expr, y: &Expr, z: &Expr, w: &Expr) -> ExprMatrix {
    let x2 = x * x;
    let y2 = y * y;
    let z2 = z * z;
    let w2 = w * w;
    let zero = Expr::constant(0.0);
    let one = Expr::constant(1.0);
    ExprMatrix::from_rows(vec![
        vec![
            &w2 + &x2 - &y2 - &z2,
            2.0 * x * y - 2.0 * w * z,
            2.0 * x * z + 2.0 * w * y,
            zero.clone(),
        ],
        vec![
            2.0 * x * y + 2.0 * w * z,
            &w2 - &x2 + &y2 - &z2,
            2.0 * y * z - 2.0 * w * x,
            zero.clone(),
        ],
        vec![
            2.0 * x * z - 2.0 * w * y,
            2.0 * y * z + 2.0 * w * x,
            &w2 - &x2 - &y2 + &z2,
            zero.clone(),
        ],
        vec![zero.clone(), zero.clone(), zero, one],
    ])
}

/// Frame from translation plus quaternion.
pub fn frame_quaternion(
    x: Expr,
    y: Expr,
    z: Expr,
    qx: &Expr,
    qy: &Expr,
    qz: &Expr,
    qw: &Expr,
) -> ExprMatrix {
    translation(x, y, z).matmul(&rotation_quaternion(qx, qy, qz, qw))
}

/// Frame from translation plus axis-angle.
pub fn frame_axis_angle(x: Expr, y: Expr, z: Expr, axis: &ExprMatrix, angle: &Expr) -> ExprMatrix {
    translation(x, y, z).matmul(&rotation_axis_angle(axis, angle))
}

/// Frame from translation plus roll/pitch/yaw.
pub fn frame_rpy(x: Expr, y: Expr, z: Expr, roll: &Expr, pitch: &Expr, yaw: &Expr) -> ExprMatrix {
    translation(x, y, z).matmul(&rotation_rpy(roll, pitch, yaw))
}

/// Rigid inverse: `[Rᵀ, −Rᵀt; 0, 1]`.
pub fn frame_inverse(frame: &ExprMatrix) -> ExprMatrix {
    assert_eq!(frame.shape(), (4, 4), "frame_inverse expects a 4×4 frame");
    let mut inv = ExprMatrix::identity(4);
    for r in 0..3 {
        for c in 0..3 {
            inv[(r, c)] = frame[(c, r)].clone();
        }
    }
    for r in 0..3 {
        let mut acc = Expr::constant(0.0);
        for c in 0..3 {
            acc = acc + &inv[(r, c)] * &frame[(c, 3)];
        }
        inv[(r, 3)] = -acc;
    }
    inv
}

/// Translation column of a frame as a 4×1 point.
pub fn position_of(frame: &ExprMatrix) -> ExprMatrix {
    frame.block(0, 3, 4, 1)
}

/// The frame with its translation zeroed.
pub fn rotation_of(frame: &ExprMatrix) -> ExprMatrix {
    let mut m = frame.clone();
    for r in 0..3 {
        m[(r, 3)] = Expr::constant(0.0);
    }
    m
}

/// Trace of the upper-left 3×3 block.
pub fn trace3(m: &ExprMatrix) -> Expr {
    &m[(0, 0)] + &m[(1, 1)] + &m[(2, 2)]
}

/// Angle of the relative rotation between two frames sharing a base.
pub fn rotation_distance(a_r_b: &ExprMatrix, a_r_c: &ExprMatrix) -> Expr {
    let difference = a_r_b.transpose().matmul(a_r_c);
    let angle = (trace3(&difference) - 1.0) / 2.0;
    angle.min(&Expr::constant(1.0)).max(&Expr::constant(-1.0)).acos()
}

/// Axis-angle of a rotation frame, smooth form.
///
/// Undefined at zero rotation (the axis norm vanishes); callers perturb
/// their input when they may sit at identity.
pub fn axis_angle_from_rotation(rm: &ExprMatrix) -> (ExprMatrix, Expr) {
    let angle = ((trace3(rm) - 1.0) / 2.0).acos();
    let x = &rm[(2, 1)] - &rm[(1, 2)];
    let y = &rm[(0, 2)] - &rm[(2, 0)];
    let z = &rm[(1, 0)] - &rm[(0, 1)];
    let n = (&x * &x + &y * &y + &z * &z).sqrt();
    let axis = ExprMatrix::column(vec![&x / &n, &y / &n, &z / &n]);
    (axis, angle)
}

/// Axis-angle of a rotation frame, guarded at identity (still smooth).
pub fn axis_angle_from_rotation_stable(rm: &ExprMatrix) -> (ExprMatrix, Expr) {
    let cos_angle = (trace3(rm) - 1.0) / 2.0;
    let cos_angle = smooth_min(&cos_angle, &Expr::constant(1.0));
    let cos_angle = smooth_max(&cos_angle, &Expr::constant(-1.0));
    let angle = cos_angle.acos();
    let x = &rm[(2, 1)] - &rm[(1, 2)];
    let y = &rm[(0, 2)] - &rm[(2, 0)];
    let z = &rm[(1, 0)] - &rm[(0, 1)];
    let n = (&x * &x + &y * &y + &z * &z).sqrt();
    let m = smooth_if_eq_zero(&n, &Expr::constant(1.0), &n);
    let axis = ExprMatrix::column(vec![
        smooth_if_eq_zero(&n, &Expr::constant(0.0), &(&x / &m)),
        smooth_if_eq_zero(&n, &Expr::constant(0.0), &(&y / &m)),
        smooth_if_eq_zero(&n, &Expr::constant(1.0), &(&z / &m)),
    ]);
    (axis, angle)
}

/// Axis-angle of a quaternion, exact piecewise form (bounds only).
///
/// The input is normalized first; the identity maps to the +z axis with
/// zero angle.
pub fn axis_angle_from_quaternion(x: &Expr, y: &Expr, z: &Expr, w: &Expr) -> (ExprMatrix, Expr) {
    let l = (x * x + y * y + z * z + w * w).sqrt();
    let (x, y, z, w) = (x / &l, y / &l, z / &l, w / &l);
    let w2 = (1.0 - &w * &w).sqrt();
    let angle = 2.0 * w.min(&Expr::constant(1.0)).max(&Expr::constant(-1.0)).acos();
    let m = exact_if_eq_zero(&w2, Expr::constant(1.0), w2.clone());
    let axis = ExprMatrix::column(vec![
        exact_if_eq_zero(&w2, Expr::constant(0.0), &x / &m),
        exact_if_eq_zero(&w2, Expr::constant(0.0), &y / &m),
        exact_if_eq_zero(&w2, Expr::constant(1.0), &z / &m),
    ]);
    (axis, angle)
}

/// Quaternion from a unit axis and an angle.
pub fn quaternion_from_axis_angle(axis: &ExprMatrix, angle: &Expr) -> ExprMatrix {
    let half = angle / 2.0;
    let s = half.sin();
    ExprMatrix::column(vec![&axis[0] * &s, &axis[1] * &s, &axis[2] * &s, half.cos()])
}

/// Quaternion from roll/pitch/yaw.
pub fn quaternion_from_rpy(roll: &Expr, pitch: &Expr, yaw: &Expr) -> ExprMatrix {
    let (sr, cr) = ((roll / 2.0).sin(), (roll / 2.0).cos());
    let (sp, cp) = ((pitch / 2.0).sin(), (pitch / 2.0).cos());
    let (sy, cy) = ((yaw / 2.0).sin(), (yaw / 2.0).cos());
    let cc = &cr * &cy;
    let cs = &cr * &sy;
    let sc = &sr * &cy;
    let ss = &sr * &sy;
    ExprMatrix::column(vec![
        &cp * &sc - &sp * &cs,
        &cp * &ss + &sp * &cc,
        &cp * &cs - &sp * &sc,
        &cp * &cc + &sp * &ss,
    ])
}

/// Quaternion of a rotation frame, differentiable form.
///
/// Shepperd's branching realized through smooth selections; expensive
/// but safe to feed into slerp chains that end up in bound expressions.
pub fn quaternion_from_rotation(m: &ExprMatrix) -> ExprMatrix {
    let t = trace3(m) + 1.0;

    let if0 = &t - 1.0;
    let if1 = &m[(1, 1)] - &m[(0, 0)];

    let mut m_i_i = smooth_if_greater_zero(&if1, &m[(1, 1)], &m[(0, 0)]);
    let mut m_i_j = smooth_if_greater_zero(&if1, &m[(1, 2)], &m[(0, 1)]);
    let mut m_i_k = smooth_if_greater_zero(&if1, &m[(1, 0)], &m[(0, 2)]);

    let mut m_j_i = smooth_if_greater_zero(&if1, &m[(2, 1)], &m[(1, 0)]);
    let mut m_j_j = smooth_if_greater_zero(&if1, &m[(2, 2)], &m[(1, 1)]);
    let mut m_j_k = smooth_if_greater_zero(&if1, &m[(2, 0)], &m[(1, 2)]);

    let mut m_k_i = smooth_if_greater_zero(&if1, &m[(0, 1)], &m[(2, 0)]);
    let mut m_k_j = smooth_if_greater_zero(&if1, &m[(0, 2)], &m[(2, 1)]);
    let mut m_k_k = smooth_if_greater_zero(&if1, &m[(0, 0)], &m[(2, 2)]);

    let if2 = &m[(2, 2)] - &m_i_i;

    m_i_i = smooth_if_greater_zero(&if2, &m[(2, 2)], &m_i_i);
    m_i_j = smooth_if_greater_zero(&if2, &m[(2, 0)], &m_i_j);
    m_i_k = smooth_if_greater_zero(&if2, &m[(2, 1)], &m_i_k);

    m_j_i = smooth_if_greater_zero(&if2, &m[(0, 2)], &m_j_i);
    m_j_j = smooth_if_greater_zero(&if2, &m[(0, 0)], &m_j_j);
    m_j_k = smooth_if_greater_zero(&if2, &m[(0, 1)], &m_j_k);

    m_k_i = smooth_if_greater_zero(&if2, &m[(1, 2)], &m_k_i);
    m_k_j = smooth_if_greater_zero(&if2, &m[(1, 0)], &m_k_j);
    m_k_k = smooth_if_greater_zero(&if2, &m[(1, 1)], &m_k_k);

    let t = smooth_if_greater_zero(&if0, &t, &(&m_i_i - (&m_j_j + &m_k_k) + 1.0));

    let q0 = smooth_if_greater_zero(
        &if0,
        &(&m[(2, 1)] - &m[(1, 2)]),
        &smooth_if_greater_zero(
            &if2,
            &(&m_i_j + &m_j_i),
            &smooth_if_greater_zero(&if1, &(&m_k_i + &m_i_k), &t),
        ),
    );
    let q1 = smooth_if_greater_zero(
        &if0,
        &(&m[(0, 2)] - &m[(2, 0)]),
        &smooth_if_greater_zero(
            &if2,
            &(&m_k_i + &m_i_k),
            &smooth_if_greater_zero(&if1, &t, &(&m_i_j + &m_j_i)),
        ),
    );
    let q2 = smooth_if_greater_zero(
        &if0,
        &(&m[(1, 0)] - &m[(0, 1)]),
        &smooth_if_greater_zero(
            &if2,
            &t,
            &smooth_if_greater_zero(&if1, &(&m_i_j + &m_j_i), &(&m_k_i + &m_i_k)),
        ),
    );
    let q3 = smooth_if_greater_zero(&if0, &t, &(&m_k_j - &m_j_k));

    let norm = 0.5 / t.sqrt();
    ExprMatrix::column(vec![&q0 * &norm, &q1 * &norm, &q2 * &norm, &q3 * &norm])
}

/// Hamilton product `q1 · q2`.
pub fn quaternion_multiply(q1: &ExprMatrix, q2: &ExprMatrix) -> ExprMatrix {
    let (x0, y0, z0, w0) = (&q2[0], &q2[1], &q2[2], &q2[3]);
    let (x1, y1, z1, w1) = (&q1[0], &q1[1], &q1[2], &q1[3]);
    ExprMatrix::column(vec![
        x1 * w0 + y1 * z0 - z1 * y0 + w1 * x0,
        -(x1 * z0) + y1 * w0 + z1 * x0 + w1 * y0,
        x1 * y0 - y1 * x0 + z1 * w0 + w1 * z0,
        -(x1 * x0) - y1 * y0 - z1 * z0 + w1 * w0,
    ])
}

pub fn quaternion_conjugate(q: &ExprMatrix) -> ExprMatrix {
    ExprMatrix::column(vec![-(&q[0]), -(&q[1]), -(&q[2]), q[3].clone()])
}

/// The quaternion `p` with `q0 · p = q1`.
pub fn quaternion_diff(q0: &ExprMatrix, q1: &ExprMatrix) -> ExprMatrix {
    quaternion_multiply(&quaternion_conjugate(q0), q1)
}

/// Spherical linear interpolation, differentiable form.
///
/// Handles the antipodal flip, near-identical quaternions, and the
/// vanishing-sine region with dedicated guard branches.
pub fn slerp(q1: &ExprMatrix, q2: &ExprMatrix, t: &Expr) -> ExprMatrix {
    let cos_half_theta = q1.dot(q2);

    let if0 = -(&cos_half_theta);
    let q2: ExprMatrix = {
        let flipped = q2.map(|e| -e);
        ExprMatrix::column(
            (0..4)
                .map(|i| smooth_if_greater_zero(&if0, &flipped[i], &q2[i]))
                .collect(),
        )
    };
    let cos_half_theta = smooth_if_greater_zero(&if0, &(-(&cos_half_theta)), &cos_half_theta);

    let if1 = smooth_abs(&cos_half_theta) - 1.0;

    let cos_half_theta = smooth_min(&Expr::constant(1.0), &cos_half_theta);
    let cos_half_theta = smooth_max(&Expr::constant(-1.0), &cos_half_theta);

    let half_theta = cos_half_theta.acos();
    let sin_half_theta = (1.0 - &cos_half_theta * &cos_half_theta).sqrt();
    let if2 = 0.001 - smooth_abs(&sin_half_theta);

    let ratio_a = safe_division(&(((1.0 - t) * &half_theta).sin()), &sin_half_theta);
    let ratio_b = safe_division(&((t * &half_theta).sin()), &sin_half_theta);

    ExprMatrix::column(
        (0..4)
            .map(|i| {
                let mid = 0.5 * &q1[i] + 0.5 * &q2[i];
                let interp = &ratio_a * &q1[i] + &ratio_b * &q2[i];
                smooth_if_greater_eq_zero(
                    &if1,
                    &q1[i],
                    &smooth_if_greater_zero(&if2, &mid, &interp),
                )
            })
            .collect(),
    )
}

/// `v` scaled to magnitude `a` (zero-safe).
pub fn scale(v: &ExprMatrix, a: &Expr) -> ExprMatrix {
    let n = v.norm();
    v.map(|e| safe_division(e, &n) * a)
}

/// `1 − v̂0·v̂1` for pre-normalized vectors.
pub fn cosine_distance(v0: &ExprMatrix, v1: &ExprMatrix) -> Expr {
    1.0 - v0.dot(v1)
}

pub fn euclidean_distance(v0: &ExprMatrix, v1: &ExprMatrix) -> Expr {
    (v0 - v1).norm()
}

/// Floating modulo, exact form. Results within [`SMALL_NUMBER`] of a
/// full period snap to zero.
pub fn fmod(a: &Expr, b: &Expr) -> Expr {
    let s = a.sign();
    let a = a.abs();
    let b = b.abs();
    let f1 = &a - &(&b * &(&a / &b).floor());
    let near = (&a - &b).abs() - SMALL_NUMBER;
    s * Expr::select(SelectKind::LeZero, near, Expr::constant(0.0), f1)
}

/// Normalize an angle into `[0, 2π)`.
pub fn normalize_angle_positive(angle: &Expr) -> Expr {
    let two_pi = Expr::constant(2.0 * std::f64::consts::PI);
    fmod(&(fmod(angle, &two_pi) + &two_pi), &two_pi)
}

/// Normalize an angle into `[-π, π]`.
pub fn normalize_angle(angle: &Expr) -> Expr {
    let pi = std::f64::consts::PI;
    let a = normalize_angle_positive(angle);
    Expr::select(
        SelectKind::GtZero,
        &a - pi,
        &a - 2.0 * pi,
        a.clone(),
    )
}

/// Shortest signed angular distance, always in `[-π, π]`.
pub fn shortest_angular_distance(from: &Expr, to: &Expr) -> Expr {
    normalize_angle(&(to - from))
}

fn exact_if_eq_zero(cond: &Expr, then: Expr, otherwise: Expr) -> Expr {
    Expr::select(SelectKind::EqZero, cond.clone(), then, otherwise)
}
