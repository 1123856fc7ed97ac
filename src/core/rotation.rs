use glam::{Mat3, Mat4};
use thiserror::Error;

/// Smallest `qw` accepted when extracting the quaternion. Below this the
/// off-diagonal terms are divided by something too close to zero and the
/// result is noise.
const QW_EPSILON: f32 = 1e-3;

/// Tolerance on the determinant of the upper-left 3×3 block.
const DETERMINANT_TOLERANCE: f32 = 1e-2;

/// Per-element tolerance on `R * Rᵀ = I`.
const ORTHONORMAL_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum RotationError {
    #[error("degenerate rotation: trace {trace} is too close to -1")]
    Degenerate { trace: f32 },
    #[error("not a rotation: determinant {determinant}, orthonormal: {orthonormal}")]
    NotRotation { determinant: f32, orthonormal: bool },
    #[error("transform contains non-finite values")]
    NonFinite,
}

/// Yaw, pitch and roll in degrees.
///
/// `yaw` is the rotation about z, `pitch` about y and `roll` about x, taken
/// in that order.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Decomposes the rotation part of a homogeneous transform.
///
/// The quaternion is derived from the matrix trace, so rotations of (nearly)
/// 180° about any axis are rejected with [`RotationError::Degenerate`]
/// instead of producing NaN.
///
/// The off-diagonal differences are taken as column minus row, which yields
/// the angles of the inverse rotation. Receivers rely on this convention.
pub fn euler_angles(transform: &Mat4) -> Result<EulerAngles, RotationError> {
    if !transform.is_finite() {
        return Err(RotationError::NonFinite);
    }

    let rotation = Mat3::from_mat4(*transform);
    let determinant = rotation.determinant();
    let orthonormal =
        (rotation * rotation.transpose()).abs_diff_eq(Mat3::IDENTITY, ORTHONORMAL_TOLERANCE);
    if !orthonormal || (determinant - 1.).abs() > DETERMINANT_TOLERANCE {
        return Err(RotationError::NotRotation {
            determinant,
            orthonormal,
        });
    }

    let (m0, m1, m2) = (transform.x_axis, transform.y_axis, transform.z_axis);
    let trace = m0.x + m1.y + m2.z;

    let qw = (1. + trace).max(0.).sqrt() / 2.;
    if qw < QW_EPSILON {
        return Err(RotationError::Degenerate { trace });
    }

    let qx = (m2.y - m1.z) / (qw * 4.);
    let qy = (m0.z - m2.x) / (qw * 4.);
    let qz = (m1.x - m0.y) / (qw * 4.);

    let yaw = f32::atan2(2. * (qw * qz + qx * qy), 1. - 2. * (qy * qy + qz * qz));
    let pitch = pitch_from_sine(2. * (qw * qy - qz * qx));
    let roll = f32::atan2(2. * (qw * qx + qy * qz), 1. - 2. * (qx * qx + qy * qy));

    Ok(EulerAngles {
        yaw: yaw.to_degrees(),
        pitch,
        roll: roll.to_degrees(),
    })
}

/// Pitch in degrees from its sine. Values outside [-1, 1] show up at gimbal
/// lock and are clamped to ±90°.
#[inline(always)]
pub fn pitch_from_sine(sinp: f32) -> f32 {
    sinp.clamp(-1., 1.).asin().to_degrees()
}
