//! Axis-angle (Rodrigues) rotation helpers.
//!
//! The pose solver reports orientation as a rotation vector whose direction
//! is the rotation axis and whose norm is the angle in radians.  Navigation
//! only needs the heading, so the engine reads yaw straight off the rotation
//! matrix and ignores roll and pitch.

/// A 3×3 rotation matrix in row-major order.
pub type RotationMatrix = [[f64; 3]; 3];

/// Rotation vectors shorter than this are treated as the identity.
const SMALL_ANGLE: f64 = 1e-10;

/// Below this `sqrt(R00² + R10²)` the ZYX decomposition is in gimbal lock.
const GIMBAL_LOCK: f64 = 1e-6;

/// Build the rotation matrix for an axis-angle vector (exponential map).
///
/// `R = cos θ·I + (1 − cos θ)·k kᵀ + sin θ·[k]ₓ`
pub fn rotation_matrix(rotation_vector: [f64; 3]) -> RotationMatrix {
    let [rx, ry, rz] = rotation_vector;
    let theta = (rx * rx + ry * ry + rz * rz).sqrt();
    if theta < SMALL_ANGLE {
        return [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    }

    let (kx, ky, kz) = (rx / theta, ry / theta, rz / theta);
    let (st, ct) = theta.sin_cos();
    let vt = 1.0 - ct;

    [
        [ct + kx * kx * vt, kx * ky * vt - kz * st, kx * kz * vt + ky * st],
        [ky * kx * vt + kz * st, ct + ky * ky * vt, ky * kz * vt - kx * st],
        [kz * kx * vt - ky * st, kz * ky * vt + kx * st, ct + kz * kz * vt],
    ]
}

/// Heading (rotation about the camera Z axis) in degrees, in `[-180, 180]`.
pub fn yaw_degrees(rotation_vector: [f64; 3]) -> f64 {
    let r = rotation_matrix(rotation_vector);
    r[1][0].atan2(r[0][0]).to_degrees()
}

/// Roll, pitch and yaw in degrees (ZYX convention).
///
/// In gimbal lock yaw is reported as `0` and the whole rotation about the
/// vertical is folded into roll.
pub fn euler_degrees(rotation_vector: [f64; 3]) -> (f64, f64, f64) {
    let r = rotation_matrix(rotation_vector);
    let sy = (r[0][0] * r[0][0] + r[1][0] * r[1][0]).sqrt();

    let (roll, pitch, yaw) = if sy >= GIMBAL_LOCK {
        (
            r[2][1].atan2(r[2][2]),
            (-r[2][0]).atan2(sy),
            r[1][0].atan2(r[0][0]),
        )
    } else {
        ((-r[1][2]).atan2(r[1][1]), (-r[2][0]).atan2(sy), 0.0)
    };

    (roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
}
