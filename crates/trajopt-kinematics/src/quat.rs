//! Quaternion helpers for link orientation and orientation error.
//!
//! Ported term-for-term from the original `quatMult`/`quatLog`/`quatInv`
//! in `sandbox/quat_ops.hpp`. Quaternions are `[w, x, y, z]`; `quat_log`
//! keeps the original's half-angle convention (it returns `(angle/2) *
//! axis`, not the full rotation vector) since that is what the upstream
//! angular-velocity computation (`getW`) builds on by scaling externally.

/// `w, x, y, z`.
pub type Quat = [f64; 4];

pub const QUAT_IDENTITY: Quat = [1.0, 0.0, 0.0, 0.0];

pub fn quat_mult(q1: Quat, q2: Quat) -> Quat {
    [
        q1[0] * q2[0] - q1[1] * q2[1] - q1[2] * q2[2] - q1[3] * q2[3],
        q1[0] * q2[1] + q1[1] * q2[0] + q1[2] * q2[3] - q1[3] * q2[2],
        q1[0] * q2[2] + q1[2] * q2[0] + q1[3] * q2[1] - q1[1] * q2[3],
        q1[0] * q2[3] + q1[3] * q2[0] + q1[1] * q2[2] - q1[2] * q2[1],
    ]
}

pub fn quat_inv(q: Quat) -> Quat {
    [q[0], -q[1], -q[2], -q[3]]
}

/// `(acos(w) / ||v||) * v`, zero if `v` is numerically zero (`q` is the
/// identity, i.e. zero rotation).
pub fn quat_log(q: Quat) -> [f64; 3] {
    let v = [q[1], q[2], q[3]];
    let norm_v = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm_v < 1e-10 {
        return [0.0, 0.0, 0.0];
    }
    let s = q[0].clamp(-1.0, 1.0);
    let scale = s.acos() / norm_v;
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

/// Unit quaternion for a rotation of `angle` radians about `axis`
/// (assumed unit-length).
pub fn axis_angle_to_quat(axis: [f64; 3], angle: f64) -> Quat {
    let half = angle / 2.0;
    let s = half.sin();
    [half.cos(), axis[0] * s, axis[1] * s, axis[2] * s]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_of_identity_is_zero() {
        assert_eq!(quat_log(QUAT_IDENTITY), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn log_of_z_rotation_is_half_angle_about_z() {
        let q = axis_angle_to_quat([0.0, 0.0, 1.0], 1.0);
        let log = quat_log(q);
        assert_relative_eq!(log[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(log[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(log[2], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn relative_log_of_equal_quats_is_zero() {
        let q = axis_angle_to_quat([0.0, 1.0, 0.0], 0.7);
        let rel = quat_mult(q, quat_inv(q));
        let log = quat_log(rel);
        assert_relative_eq!(log[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(log[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(log[2], 0.0, epsilon = 1e-9);
    }
}
