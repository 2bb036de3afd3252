// Differential-drive kinematics and planar angle helpers
// All angles in radians, all speeds in m/s.

use std::f64::consts::{PI, TAU};

use crate::messages::Pose;

/// Body angular velocity (rad/s, positive = counter-clockwise) produced by two wheel speeds
///
/// Caller guarantees `wheel_distance > 0`.
pub fn angular_velocity(v_left: f64, v_right: f64, wheel_distance: f64) -> f64 {
    (v_right - v_left) / wheel_distance
}

/// Body forward velocity produced by two wheel speeds
pub fn linear_velocity(v_left: f64, v_right: f64) -> f64 {
    (v_right + v_left) / 2.0
}

/// Wrap any angle into (-π, π]
///
/// Values already in range come back unchanged, which makes the function exactly
/// idempotent. -π itself is reported as +π.
pub fn normalize_angle(theta: f64) -> f64 {
    if theta > -PI && theta <= PI {
        return theta;
    }

    // rem_euclid never returns a negative remainder
    let wrapped = (theta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Absolute direction from `from` to the target point
pub fn bearing_to(from: &Pose, target_x: f64, target_y: f64) -> f64 {
    (target_y - from.y).atan2(target_x - from.x)
}

/// Signed rotation needed to face the target (positive = counter-clockwise)
pub fn relative_angle(from: &Pose, target_x: f64, target_y: f64) -> f64 {
    normalize_angle(bearing_to(from, target_x, target_y) - from.yaw)
}

/// Planar yaw from the z and w components of an orientation quaternion
///
/// Assumes roll and pitch are ~0. The result is in (-π, π] like every other heading.
pub fn yaw_from_quaternion(z: f64, w: f64) -> f64 {
    normalize_angle((2.0 * w * z).atan2(1.0 - 2.0 * z * z))
}

/// Inverse of [`yaw_from_quaternion`]: returns `(z, w)` for a pure rotation about z
pub fn quaternion_from_yaw(yaw: f64) -> (f64, f64) {
    let half = yaw / 2.0;
    (half.sin(), half.cos())
}
