// Define data and message types for navigation

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::kinematics::{
    angular_velocity, linear_velocity, quaternion_from_yaw, yaw_from_quaternion,
};

/// Planar pose snapshot: position in meters, yaw in radians within (-π, π]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={:.2}, y={:.2}, yaw={:.2} deg",
            self.x,
            self.y,
            self.yaw.to_degrees()
        )
    }
}

/// Goal of one maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationRequest {
    pub target_x: f64,
    pub target_y: f64,
    pub max_wheel_velocity: f64,
}

impl NavigationRequest {
    pub fn new(target_x: f64, target_y: f64, max_wheel_velocity: f64) -> Result<Self, NavError> {
        let request = Self {
            target_x,
            target_y,
            max_wheel_velocity,
        };
        request.validate()?;
        Ok(request)
    }

    /// Reject requests that cannot produce a finite, non-zero speed plan
    pub fn validate(&self) -> Result<(), NavError> {
        if !(self.target_x.is_finite() && self.target_y.is_finite()) {
            return Err(NavError::InvalidRequest(format!(
                "target must be finite, got ({}, {})",
                self.target_x, self.target_y
            )));
        }
        if !(self.max_wheel_velocity.is_finite() && self.max_wheel_velocity > 0.0) {
            return Err(NavError::InvalidRequest(format!(
                "max_wheel_velocity must be > 0, got {}",
                self.max_wheel_velocity
            )));
        }
        Ok(())
    }
}

/// Commanded wheel speeds in m/s
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelCommand {
    pub v_left: f64,
    pub v_right: f64,
}

impl WheelCommand {
    pub const STOP: WheelCommand = WheelCommand {
        v_left: 0.0,
        v_right: 0.0,
    };

    pub fn new(v_left: f64, v_right: f64) -> Self {
        Self { v_left, v_right }
    }

    pub fn is_stop(&self) -> bool {
        self.v_left == 0.0 && self.v_right == 0.0
    }

    /// True if neither wheel exceeds `limit` in magnitude
    pub fn within(&self, limit: f64) -> bool {
        self.v_left.abs() <= limit && self.v_right.abs() <= limit
    }
}

/// A wheel command held for `duration`, then replaced by the stop command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedCommand {
    pub command: WheelCommand,
    pub duration: Duration,
}

impl TimedCommand {
    /// Build from a duration in seconds; negative or NaN durations clamp to zero
    ///
    /// A hold longer than `Duration` can represent is `HoldTooLong`.
    pub fn from_secs(command: WheelCommand, secs: f64) -> Result<Self, NavError> {
        let secs = if secs.is_nan() { 0.0 } else { secs.max(0.0) };
        let duration = Duration::try_from_secs_f64(secs).map_err(|e| {
            NavError::HoldTooLong(format!("{} s is not representable: {}", secs, e))
        })?;
        Ok(Self { command, duration })
    }
}

// Wire messages. Protobuf JSON leaves out zero-valued fields, so every field defaults.

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseMsg {
    pub position: Vector3,
    pub orientation: Quaternion,
}

/// Odometry telemetry: only the pose part is consumed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Odometry {
    pub pose: PoseMsg,
}

impl Odometry {
    pub fn to_pose(&self) -> Pose {
        let orientation = &self.pose.orientation;
        Pose {
            x: self.pose.position.x,
            y: self.pose.position.y,
            yaw: yaw_from_quaternion(orientation.z, orientation.w),
        }
    }
}

impl From<&Pose> for Odometry {
    fn from(pose: &Pose) -> Self {
        let (z, w) = quaternion_from_yaw(pose.yaw);
        Self {
            pose: PoseMsg {
                position: Vector3 {
                    x: pose.x,
                    y: pose.y,
                    z: 0.0,
                },
                orientation: Quaternion { x: 0.0, y: 0.0, z, w },
            },
        }
    }
}

/// Body-frame velocity command sent to the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    /// Body twist produced by a pair of wheel speeds
    pub fn from_wheels(cmd: &WheelCommand, wheel_distance: f64) -> Self {
        Self {
            linear: Vector3 {
                x: linear_velocity(cmd.v_left, cmd.v_right),
                ..Vector3::default()
            },
            angular: Vector3 {
                z: angular_velocity(cmd.v_left, cmd.v_right, wheel_distance),
                ..Vector3::default()
            },
        }
    }

    /// Text form accepted by `ign topic -p`
    pub fn to_ign_text(&self) -> String {
        format!("linear: {{x: {}}}, angular: {{z: {}}}", self.linear.x, self.angular.z)
    }
}

/// Health status published by the simulated base
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}
