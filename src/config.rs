// Robot constants, topics, timeouts
use std::time::Duration;

use crate::error::NavError;

// Lateral separation of the two drive wheels (meters)
pub const DEFAULT_WHEEL_DISTANCE: f64 = 1.2;

// Ignition Gazebo topics (used through the `ign topic` CLI)
pub const IGN_ODOM_TOPIC: &str = "/model/robot/odometry";
pub const IGN_CMD_TOPIC: &str = "/cmd_vel";
pub const IGN_PROGRAM: &str = "ign";
pub const IGN_TWIST_TYPE: &str = "ignition.msgs.Twist";

// Zenoh key expressions
pub const TOPIC_ODOM: &str = "go2pos/odometry"; // telemetry
pub const TOPIC_CMD_VEL: &str = "go2pos/cmd_vel"; // commands
pub const TOPIC_HEALTH: &str = "go2pos/state/health"; // simulated base health

// How long the bus bridge waits for a fresh odometry sample
pub const POSE_TIMEOUT: Duration = Duration::from_secs(1);

// Simulated base loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for the simulated base watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

/// Fixed physical parameters of the vehicle, set once at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotConfig {
    pub wheel_distance: f64,
}

impl RobotConfig {
    /// Build a config, rejecting a non-positive or non-finite wheel distance
    pub fn new(wheel_distance: f64) -> Result<Self, NavError> {
        let config = Self { wheel_distance };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NavError> {
        if !(self.wheel_distance.is_finite() && self.wheel_distance > 0.0) {
            return Err(NavError::InvalidRequest(format!(
                "wheel_distance must be a positive number, got {}",
                self.wheel_distance
            )));
        }
        Ok(())
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            wheel_distance: DEFAULT_WHEEL_DISTANCE,
        }
    }
}
