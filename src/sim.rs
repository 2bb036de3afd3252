// Simulated differential-drive base
//
// DiffDriveModel integrates a body twist exactly (unicycle model).
// SimulatedBase wraps it with a virtual clock and acts as pose source, motion
// sink and clock at once, so whole maneuvers run instantly and deterministically.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::error::{NavError, TransportError};
use crate::kinematics::normalize_angle;
use crate::messages::{Pose, Twist, WheelCommand};
use crate::motion::{Clock, MotionSink};
use crate::navigation::PoseSource;

// Below this angular rate the arc is treated as a straight line
const STRAIGHT_EPS: f64 = 1e-12;

/// Planar vehicle driven by a body twist (forward speed, yaw rate)
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffDriveModel {
    pose: Pose,
    linear: f64,
    angular: f64,
}

impl DiffDriveModel {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            ..Self::default()
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_twist(&mut self, twist: &Twist) {
        self.linear = twist.linear.x;
        self.angular = twist.angular.z;
    }

    /// Advance the pose by `dt` seconds under the current twist
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }

        let Pose { x, y, yaw } = self.pose;
        let dtheta = self.angular * dt;

        let (nx, ny) = if self.angular.abs() < STRAIGHT_EPS {
            (x + self.linear * dt * yaw.cos(), y + self.linear * dt * yaw.sin())
        } else {
            // Exact arc of radius v/omega
            let r = self.linear / self.angular;
            (
                x + r * ((yaw + dtheta).sin() - yaw.sin()),
                y - r * ((yaw + dtheta).cos() - yaw.cos()),
            )
        };

        self.pose = Pose::new(nx, ny, normalize_angle(yaw + dtheta));
    }
}

struct SimState {
    model: DiffDriveModel,
    now: Duration,
    wheel_distance: f64,
    command_latency: Duration,
    telemetry: bool,
    commands: Vec<(Duration, WheelCommand)>,
    samples: usize,
}

impl SimState {
    fn advance(&mut self, dt: Duration) {
        self.model.step(dt.as_secs_f64());
        self.now += dt;
    }
}

/// Virtual-time simulated base; clones share the same vehicle
#[derive(Clone)]
pub struct SimulatedBase {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedBase {
    /// Vehicle at the origin facing +x
    pub fn new(wheel_distance: f64) -> Self {
        Self::with_pose(wheel_distance, Pose::default())
    }

    pub fn with_pose(wheel_distance: f64, pose: Pose) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                model: DiffDriveModel::new(pose),
                now: Duration::ZERO,
                wheel_distance,
                command_latency: Duration::ZERO,
                telemetry: true,
                commands: Vec::new(),
                samples: 0,
            })),
        }
    }

    /// Each command takes `latency` of virtual time to reach the vehicle
    pub fn with_command_latency(self, latency: Duration) -> Self {
        self.state.borrow_mut().command_latency = latency;
        self
    }

    /// Odometry never arrives; every sample fails
    pub fn without_telemetry(self) -> Self {
        self.state.borrow_mut().telemetry = false;
        self
    }

    /// Ground-truth pose
    pub fn pose(&self) -> Pose {
        self.state.borrow().model.pose()
    }

    /// Every command the vehicle received, stamped with its arrival time
    pub fn command_log(&self) -> Vec<(Duration, WheelCommand)> {
        self.state.borrow().commands.clone()
    }

    /// Number of pose samples attempted
    pub fn sample_count(&self) -> usize {
        self.state.borrow().samples
    }
}

impl PoseSource for SimulatedBase {
    fn sample(&mut self) -> Result<Pose, NavError> {
        let mut state = self.state.borrow_mut();
        state.samples += 1;
        if !state.telemetry {
            return Err(NavError::NoPoseData("simulated odometry is silent".into()));
        }
        Ok(state.model.pose())
    }
}

impl MotionSink for SimulatedBase {
    fn command(&mut self, cmd: WheelCommand) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        let latency = state.command_latency;
        state.advance(latency);

        let twist = Twist::from_wheels(&cmd, state.wheel_distance);
        state.model.set_twist(&twist);
        let now = state.now;
        state.commands.push((now, cmd));
        debug!("sim: {:?} at {:?}", cmd, now);
        Ok(())
    }
}

impl Clock for SimulatedBase {
    fn now(&self) -> Duration {
        self.state.borrow().now
    }

    fn sleep(&self, duration: Duration) {
        self.state.borrow_mut().advance(duration);
    }
}
