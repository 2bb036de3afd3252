// Two-phase go-to-position maneuver
//
// Rotate in place to face the target, re-sample the pose, drive straight for the
// remaining distance. Open loop: each phase is a precomputed timed command.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RobotConfig;
use crate::error::NavError;
use crate::kinematics::{angular_velocity, relative_angle};
use crate::messages::{NavigationRequest, Pose, TimedCommand, WheelCommand};
use crate::motion::{self, Clock, MotionSink};

/// Telemetry source reporting the latest known pose
pub trait PoseSource {
    fn sample(&mut self) -> Result<Pose, NavError>;
}

/// Where a maneuver currently is; a maneuver is a single linear pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    Idle,
    SamplingInitialPose,
    Rotating,
    SamplingMidPose,
    Translating,
    SamplingFinalPose,
    Done,
    Failed,
}

/// In-place rotation toward the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationPlan {
    /// Signed rotation needed, positive = counter-clockwise
    pub rel_angle: f64,
    /// +1 for counter-clockwise, -1 for clockwise
    pub direction: f64,
    /// Body angular velocity during the turn
    pub omega: f64,
    pub timed: TimedCommand,
}

/// Straight drive to the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationPlan {
    pub distance: f64,
    pub timed: TimedCommand,
}

/// Everything observed and commanded during one maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationReport {
    pub start_pose: Pose,
    pub rotation: RotationPlan,
    pub mid_pose: Pose,
    pub translation: TranslationPlan,
    pub final_pose: Pose,
    pub rotation_elapsed: Duration,
    pub translation_elapsed: Duration,
}

/// Plan the rotation phase from the pose sampled before turning
///
/// Both wheels run at full `max_wheel_velocity` in opposite directions.
pub fn plan_rotation(
    pose: &Pose,
    request: &NavigationRequest,
    config: &RobotConfig,
) -> Result<RotationPlan, NavError> {
    let rel_angle = relative_angle(pose, request.target_x, request.target_y);
    let direction = if rel_angle >= 0.0 { 1.0 } else { -1.0 };

    let v_left = -direction * request.max_wheel_velocity;
    let v_right = direction * request.max_wheel_velocity;
    let omega = angular_velocity(v_left, v_right, config.wheel_distance);

    let turn_secs = (rel_angle / omega).abs();
    let timed = TimedCommand::from_secs(WheelCommand::new(v_left, v_right), turn_secs)?;

    Ok(RotationPlan {
        rel_angle,
        direction,
        omega,
        timed,
    })
}

/// Plan the straight drive from the pose sampled after turning
pub fn plan_translation(
    pose: &Pose,
    request: &NavigationRequest,
) -> Result<TranslationPlan, NavError> {
    let distance = (request.target_x - pose.x).hypot(request.target_y - pose.y);
    let v = request.max_wheel_velocity;
    let timed = TimedCommand::from_secs(WheelCommand::new(v, v), distance / v)?;

    Ok(TranslationPlan { distance, timed })
}

/// Planning failures before the first command count as a bad request
fn reject_request(e: NavError) -> NavError {
    match e {
        NavError::HoldTooLong(msg) => NavError::InvalidRequest(msg),
        other => other,
    }
}

/// Drives one maneuver at a time for a fixed vehicle
pub struct NavigationController {
    config: RobotConfig,
    phase: NavigationPhase,
}

impl NavigationController {
    pub fn new(config: RobotConfig) -> Self {
        Self {
            config,
            phase: NavigationPhase::Idle,
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Phase of the current (or last) maneuver
    pub fn phase(&self) -> NavigationPhase {
        self.phase
    }

    fn enter(&mut self, phase: NavigationPhase) {
        debug!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Run the full rotate-then-drive maneuver
    ///
    /// Inputs are validated before anything is sampled or commanded. Any failure
    /// aborts the maneuver without retrying and leaves the controller `Failed`.
    pub fn navigate<P, S, C>(
        &mut self,
        request: &NavigationRequest,
        pose_source: &mut P,
        sink: &mut S,
        clock: &C,
    ) -> Result<NavigationReport, NavError>
    where
        P: PoseSource + ?Sized,
        S: MotionSink + ?Sized,
        C: Clock + ?Sized,
    {
        self.phase = NavigationPhase::Idle;

        let result = self.run(request, pose_source, sink, clock);
        match &result {
            Ok(_) => self.enter(NavigationPhase::Done),
            Err(e) => {
                warn!("Maneuver aborted during {:?}: {}", self.phase, e);
                self.enter(NavigationPhase::Failed);
            }
        }
        result
    }

    fn run<P, S, C>(
        &mut self,
        request: &NavigationRequest,
        pose_source: &mut P,
        sink: &mut S,
        clock: &C,
    ) -> Result<NavigationReport, NavError>
    where
        P: PoseSource + ?Sized,
        S: MotionSink + ?Sized,
        C: Clock + ?Sized,
    {
        self.config.validate()?;
        request.validate()?;

        self.enter(NavigationPhase::SamplingInitialPose);
        let start_pose = pose_source.sample()?;
        info!("Initial pose: {}", start_pose);

        // Nothing has moved yet, so an unplannable hold is the request's fault
        let rotation =
            plan_rotation(&start_pose, request, &self.config).map_err(reject_request)?;
        plan_translation(&start_pose, request).map_err(reject_request)?;
        info!(
            "Rotating to face target (relative angle: {:.2} deg)",
            rotation.rel_angle.to_degrees()
        );

        self.enter(NavigationPhase::Rotating);
        let rotation_elapsed = motion::execute(&rotation.timed, sink, clock, "Rotating")?;

        // Re-sample so rotational overshoot does not skew the distance
        self.enter(NavigationPhase::SamplingMidPose);
        let mid_pose = pose_source.sample()?;

        let translation = plan_translation(&mid_pose, request)?;
        info!(
            "Driving straight to target (distance: {:.2} m)",
            translation.distance
        );

        self.enter(NavigationPhase::Translating);
        let translation_elapsed =
            motion::execute(&translation.timed, sink, clock, "Driving straight")?;

        // Observational only, no correction
        self.enter(NavigationPhase::SamplingFinalPose);
        let final_pose = pose_source.sample()?;
        info!("Reached target pose: {}", final_pose);

        Ok(NavigationReport {
            start_pose,
            rotation,
            mid_pose,
            translation,
            final_pose,
            rotation_elapsed,
            translation_elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedBase;
    use std::collections::VecDeque;
    use std::f64::consts::{FRAC_PI_4, PI, SQRT_2};

    fn config() -> RobotConfig {
        RobotConfig::new(1.2).unwrap()
    }

    /// Pose source replaying a fixed script; `None` means no data
    struct ScriptedPoses(VecDeque<Option<Pose>>);

    impl PoseSource for ScriptedPoses {
        fn sample(&mut self) -> Result<Pose, NavError> {
            self.0
                .pop_front()
                .flatten()
                .ok_or_else(|| NavError::NoPoseData("script exhausted".into()))
        }
    }

    #[test]
    fn test_scenario_a_rotation_plan() {
        let request = NavigationRequest::new(1.0, 1.0, 0.5).unwrap();
        let plan = plan_rotation(&Pose::new(0.0, 0.0, 0.0), &request, &config()).unwrap();

        assert!((plan.rel_angle - FRAC_PI_4).abs() < 1e-12);
        assert_eq!(plan.direction, 1.0);
        assert_eq!(plan.timed.command, WheelCommand::new(-0.5, 0.5));
        assert!((plan.omega - 0.833_333).abs() < 1e-6);
        assert!((plan.timed.duration.as_secs_f64() - 0.942_477_8).abs() < 1e-6);
    }

    #[test]
    fn test_scenario_b_translation_plan() {
        let request = NavigationRequest::new(1.0, 1.0, 0.5).unwrap();
        let plan = plan_translation(&Pose::new(0.0, 0.0, FRAC_PI_4), &request).unwrap();

        assert!((plan.distance - SQRT_2).abs() < 1e-12);
        assert_eq!(plan.timed.command, WheelCommand::new(0.5, 0.5));
        assert!((plan.timed.duration.as_secs_f64() - 2.828_427).abs() < 1e-6);
    }

    #[test]
    fn test_zero_angle_means_zero_turn() {
        let request = NavigationRequest::new(3.0, 0.0, 0.5).unwrap();
        let plan = plan_rotation(&Pose::new(0.0, 0.0, 0.0), &request, &config()).unwrap();
        assert_eq!(plan.rel_angle, 0.0);
        assert_eq!(plan.direction, 1.0);
        assert_eq!(plan.timed.duration, Duration::ZERO);
    }

    #[test]
    fn test_direction_follows_angle_sign() {
        let origin = Pose::new(0.0, 0.0, 0.0);
        for (tx, ty) in [(1.0, 0.5), (-1.0, 0.5), (1.0, -0.5), (-1.0, -0.5), (0.0, -2.0)] {
            let request = NavigationRequest::new(tx, ty, 0.4).unwrap();
            let plan = plan_rotation(&origin, &request, &config()).unwrap();
            assert_eq!(plan.direction < 0.0, plan.rel_angle < 0.0);
            // Turning clockwise means the left wheel goes forward
            assert_eq!(plan.timed.command.v_left > 0.0, plan.rel_angle < 0.0);
            assert!(plan.timed.command.within(0.4));
        }
    }

    #[test]
    fn test_turn_duration_monotonic_in_angle() {
        let request = NavigationRequest::new(1.0, 0.0, 0.5).unwrap();
        let mut last = Duration::ZERO;
        // Rotating the start heading away from the target grows |rel_angle|
        for k in 0..=30 {
            let yaw = -(k as f64) * PI / 30.0 + 1e-9;
            let plan = plan_rotation(&Pose::new(0.0, 0.0, yaw), &request, &config()).unwrap();
            assert!(plan.timed.duration >= last);
            last = plan.timed.duration;
        }
    }

    #[test]
    fn test_straight_duration_scaling() {
        let pose = Pose::new(0.0, 0.0, 0.0);
        let secs = |tx: f64, v: f64| {
            let request = NavigationRequest::new(tx, 0.0, v).unwrap();
            plan_translation(&pose, &request).unwrap().timed.duration.as_secs_f64()
        };

        assert!((secs(2.0, 0.5) - 2.0 * secs(1.0, 0.5)).abs() < 1e-9);
        assert!((secs(2.0, 1.0) - secs(2.0, 0.5) / 2.0).abs() < 1e-9);
        assert_eq!(secs(0.0, 0.5), 0.0);
    }

    #[test]
    fn test_navigate_in_simulation_reaches_target() {
        let sim = SimulatedBase::new(1.2);
        let mut source = sim.clone();
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        let request = NavigationRequest::new(1.0, 1.0, 0.5).unwrap();
        let report = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap();

        assert_eq!(controller.phase(), NavigationPhase::Done);
        assert_eq!(report.start_pose, Pose::default());
        assert!((report.mid_pose.yaw - FRAC_PI_4).abs() < 1e-6);
        assert!((report.translation.distance - SQRT_2).abs() < 1e-6);
        assert!((report.final_pose.x - 1.0).abs() < 1e-6);
        assert!((report.final_pose.y - 1.0).abs() < 1e-6);

        // Exactly rotate, stop, drive, stop
        let log = sim.command_log();
        let cmds: Vec<WheelCommand> = log.iter().map(|(_, c)| *c).collect();
        assert_eq!(
            cmds,
            vec![
                WheelCommand::new(-0.5, 0.5),
                WheelCommand::STOP,
                WheelCommand::new(0.5, 0.5),
                WheelCommand::STOP,
            ]
        );
        assert_eq!(sim.sample_count(), 3);
    }

    #[test]
    fn test_navigate_clockwise_behind_target() {
        let sim = SimulatedBase::with_pose(1.2, Pose::new(2.0, 2.0, FRAC_PI_4));
        let mut source = sim.clone();
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        let request = NavigationRequest::new(2.0, 0.0, 0.3).unwrap();
        let report = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap();

        assert_eq!(report.rotation.direction, -1.0);
        assert!((report.rotation.rel_angle + 3.0 * FRAC_PI_4).abs() < 1e-9);
        assert!((report.final_pose.x - 2.0).abs() < 1e-6);
        assert!(report.final_pose.y.abs() < 1e-6);
    }

    #[test]
    fn test_mid_pose_resample_absorbs_drift() {
        // Pretend the turn overshot and the base slid to (0.5, 0.5)
        let mut source = ScriptedPoses(VecDeque::from([
            Some(Pose::new(0.0, 0.0, 0.0)),
            Some(Pose::new(0.5, 0.5, 1.0)),
            Some(Pose::new(1.0, 1.0, 1.0)),
        ]));
        let sim = SimulatedBase::new(1.2);
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        let request = NavigationRequest::new(1.0, 1.0, 0.5).unwrap();
        let report = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap();

        assert!((report.translation.distance - SQRT_2 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_scenario_c_no_pose_data() {
        let sim = SimulatedBase::new(1.2).without_telemetry();
        let mut source = sim.clone();
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        let request = NavigationRequest::new(1.0, 1.0, 0.5).unwrap();
        let err = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap_err();

        assert!(matches!(err, NavError::NoPoseData(_)));
        assert_eq!(controller.phase(), NavigationPhase::Failed);
        assert!(sim.command_log().is_empty());
    }

    #[test]
    fn test_mid_pose_failure_leaves_vehicle_stopped() {
        let mut source = ScriptedPoses(VecDeque::from([Some(Pose::default()), None]));
        let sim = SimulatedBase::new(1.2);
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        let request = NavigationRequest::new(0.0, 1.0, 0.5).unwrap();
        let err = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap_err();

        assert!(matches!(err, NavError::NoPoseData(_)));
        let log = sim.command_log();
        assert_eq!(log.len(), 2);
        assert!(log[1].1.is_stop());
    }

    #[test]
    fn test_scenario_d_zero_velocity_rejected() {
        let sim = SimulatedBase::new(1.2);
        let mut source = sim.clone();
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        // Bypass the checked constructor to reach navigate's own validation
        let request = NavigationRequest {
            target_x: 1.0,
            target_y: 1.0,
            max_wheel_velocity: 0.0,
        };
        let err = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap_err();

        assert!(matches!(err, NavError::InvalidRequest(_)));
        assert_eq!(sim.sample_count(), 0);
        assert!(sim.command_log().is_empty());
    }

    #[test]
    fn test_unreachable_target_rejected_before_moving() {
        let sim = SimulatedBase::new(1.2);
        let mut source = sim.clone();
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        // 1e20 s of driving does not fit in a Duration
        let request = NavigationRequest::new(1e20, 0.0, 1.0).unwrap();
        let err = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap_err();

        assert!(matches!(err, NavError::InvalidRequest(_)));
        assert_eq!(controller.phase(), NavigationPhase::Failed);
        assert!(sim.command_log().is_empty());
    }

    #[test]
    fn test_hold_overflow_after_rotation_is_not_invalid_request() {
        // Start pose makes the plan fit, the mid pose puts the target out of reach
        let mut source = ScriptedPoses(VecDeque::from([
            Some(Pose::new(0.0, 0.0, 0.0)),
            Some(Pose::new(-1e20, 0.0, 0.0)),
        ]));
        let sim = SimulatedBase::new(1.2);
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(config());

        let request = NavigationRequest::new(1.0, 0.0, 1.0).unwrap();
        let err = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap_err();

        assert!(matches!(err, NavError::HoldTooLong(_)));
        // Only the rotation and its stop went out
        let log = sim.command_log();
        assert_eq!(log.len(), 2);
        assert!(log[1].1.is_stop());
    }

    #[test]
    fn test_bad_wheel_distance_rejected() {
        let sim = SimulatedBase::new(1.2);
        let mut source = sim.clone();
        let mut sink = sim.clone();
        let mut controller = NavigationController::new(RobotConfig {
            wheel_distance: 0.0,
        });

        let request = NavigationRequest::new(1.0, 1.0, 0.5).unwrap();
        let err = controller
            .navigate(&request, &mut source, &mut sink, &sim)
            .unwrap_err();

        assert!(matches!(err, NavError::InvalidRequest(_)));
        assert_eq!(sim.sample_count(), 0);
    }

    #[test]
    fn test_controller_is_reusable_after_failure() {
        let mut controller = NavigationController::new(config());
        let request = NavigationRequest::new(1.0, 0.0, 0.5).unwrap();

        let silent = SimulatedBase::new(1.2).without_telemetry();
        let (mut s, mut k) = (silent.clone(), silent.clone());
        assert!(controller.navigate(&request, &mut s, &mut k, &silent).is_err());

        let sim = SimulatedBase::new(1.2);
        let (mut s, mut k) = (sim.clone(), sim.clone());
        let report = controller.navigate(&request, &mut s, &mut k, &sim).unwrap();
        assert!((report.final_pose.x - 1.0).abs() < 1e-6);
        assert_eq!(controller.phase(), NavigationPhase::Done);
    }
}
