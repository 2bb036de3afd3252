// go2pos: open-loop go-to-position for a differential-drive base
//
// Core: kinematics -> motion (timed commands) -> navigation (two-phase maneuver)
// Outer layers: transports (Ignition CLI, zenoh bus), simulated base, CLI

pub mod cli;
pub mod config;
pub mod error;
pub mod kinematics;
pub mod messages;
pub mod motion;
pub mod navigation;
pub mod runtime;
pub mod sim;
pub mod transport;

pub use config::RobotConfig;
pub use error::{NavError, TransportError};
pub use messages::{NavigationRequest, Pose, TimedCommand, WheelCommand};
pub use motion::{Clock, MotionSink, SystemClock};
pub use navigation::{NavigationController, NavigationPhase, NavigationReport, PoseSource};
