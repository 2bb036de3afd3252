// Ignition Gazebo bridge over the `ign topic` CLI
//
// Odometry: `ign topic -t <topic> -n 1 -e --json-output` prints one message as JSON
// Commands: `ign topic -t <topic> -m ignition.msgs.Twist -p "<text>"`

use std::process::{Command, Output};

use tracing::debug;

use crate::config::{IGN_CMD_TOPIC, IGN_ODOM_TOPIC, IGN_PROGRAM, IGN_TWIST_TYPE};
use crate::error::{NavError, TransportError};
use crate::messages::{Odometry, Pose, Twist, WheelCommand};
use crate::motion::MotionSink;
use crate::navigation::PoseSource;

/// Run a command to completion, turning a non-zero exit into an error
fn run(program: &str, args: &[&str]) -> Result<Output, TransportError> {
    debug!("Running {} {:?}", program, args);
    let output = Command::new(program).args(args).output()?;

    if !output.status.success() {
        return Err(TransportError::Process {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Decode one `--json-output` odometry message; `None` when nothing was printed
pub fn parse_odometry(stdout: &str) -> Result<Option<Pose>, TransportError> {
    let text = stdout.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let odom: Odometry = serde_json::from_str(text)?;
    Ok(Some(odom.to_pose()))
}

/// Pose source echoing a single message from an odometry topic
#[derive(Debug, Clone)]
pub struct IgnOdometry {
    program: String,
    topic: String,
}

impl IgnOdometry {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            program: IGN_PROGRAM.to_string(),
            topic: topic.into(),
        }
    }

    /// Use a different executable (e.g. `gz` on newer releases)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for IgnOdometry {
    fn default() -> Self {
        Self::new(IGN_ODOM_TOPIC)
    }
}

impl PoseSource for IgnOdometry {
    fn sample(&mut self) -> Result<Pose, NavError> {
        let args = ["topic", "-t", self.topic.as_str(), "-n", "1", "-e", "--json-output"];
        let output = run(&self.program, &args).map_err(NavError::Telemetry)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        parse_odometry(&stdout)
            .map_err(NavError::Telemetry)?
            .ok_or_else(|| NavError::NoPoseData(format!("nothing received on {}", self.topic)))
    }
}

/// Motion sink publishing one Twist per command
#[derive(Debug, Clone)]
pub struct IgnCmdVel {
    program: String,
    topic: String,
    wheel_distance: f64,
}

impl IgnCmdVel {
    pub fn new(topic: impl Into<String>, wheel_distance: f64) -> Self {
        Self {
            program: IGN_PROGRAM.to_string(),
            topic: topic.into(),
            wheel_distance,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn default_topic(wheel_distance: f64) -> Self {
        Self::new(IGN_CMD_TOPIC, wheel_distance)
    }
}

impl MotionSink for IgnCmdVel {
    fn command(&mut self, cmd: WheelCommand) -> Result<(), TransportError> {
        let text = Twist::from_wheels(&cmd, self.wheel_distance).to_ign_text();
        let args = ["topic", "-t", self.topic.as_str(), "-m", IGN_TWIST_TYPE, "-p", text.as_str()];
        run(&self.program, &args)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_output_is_no_data() {
        assert_eq!(parse_odometry("").unwrap(), None);
        assert_eq!(parse_odometry("  \n").unwrap(), None);
    }

    #[test]
    fn test_parse_odometry_line() {
        let stdout = "{\"pose\":{\"position\":{\"x\":0.25,\"y\":-1},\"orientation\":{\"w\":1}}}\n";
        let pose = parse_odometry(stdout).unwrap().unwrap();
        assert_eq!(pose, Pose::new(0.25, -1.0, 0.0));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(matches!(
            parse_odometry("Error: topic not found"),
            Err(TransportError::Json(_))
        ));
    }

    #[test]
    fn test_missing_program_is_telemetry_error() {
        let mut source = IgnOdometry::default().with_program("go2pos-no-such-binary");
        assert!(matches!(source.sample(), Err(NavError::Telemetry(TransportError::Io(_)))));

        let mut sink = IgnCmdVel::default_topic(1.2).with_program("go2pos-no-such-binary");
        assert!(matches!(sink.command(WheelCommand::STOP), Err(TransportError::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_topic_is_no_pose_data() {
        // `true` accepts any arguments, prints nothing, exits 0
        let mut source = IgnOdometry::default().with_program("true");
        assert!(matches!(source.sample(), Err(NavError::NoPoseData(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_publisher_is_reported() {
        let mut sink = IgnCmdVel::default_topic(1.2).with_program("false");
        assert!(matches!(
            sink.command(WheelCommand::new(0.5, 0.5)),
            Err(TransportError::Process { .. })
        ));
    }
}
