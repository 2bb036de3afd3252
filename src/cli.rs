// Command-line arguments and interactive fallback for missing inputs

use std::io::{BufRead, Write};

use clap::{Parser, ValueEnum};

use crate::config::{
    DEFAULT_WHEEL_DISTANCE, IGN_CMD_TOPIC, IGN_ODOM_TOPIC, TOPIC_CMD_VEL, TOPIC_ODOM,
};
use crate::error::NavError;
use crate::messages::NavigationRequest;

/// Which channel reaches the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Ignition Gazebo via the `ign topic` CLI
    Ign,
    /// Zenoh bus (e.g. the sim_base binary)
    Bus,
    /// In-process simulation on a virtual clock
    Sim,
}

impl Backend {
    pub fn default_odom_topic(self) -> &'static str {
        match self {
            Backend::Ign => IGN_ODOM_TOPIC,
            Backend::Bus | Backend::Sim => TOPIC_ODOM,
        }
    }

    pub fn default_cmd_topic(self) -> &'static str {
        match self {
            Backend::Ign => IGN_CMD_TOPIC,
            Backend::Bus | Backend::Sim => TOPIC_CMD_VEL,
        }
    }
}

/// Drive a differential-drive vehicle to an (x, y) target: turn in place, then go straight
#[derive(Debug, Parser)]
#[command(name = "go2pos", version)]
pub struct Args {
    /// Target X position (m); prompted for when omitted
    #[arg(long, allow_negative_numbers = true)]
    pub x: Option<f64>,

    /// Target Y position (m); prompted for when omitted
    #[arg(long, allow_negative_numbers = true)]
    pub y: Option<f64>,

    /// Maximum wheel velocity (m/s); prompted for when omitted
    #[arg(long)]
    pub max_wheel_vel: Option<f64>,

    /// Distance between the left and right wheels (m)
    #[arg(long, default_value_t = DEFAULT_WHEEL_DISTANCE)]
    pub wheel_distance: f64,

    #[arg(long, value_enum, default_value_t = Backend::Ign)]
    pub backend: Backend,

    /// Odometry topic / key expression
    #[arg(long)]
    pub odom_topic: Option<String>,

    /// Velocity command topic / key expression
    #[arg(long)]
    pub cmd_topic: Option<String>,
}

impl Args {
    pub fn odom_topic(&self) -> String {
        self.odom_topic
            .clone()
            .unwrap_or_else(|| self.backend.default_odom_topic().to_string())
    }

    pub fn cmd_topic(&self) -> String {
        self.cmd_topic
            .clone()
            .unwrap_or_else(|| self.backend.default_cmd_topic().to_string())
    }
}

/// Ask for a number on `output`, read one line from `input`
pub fn prompt_f64<R, W>(prompt: &str, input: &mut R, output: &mut W) -> Result<f64, NavError>
where
    R: BufRead,
    W: Write,
{
    let io_err =
        |e: std::io::Error| NavError::InvalidRequest(format!("failed to read input: {}", e));

    write!(output, "{}", prompt).map_err(io_err)?;
    output.flush().map_err(io_err)?;

    let mut line = String::new();
    if input.read_line(&mut line).map_err(io_err)? == 0 {
        return Err(NavError::InvalidRequest(format!(
            "no value given for \"{}\"",
            prompt.trim()
        )));
    }

    line.trim().parse().map_err(|e| {
        NavError::InvalidRequest(format!("\"{}\" is not a number: {}", line.trim(), e))
    })
}

/// Build the request from flags, prompting for whatever was left out
pub fn resolve_request<R, W>(
    args: &Args,
    input: &mut R,
    output: &mut W,
) -> Result<NavigationRequest, NavError>
where
    R: BufRead,
    W: Write,
{
    let target_x = match args.x {
        Some(x) => x,
        None => prompt_f64("Enter target X position (m): ", input, output)?,
    };
    let target_y = match args.y {
        Some(y) => y,
        None => prompt_f64("Enter target Y position (m): ", input, output)?,
    };
    let max_wheel_velocity = match args.max_wheel_vel {
        Some(v) => v,
        None => prompt_f64("Enter max wheel velocity (m/s): ", input, output)?,
    };

    NavigationRequest::new(target_x, target_y, max_wheel_velocity)
}
