// Simulated differential-drive base on the zenoh bus
// Subscribes to Twist commands, publishes Odometry at 50 Hz.
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use go2pos::config::{TOPIC_CMD_VEL, TOPIC_HEALTH, TOPIC_ODOM};
use go2pos::messages::Pose;
use go2pos::runtime::{self, RuntimeTopics};

#[derive(Debug, Parser)]
#[command(name = "sim_base", version)]
struct Args {
    /// Initial X position (m)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    x: f64,

    /// Initial Y position (m)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    y: f64,

    /// Initial heading (degrees)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    yaw_deg: f64,

    /// Stop the base when no command arrives for this long (ms)
    #[arg(long)]
    watchdog_ms: Option<u64>,

    #[arg(long, default_value = TOPIC_CMD_VEL)]
    cmd_topic: String,

    #[arg(long, default_value = TOPIC_ODOM)]
    odom_topic: String,

    #[arg(long, default_value = TOPIC_HEALTH)]
    health_topic: String,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let pose = Pose::new(
        args.x,
        args.y,
        go2pos::kinematics::normalize_angle(args.yaw_deg.to_radians()),
    );
    let topics = RuntimeTopics {
        cmd_vel: args.cmd_topic,
        odometry: args.odom_topic,
        health: args.health_topic,
    };

    if let Err(e) = runtime::run(pose, topics, args.watchdog_ms.map(Duration::from_millis)).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
