// Simulated base runtime: 50 Hz loop with optional watchdog
// Note: the watchdog zeroes the twist when commands stop arriving. go2pos holds a
// single command for a whole phase, so the watchdog is off unless asked for.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{LOOP_HZ, TOPIC_CMD_VEL, TOPIC_HEALTH, TOPIC_ODOM};
use crate::messages::{Odometry, Pose, RuntimeHealth, Twist};
use crate::sim::DiffDriveModel;

/// Key expressions used by the simulated base
#[derive(Debug, Clone)]
pub struct RuntimeTopics {
    pub cmd_vel: String,
    pub odometry: String,
    pub health: String,
}

impl Default for RuntimeTopics {
    fn default() -> Self {
        Self {
            cmd_vel: TOPIC_CMD_VEL.to_string(),
            odometry: TOPIC_ODOM.to_string(),
            health: TOPIC_HEALTH.to_string(),
        }
    }
}

pub struct Runtime {
    model: DiffDriveModel,
    watchdog: Option<Duration>,
    latest_cmd: Option<Twist>,
    cmd_received_at: Instant,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new(initial_pose: Pose, watchdog: Option<Duration>) -> Self {
        Self {
            model: DiffDriveModel::new(initial_pose),
            watchdog,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Process incoming command
    fn on_command(&mut self, cmd: Twist, now: Instant) {
        info!(
            "Received twist: linear={:.3}, angular={:.3}",
            cmd.linear.x, cmd.angular.z
        );
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Twist to apply this tick, after the watchdog
    fn compute_twist(&mut self, now: Instant) -> Twist {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        if self.watchdog.is_some_and(|timeout| cmd_age > timeout) {
            // Watchdog triggered - stop the vehicle
            if self.health != RuntimeHealth::CmdStale {
                warn!("Command stale ({:?} old), stopping vehicle", cmd_age);
            }
            self.health = RuntimeHealth::CmdStale;
            Twist::default()
        } else if let Some(cmd) = self.latest_cmd {
            self.health = RuntimeHealth::Ok;
            cmd
        } else {
            // No command ever received
            self.health = RuntimeHealth::CmdStale;
            Twist::default()
        }
    }

    /// One loop iteration: apply the (watchdogged) twist for `dt`
    fn tick(&mut self, now: Instant, dt: Duration) -> Pose {
        let twist = self.compute_twist(now);
        self.model.set_twist(&twist);
        self.model.step(dt.as_secs_f64());
        self.model.pose()
    }
}

pub async fn run(
    initial_pose: Pose,
    topics: RuntimeTopics,
    watchdog: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(topics.cmd_vel.clone()).await?;
    let pub_odom = session.declare_publisher(topics.odometry.clone()).await?;
    let pub_health = session.declare_publisher(topics.health.clone()).await?;

    let mut runtime = Runtime::new(initial_pose, watchdog);
    let period = Duration::from_millis(1000 / LOOP_HZ);
    let mut tick = interval(period);

    match watchdog {
        Some(timeout) => info!(
            "Simulated base started: {}Hz loop, {}ms watchdog timeout, pose {}",
            LOOP_HZ,
            timeout.as_millis(),
            initial_pose
        ),
        None => info!(
            "Simulated base started: {}Hz loop, no watchdog, pose {}",
            LOOP_HZ, initial_pose
        ),
    }
    info!("Subscribed to: {}", topics.cmd_vel);
    info!("Publishing to: {}, {}", topics.odometry, topics.health);

    loop {
        tick.tick().await;
        let now = Instant::now();

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<Twist>(&payload) {
                Ok(cmd) => runtime.on_command(cmd, now),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }

        // 2. Integrate the model (includes watchdog logic)
        let pose = runtime.tick(now, period);

        // 3. Publish odometry
        let odom_json = serde_json::to_string(&Odometry::from(&pose))?;
        pub_odom.put(odom_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health)?;
        pub_health.put(health_json).await?;
    }
}
