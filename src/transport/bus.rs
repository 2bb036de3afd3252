// Zenoh bus bridge
//
// Presents the async zenoh session as a blocking PoseSource / MotionSink by
// owning a tokio runtime and blocking on it for each call.
// Payloads are JSON (Odometry in, Twist out), same as the sim_base runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, info};
use zenoh::Session;
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::Subscriber;
use zenoh::sample::Sample;

use crate::config::POSE_TIMEOUT;
use crate::error::{NavError, TransportError};
use crate::messages::{Odometry, Pose, Twist, WheelCommand};
use crate::motion::MotionSink;
use crate::navigation::PoseSource;

fn zenoh_err(e: zenoh::Error) -> TransportError {
    TransportError::Zenoh(e.to_string())
}

/// Decode a JSON odometry payload into a pose
pub fn decode_odometry(payload: &[u8]) -> Result<Pose, TransportError> {
    let odom: Odometry = serde_json::from_slice(payload)?;
    Ok(odom.to_pose())
}

/// Encode the body twist for a wheel command as a JSON payload
pub fn encode_twist(cmd: &WheelCommand, wheel_distance: f64) -> Result<String, TransportError> {
    Ok(serde_json::to_string(&Twist::from_wheels(cmd, wheel_distance))?)
}

/// Open zenoh session plus the runtime used to drive it
pub struct ZenohBridge {
    session: Session,
    runtime: Arc<Runtime>,
}

impl ZenohBridge {
    pub fn open() -> Result<Self, TransportError> {
        let runtime = Arc::new(Runtime::new()?);

        info!("Opening Zenoh session...");
        let session = runtime
            .block_on(async { zenoh::open(zenoh::Config::default()).await })
            .map_err(zenoh_err)?;

        Ok(Self { session, runtime })
    }

    /// Subscribe to odometry now so samples buffer before the first read
    pub fn pose_source(&self, topic: &str) -> Result<BusPoseSource, TransportError> {
        let subscriber = self
            .runtime
            .block_on(async { self.session.declare_subscriber(topic.to_string()).await })
            .map_err(zenoh_err)?;
        info!("Subscribed to: {}", topic);

        Ok(BusPoseSource {
            subscriber,
            topic: topic.to_string(),
            timeout: POSE_TIMEOUT,
            runtime: Arc::clone(&self.runtime),
        })
    }

    pub fn motion_sink(&self, topic: &str, wheel_distance: f64) -> BusMotionSink {
        info!("Publishing to: {}", topic);
        BusMotionSink {
            session: self.session.clone(),
            topic: topic.to_string(),
            wheel_distance,
            runtime: Arc::clone(&self.runtime),
        }
    }
}

/// Latest odometry from a zenoh key expression
pub struct BusPoseSource {
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
    topic: String,
    timeout: Duration,
    runtime: Arc<Runtime>,
}

impl BusPoseSource {
    /// How long to wait when nothing is buffered
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PoseSource for BusPoseSource {
    fn sample(&mut self) -> Result<Pose, NavError> {
        // Drain everything buffered, keep the newest
        let mut latest = None;
        while let Ok(Some(sample)) = self.subscriber.try_recv() {
            latest = Some(sample);
        }

        let sample = match latest {
            Some(sample) => sample,
            None => {
                debug!("No buffered odometry, waiting up to {:?}", self.timeout);
                let received = self.runtime.block_on(async {
                    tokio::time::timeout(self.timeout, self.subscriber.recv_async()).await
                });
                match received {
                    Ok(Ok(sample)) => sample,
                    Ok(Err(e)) => return Err(NavError::Telemetry(zenoh_err(e))),
                    Err(_) => {
                        return Err(NavError::NoPoseData(format!(
                            "no odometry on {} within {:?}",
                            self.topic, self.timeout
                        )));
                    }
                }
            }
        };

        let payload = sample.payload().to_bytes();
        decode_odometry(&payload).map_err(NavError::Telemetry)
    }
}

/// Twist commands as JSON puts on a zenoh key expression
pub struct BusMotionSink {
    session: Session,
    topic: String,
    wheel_distance: f64,
    runtime: Arc<Runtime>,
}

impl MotionSink for BusMotionSink {
    fn command(&mut self, cmd: WheelCommand) -> Result<(), TransportError> {
        let payload = encode_twist(&cmd, self.wheel_distance)?;
        self.runtime
            .block_on(async { self.session.put(self.topic.as_str(), payload).await })
            .map_err(zenoh_err)
    }
}
