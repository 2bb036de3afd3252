// Error types for sensing, actuation and maneuver execution

/// Failure of the channel used to reach the vehicle (process, bus, codec)
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zenoh error: {0}")]
    Zenoh(String),

    #[error("`{program}` exited with {status}: {stderr}")]
    Process {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Why a maneuver was aborted
///
/// Each variant is a distinct failure class so a supervisor can decide whether
/// to retry the whole maneuver.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("No pose data: {0}")]
    NoPoseData(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Command issuance failed: {0}")]
    CommandIssuance(#[source] TransportError),

    #[error("Stop command failed, vehicle may still be moving: {0}")]
    StopFailed(#[source] TransportError),

    #[error("Telemetry failure: {0}")]
    Telemetry(#[source] TransportError),

    #[error("Hold duration out of range: {0}")]
    HoldTooLong(String),
}

impl NavError {
    /// Process exit code for this failure class
    pub fn exit_code(&self) -> i32 {
        match self {
            NavError::NoPoseData(_) => 2,
            NavError::InvalidRequest(_) => 3,
            NavError::CommandIssuance(_) => 4,
            NavError::StopFailed(_) => 5,
            NavError::Telemetry(_) => 6,
            NavError::HoldTooLong(_) => 7,
        }
    }
}
