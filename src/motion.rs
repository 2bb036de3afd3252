// Timed motion primitive: issue a wheel command, hold it, always stop
//
// The hold is budgeted from the moment the command starts being issued, so the
// time spent in the transport counts against the requested duration.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{NavError, TransportError};
use crate::messages::{TimedCommand, WheelCommand};

/// Actuation channel accepting wheel velocity commands (fire-and-forget)
pub trait MotionSink {
    fn command(&mut self, cmd: WheelCommand) -> Result<(), TransportError>;
}

/// Monotonic time source with a blocking wait
///
/// Tests substitute a virtual clock so timed holds cost nothing.
pub trait Clock {
    /// Time since an arbitrary, fixed origin
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Execute one timed command and return the total wall-clock time it took
///
/// The stop command is always the last thing sent, even if issuing `timed.command`
/// failed. A failed stop wins over any earlier error because the vehicle may
/// still be moving.
pub fn execute<S, C>(
    timed: &TimedCommand,
    sink: &mut S,
    clock: &C,
    action: &str,
) -> Result<Duration, NavError>
where
    S: MotionSink + ?Sized,
    C: Clock + ?Sized,
{
    let cmd = timed.command;
    info!(
        "{}: v_l={:.2}, v_r={:.2}, duration={:.2}s",
        action,
        cmd.v_left,
        cmd.v_right,
        timed.duration.as_secs_f64()
    );

    let t0 = clock.now();
    let issued = sink.command(cmd);

    match &issued {
        Ok(()) => {
            // Compensate for time spent issuing the command
            let elapsed = clock.now().saturating_sub(t0);
            let remaining = timed.duration.saturating_sub(elapsed);
            debug!(
                "{}: issuance took {:?}, holding for {:?}",
                action, elapsed, remaining
            );
            clock.sleep(remaining);
        }
        Err(e) => warn!("{}: command failed ({}), stopping", action, e),
    }

    let stopped = sink.command(WheelCommand::STOP);
    let total = clock.now().saturating_sub(t0);
    info!("Total elapsed time: {:.2} s", total.as_secs_f64());

    match (issued, stopped) {
        (Err(e), Err(stop_err)) => {
            warn!("{}: command error superseded by stop failure: {}", action, e);
            Err(NavError::StopFailed(stop_err))
        }
        (Ok(()), Err(stop_err)) => Err(NavError::StopFailed(stop_err)),
        (Err(e), Ok(())) => Err(NavError::CommandIssuance(e)),
        (Ok(()), Ok(())) => Ok(total),
    }
}
