use std::io;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use go2pos::cli::{self, Args, Backend};
use go2pos::sim::SimulatedBase;
use go2pos::transport::{IgnCmdVel, IgnOdometry, ZenohBridge};
use go2pos::{NavError, NavigationController, NavigationReport, RobotConfig, SystemClock};

fn main() {
    // Setup logging (set RUST_LOG=debug for phase transitions)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Navigation error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(args: &Args) -> Result<(), NavError> {
    let config = RobotConfig::new(args.wheel_distance)?;
    let request = cli::resolve_request(args, &mut io::stdin().lock(), &mut io::stdout())?;
    let mut controller = NavigationController::new(config);

    info!(
        "Target ({:.2}, {:.2}) at up to {:.2} m/s via {:?}",
        request.target_x, request.target_y, request.max_wheel_velocity, args.backend
    );

    let report = match args.backend {
        Backend::Ign => {
            let mut source = IgnOdometry::new(args.odom_topic());
            let mut sink = IgnCmdVel::new(args.cmd_topic(), config.wheel_distance);
            controller.navigate(&request, &mut source, &mut sink, &SystemClock::new())?
        }
        Backend::Bus => {
            let bridge = ZenohBridge::open().map_err(NavError::Telemetry)?;
            let mut source = bridge
                .pose_source(&args.odom_topic())
                .map_err(NavError::Telemetry)?;
            let mut sink = bridge.motion_sink(&args.cmd_topic(), config.wheel_distance);
            controller.navigate(&request, &mut source, &mut sink, &SystemClock::new())?
        }
        Backend::Sim => {
            let sim = SimulatedBase::new(config.wheel_distance);
            let (mut source, mut sink) = (sim.clone(), sim.clone());
            controller.navigate(&request, &mut source, &mut sink, &sim)?
        }
    };

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &NavigationReport) {
    println!("Start: {}", report.start_pose);
    println!(
        "Rotated {:.2} deg in {:.2} s",
        report.rotation.rel_angle.to_degrees(),
        report.rotation_elapsed.as_secs_f64()
    );
    println!(
        "Drove {:.2} m in {:.2} s",
        report.translation.distance,
        report.translation_elapsed.as_secs_f64()
    );
    println!("Final: {}", report.final_pose);
}
