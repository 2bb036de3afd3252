// Concrete channels to a vehicle
//
// - ign: Ignition Gazebo through the `ign topic` command-line tool
// - bus: zenoh pub/sub with JSON payloads (talks to the sim_base runtime)

pub mod bus;
pub mod ign;

pub use bus::{BusMotionSink, BusPoseSource, ZenohBridge};
pub use ign::{IgnCmdVel, IgnOdometry};
