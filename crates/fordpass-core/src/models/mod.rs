//! Typed models for the FordPass API payloads.

pub mod command;
pub mod status;

pub use command::{CommandResponse, CommandStatus};
pub use status::{BatteryStatus, FuelStatus, GpsPosition, Reading, VehicleStatus};
