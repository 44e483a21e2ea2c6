//! The vehicle status payload returned by the v4 status endpoint.
//!
//! The vendor omits readings the vehicle doesn't report (no EV fields on a
//! gas vehicle, no fuel on a BEV), so every leaf is optional. Unknown fields
//! are ignored.

use serde::{Deserialize, Serialize};

/// A single telemetry reading: the value plus the vendor's freshness
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading<T> {
    pub value: Option<T>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelStatus {
    #[serde(rename = "fuelLevel")]
    pub fuel_level: Option<f64>,
    #[serde(rename = "distanceToEmpty")]
    pub distance_to_empty: Option<f64>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryStatus {
    #[serde(rename = "batteryHealth")]
    pub battery_health: Option<Reading<String>>,
    #[serde(rename = "batteryStatusActual")]
    pub battery_status_actual: Option<Reading<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsPosition {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "gpsState")]
    pub gps_state: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

/// Parsed `vehiclestatus` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub vin: Option<String>,
    #[serde(rename = "lockStatus")]
    pub lock_status: Option<Reading<String>>,
    pub alarm: Option<Reading<String>>,
    #[serde(rename = "ignitionStatus")]
    pub ignition_status: Option<Reading<String>>,
    pub odometer: Option<Reading<f64>>,
    pub fuel: Option<FuelStatus>,
    pub battery: Option<BatteryStatus>,
    /// 12V battery aside, EVs report their traction battery fill here
    #[serde(rename = "batteryFillLevel")]
    pub battery_fill_level: Option<Reading<f64>>,
    #[serde(rename = "elVehDTE")]
    pub ev_distance_to_empty: Option<Reading<f64>>,
    pub gps: Option<GpsPosition>,
    #[serde(rename = "remoteStartStatus")]
    pub remote_start_status: Option<Reading<i64>>,
    #[serde(rename = "lastRefresh")]
    pub last_refresh: Option<String>,
    #[serde(rename = "lastModifiedDate")]
    pub last_modified_date: Option<String>,
}
