//! Parking spot model
//!
//! Spots are shared mutable inventory: the booking engine reserves them and
//! the sensor simulation moves them between the physical states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Location;

/// Occupancy status of a spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    Available,
    Occupied,
    SoonAvailable,
    Reserved,
}

impl SpotStatus {
    /// States a physical sensor can report
    pub const SENSOR_STATES: [SpotStatus; 3] = [
        SpotStatus::Available,
        SpotStatus::Occupied,
        SpotStatus::SoonAvailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Available => "available",
            SpotStatus::Occupied => "occupied",
            SpotStatus::SoonAvailable => "soon_available",
            SpotStatus::Reserved => "reserved",
        }
    }
}

impl Default for SpotStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpotStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(SpotStatus::Available),
            "occupied" => Ok(SpotStatus::Occupied),
            "soon_available" => Ok(SpotStatus::SoonAvailable),
            "reserved" => Ok(SpotStatus::Reserved),
            _ => Err(anyhow::anyhow!("Invalid spot status: {}", s)),
        }
    }
}

/// A single physical parking space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: String,
    pub lot_id: String,
    pub slot_number: String,
    pub status: SpotStatus,
    pub ev_charging: bool,
    pub location: Location,
    pub rate_per_hour: f64,
}
