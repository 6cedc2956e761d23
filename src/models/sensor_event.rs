//! Sensor event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SpotStatus;

/// A status change reported for a spot by the (simulated) sensor network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub id: String,
    pub spot_id: String,
    pub status: SpotStatus,
    pub timestamp: DateTime<Utc>,
}
