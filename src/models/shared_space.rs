//! Shared space model
//!
//! A rentable slot listed by a user. Listing only; shared spaces are not
//! bookable through the booking engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSpace {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub location: Location,
    pub rate_per_hour: f64,
    pub available: bool,
    pub slot_type: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for listing a new shared space
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSharedSpaceInput {
    pub name: String,
    pub location: Location,
    pub rate_per_hour: f64,
    pub slot_type: String,
}
