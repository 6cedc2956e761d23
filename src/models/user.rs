//! User model
//!
//! Users are provisioned from the identity provider on their first successful
//! session exchange. Only the display name can change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier (provider-assigned)
    pub id: String,
    /// Email address (unique, used to match returning users)
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    pub picture: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user stamped with the current time.
    pub fn new(id: String, email: String, name: String, picture: Option<String>) -> Self {
        Self {
            id,
            email,
            name,
            picture,
            created_at: Utc::now(),
        }
    }
}

/// Input for a profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub name: Option<String>,
}
