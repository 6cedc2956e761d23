//! Reward model
//!
//! One ledger record per user. `points` and `carbon_saved` only grow; the
//! `level` column is informational and is recomputed from `points` on read.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reward tier derived from accumulated points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "Eco Starter")]
    EcoStarter,
    #[serde(rename = "Bronze Member")]
    BronzeMember,
    #[serde(rename = "Silver Saver")]
    SilverSaver,
    #[serde(rename = "Green Hero")]
    GreenHero,
}

impl Level {
    /// Step function over points: 50, 200 and 500 are the tier thresholds.
    pub fn from_points(points: i64) -> Self {
        if points >= 500 {
            Level::GreenHero
        } else if points >= 200 {
            Level::SilverSaver
        } else if points >= 50 {
            Level::BronzeMember
        } else {
            Level::EcoStarter
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::EcoStarter => "Eco Starter",
            Level::BronzeMember => "Bronze Member",
            Level::SilverSaver => "Silver Saver",
            Level::GreenHero => "Green Hero",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::EcoStarter
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carbon saved during one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCarbon {
    /// `YYYY-MM`
    pub month: String,
    pub carbon: f64,
}

/// Per-user gamification ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub user_id: String,
    pub points: i64,
    pub level: Level,
    pub carbon_saved: f64,
    pub badges: Vec<String>,
    pub monthly_carbon: Vec<MonthlyCarbon>,
}

impl Reward {
    /// Zero-state record for a newly seen user
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            points: 0,
            level: Level::EcoStarter,
            carbon_saved: 0.0,
            badges: Vec::new(),
            monthly_carbon: Vec::new(),
        }
    }
}

/// One row of the public leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub picture: Option<String>,
    pub points: i64,
    pub level: Level,
    pub carbon_saved: f64,
}
