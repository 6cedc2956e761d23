//! Reward service
//!
//! Per-user points/carbon ledger and the public leaderboard. The level is
//! never trusted from storage; it is recomputed from points on every read.

use crate::db::repositories::{RewardRepository, UserRepository};
use crate::models::{LeaderboardEntry, Level, Reward};
use anyhow::Context;
use std::sync::Arc;

/// Number of entries on the leaderboard
pub const LEADERBOARD_SIZE: i64 = 10;

/// Error types for reward service operations
#[derive(Debug, thiserror::Error)]
pub enum RewardServiceError {
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Compute the reward tier for a points total
pub fn compute_level(points: i64) -> Level {
    Level::from_points(points)
}

pub struct RewardService {
    reward_repo: Arc<dyn RewardRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl RewardService {
    pub fn new(reward_repo: Arc<dyn RewardRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            reward_repo,
            user_repo,
        }
    }

    /// Get the user's ledger record, creating a zero-state one if missing
    pub async fn get_or_create(&self, user_id: &str) -> Result<Reward, RewardServiceError> {
        if let Some(reward) = self
            .reward_repo
            .get(user_id)
            .await
            .context("Failed to get reward")?
        {
            return Ok(reward);
        }

        self.reward_repo
            .create(&Reward::new(user_id))
            .await
            .context("Failed to create reward")?;

        // Re-read: a concurrent request may have created and credited it.
        let reward = self
            .reward_repo
            .get(user_id)
            .await
            .context("Failed to get reward")?
            .unwrap_or_else(|| Reward::new(user_id));
        Ok(reward)
    }

    /// Credit points and carbon atomically, creating the record if needed
    pub async fn credit(
        &self,
        user_id: &str,
        points: i64,
        carbon: f64,
    ) -> Result<(), RewardServiceError> {
        let credited = self
            .reward_repo
            .increment(user_id, points, carbon)
            .await
            .context("Failed to credit reward")?;

        if !credited {
            self.reward_repo
                .create(&Reward::new(user_id))
                .await
                .context("Failed to create reward")?;
            self.reward_repo
                .increment(user_id, points, carbon)
                .await
                .context("Failed to credit reward")?;
        }

        tracing::info!(
            "Credited {} points and {:.2} kg carbon to user {}",
            points,
            carbon,
            user_id
        );
        Ok(())
    }

    /// The user's rewards with the level recomputed
    pub async fn my_rewards(&self, user_id: &str) -> Result<Reward, RewardServiceError> {
        let mut reward = self.get_or_create(user_id).await?;
        reward.level = compute_level(reward.points);
        Ok(reward)
    }

    /// Top users by points. Records whose user no longer exists are skipped.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RewardServiceError> {
        let top = self
            .reward_repo
            .top_by_points(LEADERBOARD_SIZE)
            .await
            .context("Failed to load leaderboard")?;

        let mut entries = Vec::with_capacity(top.len());
        for reward in top {
            let user = self
                .user_repo
                .get_by_id(&reward.user_id)
                .await
                .context("Failed to get leaderboard user")?;
            if let Some(user) = user {
                entries.push(LeaderboardEntry {
                    name: user.name,
                    picture: user.picture,
                    points: reward.points,
                    level: compute_level(reward.points),
                    carbon_saved: reward.carbon_saved,
                });
            }
        }

        Ok(entries)
    }
}
