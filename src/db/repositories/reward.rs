//! Reward repository
//!
//! One row per user. Points and carbon are only ever changed through
//! `increment`, a single `UPDATE ... SET x = x + ?` so concurrent credits
//! cannot lose updates. Badges and monthly carbon are stored as JSON text.

use crate::db::DynDatabasePool;
use crate::models::{Level, MonthlyCarbon, Reward};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Reward repository trait
#[async_trait]
pub trait RewardRepository: Send + Sync {
    /// Get the ledger record of a user
    async fn get(&self, user_id: &str) -> Result<Option<Reward>>;

    /// Insert a record; an existing record for the user is left untouched
    async fn create(&self, reward: &Reward) -> Result<()>;

    /// Atomically add points and carbon. Returns false if no record exists.
    async fn increment(&self, user_id: &str, points: i64, carbon: f64) -> Result<bool>;

    /// Records with the highest points, at most `limit`
    async fn top_by_points(&self, limit: i64) -> Result<Vec<Reward>>;
}

/// SQLx-based reward repository implementation
pub struct SqlxRewardRepository {
    pool: DynDatabasePool,
}

impl SqlxRewardRepository {
    /// Create a new SQLx reward repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RewardRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RewardRepository for SqlxRewardRepository {
    async fn get(&self, user_id: &str) -> Result<Option<Reward>> {
        get_reward(self.pool.sqlite(), user_id).await
    }

    async fn create(&self, reward: &Reward) -> Result<()> {
        create_reward(self.pool.sqlite(), reward).await
    }

    async fn increment(&self, user_id: &str, points: i64, carbon: f64) -> Result<bool> {
        increment_reward(self.pool.sqlite(), user_id, points, carbon).await
    }

    async fn top_by_points(&self, limit: i64) -> Result<Vec<Reward>> {
        top_rewards(self.pool.sqlite(), limit).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_reward(pool: &SqlitePool, user_id: &str) -> Result<Option<Reward>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, points, carbon_saved, badges, monthly_carbon
        FROM rewards
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get reward")?;

    match row {
        Some(row) => Ok(Some(row_to_reward(&row)?)),
        None => Ok(None),
    }
}

async fn create_reward(pool: &SqlitePool, reward: &Reward) -> Result<()> {
    let badges = serde_json::to_string(&reward.badges).context("Failed to encode badges")?;
    let monthly = serde_json::to_string(&reward.monthly_carbon)
        .context("Failed to encode monthly carbon")?;

    sqlx::query(
        r#"
        INSERT INTO rewards (user_id, points, carbon_saved, badges, monthly_carbon)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(&reward.user_id)
    .bind(reward.points)
    .bind(reward.carbon_saved)
    .bind(badges)
    .bind(monthly)
    .execute(pool)
    .await
    .context("Failed to create reward")?;

    Ok(())
}

async fn increment_reward(pool: &SqlitePool, user_id: &str, points: i64, carbon: f64) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE rewards
        SET points = points + ?, carbon_saved = carbon_saved + ?
        WHERE user_id = ?
        "#,
    )
    .bind(points)
    .bind(carbon)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to credit reward")?;

    Ok(result.rows_affected() > 0)
}

async fn top_rewards(pool: &SqlitePool, limit: i64) -> Result<Vec<Reward>> {
    let rows = sqlx::query(
        r#"
        SELECT user_id, points, carbon_saved, badges, monthly_carbon
        FROM rewards
        ORDER BY points DESC, rowid
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list rewards")?;

    rows.iter().map(row_to_reward).collect()
}

fn row_to_reward(row: &sqlx::sqlite::SqliteRow) -> Result<Reward> {
    let badges: String = row.get("badges");
    let monthly: String = row.get("monthly_carbon");
    let points: i64 = row.get("points");

    Ok(Reward {
        user_id: row.get("user_id"),
        points,
        level: Level::from_points(points),
        carbon_saved: row.get("carbon_saved"),
        badges: serde_json::from_str::<Vec<String>>(&badges).context("Invalid badges JSON")?,
        monthly_carbon: serde_json::from_str::<Vec<MonthlyCarbon>>(&monthly)
            .context("Invalid monthly carbon JSON")?,
    })
}
