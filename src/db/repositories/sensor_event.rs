//! Sensor event repository
//!
//! Append-only log of spot status changes reported by the sensor network.

use crate::db::DynDatabasePool;
use crate::models::SensorEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait SensorEventRepository: Send + Sync {
    /// Append an event
    async fn create(&self, event: &SensorEvent) -> Result<()>;

    /// Events for a spot, oldest first
    async fn list_by_spot(&self, spot_id: &str) -> Result<Vec<SensorEvent>>;
}

/// SQLx-based sensor event repository implementation
pub struct SqlxSensorEventRepository {
    pool: DynDatabasePool,
}

impl SqlxSensorEventRepository {
    /// Create a new SQLx sensor event repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SensorEventRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SensorEventRepository for SqlxSensorEventRepository {
    async fn create(&self, event: &SensorEvent) -> Result<()> {
        create_event(self.pool.sqlite(), event).await
    }

    async fn list_by_spot(&self, spot_id: &str) -> Result<Vec<SensorEvent>> {
        list_events_by_spot(self.pool.sqlite(), spot_id).await
    }
}

async fn create_event(pool: &SqlitePool, event: &SensorEvent) -> Result<()> {
    sqlx::query("INSERT INTO sensor_events (id, spot_id, status, timestamp) VALUES (?, ?, ?, ?)")
        .bind(&event.id)
        .bind(&event.spot_id)
        .bind(event.status.as_str())
        .bind(event.timestamp)
        .execute(pool)
        .await
        .context("Failed to record sensor event")?;

    Ok(())
}

async fn list_events_by_spot(pool: &SqlitePool, spot_id: &str) -> Result<Vec<SensorEvent>> {
    let rows = sqlx::query(
        "SELECT id, spot_id, status, timestamp FROM sensor_events WHERE spot_id = ? ORDER BY rowid",
    )
    .bind(spot_id)
    .fetch_all(pool)
    .await
    .context("Failed to list sensor events")?;

    rows.iter()
        .map(|row| {
            let status: String = row.get("status");
            Ok(SensorEvent {
                id: row.get("id"),
                spot_id: row.get("spot_id"),
                status: status.parse()?,
                timestamp: row.get("timestamp"),
            })
        })
        .collect()
}
