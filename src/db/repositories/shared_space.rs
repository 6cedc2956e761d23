//! Shared space repository

use crate::db::DynDatabasePool;
use crate::models::{Location, SharedSpace};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Shared space repository trait
#[async_trait]
pub trait SharedSpaceRepository: Send + Sync {
    /// Create a new listing
    async fn create(&self, space: &SharedSpace) -> Result<SharedSpace>;

    /// Listings currently marked available, at most `limit`
    async fn list_available(&self, limit: i64) -> Result<Vec<SharedSpace>>;
}

/// SQLx-based shared space repository implementation
pub struct SqlxSharedSpaceRepository {
    pool: DynDatabasePool,
}

impl SqlxSharedSpaceRepository {
    /// Create a new SQLx shared space repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SharedSpaceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SharedSpaceRepository for SqlxSharedSpaceRepository {
    async fn create(&self, space: &SharedSpace) -> Result<SharedSpace> {
        create_shared_space(self.pool.sqlite(), space).await
    }

    async fn list_available(&self, limit: i64) -> Result<Vec<SharedSpace>> {
        list_available_spaces(self.pool.sqlite(), limit).await
    }
}

async fn create_shared_space(pool: &SqlitePool, space: &SharedSpace) -> Result<SharedSpace> {
    sqlx::query(
        r#"
        INSERT INTO shared_spaces (id, owner_id, name, lat, lng, rate_per_hour,
                                   available, slot_type, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&space.id)
    .bind(&space.owner_id)
    .bind(&space.name)
    .bind(space.location.lat)
    .bind(space.location.lng)
    .bind(space.rate_per_hour)
    .bind(space.available)
    .bind(&space.slot_type)
    .bind(space.created_at)
    .execute(pool)
    .await
    .context("Failed to create shared space")?;

    Ok(space.clone())
}

async fn list_available_spaces(pool: &SqlitePool, limit: i64) -> Result<Vec<SharedSpace>> {
    let rows = sqlx::query(
        r#"
        SELECT id, owner_id, name, lat, lng, rate_per_hour, available, slot_type, created_at
        FROM shared_spaces
        WHERE available = 1
        ORDER BY rowid
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list shared spaces")?;

    rows.iter().map(row_to_shared_space).collect()
}

fn row_to_shared_space(row: &sqlx::sqlite::SqliteRow) -> Result<SharedSpace> {
    Ok(SharedSpace {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        location: Location::new(row.get("lat"), row.get("lng")),
        rate_per_hour: row.get("rate_per_hour"),
        available: row.get("available"),
        slot_type: row.get("slot_type"),
        created_at: row.get("created_at"),
    })
}
