//! Spot repository
//!
//! Database operations for parking spots.
//!
//! This module provides:
//! - `SpotRepository` trait defining the interface for spot data access
//! - `SqlxSpotRepository` implementing the trait for SQLite
//!
//! Reservation goes through `try_reserve`, a single conditional update. Two
//! concurrent bookings of the same spot cannot both observe `available`.

use crate::db::DynDatabasePool;
use crate::models::{Location, ParkingSpot, SpotStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Optional filters for listing spots
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpotFilter {
    pub status: Option<SpotStatus>,
    pub ev_charging: Option<bool>,
}

/// Spot repository trait
#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// List spots matching the filter in insertion order, at most `limit`
    async fn list(&self, filter: SpotFilter, limit: i64) -> Result<Vec<ParkingSpot>>;

    /// Get spot by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<ParkingSpot>>;

    /// Move an `available` spot to `reserved`.
    ///
    /// Returns false when the spot is missing or no longer available.
    async fn try_reserve(&self, id: &str) -> Result<bool>;

    /// Set the status unconditionally. Returns false if the spot is missing.
    async fn set_status(&self, id: &str, status: SpotStatus) -> Result<bool>;

    /// Create a spot
    async fn create(&self, spot: &ParkingSpot) -> Result<ParkingSpot>;

    /// Insert many spots in one transaction
    async fn create_many(&self, spots: &[ParkingSpot]) -> Result<usize>;

    /// Remove every spot. Returns the number deleted.
    async fn delete_all(&self) -> Result<u64>;
}

/// SQLx-based spot repository implementation
pub struct SqlxSpotRepository {
    pool: DynDatabasePool,
}

impl SqlxSpotRepository {
    /// Create a new SQLx spot repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SpotRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SpotRepository for SqlxSpotRepository {
    async fn list(&self, filter: SpotFilter, limit: i64) -> Result<Vec<ParkingSpot>> {
        list_spots(self.pool.sqlite(), filter, limit).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ParkingSpot>> {
        get_spot_by_id(self.pool.sqlite(), id).await
    }

    async fn try_reserve(&self, id: &str) -> Result<bool> {
        reserve_spot(self.pool.sqlite(), id).await
    }

    async fn set_status(&self, id: &str, status: SpotStatus) -> Result<bool> {
        set_spot_status(self.pool.sqlite(), id, status).await
    }

    async fn create(&self, spot: &ParkingSpot) -> Result<ParkingSpot> {
        insert_spot(self.pool.sqlite(), spot).await?;
        Ok(spot.clone())
    }

    async fn create_many(&self, spots: &[ParkingSpot]) -> Result<usize> {
        create_spots(self.pool.sqlite(), spots).await
    }

    async fn delete_all(&self) -> Result<u64> {
        delete_all_spots(self.pool.sqlite()).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

const SPOT_COLUMNS: &str = "id, lot_id, slot_number, status, ev_charging, lat, lng, rate_per_hour";

async fn list_spots(pool: &SqlitePool, filter: SpotFilter, limit: i64) -> Result<Vec<ParkingSpot>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM spots
        WHERE (? IS NULL OR status = ?)
          AND (? IS NULL OR ev_charging = ?)
        ORDER BY rowid
        LIMIT ?
        "#,
        SPOT_COLUMNS
    );
    let status = filter.status.map(|s| s.as_str());

    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(filter.ev_charging)
        .bind(filter.ev_charging)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list spots")?;

    rows.iter().map(row_to_spot).collect()
}

async fn get_spot_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ParkingSpot>> {
    let sql = format!("SELECT {} FROM spots WHERE id = ?", SPOT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get spot by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_spot(&row)?)),
        None => Ok(None),
    }
}

async fn reserve_spot(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE spots SET status = ? WHERE id = ? AND status = ?")
        .bind(SpotStatus::Reserved.as_str())
        .bind(id)
        .bind(SpotStatus::Available.as_str())
        .execute(pool)
        .await
        .context("Failed to reserve spot")?;

    Ok(result.rows_affected() == 1)
}

async fn set_spot_status(pool: &SqlitePool, id: &str, status: SpotStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE spots SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update spot status")?;

    Ok(result.rows_affected() > 0)
}

async fn insert_spot<'e, E>(executor: E, spot: &ParkingSpot) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO spots (id, lot_id, slot_number, status, ev_charging, lat, lng, rate_per_hour)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&spot.id)
    .bind(&spot.lot_id)
    .bind(&spot.slot_number)
    .bind(spot.status.as_str())
    .bind(spot.ev_charging)
    .bind(spot.location.lat)
    .bind(spot.location.lng)
    .bind(spot.rate_per_hour)
    .execute(executor)
    .await
    .context("Failed to create spot")?;

    Ok(())
}

async fn create_spots(pool: &SqlitePool, spots: &[ParkingSpot]) -> Result<usize> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for spot in spots {
        insert_spot(&mut *tx, spot).await?;
    }
    tx.commit().await.context("Failed to commit spots")?;
    Ok(spots.len())
}

async fn delete_all_spots(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM spots")
        .execute(pool)
        .await
        .context("Failed to delete spots")?;

    Ok(result.rows_affected())
}

fn row_to_spot(row: &sqlx::sqlite::SqliteRow) -> Result<ParkingSpot> {
    let status: String = row.get("status");
    Ok(ParkingSpot {
        id: row.get("id"),
        lot_id: row.get("lot_id"),
        slot_number: row.get("slot_number"),
        status: status.parse()?,
        ev_charging: row.get("ev_charging"),
        location: Location::new(row.get("lat"), row.get("lng")),
        rate_per_hour: row.get("rate_per_hour"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxSpotRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSpotRepository::new(pool)
    }

    fn test_spot(id: &str, status: SpotStatus, ev: bool) -> ParkingSpot {
        ParkingSpot {
            id: id.to_string(),
            lot_id: "lot_001".to_string(),
            slot_number: id.to_uppercase(),
            status,
            ev_charging: ev,
            location: Location::new(28.6139, 77.2090),
            rate_per_hour: 40.0,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_spot() {
        let repo = setup_test_repo().await;
        repo.create(&test_spot("s1", SpotStatus::Available, true))
            .await
            .expect("create");

        let found = repo.get_by_id("s1").await.expect("get").expect("exists");
        assert_eq!(found, test_spot("s1", SpotStatus::Available, true));
        assert!(repo.get_by_id("s2").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_list_with_filters_keeps_insertion_order() {
        let repo = setup_test_repo().await;
        repo.create_many(&[
            test_spot("s3", SpotStatus::Available, false),
            test_spot("s1", SpotStatus::Occupied, true),
            test_spot("s2", SpotStatus::Available, true),
        ])
        .await
        .expect("create many");

        let all = repo.list(SpotFilter::default(), 1000).await.expect("list");
        let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s3", "s1", "s2"]);

        let available = repo
            .list(
                SpotFilter {
                    status: Some(SpotStatus::Available),
                    ev_charging: None,
                },
                1000,
            )
            .await
            .expect("list");
        assert_eq!(available.len(), 2);

        let ev_available = repo
            .list(
                SpotFilter {
                    status: Some(SpotStatus::Available),
                    ev_charging: Some(true),
                },
                1000,
            )
            .await
            .expect("list");
        assert_eq!(ev_available.len(), 1);
        assert_eq!(ev_available[0].id, "s2");

        let capped = repo.list(SpotFilter::default(), 2).await.expect("list");
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_try_reserve_only_once() {
        let repo = setup_test_repo().await;
        repo.create(&test_spot("s1", SpotStatus::Available, false))
            .await
            .expect("create");

        assert!(repo.try_reserve("s1").await.expect("reserve"));
        assert!(!repo.try_reserve("s1").await.expect("reserve again"));
        assert!(!repo.try_reserve("missing").await.expect("reserve missing"));

        let spot = repo.get_by_id("s1").await.expect("get").expect("exists");
        assert_eq!(spot.status, SpotStatus::Reserved);
    }

    #[tokio::test]
    async fn test_try_reserve_rejects_unavailable() {
        let repo = setup_test_repo().await;
        repo.create(&test_spot("s1", SpotStatus::SoonAvailable, false))
            .await
            .expect("create");

        assert!(!repo.try_reserve("s1").await.expect("reserve"));
        let spot = repo.get_by_id("s1").await.expect("get").expect("exists");
        assert_eq!(spot.status, SpotStatus::SoonAvailable);
    }

    #[tokio::test]
    async fn test_set_status_and_delete_all() {
        let repo = setup_test_repo().await;
        repo.create(&test_spot("s1", SpotStatus::Available, false))
            .await
            .expect("create");

        assert!(repo.set_status("s1", SpotStatus::Occupied).await.expect("set"));
        assert!(!repo.set_status("nope", SpotStatus::Occupied).await.expect("set"));
        let spot = repo.get_by_id("s1").await.expect("get").expect("exists");
        assert_eq!(spot.status, SpotStatus::Occupied);

        assert_eq!(repo.delete_all().await.expect("delete"), 1);
        assert!(repo.list(SpotFilter::default(), 1000).await.expect("list").is_empty());
    }
}
