//! Booking repository
//!
//! This module provides:
//! - `BookingRepository` trait defining the interface for booking data access
//! - `SqlxBookingRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::{Booking, BookingStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Booking repository trait
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Create a new booking
    async fn create(&self, booking: &Booking) -> Result<Booking>;

    /// Get booking by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Booking>>;

    /// All bookings of a user, oldest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>>;

    /// The user's most recent bookings, newest first
    async fn list_recent_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Booking>>;

    /// Update the status. Returns false if the booking is missing.
    async fn set_status(&self, id: &str, status: BookingStatus) -> Result<bool>;
}

/// SQLx-based booking repository implementation
pub struct SqlxBookingRepository {
    pool: DynDatabasePool,
}

impl SqlxBookingRepository {
    /// Create a new SQLx booking repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BookingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BookingRepository for SqlxBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<Booking> {
        create_booking(self.pool.sqlite(), booking).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Booking>> {
        get_booking_by_id(self.pool.sqlite(), id).await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        list_bookings_by_user(self.pool.sqlite(), user_id).await
    }

    async fn list_recent_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Booking>> {
        list_recent_bookings_by_user(self.pool.sqlite(), user_id, limit).await
    }

    async fn set_status(&self, id: &str, status: BookingStatus) -> Result<bool> {
        set_booking_status(self.pool.sqlite(), id, status).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_booking(pool: &SqlitePool, booking: &Booking) -> Result<Booking> {
    sqlx::query(
        r#"
        INSERT INTO bookings (id, user_id, spot_id, start_time, end_time, duration_hours,
                              amount, status, ev_charging, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.user_id)
    .bind(&booking.spot_id)
    .bind(booking.start_time)
    .bind(booking.end_time)
    .bind(booking.duration_hours)
    .bind(booking.amount)
    .bind(booking.status.as_str())
    .bind(booking.ev_charging)
    .bind(booking.created_at)
    .execute(pool)
    .await
    .context("Failed to create booking")?;

    Ok(booking.clone())
}

async fn get_booking_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Booking>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, spot_id, start_time, end_time, duration_hours,
               amount, status, ev_charging, created_at
        FROM bookings
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get booking by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_booking(&row)?)),
        None => Ok(None),
    }
}

async fn list_bookings_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Booking>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, spot_id, start_time, end_time, duration_hours,
               amount, status, ev_charging, created_at
        FROM bookings
        WHERE user_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list bookings")?;

    rows.iter().map(row_to_booking).collect()
}

async fn list_recent_bookings_by_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Booking>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, spot_id, start_time, end_time, duration_hours,
               amount, status, ev_charging, created_at
        FROM bookings
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list recent bookings")?;

    rows.iter().map(row_to_booking).collect()
}

async fn set_booking_status(pool: &SqlitePool, id: &str, status: BookingStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE bookings SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update booking status")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_booking(row: &sqlx::sqlite::SqliteRow) -> Result<Booking> {
    let status: String = row.get("status");
    Ok(Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        spot_id: row.get("spot_id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        duration_hours: row.get("duration_hours"),
        amount: row.get("amount"),
        status: status.parse()?,
        ev_charging: row.get("ev_charging"),
        created_at: row.get("created_at"),
    })
}
