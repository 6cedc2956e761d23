//! Session repository
//!
//! Database operations for user sessions.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a session. Re-issuing an existing token replaces its owner and
    /// expiry.
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by token
    async fn get_by_token(&self, token: &str) -> Result<Option<Session>>;

    /// Delete a session. Returns false if the token was unknown.
    async fn delete(&self, token: &str) -> Result<bool>;

    /// Delete sessions whose expiry is at or before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        create_session(self.pool.sqlite(), session).await
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Session>> {
        get_session_by_token(self.pool.sqlite(), token).await
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        delete_session(self.pool.sqlite(), token).await
    }


    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        delete_expired_sessions(self.pool.sqlite(), now).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO user_sessions (session_token, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(session_token) DO UPDATE SET
            user_id = excluded.user_id,
            expires_at = excluded.expires_at,
            created_at = excluded.created_at
        "#,
    )
    .bind(&session.session_token)
    .bind(&session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT session_token, user_id, expires_at, created_at
        FROM user_sessions
        WHERE session_token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by token")?;

    match row {
        Some(row) => Ok(Some(row_to_session(&row)?)),
        None => Ok(None),
    }
}

async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE session_token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_expired_sessions(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected())
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    Ok(Session {
        session_token: row.get("session_token"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    })
}
