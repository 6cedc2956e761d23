//! Database migrations module
//!
//! Code-based migrations embedded directly in the binary. Each collection of
//! the document store (users, sessions, spots, bookings, transactions, rewards,
//! shared spaces, sensor events) is one table.
//!
//! # Usage
//!
//! ```ignore
//! use ecopark::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::DynDatabasePool;

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements
    pub up: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(64) PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                picture TEXT,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
    },
    // No foreign key on user_id: a session whose user vanished must still be
    // readable so the lookup can report it as invalid.
    Migration {
        version: 2,
        name: "create_user_sessions",
        up: r#"
            CREATE TABLE IF NOT EXISTS user_sessions (
                session_token VARCHAR(255) PRIMARY KEY,
                user_id VARCHAR(64) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_user_sessions_user_id ON user_sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_user_sessions_expires_at ON user_sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_spots",
        up: r#"
            CREATE TABLE IF NOT EXISTS spots (
                id VARCHAR(64) PRIMARY KEY,
                lot_id VARCHAR(64) NOT NULL,
                slot_number VARCHAR(32) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'available',
                ev_charging INTEGER NOT NULL DEFAULT 0,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                rate_per_hour REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_spots_status ON spots(status);
        "#,
    },
    Migration {
        version: 4,
        name: "create_bookings",
        up: r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id VARCHAR(64) PRIMARY KEY,
                user_id VARCHAR(64) NOT NULL,
                spot_id VARCHAR(64) NOT NULL,
                start_time TIMESTAMP NOT NULL,
                end_time TIMESTAMP NOT NULL,
                duration_hours REAL NOT NULL,
                amount REAL NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                ev_charging INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bookings_user_id ON bookings(user_id);
            CREATE INDEX IF NOT EXISTS idx_bookings_created_at ON bookings(created_at);
        "#,
    },
    Migration {
        version: 5,
        name: "create_transactions",
        up: r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id VARCHAR(64) PRIMARY KEY,
                user_id VARCHAR(64) NOT NULL,
                booking_id VARCHAR(64) NOT NULL,
                amount REAL NOT NULL,
                payment_method VARCHAR(32) NOT NULL,
                razorpay_order_id VARCHAR(64),
                razorpay_payment_id VARCHAR(64),
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_user_id ON transactions(user_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_booking_id ON transactions(booking_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_order_id ON transactions(razorpay_order_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_rewards",
        up: r#"
            CREATE TABLE IF NOT EXISTS rewards (
                user_id VARCHAR(64) PRIMARY KEY,
                points INTEGER NOT NULL DEFAULT 0,
                carbon_saved REAL NOT NULL DEFAULT 0,
                badges TEXT NOT NULL DEFAULT '[]',
                monthly_carbon TEXT NOT NULL DEFAULT '[]'
            );
            CREATE INDEX IF NOT EXISTS idx_rewards_points ON rewards(points);
        "#,
    },
    Migration {
        version: 7,
        name: "create_shared_spaces",
        up: r#"
            CREATE TABLE IF NOT EXISTS shared_spaces (
                id VARCHAR(64) PRIMARY KEY,
                owner_id VARCHAR(64) NOT NULL,
                name VARCHAR(255) NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                rate_per_hour REAL NOT NULL,
                available INTEGER NOT NULL DEFAULT 1,
                slot_type VARCHAR(32) NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_shared_spaces_available ON shared_spaces(available);
        "#,
    },
    Migration {
        version: 8,
        name: "create_sensor_events",
        up: r#"
            CREATE TABLE IF NOT EXISTS sensor_events (
                id VARCHAR(64) PRIMARY KEY,
                spot_id VARCHAR(64) NOT NULL,
                status VARCHAR(20) NOT NULL,
                timestamp TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sensor_events_spot_id ON sensor_events(spot_id);
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool.sqlite())
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.sqlite().begin().await?;

    for statement in split_sql_statements(migration.up) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with("--")
    })
}
