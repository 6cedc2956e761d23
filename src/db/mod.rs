//! Database layer
//!
//! The persistence adapter for EcoPark. The document store is modelled as one
//! SQLite table per collection, reached through a shared `DynDatabasePool`
//! that is opened at start-up, injected into every repository and closed at
//! shutdown.
//!
//! # Usage
//!
//! ```ignore
//! use ecopark::config::DatabaseConfig;
//! use ecopark::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
