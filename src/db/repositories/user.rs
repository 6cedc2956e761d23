//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Change the display name. Returns false if the user does not exist.
    async fn update_name(&self, id: &str, name: &str) -> Result<bool>;

    /// Delete a user
    async fn delete(&self, id: &str) -> Result<()>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        create_user(self.pool.sqlite(), user).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        get_user_by(self.pool.sqlite(), "id", id).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        get_user_by(self.pool.sqlite(), "email", email).await
    }

    async fn update_name(&self, id: &str, name: &str) -> Result<bool> {
        update_user_name(self.pool.sqlite(), id, name).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        delete_user(self.pool.sqlite(), id).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user(pool: &SqlitePool, user: &User) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, picture, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.picture)
    .bind(user.created_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(user.clone())
}

/// `column` is always one of the fixed identifiers above, never user input.
async fn get_user_by(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<User>> {
    let sql = format!(
        "SELECT id, email, name, picture, created_at FROM users WHERE {} = ?",
        column
    );
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", column))?;

    match row {
        Some(row) => Ok(Some(row_to_user(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_name(pool: &SqlitePool, id: &str, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user name")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_user(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        picture: row.get("picture"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(id: &str, email: &str) -> User {
        User::new(
            id.to_string(),
            email.to_string(),
            "Test Driver".to_string(),
            Some("https://example.com/a.png".to_string()),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("u1", "driver@example.com");
        repo.create(&user).await.expect("Failed to create user");

        let found = repo
            .get_by_id("u1")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.email, "driver@example.com");
        assert_eq!(found.name, "Test Driver");
        assert_eq!(found.picture.as_deref(), Some("https://example.com/a.png"));
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;
        let found = repo.get_by_id("missing").await.expect("Failed to get user");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("u1", "findme@example.com"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_email("findme@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.id, "u1");

        let none = repo
            .get_by_email("nobody@example.com")
            .await
            .expect("Failed to get user");
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_update_name() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("u1", "a@example.com"))
            .await
            .expect("Failed to create user");

        assert!(repo.update_name("u1", "Renamed").await.expect("update"));
        assert!(!repo.update_name("ghost", "Nobody").await.expect("update"));

        let found = repo.get_by_id("u1").await.expect("get").expect("exists");
        assert_eq!(found.name, "Renamed");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("u1", "a@example.com"))
            .await
            .expect("Failed to create user");

        repo.delete("u1").await.expect("Failed to delete user");

        assert!(repo.get_by_id("u1").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("u1", "same@example.com"))
            .await
            .expect("Failed to create user");

        let result = repo.create(&create_test_user("u2", "same@example.com")).await;
        assert!(result.is_err());
    }
}
