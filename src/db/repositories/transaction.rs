//! Transaction repository
//!
//! Payment attempt records. Repeated order creation for the same booking
//! produces several rows; nothing here deduplicates them.

use crate::db::DynDatabasePool;
use crate::models::{Transaction, TransactionStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Transaction repository trait
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Record a new transaction
    async fn create(&self, transaction: &Transaction) -> Result<Transaction>;

    /// Mark the transaction for `order_id` completed with the gateway's
    /// payment id. Returns the number of rows updated.
    async fn complete_by_order_id(&self, order_id: &str, payment_id: &str) -> Result<u64>;

    /// Earliest transaction recorded for a booking
    async fn first_by_booking(&self, booking_id: &str) -> Result<Option<Transaction>>;

    /// The user's most recent transactions, newest first
    async fn list_recent_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Transaction>>;
}

/// SQLx-based transaction repository implementation
pub struct SqlxTransactionRepository {
    pool: DynDatabasePool,
}

impl SqlxTransactionRepository {
    /// Create a new SQLx transaction repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TransactionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TransactionRepository for SqlxTransactionRepository {
    async fn create(&self, transaction: &Transaction) -> Result<Transaction> {
        create_transaction(self.pool.sqlite(), transaction).await
    }

    async fn complete_by_order_id(&self, order_id: &str, payment_id: &str) -> Result<u64> {
        complete_transaction(self.pool.sqlite(), order_id, payment_id).await
    }

    async fn first_by_booking(&self, booking_id: &str) -> Result<Option<Transaction>> {
        first_transaction_by_booking(self.pool.sqlite(), booking_id).await
    }

    async fn list_recent_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Transaction>> {
        list_recent_transactions(self.pool.sqlite(), user_id, limit).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_transaction(pool: &SqlitePool, transaction: &Transaction) -> Result<Transaction> {
    sqlx::query(
        r#"
        INSERT INTO transactions (id, user_id, booking_id, amount, payment_method,
                                  razorpay_order_id, razorpay_payment_id, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.user_id)
    .bind(&transaction.booking_id)
    .bind(transaction.amount)
    .bind(&transaction.payment_method)
    .bind(&transaction.razorpay_order_id)
    .bind(&transaction.razorpay_payment_id)
    .bind(transaction.status.as_str())
    .bind(transaction.created_at)
    .execute(pool)
    .await
    .context("Failed to create transaction")?;

    Ok(transaction.clone())
}

async fn complete_transaction(pool: &SqlitePool, order_id: &str, payment_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET razorpay_payment_id = ?, status = ?
        WHERE razorpay_order_id = ?
        "#,
    )
    .bind(payment_id)
    .bind(TransactionStatus::Completed.as_str())
    .bind(order_id)
    .execute(pool)
    .await
    .context("Failed to complete transaction")?;

    Ok(result.rows_affected())
}

async fn first_transaction_by_booking(
    pool: &SqlitePool,
    booking_id: &str,
) -> Result<Option<Transaction>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, booking_id, amount, payment_method,
               razorpay_order_id, razorpay_payment_id, status, created_at
        FROM transactions
        WHERE booking_id = ?
        ORDER BY rowid
        LIMIT 1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get transaction by booking")?;

    match row {
        Some(row) => Ok(Some(row_to_transaction(&row)?)),
        None => Ok(None),
    }
}

async fn list_recent_transactions(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Transaction>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, booking_id, amount, payment_method,
               razorpay_order_id, razorpay_payment_id, status, created_at
        FROM transactions
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list transactions")?;

    rows.iter().map(row_to_transaction).collect()
}

fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
    let status: String = row.get("status");
    Ok(Transaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        booking_id: row.get("booking_id"),
        amount: row.get("amount"),
        payment_method: row.get("payment_method"),
        razorpay_order_id: row.get("razorpay_order_id"),
        razorpay_payment_id: row.get("razorpay_payment_id"),
        status: status.parse()?,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration, Utc};

    async fn setup_test_repo() -> SqlxTransactionRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxTransactionRepository::new(pool)
    }

    fn pending(id: &str, booking_id: &str, order_id: &str, offset_secs: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            user_id: "u1".to_string(),
            booking_id: booking_id.to_string(),
            amount: 130.0,
            payment_method: "razorpay".to_string(),
            razorpay_order_id: Some(order_id.to_string()),
            razorpay_payment_id: None,
            status: TransactionStatus::Pending,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_complete_by_order_id() {
        let repo = setup_test_repo().await;
        repo.create(&pending("t1", "b1", "order_mock_abc", 0))
            .await
            .expect("create");

        let updated = repo
            .complete_by_order_id("order_mock_abc", "pay_123")
            .await
            .expect("complete");
        assert_eq!(updated, 1);

        let found = repo.first_by_booking("b1").await.expect("get").expect("exists");
        assert_eq!(found.status, TransactionStatus::Completed);
        assert_eq!(found.razorpay_payment_id.as_deref(), Some("pay_123"));
    }

    #[tokio::test]
    async fn test_complete_unknown_order_updates_nothing() {
        let repo = setup_test_repo().await;
        let updated = repo
            .complete_by_order_id("order_mock_none", "pay_1")
            .await
            .expect("complete");
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn test_first_by_booking_returns_earliest() {
        let repo = setup_test_repo().await;
        repo.create(&pending("t1", "b1", "o1", 0)).await.expect("create");
        repo.create(&pending("t2", "b1", "o2", 1)).await.expect("create");

        let first = repo.first_by_booking("b1").await.expect("get").expect("exists");
        assert_eq!(first.id, "t1");
        assert!(repo.first_by_booking("b2").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_list_recent_by_user() {
        let repo = setup_test_repo().await;
        repo.create(&pending("t1", "b1", "o1", 0)).await.expect("create");
        repo.create(&pending("t2", "b2", "o2", 5)).await.expect("create");

        let list = repo.list_recent_by_user("u1", 100).await.expect("list");
        let ids: Vec<_> = list.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t1"]);
        assert!(repo.list_recent_by_user("u2", 100).await.expect("list").is_empty());
    }
}
