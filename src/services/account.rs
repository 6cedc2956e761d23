//! Account service
//!
//! User-facing read views over the other collections (booking history,
//! wallet) and the profile, whose only mutable field is the display name.

use crate::db::repositories::{
    BookingRepository, RewardRepository, SpotRepository, TransactionRepository, UserRepository,
};
use crate::models::{Booking, ParkingSpot, Transaction, UpdateProfileInput, User};
use crate::services::random::round2;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Maximum rows in the history and wallet views
pub const ACCOUNT_VIEW_LIMIT: i64 = 100;

/// Wallet credit per reward point
pub const POINT_VALUE: f64 = 0.1;

/// Error types for account operations
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// One booking with its spot and first transaction, either may be gone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub booking: Booking,
    pub spot: Option<ParkingSpot>,
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    pub balance: f64,
    pub points: i64,
    pub transactions: Vec<Transaction>,
}

/// Wallet balance for a points total, rounded to two decimals
pub fn wallet_balance(points: i64) -> f64 {
    round2(points as f64 * POINT_VALUE)
}

pub struct AccountService {
    user_repo: Arc<dyn UserRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    spot_repo: Arc<dyn SpotRepository>,
    transaction_repo: Arc<dyn TransactionRepository>,
    reward_repo: Arc<dyn RewardRepository>,
}

impl AccountService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        spot_repo: Arc<dyn SpotRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
        reward_repo: Arc<dyn RewardRepository>,
    ) -> Self {
        Self {
            user_repo,
            booking_repo,
            spot_repo,
            transaction_repo,
            reward_repo,
        }
    }

    /// The user's bookings, newest first, each joined to its spot and first
    /// transaction
    pub async fn get_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, AccountServiceError> {
        let bookings = self
            .booking_repo
            .list_recent_by_user(user_id, ACCOUNT_VIEW_LIMIT)
            .await
            .context("Failed to list bookings")?;

        let mut history = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let spot = self
                .spot_repo
                .get_by_id(&booking.spot_id)
                .await
                .context("Failed to get spot")?;
            let transaction = self
                .transaction_repo
                .first_by_booking(&booking.id)
                .await
                .context("Failed to get transaction")?;
            history.push(HistoryEntry {
                booking,
                spot,
                transaction,
            });
        }

        Ok(history)
    }

    /// Points, derived balance and recent transactions. A user without a
    /// reward record has zero points; no record is created.
    pub async fn get_wallet(&self, user_id: &str) -> Result<Wallet, AccountServiceError> {
        let transactions = self
            .transaction_repo
            .list_recent_by_user(user_id, ACCOUNT_VIEW_LIMIT)
            .await
            .context("Failed to list transactions")?;
        let points = self
            .reward_repo
            .get(user_id)
            .await
            .context("Failed to get reward")?
            .map(|r| r.points)
            .unwrap_or(0);

        Ok(Wallet {
            balance: wallet_balance(points),
            points,
            transactions,
        })
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<User, AccountServiceError> {
        self.user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| AccountServiceError::NotFound("User not found".to_string()))
    }

    /// Apply a profile update. Absent fields are left unchanged.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> Result<(), AccountServiceError> {
        let name = match input.name {
            Some(name) => name,
            None => return Ok(()),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(AccountServiceError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }

        let updated = self
            .user_repo
            .update_name(user_id, name)
            .await
            .context("Failed to update profile")?;
        if !updated {
            return Err(AccountServiceError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxBookingRepository, SqlxRewardRepository, SqlxSpotRepository,
        SqlxTransactionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{BookingStatus, Location, Reward, SpotStatus, TransactionStatus};
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    struct Fixture {
        service: AccountService,
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        spots: Arc<dyn SpotRepository>,
        transactions: Arc<dyn TransactionRepository>,
        rewards: Arc<dyn RewardRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let users = SqlxUserRepository::boxed(pool.clone());
        let bookings = SqlxBookingRepository::boxed(pool.clone());
        let spots = SqlxSpotRepository::boxed(pool.clone());
        let transactions = SqlxTransactionRepository::boxed(pool.clone());
        let rewards = SqlxRewardRepository::boxed(pool);
        let service = AccountService::new(
            users.clone(),
            bookings.clone(),
            spots.clone(),
            transactions.clone(),
            rewards.clone(),
        );
        users
            .create(&User::new(
                "u1".to_string(),
                "u1@example.com".to_string(),
                "Original".to_string(),
                None,
            ))
            .await
            .expect("create user");
        Fixture {
            service,
            users,
            bookings,
            spots,
            transactions,
            rewards,
        }
    }

    fn booking(id: &str, spot_id: &str, offset_secs: i64) -> Booking {
        let at = Utc::now() + Duration::seconds(offset_secs);
        Booking {
            id: id.to_string(),
            user_id: "u1".to_string(),
            spot_id: spot_id.to_string(),
            start_time: at,
            end_time: at + Duration::hours(1),
            duration_hours: 1.0,
            amount: 40.0,
            status: BookingStatus::Pending,
            ev_charging: false,
            created_at: at,
        }
    }

    fn transaction(id: &str, booking_id: &str, offset_secs: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            user_id: "u1".to_string(),
            booking_id: booking_id.to_string(),
            amount: 40.0,
            payment_method: "razorpay".to_string(),
            razorpay_order_id: Some(format!("order_mock_{}", id)),
            razorpay_payment_id: None,
            status: TransactionStatus::Pending,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_history_joins_newest_first() {
        let fx = setup().await;
        fx.spots
            .create(&ParkingSpot {
                id: "s1".to_string(),
                lot_id: "lot_001".to_string(),
                slot_number: "A1".to_string(),
                status: SpotStatus::Reserved,
                ev_charging: false,
                location: Location::new(28.6, 77.2),
                rate_per_hour: 40.0,
            })
            .await
            .expect("spot");
        fx.bookings.create(&booking("old", "s1", 0)).await.expect("booking");
        fx.bookings.create(&booking("new", "gone", 10)).await.expect("booking");
        fx.transactions.create(&transaction("t1", "old", 1)).await.expect("tx");

        let history = fx.service.get_history("u1").await.expect("history");

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].booking.id, "new");
        assert!(history[0].spot.is_none());
        assert!(history[0].transaction.is_none());
        assert_eq!(history[1].booking.id, "old");
        assert_eq!(history[1].spot.as_ref().map(|s| s.id.as_str()), Some("s1"));
        assert_eq!(history[1].transaction.as_ref().map(|t| t.id.as_str()), Some("t1"));
    }

    #[tokio::test]
    async fn test_wallet_balance_and_transactions() {
        let fx = setup().await;
        fx.rewards.create(&Reward::new("u1")).await.expect("reward");
        fx.rewards.increment("u1", 123, 1.0).await.expect("credit");
        fx.transactions.create(&transaction("t1", "b1", 0)).await.expect("tx");
        fx.transactions.create(&transaction("t2", "b2", 5)).await.expect("tx");

        let wallet = fx.service.get_wallet("u1").await.expect("wallet");
        assert_eq!(wallet.points, 123);
        assert_eq!(wallet.balance, 12.3);
        let ids: Vec<_> = wallet.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t1"]);
    }

    #[tokio::test]
    async fn test_wallet_without_reward_record() {
        let fx = setup().await;
        let wallet = fx.service.get_wallet("u1").await.expect("wallet");
        assert_eq!(wallet.points, 0);
        assert_eq!(wallet.balance, 0.0);
        assert!(wallet.transactions.is_empty());
        assert!(fx.rewards.get("u1").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_profile_update_roundtrip() {
        let fx = setup().await;

        fx.service
            .update_profile("u1", UpdateProfileInput { name: None })
            .await
            .expect("noop update");
        assert_eq!(fx.service.get_profile("u1").await.expect("profile").name, "Original");

        fx.service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    name: Some("Renamed".to_string()),
                },
            )
            .await
            .expect("update");
        assert_eq!(fx.service.get_profile("u1").await.expect("profile").name, "Renamed");
    }

    #[tokio::test]
    async fn test_profile_blank_name_rejected() {
        let fx = setup().await;
        let err = fx
            .service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    name: Some("   ".to_string()),
                },
            )
            .await
            .expect_err("must fail");
        assert!(matches!(err, AccountServiceError::ValidationError(_)));
        let user = fx.users.get_by_id("u1").await.expect("get").expect("exists");
        assert_eq!(user.name, "Original");
    }

    #[tokio::test]
    async fn test_profile_of_missing_user() {
        let fx = setup().await;
        let err = fx.service.get_profile("ghost").await.expect_err("must fail");
        assert!(matches!(err, AccountServiceError::NotFound(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn balance_is_tenth_of_points(points in 0i64..100_000) {
            let balance = wallet_balance(points);
            prop_assert!((balance - points as f64 / 10.0).abs() < 0.005 + 1e-9);
            prop_assert_eq!(round2(balance), balance);
        }
    }
}
