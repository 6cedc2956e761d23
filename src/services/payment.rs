//! Payment service
//!
//! Mock payment gateway. Orders are recorded as pending transactions and
//! verification completes them without any signature check, activates the
//! booking and credits the user's reward ledger.

use crate::db::repositories::{BookingRepository, TransactionRepository};
use crate::models::{BookingStatus, Transaction, TransactionStatus};
use crate::services::random::{round2, RandomSource};
use crate::services::reward::{RewardService, RewardServiceError};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Currency of every mock order
pub const CURRENCY: &str = "INR";

/// Payment method recorded on transactions
pub const PAYMENT_METHOD: &str = "razorpay";

/// Points awarded per verified payment
pub const POINTS_RANGE: (i64, i64) = (10, 30);

/// Carbon (kg) credited per verified payment
pub const CARBON_RANGE: (f64, f64) = (0.5, 2.0);

/// Error types for payment operations
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<RewardServiceError> for PaymentError {
    fn from(err: RewardServiceError) -> Self {
        match err {
            RewardServiceError::InternalError(e) => PaymentError::InternalError(e),
        }
    }
}

/// Order handed to the client for checkout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentOrder {
    pub order_id: String,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub booking_id: String,
}

/// Outcome of a verified payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub success: bool,
    pub points_earned: i64,
    pub carbon_saved: f64,
}

/// Convert a major-unit amount to minor units, truncating
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).trunc() as i64
}

/// `order_mock_` followed by 12 hex characters
pub fn generate_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("order_mock_{}", &hex[..12])
}

pub struct PaymentService {
    booking_repo: Arc<dyn BookingRepository>,
    transaction_repo: Arc<dyn TransactionRepository>,
    rewards: Arc<RewardService>,
    random: Arc<dyn RandomSource>,
}

impl PaymentService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
        rewards: Arc<RewardService>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            booking_repo,
            transaction_repo,
            rewards,
            random,
        }
    }

    /// Create a mock order for a booking and record a pending transaction.
    ///
    /// Every call creates a new order; repeated attempts are not merged.
    pub async fn create_order(
        &self,
        user_id: &str,
        booking_id: &str,
    ) -> Result<PaymentOrder, PaymentError> {
        let booking = self
            .booking_repo
            .get_by_id(booking_id)
            .await
            .context("Failed to get booking")?
            .ok_or_else(|| PaymentError::NotFound("Booking not found".to_string()))?;

        let order_id = generate_order_id();
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            booking_id: booking.id.clone(),
            amount: booking.amount,
            payment_method: PAYMENT_METHOD.to_string(),
            razorpay_order_id: Some(order_id.clone()),
            razorpay_payment_id: None,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        };
        self.transaction_repo
            .create(&transaction)
            .await
            .context("Failed to record transaction")?;

        tracing::info!("Created order {} for booking {}", order_id, booking.id);

        Ok(PaymentOrder {
            order_id,
            amount: to_minor_units(booking.amount),
            currency: CURRENCY.to_string(),
            booking_id: booking.id,
        })
    }

    /// Verify a payment: complete the transaction, activate the booking and
    /// credit the user with points and carbon.
    pub async fn verify_payment(
        &self,
        user_id: &str,
        order_id: &str,
        payment_id: &str,
        booking_id: &str,
    ) -> Result<PaymentReceipt, PaymentError> {
        let booking = self
            .booking_repo
            .get_by_id(booking_id)
            .await
            .context("Failed to get booking")?
            .ok_or_else(|| PaymentError::NotFound("Booking not found".to_string()))?;

        let completed = self
            .transaction_repo
            .complete_by_order_id(order_id, payment_id)
            .await
            .context("Failed to complete transaction")?;
        if completed == 0 {
            tracing::warn!("Payment {} references unknown order {}", payment_id, order_id);
        }

        self.booking_repo
            .set_status(&booking.id, BookingStatus::Active)
            .await
            .context("Failed to activate booking")?;

        let points = self.random.int_in(POINTS_RANGE.0, POINTS_RANGE.1);
        let carbon = round2(self.random.float_in(CARBON_RANGE.0, CARBON_RANGE.1));
        self.rewards.credit(user_id, points, carbon).await?;

        tracing::info!("Payment {} verified for booking {}", payment_id, booking.id);

        Ok(PaymentReceipt {
            success: true,
            points_earned: points,
            carbon_saved: carbon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        RewardRepository, SqlxBookingRepository, SqlxRewardRepository,
        SqlxTransactionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::Booking;
    use crate::services::random::SequenceRandom;
    use chrono::Duration;

    struct Fixture {
        service: PaymentService,
        bookings: Arc<dyn BookingRepository>,
        transactions: Arc<dyn TransactionRepository>,
        rewards: Arc<dyn RewardRepository>,
    }

    async fn setup(random: Arc<dyn RandomSource>) -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let bookings = SqlxBookingRepository::boxed(pool.clone());
        let transactions = SqlxTransactionRepository::boxed(pool.clone());
        let rewards = SqlxRewardRepository::boxed(pool.clone());
        let users = SqlxUserRepository::boxed(pool);
        let reward_service = Arc::new(RewardService::new(rewards.clone(), users));
        Fixture {
            service: PaymentService::new(
                bookings.clone(),
                transactions.clone(),
                reward_service,
                random,
            ),
            bookings,
            transactions,
            rewards,
        }
    }

    async fn add_booking(bookings: &Arc<dyn BookingRepository>, id: &str, amount: f64) {
        let now = Utc::now();
        bookings
            .create(&Booking {
                id: id.to_string(),
                user_id: "u1".to_string(),
                spot_id: "s1".to_string(),
                start_time: now,
                end_time: now + Duration::hours(2),
                duration_hours: 2.0,
                amount,
                status: BookingStatus::Pending,
                ev_charging: true,
                created_at: now,
            })
            .await
            .expect("create booking");
    }

    #[test]
    fn test_order_id_format() {
        let id = generate_order_id();
        let suffix = id.strip_prefix("order_mock_").expect("prefix");
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_minor_units_truncate() {
        assert_eq!(to_minor_units(130.0), 13000);
        assert_eq!(to_minor_units(12.349), 1234);
        assert_eq!(to_minor_units(0.0), 0);
    }

    #[tokio::test]
    async fn test_create_order() {
        let fx = setup(Arc::new(SequenceRandom::constant(0.5))).await;
        add_booking(&fx.bookings, "b1", 130.0).await;

        let order = fx.service.create_order("u1", "b1").await.expect("order");

        assert_eq!(order.amount, 13000);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.booking_id, "b1");

        let tx = fx.transactions.first_by_booking("b1").await.expect("get").expect("exists");
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.payment_method, "razorpay");
        assert_eq!(tx.razorpay_order_id.as_deref(), Some(order.order_id.as_str()));
    }

    #[tokio::test]
    async fn test_create_order_missing_booking() {
        let fx = setup(Arc::new(SequenceRandom::constant(0.5))).await;
        let err = fx.service.create_order("u1", "nope").await.expect_err("must fail");
        assert!(matches!(err, PaymentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_repeated_orders_are_not_deduplicated() {
        let fx = setup(Arc::new(SequenceRandom::constant(0.5))).await;
        add_booking(&fx.bookings, "b1", 50.0).await;

        let a = fx.service.create_order("u1", "b1").await.expect("order");
        let b = fx.service.create_order("u1", "b1").await.expect("order");

        assert_ne!(a.order_id, b.order_id);
        let all = fx.transactions.list_recent_by_user("u1", 100).await.expect("list");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_verify_payment_completes_everything() {
        // points: 10 + floor(1.0 * 21) capped -> 30; carbon: 0.5 + 0.5 * 1.5 = 1.25
        let fx = setup(Arc::new(SequenceRandom::new([1.0, 0.5]))).await;
        add_booking(&fx.bookings, "b1", 130.0).await;
        let order = fx.service.create_order("u1", "b1").await.expect("order");

        let receipt = fx
            .service
            .verify_payment("u1", &order.order_id, "pay_1", "b1")
            .await
            .expect("verify");

        assert!(receipt.success);
        assert_eq!(receipt.points_earned, 30);
        assert_eq!(receipt.carbon_saved, 1.25);

        let booking = fx.bookings.get_by_id("b1").await.expect("get").expect("exists");
        assert_eq!(booking.status, BookingStatus::Active);

        let tx = fx.transactions.first_by_booking("b1").await.expect("get").expect("exists");
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.razorpay_payment_id.as_deref(), Some("pay_1"));

        let reward = fx.rewards.get("u1").await.expect("get").expect("exists");
        assert_eq!(reward.points, 30);
        assert!((reward.carbon_saved - 1.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_verify_payment_rewards_within_ranges() {
        let fx = setup(Arc::new(crate::services::random::ThreadRandom)).await;
        add_booking(&fx.bookings, "b1", 40.0).await;
        let order = fx.service.create_order("u1", "b1").await.expect("order");

        let receipt = fx
            .service
            .verify_payment("u1", &order.order_id, "pay_1", "b1")
            .await
            .expect("verify");

        assert!((10..=30).contains(&receipt.points_earned));
        assert!(receipt.carbon_saved >= 0.5 && receipt.carbon_saved <= 2.0);
        assert_eq!(round2(receipt.carbon_saved), receipt.carbon_saved);
    }

    #[tokio::test]
    async fn test_verify_payment_missing_booking() {
        let fx = setup(Arc::new(SequenceRandom::constant(0.5))).await;
        let err = fx
            .service
            .verify_payment("u1", "order_mock_x", "pay_1", "nope")
            .await
            .expect_err("must fail");
        assert!(matches!(err, PaymentError::NotFound(_)));
        assert!(fx.rewards.get("u1").await.expect("get").is_none());
    }
}
