//! Booking service
//!
//! Turns an available spot into a pending booking. The spot transition to
//! `reserved` is the authoritative step: it is a conditional write performed
//! before the booking row exists, so a lost race leaves nothing behind.

use crate::db::repositories::{BookingRepository, SpotRepository};
use crate::models::{Booking, BookingStatus, CreateBookingInput, SpotStatus};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Flat surcharge for EV charging
pub const EV_CHARGING_FEE: f64 = 50.0;

/// Error types for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Price of a booking: hourly rate times duration, plus the EV fee
pub fn compute_amount(rate_per_hour: f64, duration_hours: f64, ev_charging: bool) -> f64 {
    rate_per_hour * duration_hours + if ev_charging { EV_CHARGING_FEE } else { 0.0 }
}

pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    spot_repo: Arc<dyn SpotRepository>,
}

impl BookingService {
    pub fn new(booking_repo: Arc<dyn BookingRepository>, spot_repo: Arc<dyn SpotRepository>) -> Self {
        Self {
            booking_repo,
            spot_repo,
        }
    }

    /// Book a spot for the user.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the spot does not exist
    /// - `InvalidState` if the spot is not available, or was taken between
    ///   the read and the reservation
    /// - `ValidationError` if the duration is not a positive number of hours
    /// - `InternalError` for database errors
    pub async fn create_booking(
        &self,
        user_id: &str,
        input: CreateBookingInput,
    ) -> Result<Booking, BookingError> {
        let spot = self
            .spot_repo
            .get_by_id(&input.spot_id)
            .await
            .context("Failed to get spot")?
            .ok_or_else(|| BookingError::NotFound("Spot not found".to_string()))?;

        if spot.status != SpotStatus::Available {
            return Err(BookingError::InvalidState(format!(
                "Spot not available (currently {})",
                spot.status
            )));
        }

        if !input.duration_hours.is_finite() || input.duration_hours <= 0.0 {
            return Err(BookingError::ValidationError(
                "duration_hours must be greater than zero".to_string(),
            ));
        }

        let amount = compute_amount(spot.rate_per_hour, input.duration_hours, input.ev_charging);
        let start_time = Utc::now();
        let millis = (input.duration_hours * 3_600_000.0).round() as i64;
        let end_time = Duration::try_milliseconds(millis)
            .and_then(|d| start_time.checked_add_signed(d))
            .ok_or_else(|| BookingError::ValidationError("duration_hours is too large".to_string()))?;

        if !self
            .spot_repo
            .try_reserve(&spot.id)
            .await
            .context("Failed to reserve spot")?
        {
            return Err(BookingError::InvalidState("Spot not available".to_string()));
        }

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            spot_id: spot.id.clone(),
            start_time,
            end_time,
            duration_hours: input.duration_hours,
            amount,
            status: BookingStatus::Pending,
            ev_charging: input.ev_charging,
            created_at: start_time,
        };

        let booking = self
            .booking_repo
            .create(&booking)
            .await
            .context("Failed to create booking")?;

        tracing::info!(
            "Booking {} created for spot {} by user {} (amount {:.2})",
            booking.id,
            booking.spot_id,
            user_id,
            booking.amount
        );
        Ok(booking)
    }

    /// All bookings of the user in creation order
    pub async fn list_bookings(&self, user_id: &str) -> Result<Vec<Booking>, BookingError> {
        let bookings = self
            .booking_repo
            .list_by_user(user_id)
            .await
            .context("Failed to list bookings")?;
        Ok(bookings)
    }
}
