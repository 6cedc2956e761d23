//! Data models
//!
//! This module contains the data structures used throughout EcoPark:
//! - Stored entities (User, Session, ParkingSpot, Booking, Transaction,
//!   Reward, SharedSpace, SensorEvent)
//! - Request inputs that are validated at the API boundary

mod booking;
mod location;
mod reward;
mod sensor_event;
mod session;
mod shared_space;
mod spot;
mod transaction;
mod user;

pub use booking::{Booking, BookingStatus, CreateBookingInput};
pub use location::Location;
pub use reward::{LeaderboardEntry, Level, MonthlyCarbon, Reward};
pub use sensor_event::SensorEvent;
pub use session::Session;
pub use shared_space::{CreateSharedSpaceInput, SharedSpace};
pub use spot::{ParkingSpot, SpotStatus};
pub use transaction::{Transaction, TransactionStatus};
pub use user::{UpdateProfileInput, User};
