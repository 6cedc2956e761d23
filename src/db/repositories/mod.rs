//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles one collection of the document store.

pub mod booking;
pub mod sensor_event;
pub mod session;
pub mod shared_space;
pub mod spot;
pub mod reward;
pub mod transaction;
pub mod user;

pub use booking::{BookingRepository, SqlxBookingRepository};
pub use reward::{RewardRepository, SqlxRewardRepository};
pub use sensor_event::{SensorEventRepository, SqlxSensorEventRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use shared_space::{SharedSpaceRepository, SqlxSharedSpaceRepository};
pub use spot::{SpotFilter, SpotRepository, SqlxSpotRepository};
pub use transaction::{SqlxTransactionRepository, TransactionRepository};
pub use user::{SqlxUserRepository, UserRepository};
