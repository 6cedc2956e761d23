//! Services layer - Business logic
//!
//! This module contains all business logic services for EcoPark.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories
//! - Handling validation and error cases

pub mod account;
pub mod auth;
pub mod booking;
pub mod identity;
pub mod payment;
pub mod prediction;
pub mod random;
pub mod reward;
pub mod shared_space;
pub mod spot;

pub use account::{AccountService, AccountServiceError, HistoryEntry, Wallet};
pub use auth::{AuthService, AuthServiceError, SessionGrant};
pub use booking::{compute_amount, BookingError, BookingService};
pub use identity::{HttpIdentityProvider, IdentityError, IdentityProvider, ProviderIdentity};
pub use payment::{PaymentError, PaymentOrder, PaymentReceipt, PaymentService};
pub use prediction::{Prediction, PredictionRequest, PredictionService};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
pub use reward::{compute_level, RewardService, RewardServiceError};
pub use shared_space::{SharedSpaceError, SharedSpaceService};
pub use spot::{SpotService, SpotServiceError};
