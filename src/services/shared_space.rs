//! Shared space service
//!
//! Users can list their own parking space for others. Listings are shown
//! while `available`; there is no booking flow for them.

use crate::db::repositories::SharedSpaceRepository;
use crate::models::{CreateSharedSpaceInput, SharedSpace};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub const SHARED_SPACE_LIST_LIMIT: i64 = 100;

/// Error types for shared space operations
#[derive(Debug, thiserror::Error)]
pub enum SharedSpaceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct SharedSpaceService {
    repo: Arc<dyn SharedSpaceRepository>,
}

impl SharedSpaceService {
    pub fn new(repo: Arc<dyn SharedSpaceRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_shared_spaces(&self) -> Result<Vec<SharedSpace>, SharedSpaceError> {
        let spaces = self
            .repo
            .list_available(SHARED_SPACE_LIST_LIMIT)
            .await
            .context("Failed to list shared spaces")?;
        Ok(spaces)
    }

    /// List a new space owned by `owner_id`; it starts out available
    pub async fn create_shared_space(
        &self,
        owner_id: &str,
        input: CreateSharedSpaceInput,
    ) -> Result<SharedSpace, SharedSpaceError> {
        if input.name.trim().is_empty() {
            return Err(SharedSpaceError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }
        if !input.location.is_valid() {
            return Err(SharedSpaceError::ValidationError(
                "location must be a valid lat/lng pair".to_string(),
            ));
        }
        if !input.rate_per_hour.is_finite() || input.rate_per_hour < 0.0 {
            return Err(SharedSpaceError::ValidationError(
                "rate_per_hour must be a non-negative number".to_string(),
            ));
        }

        let space = SharedSpace {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: input.name,
            location: input.location,
            rate_per_hour: input.rate_per_hour,
            available: true,
            slot_type: input.slot_type,
            created_at: Utc::now(),
        };

        let space = self
            .repo
            .create(&space)
            .await
            .context("Failed to create shared space")?;
        tracing::info!("User {} listed shared space {}", owner_id, space.id);
        Ok(space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSharedSpaceRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::Location;

    async fn setup() -> SharedSpaceService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SharedSpaceService::new(SqlxSharedSpaceRepository::boxed(pool))
    }

    fn input(name: &str, location: Location) -> CreateSharedSpaceInput {
        CreateSharedSpaceInput {
            name: name.to_string(),
            location,
            rate_per_hour: 20.0,
            slot_type: "car".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let service = setup().await;

        let created = service
            .create_shared_space("u1", input("My driveway", Location::new(28.6, 77.2)))
            .await
            .expect("create");
        assert!(created.available);
        assert_eq!(created.owner_id, "u1");

        let listed = service.list_shared_spaces().await.expect("list");
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let service = setup().await;

        let err = service
            .create_shared_space("u1", input(" ", Location::new(28.6, 77.2)))
            .await
            .expect_err("blank name");
        assert!(matches!(err, SharedSpaceError::ValidationError(_)));

        let err = service
            .create_shared_space("u1", input("Spot", Location::new(123.0, 77.2)))
            .await
            .expect_err("bad latitude");
        assert!(matches!(err, SharedSpaceError::ValidationError(_)));

        assert!(service.list_shared_spaces().await.expect("list").is_empty());
    }
}
