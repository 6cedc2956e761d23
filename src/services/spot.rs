//! Spot service
//!
//! Read access to the spot inventory plus the two operational tools that
//! write to it: the simulated sensor sweep and the demo-data seeder.

use crate::db::repositories::{SensorEventRepository, SpotFilter, SpotRepository};
use crate::models::{Location, ParkingSpot, SensorEvent, SpotStatus};
use crate::services::random::{pick, RandomSource};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Maximum number of spots returned by a listing
pub const SPOT_LIST_LIMIT: i64 = 1000;

/// Probability that a sensor reports a change for a given spot per sweep
pub const SENSOR_CHANGE_PROBABILITY: f64 = 0.1;

/// Demo lot layout
pub const SEED_SPOT_COUNT: usize = 20;
pub const SEED_LOT_ID: &str = "lot_001";
pub const SEED_CENTER: (f64, f64) = (28.6139, 77.2090);
pub const SEED_JITTER: f64 = 0.01;
pub const SEED_RATES: [f64; 4] = [30.0, 40.0, 50.0, 60.0];

/// Error types for spot operations
#[derive(Debug, thiserror::Error)]
pub enum SpotServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct SpotService {
    spot_repo: Arc<dyn SpotRepository>,
    event_repo: Arc<dyn SensorEventRepository>,
    random: Arc<dyn RandomSource>,
}

impl SpotService {
    pub fn new(
        spot_repo: Arc<dyn SpotRepository>,
        event_repo: Arc<dyn SensorEventRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            spot_repo,
            event_repo,
            random,
        }
    }

    /// List spots, optionally filtered by status and EV charging
    pub async fn list_spots(&self, filter: SpotFilter) -> Result<Vec<ParkingSpot>, SpotServiceError> {
        let spots = self
            .spot_repo
            .list(filter, SPOT_LIST_LIMIT)
            .await
            .context("Failed to list spots")?;
        Ok(spots)
    }

    /// Get a single spot
    pub async fn get_spot(&self, id: &str) -> Result<ParkingSpot, SpotServiceError> {
        self.spot_repo
            .get_by_id(id)
            .await
            .context("Failed to get spot")?
            .ok_or_else(|| SpotServiceError::NotFound("Spot not found".to_string()))
    }

    /// Run one simulated sensor sweep.
    ///
    /// Each spot independently changes, with probability 0.1, to one of the
    /// physical states; every change is logged as a sensor event. Returns the
    /// number of spots changed.
    pub async fn simulate_iot_update(&self) -> Result<usize, SpotServiceError> {
        let spots = self
            .spot_repo
            .list(SpotFilter::default(), SPOT_LIST_LIMIT)
            .await
            .context("Failed to list spots")?;

        let mut changed = 0;
        for spot in spots {
            if !self.random.chance(SENSOR_CHANGE_PROBABILITY) {
                continue;
            }
            let status = match pick(self.random.as_ref(), &SpotStatus::SENSOR_STATES) {
                Some(status) => *status,
                None => continue,
            };

            self.spot_repo
                .set_status(&spot.id, status)
                .await
                .context("Failed to update spot status")?;
            self.event_repo
                .create(&SensorEvent {
                    id: Uuid::new_v4().to_string(),
                    spot_id: spot.id.clone(),
                    status,
                    timestamp: Utc::now(),
                })
                .await
                .context("Failed to record sensor event")?;

            tracing::debug!("Sensor update: spot {} {} -> {}", spot.id, spot.status, status);
            changed += 1;
        }

        Ok(changed)
    }

    /// Replace the whole inventory with the demo lot. Returns the number of
    /// spots created.
    pub async fn seed_data(&self) -> Result<usize, SpotServiceError> {
        let removed = self
            .spot_repo
            .delete_all()
            .await
            .context("Failed to clear spots")?;

        let spots: Vec<ParkingSpot> = (0..SEED_SPOT_COUNT).map(|i| self.seed_spot(i)).collect();
        let created = self
            .spot_repo
            .create_many(&spots)
            .await
            .context("Failed to insert seed spots")?;

        tracing::info!("Seeded {} spots (removed {})", created, removed);
        Ok(created)
    }

    fn seed_spot(&self, i: usize) -> ParkingSpot {
        let rng = self.random.as_ref();
        let status = pick(rng, &SpotStatus::SENSOR_STATES)
            .copied()
            .unwrap_or_default();
        let lat = SEED_CENTER.0 + rng.float_in(-SEED_JITTER, SEED_JITTER);
        let lng = SEED_CENTER.1 + rng.float_in(-SEED_JITTER, SEED_JITTER);
        let rate = pick(rng, &SEED_RATES).copied().unwrap_or(SEED_RATES[0]);

        ParkingSpot {
            id: Uuid::new_v4().to_string(),
            lot_id: SEED_LOT_ID.to_string(),
            slot_number: format!("A{}", i + 1),
            status,
            ev_charging: i % 3 == 0,
            location: Location::new(lat, lng),
            rate_per_hour: rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSensorEventRepository, SqlxSpotRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::random::{SequenceRandom, ThreadRandom};

    async fn setup(
        random: Arc<dyn RandomSource>,
    ) -> (SpotService, Arc<dyn SpotRepository>, Arc<dyn SensorEventRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let spots = SqlxSpotRepository::boxed(pool.clone());
        let events = SqlxSensorEventRepository::boxed(pool);
        (
            SpotService::new(spots.clone(), events.clone(), random),
            spots,
            events,
        )
    }

    #[tokio::test]
    async fn test_seed_creates_demo_lot() {
        let (service, _spots, _events) = setup(Arc::new(ThreadRandom)).await;

        let created = service.seed_data().await.expect("seed");
        assert_eq!(created, 20);

        let spots = service.list_spots(SpotFilter::default()).await.expect("list");
        assert_eq!(spots.len(), 20);
        for (i, spot) in spots.iter().enumerate() {
            assert_eq!(spot.slot_number, format!("A{}", i + 1));
            assert_eq!(spot.lot_id, "lot_001");
            assert_eq!(spot.ev_charging, i % 3 == 0);
            assert!(SpotStatus::SENSOR_STATES.contains(&spot.status));
            assert!(SEED_RATES.contains(&spot.rate_per_hour));
            assert!((spot.location.lat - 28.6139).abs() <= 0.01 + 1e-9);
            assert!((spot.location.lng - 77.2090).abs() <= 0.01 + 1e-9);
        }
    }

    #[tokio::test]
    async fn test_seed_replaces_existing_inventory() {
        let (service, _spots, _events) = setup(Arc::new(ThreadRandom)).await;
        service.seed_data().await.expect("seed");
        service.seed_data().await.expect("seed again");

        let spots = service.list_spots(SpotFilter::default()).await.expect("list");
        assert_eq!(spots.len(), 20);
    }

    #[tokio::test]
    async fn test_seed_with_fixed_source() {
        // 0.3 -> status index 0 (available), rate index 1 (40)
        let (service, _spots, _events) = setup(Arc::new(SequenceRandom::constant(0.3))).await;
        service.seed_data().await.expect("seed");

        let spots = service.list_spots(SpotFilter::default()).await.expect("list");
        assert!(spots.iter().all(|s| s.status == SpotStatus::Available));
        assert!(spots.iter().all(|s| s.rate_per_hour == 40.0));
    }

    #[tokio::test]
    async fn test_get_spot() {
        let (service, _spots, _events) = setup(Arc::new(ThreadRandom)).await;
        service.seed_data().await.expect("seed");
        let first = service.list_spots(SpotFilter::default()).await.expect("list")[0].clone();

        let found = service.get_spot(&first.id).await.expect("get");
        assert_eq!(found, first);

        let err = service.get_spot("missing").await.expect_err("must fail");
        assert!(matches!(err, SpotServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (service, _spots, _events) = setup(Arc::new(ThreadRandom)).await;
        service.seed_data().await.expect("seed");

        let ev = service
            .list_spots(SpotFilter {
                status: None,
                ev_charging: Some(true),
            })
            .await
            .expect("list");
        // indices 0, 3, 6, ..., 18
        assert_eq!(ev.len(), 7);
        assert!(ev.iter().all(|s| s.ev_charging));
    }

    #[tokio::test]
    async fn test_iot_sweep_no_change_when_chance_fails() {
        let (service, spots, _events) = setup(Arc::new(SequenceRandom::constant(0.3))).await;
        service.seed_data().await.expect("seed");

        // 0.3 is above the 0.1 change probability, so nothing moves
        let changed = service.simulate_iot_update().await.expect("sweep");
        assert_eq!(changed, 0);
        let all = spots.list(SpotFilter::default(), 1000).await.expect("list");
        assert!(all.iter().all(|s| s.status == SpotStatus::Available));
    }

    #[tokio::test]
    async fn test_iot_sweep_changes_and_logs() {
        let (service, spots, events) = setup(Arc::new(SequenceRandom::constant(0.3))).await;
        service.seed_data().await.expect("seed");

        // first spot: 0.05 passes the chance, 0.9 picks soon_available;
        // every later draw is 0.5 and fails the chance
        let service = SpotService::new(
            spots.clone(),
            events.clone(),
            Arc::new(SequenceRandom::new([0.05, 0.9, 0.5])),
        );
        let changed = service.simulate_iot_update().await.expect("sweep");
        assert_eq!(changed, 1);

        let all = spots.list(SpotFilter::default(), 1000).await.expect("list");
        assert_eq!(all[0].status, SpotStatus::SoonAvailable);
        let logged = events.list_by_spot(&all[0].id).await.expect("events");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].status, SpotStatus::SoonAvailable);
        assert!(events.list_by_spot(&all[1].id).await.expect("events").is_empty());
    }
}
