//! Availability prediction
//!
//! Simulated forecast: six ten-minute slots with random availability
//! percentages. The inputs are echoed but do not influence the numbers.

use crate::services::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SLOT_COUNT: usize = 6;
pub const SLOT_STEP_MINUTES: usize = 10;
pub const AVAILABILITY_RANGE: (i64, i64) = (40, 95);
pub const CONFIDENCE_RANGE: (i64, i64) = (75, 95);

/// Request body for a prediction
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub destination: String,
    pub arrival_time: String,
    pub duration: f64,
}

/// Availability bucket of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityLevel {
    High,
    Medium,
    Low,
}

impl AvailabilityLevel {
    /// Above 70 is high, above 50 medium, anything else low
    pub fn from_percent(availability: i64) -> Self {
        if availability > 70 {
            AvailabilityLevel::High
        } else if availability > 50 {
            AvailabilityLevel::Medium
        } else {
            AvailabilityLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotPrediction {
    pub time: String,
    pub availability: i64,
    pub status: AvailabilityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub destination: String,
    pub predictions: Vec<SlotPrediction>,
    pub confidence: i64,
    pub recommended_slot: SlotPrediction,
}

pub struct PredictionService {
    random: Arc<dyn RandomSource>,
}

impl PredictionService {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    pub fn predict_availability(&self, request: &PredictionRequest) -> Prediction {
        let predictions: Vec<SlotPrediction> = (0..SLOT_COUNT)
            .map(|i| {
                let availability = self
                    .random
                    .int_in(AVAILABILITY_RANGE.0, AVAILABILITY_RANGE.1);
                SlotPrediction {
                    time: format!("+{} min", i * SLOT_STEP_MINUTES),
                    availability,
                    status: AvailabilityLevel::from_percent(availability),
                }
            })
            .collect();

        let confidence = self.random.int_in(CONFIDENCE_RANGE.0, CONFIDENCE_RANGE.1);
        // SLOT_COUNT is non-zero, so the first slot always exists
        let recommended_slot = predictions[0].clone();

        Prediction {
            destination: request.destination.clone(),
            predictions,
            confidence,
            recommended_slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::random::{SequenceRandom, ThreadRandom};
    use proptest::prelude::*;

    fn request() -> PredictionRequest {
        PredictionRequest {
            destination: "Connaught Place".to_string(),
            arrival_time: "2026-10-19T18:00:00Z".to_string(),
            duration: 2.0,
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AvailabilityLevel::from_percent(71), AvailabilityLevel::High);
        assert_eq!(AvailabilityLevel::from_percent(70), AvailabilityLevel::Medium);
        assert_eq!(AvailabilityLevel::from_percent(51), AvailabilityLevel::Medium);
        assert_eq!(AvailabilityLevel::from_percent(50), AvailabilityLevel::Low);
        assert_eq!(AvailabilityLevel::from_percent(40), AvailabilityLevel::Low);
    }

    #[test]
    fn test_prediction_shape() {
        let service = PredictionService::new(Arc::new(ThreadRandom));
        let prediction = service.predict_availability(&request());

        assert_eq!(prediction.destination, "Connaught Place");
        assert_eq!(prediction.predictions.len(), 6);
        let times: Vec<_> = prediction.predictions.iter().map(|p| p.time.as_str()).collect();
        assert_eq!(
            times,
            vec!["+0 min", "+10 min", "+20 min", "+30 min", "+40 min", "+50 min"]
        );
        assert_eq!(prediction.recommended_slot, prediction.predictions[0]);
        assert!((75..=95).contains(&prediction.confidence));
        for slot in &prediction.predictions {
            assert!((40..=95).contains(&slot.availability));
            assert_eq!(slot.status, AvailabilityLevel::from_percent(slot.availability));
        }
    }

    #[test]
    fn test_prediction_with_fixed_source() {
        let service = PredictionService::new(Arc::new(SequenceRandom::new([
            1.0, 0.0, 0.5, 0.5, 0.5, 0.5, 0.0,
        ])));
        let prediction = service.predict_availability(&request());

        assert_eq!(prediction.predictions[0].availability, 95);
        assert_eq!(prediction.predictions[0].status, AvailabilityLevel::High);
        assert_eq!(prediction.predictions[1].availability, 40);
        assert_eq!(prediction.predictions[1].status, AvailabilityLevel::Low);
        assert_eq!(prediction.confidence, 75);
    }

    #[test]
    fn test_prediction_serializes_lowercase_status() {
        let slot = SlotPrediction {
            time: "+0 min".to_string(),
            availability: 60,
            status: AvailabilityLevel::Medium,
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["status"], "medium");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn bucket_matches_thresholds(availability in 40i64..=95) {
            let expected = if availability > 70 {
                "high"
            } else if availability > 50 {
                "medium"
            } else {
                "low"
            };
            let level = AvailabilityLevel::from_percent(availability);
            prop_assert_eq!(serde_json::to_value(level).unwrap(), serde_json::json!(expected));
        }
    }
}
