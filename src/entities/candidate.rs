use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A driver eligible for one dispatch cycle, paired with the computed
/// distance to pickup and composite score. Never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub driver_id: Uuid,
    pub distance_km: f64,
    pub score: f64,
}
