use chrono::{DateTime, Duration, Utc};

use crate::entities::{Candidate, Coordinates, VehicleClass};
use crate::error::Error;
use crate::matching;
use crate::store::Store;

const AVERAGE_SPEED_KMH: f64 = 25.0;
const MIN_ETA_MINUTES: i64 = 2;

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub initial_radius_km: f64,
    pub radius_step_km: f64,
    pub max_radius_km: f64,
    pub max_fanout: usize,
    pub freshness_window: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            initial_radius_km: 5.0,
            radius_step_km: 2.0,
            max_radius_km: 15.0,
            max_fanout: 5,
            freshness_window: Duration::minutes(10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DispatchOutcome {
    pub candidates: Vec<Candidate>,
    pub radius_km: f64,
    /// Set when the ceiling was reached with nobody found: the trip stays
    /// `requested` and the search is reported as still expanding.
    pub expanding: bool,
}

#[derive(Clone, Debug)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(mut config: DispatchConfig) -> Self {
        // a non-positive step would keep the expansion loop from ever
        // reaching the ceiling
        if config.radius_step_km <= 0.0 {
            config.radius_step_km = 2.0;
        }

        Self { config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Probe outward from the initial radius until candidates appear or the
    /// ceiling is hit, then rank and truncate to the fan-out limit. The step
    /// size and ceiling bound the loop to a fixed number of probes.
    #[tracing::instrument(skip(self, store))]
    pub async fn match_drivers(
        &self,
        store: &dyn Store,
        pickup: &Coordinates,
        class: Option<VehicleClass>,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, Error> {
        let mut radius_km = self.config.initial_radius_km;

        loop {
            let matches = matching::find_candidates(
                store,
                pickup,
                class,
                radius_km,
                self.config.freshness_window,
                now,
            )
            .await?;

            if !matches.is_empty() {
                let mut candidates = matching::rank(matches, self.config.max_radius_km);
                candidates.truncate(self.config.max_fanout);

                tracing::info!(
                    radius_km,
                    count = candidates.len(),
                    "candidates found for dispatch"
                );

                return Ok(DispatchOutcome {
                    candidates,
                    radius_km,
                    expanding: false,
                });
            }

            if radius_km >= self.config.max_radius_km {
                tracing::warn!(radius_km, "search ceiling reached with no candidates");

                return Ok(DispatchOutcome {
                    candidates: vec![],
                    radius_km,
                    expanding: true,
                });
            }

            radius_km = (radius_km + self.config.radius_step_km).min(self.config.max_radius_km);
        }
    }
}

/// Display-only pickup estimate at an assumed average speed, floored at two
/// minutes.
pub fn eta_minutes(distance_km: f64) -> i64 {
    let minutes = (distance_km / AVERAGE_SPEED_KMH * 60.0).ceil() as i64;
    minutes.max(MIN_ETA_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Availability, DriverPresence, Vehicle};
    use crate::store::{MemoryStore, Store as _};
    use uuid::Uuid;

    fn online_driver_at(latitude: f64, longitude: f64) -> DriverPresence {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            class: VehicleClass::Economy,
            active: true,
        };

        let mut presence = DriverPresence::new(
            Uuid::new_v4(),
            Coordinates::new(latitude, longitude),
            Some(vehicle),
        );
        presence.availability = Availability::Online;
        presence.verified = true;
        presence
    }

    #[tokio::test]
    async fn expands_radius_until_a_driver_appears() {
        let store = MemoryStore::new();
        let pickup = Coordinates::new(37.7749, -122.4194);

        // ~6 km north of pickup: outside the 5 km probe, inside 7 km
        let driver = online_driver_at(37.8289, -122.4194);
        store.upsert_presence(&driver).await.unwrap();

        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let outcome = dispatcher
            .match_drivers(&store, &pickup, Some(VehicleClass::Economy), Utc::now())
            .await
            .unwrap();

        assert!(!outcome.expanding);
        assert_eq!(outcome.radius_km, 7.0);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].driver_id, driver.id);
        assert!(outcome.candidates[0].distance_km > 5.0);
        assert!(outcome.candidates[0].distance_km < 7.0);
    }

    #[tokio::test]
    async fn empty_pool_terminates_at_the_ceiling() {
        let store = MemoryStore::new();
        let dispatcher = Dispatcher::new(DispatchConfig::default());

        let outcome = dispatcher
            .match_drivers(&store, &Coordinates::new(0.0, 0.0), None, Utc::now())
            .await
            .unwrap();

        assert!(outcome.expanding);
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.radius_km, 15.0);
    }

    #[tokio::test]
    async fn fanout_is_capped() {
        let store = MemoryStore::new();
        let pickup = Coordinates::new(37.7749, -122.4194);

        for i in 0..8 {
            let driver = online_driver_at(37.7749 + 0.001 * i as f64, -122.4194);
            store.upsert_presence(&driver).await.unwrap();
        }

        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let outcome = dispatcher
            .match_drivers(&store, &pickup, None, Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.candidates.len(), 5);
        assert_eq!(outcome.radius_km, 5.0);
    }

    #[test]
    fn probe_count_is_bounded() {
        let config = DispatchConfig::default();

        let mut probes = 1;
        let mut radius = config.initial_radius_km;
        while radius < config.max_radius_km {
            radius += config.radius_step_km;
            probes += 1;
        }

        assert_eq!(probes, 6);
    }

    #[test]
    fn eta_rounds_up_with_a_floor() {
        assert_eq!(eta_minutes(0.0), 2);
        assert_eq!(eta_minutes(0.4), 2);
        // 5 km at 25 km/h is exactly 12 minutes
        assert_eq!(eta_minutes(5.0), 12);
        assert_eq!(eta_minutes(5.1), 13);
    }
}
