use chrono::{DateTime, Duration, Utc};

use crate::entities::{distance_km, Coordinates, DriverPresence, VehicleClass};
use crate::error::Error;
use crate::store::Store;

/// Every presence that is online, verified, vehicle-compatible and fresh,
/// within `radius_km` of the pickup. Returns each record paired with its
/// distance to pickup. No side effects; an empty vec when nobody qualifies.
pub async fn find_candidates(
    store: &dyn Store,
    pickup: &Coordinates,
    class: Option<VehicleClass>,
    radius_km: f64,
    freshness: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<(DriverPresence, f64)>, Error> {
    let mut matches = vec![];

    for presence in store.list_presence().await? {
        if !presence.is_dispatchable(now, freshness) {
            continue;
        }

        if let Some(class) = class {
            let compatible = presence
                .vehicle
                .as_ref()
                .map_or(false, |v| v.class == class);

            if !compatible {
                continue;
            }
        }

        let distance = distance_km(pickup, &presence.coordinates);

        if distance <= radius_km {
            matches.push((presence, distance));
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Availability, Vehicle};
    use crate::store::{MemoryStore, Store as _};
    use uuid::Uuid;

    fn presence_at(latitude: f64, longitude: f64, class: VehicleClass) -> DriverPresence {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            class,
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
    async fn filters_on_radius_class_and_freshness() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let pickup = Coordinates::new(37.7749, -122.4194);

        // ~1 km north, economy: should match
        let near = presence_at(37.7839, -122.4194, VehicleClass::Economy);
        store.upsert_presence(&near).await.unwrap();

        // ~1 km north but premium: filtered by class
        let premium = presence_at(37.7839, -122.4194, VehicleClass::Premium);
        store.upsert_presence(&premium).await.unwrap();

        // ~20 km away: outside the radius
        let far = presence_at(37.95, -122.4194, VehicleClass::Economy);
        store.upsert_presence(&far).await.unwrap();

        // close but stale
        let mut stale = presence_at(37.7839, -122.4194, VehicleClass::Economy);
        stale.recorded_at = now - Duration::minutes(30);
        store.upsert_presence(&stale).await.unwrap();

        // close but busy
        let mut busy = presence_at(37.7839, -122.4194, VehicleClass::Economy);
        busy.availability = Availability::Busy;
        store.upsert_presence(&busy).await.unwrap();

        let matches = find_candidates(
            &store,
            &pickup,
            Some(VehicleClass::Economy),
            5.0,
            Duration::minutes(10),
            now,
        )
        .await
        .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.id, near.id);
        assert!(matches[0].1 < 1.5);
    }

    #[tokio::test]
    async fn empty_pool_yields_empty_set() {
        let store = MemoryStore::new();

        let matches = find_candidates(
            &store,
            &Coordinates::new(0.0, 0.0),
            None,
            5.0,
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches.is_empty());
    }
}
