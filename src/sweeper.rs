use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{CancelActor, Trip, TripStatusChange};
use crate::error::Error;
use crate::notify::{trip_status_topic, Notifier};
use crate::store::DynStore;

const TIMEOUT_REASON: &str = "no driver accepted";

#[derive(Clone, Debug)]
pub struct SweeperConfig {
    pub interval: std::time::Duration,
    pub timeout: chrono::Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(300),
            timeout: chrono::Duration::minutes(10),
        }
    }
}

/// Background reclaimer for trips abandoned in `requested`: anything older
/// than the timeout is cancelled by admin. Runs on its own schedule,
/// isolated from the request path.
pub struct Sweeper {
    store: DynStore,
    notifier: Arc<dyn Notifier>,
    config: SweeperConfig,
}

impl Sweeper {
    pub fn new(store: DynStore, notifier: Arc<dyn Notifier>, config: SweeperConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.interval);

        loop {
            ticker.tick().await;

            match self.sweep_once(Utc::now()).await {
                Ok(0) => {}
                Ok(reclaimed) => tracing::info!(reclaimed, "swept abandoned trips"),
                Err(err) => tracing::warn!(error = ?err, "sweep cycle failed"),
            }
        }
    }

    /// One sweep pass. Public so test harnesses can drive it with a pinned
    /// clock. A trip that fails to cancel is left for the next cycle; the
    /// rest of the batch still gets processed.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        let cutoff = now - self.config.timeout;
        let stale = self.store.requested_before(cutoff).await?;

        let mut reclaimed = 0;

        for trip in stale {
            let trip_id = trip.id;

            match self.reclaim(trip, now).await {
                Ok(()) => reclaimed += 1,
                Err(err) => {
                    tracing::warn!(%trip_id, error = ?err, "failed to reclaim trip")
                }
            }
        }

        Ok(reclaimed)
    }

    async fn reclaim(&self, mut trip: Trip, now: DateTime<Utc>) -> Result<(), Error> {
        let expected = trip.status;
        trip.cancel(CancelActor::Admin, TIMEOUT_REASON.into(), now)?;

        // conditional write keeps this idempotent against a concurrent
        // accept or a second sweeper instance
        self.store.update_trip_checked(expected, &trip).await?;

        self.store
            .append_history(&TripStatusChange {
                trip_id: trip.id,
                status: trip.status,
                recorded_at: now,
                coordinates: None,
                note: Some(TIMEOUT_REASON.into()),
            })
            .await?;

        self.announce(&trip).await;

        Ok(())
    }

    async fn announce(&self, trip: &Trip) {
        let payload = json!({
            "trip_id": trip.id,
            "status": trip.status,
            "reason": TIMEOUT_REASON,
        });

        if let Err(err) = self
            .notifier
            .publish(&trip_status_topic(trip.id), payload)
            .await
        {
            tracing::warn!(trip_id = %trip.id, error = ?err, "dropping sweep notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Coordinates, Status, VehicleClass};
    use crate::notify::ChannelBus;
    use crate::store::{MemoryStore, Store};

    fn sweeper() -> (Sweeper, DynStore) {
        let store: DynStore = Arc::new(MemoryStore::new());
        let (bus, _events) = ChannelBus::unbounded();

        let sweeper = Sweeper::new(store.clone(), Arc::new(bus), SweeperConfig::default());
        (sweeper, store)
    }

    fn trip_requested_at(requested_at: DateTime<Utc>) -> Trip {
        let mut trip = Trip::new(
            Uuid::new_v4(),
            Coordinates::new(37.7749, -122.4194),
            "pickup".into(),
            Coordinates::new(37.8044, -122.2712),
            "dropoff".into(),
            VehicleClass::Economy,
            "card".into(),
            None,
        );
        trip.requested_at = requested_at;
        trip
    }

    #[tokio::test]
    async fn stale_requested_trips_are_cancelled_by_admin() {
        let (sweeper, store) = sweeper();
        let now = Utc::now();

        // stuck for 11 minutes against a 10 minute timeout
        let stale = trip_requested_at(now - chrono::Duration::minutes(11));
        store.insert_trip(&stale).await.unwrap();

        let reclaimed = sweeper.sweep_once(now).await.unwrap();
        assert_eq!(reclaimed, 1);

        let stored = store.find_trip(stale.id).await.unwrap();
        assert_eq!(stored.status, Status::CancelledByAdmin);
        assert_eq!(
            stored.cancellation_reason.as_deref(),
            Some("no driver accepted")
        );

        let history = store.history_for_trip(stale.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, Status::CancelledByAdmin);
    }

    #[tokio::test]
    async fn fresh_and_accepted_trips_are_left_alone() {
        let (sweeper, store) = sweeper();
        let now = Utc::now();

        let fresh = trip_requested_at(now - chrono::Duration::minutes(5));
        store.insert_trip(&fresh).await.unwrap();

        let mut accepted = trip_requested_at(now - chrono::Duration::minutes(30));
        accepted
            .accept(Uuid::new_v4(), Uuid::new_v4(), now)
            .unwrap();
        store.insert_trip(&accepted).await.unwrap();

        let reclaimed = sweeper.sweep_once(now).await.unwrap();
        assert_eq!(reclaimed, 0);

        assert_eq!(
            store.find_trip(fresh.id).await.unwrap().status,
            Status::Requested
        );
        assert_eq!(
            store.find_trip(accepted.id).await.unwrap().status,
            Status::Accepted
        );
    }

    #[tokio::test]
    async fn sweeping_twice_is_a_no_op() {
        let (sweeper, store) = sweeper();
        let now = Utc::now();

        let stale = trip_requested_at(now - chrono::Duration::minutes(15));
        store.insert_trip(&stale).await.unwrap();

        assert_eq!(sweeper.sweep_once(now).await.unwrap(), 1);
        assert_eq!(sweeper.sweep_once(now).await.unwrap(), 0);

        // still exactly one history row
        let history = store.history_for_trip(stale.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn losing_the_race_to_an_accept_fails_cleanly() {
        let (sweeper, store) = sweeper();
        let now = Utc::now();

        let stale = trip_requested_at(now - chrono::Duration::minutes(15));
        store.insert_trip(&stale).await.unwrap();

        // snapshot taken by the scan, before a driver claims the trip
        let snapshot = store.find_trip(stale.id).await.unwrap();

        let mut claimed = store.find_trip(stale.id).await.unwrap();
        claimed.accept(Uuid::new_v4(), Uuid::new_v4(), now).unwrap();
        store
            .update_trip_checked(Status::Requested, &claimed)
            .await
            .unwrap();

        // the conditional write rejects the stale snapshot; the acceptance
        // survives and no history row is forged
        let err = sweeper.reclaim(snapshot, now).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidStatus);

        assert_eq!(
            store.find_trip(stale.id).await.unwrap().status,
            Status::Accepted
        );
        assert!(store.history_for_trip(stale.id).await.unwrap().is_empty());
    }
}
