use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DriverStats, Store};
use crate::entities::{DriverPresence, Status, Trip, TripStatusChange};
use crate::error::{
    driver_not_found_error, invalid_status_error, trip_not_available_error, trip_not_found_error,
    Error,
};

#[derive(Default)]
struct Inner {
    riders: HashSet<Uuid>,
    trips: HashMap<Uuid, Trip>,
    history: Vec<TripStatusChange>,
    presence: HashMap<Uuid, DriverPresence>,
    stats: HashMap<Uuid, DriverStats>,
}

/// In-process store. A single `RwLock` over the whole state keeps the
/// conditional trip writes trivially atomic: the check and the write happen
/// under one write guard.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_rider(&self, id: Uuid) -> Result<(), Error> {
        self.inner.write().await.riders.insert(id);
        Ok(())
    }

    async fn rider_exists(&self, id: Uuid) -> Result<bool, Error> {
        Ok(self.inner.read().await.riders.contains(&id))
    }

    async fn insert_trip(&self, trip: &Trip) -> Result<(), Error> {
        self.inner.write().await.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error> {
        self.inner
            .read()
            .await
            .trips
            .get(&id)
            .cloned()
            .ok_or_else(trip_not_found_error)
    }

    async fn assign_driver_if_unclaimed(&self, trip: &Trip) -> Result<(), Error> {
        let mut inner = self.inner.write().await;

        let current = inner.trips.get(&trip.id).ok_or_else(trip_not_found_error)?;

        if current.status != Status::Requested || current.driver_id.is_some() {
            return Err(trip_not_available_error());
        }

        inner.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn update_trip_checked(&self, expected: Status, trip: &Trip) -> Result<(), Error> {
        let mut inner = self.inner.write().await;

        let current = inner.trips.get(&trip.id).ok_or_else(trip_not_found_error)?;

        if current.status != expected {
            return Err(invalid_status_error(format!(
                "trip moved to {} concurrently",
                current.status.name()
            )));
        }

        inner.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn requested_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Trip>, Error> {
        let inner = self.inner.read().await;

        Ok(inner
            .trips
            .values()
            .filter(|t| t.status == Status::Requested && t.requested_at < cutoff)
            .cloned()
            .collect())
    }

    async fn append_history(&self, row: &TripStatusChange) -> Result<(), Error> {
        self.inner.write().await.history.push(row.clone());
        Ok(())
    }

    async fn history_for_trip(&self, trip_id: Uuid) -> Result<Vec<TripStatusChange>, Error> {
        let inner = self.inner.read().await;

        Ok(inner
            .history
            .iter()
            .filter(|row| row.trip_id == trip_id)
            .cloned()
            .collect())
    }

    async fn upsert_presence(&self, presence: &DriverPresence) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .presence
            .insert(presence.id, presence.clone());
        Ok(())
    }

    async fn find_presence(&self, driver_id: Uuid) -> Result<DriverPresence, Error> {
        self.inner
            .read()
            .await
            .presence
            .get(&driver_id)
            .cloned()
            .ok_or_else(driver_not_found_error)
    }

    async fn list_presence(&self) -> Result<Vec<DriverPresence>, Error> {
        Ok(self.inner.read().await.presence.values().cloned().collect())
    }

    async fn record_completion(&self, driver_id: Uuid, earnings: f64) -> Result<(), Error> {
        let mut inner = self.inner.write().await;

        let stats = inner.stats.entry(driver_id).or_default();
        stats.completed_trips += 1;
        stats.available_balance += earnings;

        Ok(())
    }

    async fn driver_stats(&self, driver_id: Uuid) -> Result<DriverStats, Error> {
        Ok(self
            .inner
            .read()
            .await
            .stats
            .get(&driver_id)
            .copied()
            .unwrap_or_default())
    }
}
