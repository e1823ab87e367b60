mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{DriverPresence, Status, Trip, TripStatusChange};
use crate::error::Error;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DriverStats {
    pub completed_trips: i64,
    pub available_balance: f64,
}

/// Persistence contract of the dispatch engine: plain CRUD everywhere except
/// for the two conditional trip writes, which must be atomic against
/// concurrent writers.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_rider(&self, id: Uuid) -> Result<(), Error>;
    async fn rider_exists(&self, id: Uuid) -> Result<bool, Error>;

    async fn insert_trip(&self, trip: &Trip) -> Result<(), Error>;
    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error>;

    /// The accept-race arbiter's write: persist `trip` only if the stored row
    /// is still `requested` with no driver assigned, as one indivisible
    /// operation. Losers get `TRIP_NOT_AVAILABLE`.
    async fn assign_driver_if_unclaimed(&self, trip: &Trip) -> Result<(), Error>;

    /// Status-guarded write used by every other transition: persist `trip`
    /// only if the stored row still has status `expected`.
    async fn update_trip_checked(&self, expected: Status, trip: &Trip) -> Result<(), Error>;

    /// Trips still `requested` that were created before `cutoff` (sweeper
    /// scan).
    async fn requested_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Trip>, Error>;

    async fn append_history(&self, row: &TripStatusChange) -> Result<(), Error>;
    async fn history_for_trip(&self, trip_id: Uuid) -> Result<Vec<TripStatusChange>, Error>;

    async fn upsert_presence(&self, presence: &DriverPresence) -> Result<(), Error>;
    async fn find_presence(&self, driver_id: Uuid) -> Result<DriverPresence, Error>;
    async fn list_presence(&self) -> Result<Vec<DriverPresence>, Error>;

    /// Atomic counter update: bump the driver's completed-trip count and
    /// credit earnings to the available balance.
    async fn record_completion(&self, driver_id: Uuid, earnings: f64) -> Result<(), Error>;
    async fn driver_stats(&self, driver_id: Uuid) -> Result<DriverStats, Error>;
}

pub type DynStore = Arc<dyn Store>;
