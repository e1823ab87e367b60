mod presence_api;
mod trip_api;

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::API;
use crate::dispatch::{DispatchConfig, Dispatcher};
use crate::entities::{Coordinates, Trip, TripStatusChange};
use crate::notify::{trip_status_topic, Notifier};
use crate::payment::SettlementCalculator;
use crate::store::DynStore;

pub struct Engine {
    store: DynStore,
    notifier: Arc<dyn Notifier>,
    settlement: Arc<dyn SettlementCalculator>,
    dispatcher: Dispatcher,
}

impl Engine {
    pub fn new(
        store: DynStore,
        notifier: Arc<dyn Notifier>,
        settlement: Arc<dyn SettlementCalculator>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            settlement,
            dispatcher: Dispatcher::new(config),
        }
    }
}

impl Engine {
    /// Fire-and-forget publish: delivery failures are logged, never surfaced
    /// to the caller.
    pub(crate) async fn publish_lossy(&self, topic: &str, payload: Value) {
        if let Err(err) = self.notifier.publish(topic, payload).await {
            tracing::warn!(topic, error = ?err, "dropping notification");
        }
    }

    pub(crate) async fn announce_status(&self, trip: &Trip) {
        self.publish_lossy(
            &trip_status_topic(trip.id),
            json!({
                "trip_id": trip.id,
                "status": trip.status,
                "driver_id": trip.driver_id,
            }),
        )
        .await;
    }

    /// One audit row per accepted transition. The transition itself has
    /// already committed, so an append failure only gets logged.
    pub(crate) async fn record_transition(
        &self,
        trip: &Trip,
        coordinates: Option<Coordinates>,
        note: Option<&str>,
    ) {
        let row = TripStatusChange {
            trip_id: trip.id,
            status: trip.status,
            recorded_at: Utc::now(),
            coordinates,
            note: note.map(Into::into),
        };

        if let Err(err) = self.store.append_history(&row).await {
            tracing::warn!(error = ?err, "failed to append trip status history");
        }
    }
}

impl API for Engine {}
