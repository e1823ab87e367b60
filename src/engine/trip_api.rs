use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::api::{DispatchSummary, TripAPI, TripRequest};
use crate::dispatch::eta_minutes;
use crate::entities::{CancelActor, Status, Trip};
use crate::error::{
    driver_not_available_error, driver_not_verified_error, forbidden_error, invalid_status_error,
    rider_not_found_error, Error,
};
use crate::notify::{driver_offer_topic, TRIP_REQUESTED_TOPIC};

#[async_trait]
impl TripAPI for Engine {
    #[tracing::instrument(skip(self, request))]
    async fn request_trip(&self, request: TripRequest) -> Result<DispatchSummary, Error> {
        if !self.store.rider_exists(request.rider_id).await? {
            return Err(rider_not_found_error());
        }

        let trip = Trip::new(
            request.rider_id,
            request.pickup,
            request.pickup_address,
            request.dropoff,
            request.dropoff_address,
            request.vehicle_class,
            request.payment_method,
            request.scheduled_at,
        );

        self.store.insert_trip(&trip).await?;
        self.record_transition(&trip, None, Some("trip requested")).await;

        let outcome = self
            .dispatcher
            .match_drivers(
                self.store.as_ref(),
                &trip.pickup,
                Some(trip.vehicle_class),
                Utc::now(),
            )
            .await?;

        // everything from here on is best-effort fan-out; the trip has
        // already committed and stays `requested` either way
        self.publish_lossy(
            TRIP_REQUESTED_TOPIC,
            json!({
                "trip_id": trip.id,
                "vehicle_class": trip.vehicle_class,
                "search_radius_km": outcome.radius_km,
                "candidates": outcome.candidates.len(),
                "expanding": outcome.expanding,
            }),
        )
        .await;

        for candidate in &outcome.candidates {
            let offer = json!({
                "trip_id": trip.id,
                "pickup": trip.pickup,
                "pickup_address": trip.pickup_address,
                "dropoff": trip.dropoff,
                "dropoff_address": trip.dropoff_address,
                "vehicle_class": trip.vehicle_class,
                "fare_total": trip.fare.total,
                "distance_km": candidate.distance_km,
                "eta_minutes": eta_minutes(candidate.distance_km),
            });

            self.publish_lossy(&driver_offer_topic(candidate.driver_id), offer)
                .await;
        }

        Ok(DispatchSummary {
            trip,
            notified_drivers: outcome.candidates.len(),
            search_radius_km: outcome.radius_km,
            expanding: outcome.expanding,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error> {
        self.store.find_trip(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn accept_trip(
        &self,
        id: Uuid,
        driver_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<Trip, Error> {
        // eligibility is re-checked here, not just at dispatch time: the
        // presence may have changed between notification and acceptance
        let mut presence = self.store.find_presence(driver_id).await?;

        if !presence.verified {
            return Err(driver_not_verified_error());
        }

        let vehicle = presence
            .vehicle
            .as_ref()
            .ok_or_else(|| driver_not_available_error("driver has no vehicle on record"))?;

        if vehicle.id != vehicle_id {
            return Err(forbidden_error("vehicle does not belong to driver"));
        }

        if !vehicle.active {
            return Err(driver_not_available_error("vehicle is not active"));
        }

        presence.mark_busy()?;

        let mut trip = self.store.find_trip(id).await?;
        trip.accept(driver_id, vehicle_id, Utc::now())?;

        // the arbiter: a single conditional write decides the race
        self.store.assign_driver_if_unclaimed(&trip).await?;

        // the assignment has committed; a failed presence write leaves the
        // driver dispatchable until the next ping, which is only logged
        if let Err(err) = self.store.upsert_presence(&presence).await {
            tracing::warn!(%driver_id, error = ?err, "failed to mark accepting driver busy");
        }

        self.record_transition(&trip, Some(presence.coordinates), None)
            .await;
        self.announce_status(&trip).await;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn update_trip_status(
        &self,
        id: Uuid,
        driver_id: Uuid,
        new_status: Status,
    ) -> Result<Trip, Error> {
        let mut trip = self.store.find_trip(id).await?;

        if trip.driver_id != Some(driver_id) {
            return Err(forbidden_error("trip is not assigned to this driver"));
        }

        let expected = trip.status;
        let now = Utc::now();

        match new_status {
            Status::DriverArrived => trip.mark_arrived(now)?,
            Status::InProgress => trip.start(now)?,
            Status::Completed => trip.complete(now)?,
            _ => {
                return Err(invalid_status_error(format!(
                    "status {} cannot be set by a driver",
                    new_status.name()
                )))
            }
        }

        let mut earnings = None;
        if trip.status == Status::Completed {
            let settlement = self.settlement.settle(&trip);
            trip.fare.platform_fee = Some(settlement.platform_fee);
            trip.fare.driver_earnings = Some(settlement.driver_earnings);
            earnings = Some(settlement.driver_earnings);
        }

        self.store.update_trip_checked(expected, &trip).await?;

        if let Some(earnings) = earnings {
            // the completion has committed; a failed counter update must not
            // keep the driver out of the pool
            if let Err(err) = self.store.record_completion(driver_id, earnings).await {
                tracing::warn!(%driver_id, error = ?err, "failed to credit completed trip");
            }
            self.release_driver(driver_id).await;
        }

        self.record_transition(&trip, None, None).await;
        self.announce_status(&trip).await;

        Ok(trip)
    }

    #[tracing::instrument(skip(self, reason))]
    async fn cancel_trip(&self, id: Uuid, actor_id: Uuid, reason: String) -> Result<Trip, Error> {
        let mut trip = self.store.find_trip(id).await?;

        let actor = if actor_id == trip.rider_id {
            CancelActor::Rider
        } else if trip.driver_id == Some(actor_id) {
            CancelActor::Driver
        } else {
            return Err(forbidden_error("actor is not a participant in this trip"));
        };

        let expected = trip.status;
        let freed = trip.cancel(actor, reason, Utc::now())?;

        self.store.update_trip_checked(expected, &trip).await?;

        if let Some(driver_id) = freed {
            self.release_driver(driver_id).await;
        }

        self.record_transition(&trip, None, trip.cancellation_reason.as_deref())
            .await;
        self.announce_status(&trip).await;

        Ok(trip)
    }
}

impl Engine {
    /// Put a driver back in the pool after completion or cancellation. The
    /// trip transition has already committed, so a presence failure is only
    /// logged.
    async fn release_driver(&self, driver_id: Uuid) {
        match self.store.find_presence(driver_id).await {
            Ok(mut presence) => {
                presence.release();
                if let Err(err) = self.store.upsert_presence(&presence).await {
                    tracing::warn!(%driver_id, error = ?err, "failed to release driver");
                }
            }
            Err(err) => {
                tracing::warn!(%driver_id, error = ?err, "no presence record for assigned driver")
            }
        }
    }
}
