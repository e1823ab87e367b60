use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::api::PresenceAPI;
use crate::entities::{Availability, Coordinates, DriverPresence, Vehicle};
use crate::error::Error;

#[async_trait]
impl PresenceAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_driver(
        &self,
        driver_id: Uuid,
        coordinates: Coordinates,
        vehicle: Vehicle,
        verified: bool,
    ) -> Result<DriverPresence, Error> {
        // the verification decision itself belongs to onboarding; this only
        // records its outcome
        let mut presence = DriverPresence::new(driver_id, coordinates, Some(vehicle));
        presence.verified = verified;

        self.store.upsert_presence(&presence).await?;

        Ok(presence)
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver(&self, driver_id: Uuid) -> Result<DriverPresence, Error> {
        self.store.find_presence(driver_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_driver_location(
        &self,
        driver_id: Uuid,
        latitude: f64,
        longitude: f64,
        heading: f64,
        speed: f64,
    ) -> Result<(), Error> {
        let mut presence = self.store.find_presence(driver_id).await?;

        // latest ping wins; only the freshness cutoff matters, not ordering
        presence.record_ping(
            Coordinates::new(latitude, longitude),
            heading,
            speed,
            Utc::now(),
        );

        self.store.upsert_presence(&presence).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_driver_availability(
        &self,
        driver_id: Uuid,
        availability: Availability,
    ) -> Result<DriverPresence, Error> {
        let mut presence = self.store.find_presence(driver_id).await?;
        presence.availability = availability;

        self.store.upsert_presence(&presence).await?;

        Ok(presence)
    }
}
