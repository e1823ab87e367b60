use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{
    Availability, Coordinates, DriverPresence, Status, Trip, Vehicle, VehicleClass,
};
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripRequest {
    pub rider_id: Uuid,
    pub pickup: Coordinates,
    pub pickup_address: String,
    pub dropoff: Coordinates,
    pub dropoff_address: String,
    pub vehicle_class: VehicleClass,
    pub payment_method: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// What the rider gets back from a request: the stored trip plus a summary
/// of the dispatch cycle that ran for it.
#[derive(Clone, Debug, Serialize)]
pub struct DispatchSummary {
    pub trip: Trip,
    pub notified_drivers: usize,
    pub search_radius_km: f64,
    pub expanding: bool,
}

#[async_trait]
pub trait TripAPI {
    async fn request_trip(&self, request: TripRequest) -> Result<DispatchSummary, Error>;
    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error>;
    async fn accept_trip(&self, id: Uuid, driver_id: Uuid, vehicle_id: Uuid)
        -> Result<Trip, Error>;
    async fn update_trip_status(
        &self,
        id: Uuid,
        driver_id: Uuid,
        new_status: Status,
    ) -> Result<Trip, Error>;
    async fn cancel_trip(&self, id: Uuid, actor_id: Uuid, reason: String) -> Result<Trip, Error>;
}

#[async_trait]
pub trait PresenceAPI {
    async fn create_driver(
        &self,
        driver_id: Uuid,
        coordinates: Coordinates,
        vehicle: Vehicle,
        verified: bool,
    ) -> Result<DriverPresence, Error>;
    async fn find_driver(&self, driver_id: Uuid) -> Result<DriverPresence, Error>;
    async fn update_driver_location(
        &self,
        driver_id: Uuid,
        latitude: f64,
        longitude: f64,
        heading: f64,
        speed: f64,
    ) -> Result<(), Error>;
    async fn set_driver_availability(
        &self,
        driver_id: Uuid,
        availability: Availability,
    ) -> Result<DriverPresence, Error>;
}

pub trait API: TripAPI + PresenceAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
