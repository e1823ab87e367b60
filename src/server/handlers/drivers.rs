use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{Availability, Coordinates, DriverPresence, Vehicle};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    driver_id: Uuid,
    latitude: f64,
    longitude: f64,
    vehicle: Vehicle,
    verified: bool,
}

#[derive(Serialize, Deserialize)]
pub struct LocationParams {
    latitude: f64,
    longitude: f64,
    heading: f64,
    speed: f64,
}

#[derive(Serialize, Deserialize)]
pub struct AvailabilityParams {
    availability: Availability,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CreateParams>,
) -> Result<Json<DriverPresence>, Error> {
    let presence = api
        .create_driver(
            params.driver_id,
            Coordinates::new(params.latitude, params.longitude),
            params.vehicle,
            params.verified,
        )
        .await?;

    Ok(presence.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverPresence>, Error> {
    let presence = api.find_driver(id).await?;

    Ok(presence.into())
}

pub async fn update_location(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<LocationParams>,
) -> Result<Json<()>, Error> {
    api.update_driver_location(
        id,
        params.latitude,
        params.longitude,
        params.heading,
        params.speed,
    )
    .await?;

    Ok(().into())
}

pub async fn set_availability(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<AvailabilityParams>,
) -> Result<Json<DriverPresence>, Error> {
    let presence = api.set_driver_availability(id, params.availability).await?;

    Ok(presence.into())
}
