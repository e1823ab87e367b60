use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{DispatchSummary, DynAPI, TripRequest};
use crate::entities::{Status, Trip};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct AcceptParams {
    driver_id: Uuid,
    vehicle_id: Uuid,
}

#[derive(Serialize, Deserialize)]
pub struct StatusParams {
    driver_id: Uuid,
    status: Status,
}

#[derive(Serialize, Deserialize)]
pub struct CancelParams {
    actor_id: Uuid,
    reason: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<TripRequest>,
) -> Result<Json<DispatchSummary>, Error> {
    let summary = api.request_trip(params).await?;

    Ok(summary.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.find_trip(id).await?;

    Ok(trip.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<AcceptParams>,
) -> Result<Json<Trip>, Error> {
    let trip = api
        .accept_trip(id, params.driver_id, params.vehicle_id)
        .await?;

    Ok(trip.into())
}

pub async fn update_status(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<StatusParams>,
) -> Result<Json<Trip>, Error> {
    let trip = api
        .update_trip_status(id, params.driver_id, params.status)
        .await?;

    Ok(trip.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<CancelParams>,
) -> Result<Json<Trip>, Error> {
    let trip = api.cancel_trip(id, params.actor_id, params.reason).await?;

    Ok(trip.into())
}
