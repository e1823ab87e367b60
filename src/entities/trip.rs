use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Coordinates, VehicleClass};
use crate::error::{
    invalid_status_error, trip_cannot_be_cancelled_error, trip_not_available_error, Error,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Requested,
    Accepted,
    DriverArrived,
    InProgress,
    Completed,
    CancelledByRider,
    CancelledByDriver,
    CancelledByAdmin,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Requested => "requested".into(),
            Self::Accepted => "accepted".into(),
            Self::DriverArrived => "driver_arrived".into(),
            Self::InProgress => "in_progress".into(),
            Self::Completed => "completed".into(),
            Self::CancelledByRider => "cancelled_by_rider".into(),
            Self::CancelledByDriver => "cancelled_by_driver".into(),
            Self::CancelledByAdmin => "cancelled_by_admin".into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::CancelledByRider
                | Self::CancelledByDriver
                | Self::CancelledByAdmin
        )
    }

    /// States in which the trip must carry a driver assignment.
    pub fn carries_driver(&self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::DriverArrived | Self::InProgress | Self::Completed
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelActor {
    Rider,
    Driver,
    Admin,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fare {
    pub base: f64,
    pub distance: f64,
    pub time: f64,
    pub surge: f64,
    pub discount: f64,
    pub total: f64,
    pub platform_fee: Option<f64>,
    pub driver_earnings: Option<f64>,
}

impl Fare {
    const BASE: f64 = 2.5;
    const PER_KM: f64 = 1.2;

    /// Up-front estimate from the straight-line trip distance. The fare curve
    /// itself belongs to the pricing collaborator; this only has to produce a
    /// plausible total for the settlement split to act on.
    pub fn estimate(distance_km: f64) -> Self {
        let distance = Self::PER_KM * distance_km;

        Self {
            base: Self::BASE,
            distance,
            time: 0.0,
            surge: 0.0,
            discount: 0.0,
            total: Self::BASE + distance,
            platform_fee: None,
            driver_earnings: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub status: Status,
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub pickup: Coordinates,
    pub pickup_address: String,
    pub dropoff: Coordinates,
    pub dropoff_address: String,
    pub vehicle_class: VehicleClass,
    pub fare: Fare,
    pub payment_method: String,
    pub scheduled: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancellation_fee: Option<f64>,
}

/// Append-only audit row, one per accepted transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripStatusChange {
    pub trip_id: Uuid,
    pub status: Status,
    pub recorded_at: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
    pub note: Option<String>,
}

impl Trip {
    pub fn new(
        rider_id: Uuid,
        pickup: Coordinates,
        pickup_address: String,
        dropoff: Coordinates,
        dropoff_address: String,
        vehicle_class: VehicleClass,
        payment_method: String,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Self {
        let distance = super::location::distance_km(&pickup, &dropoff);

        Self {
            id: Uuid::new_v4(),
            status: Status::Requested,
            rider_id,
            driver_id: None,
            vehicle_id: None,
            pickup,
            pickup_address,
            dropoff,
            dropoff_address,
            vehicle_class,
            fare: Fare::estimate(distance),
            payment_method,
            scheduled: scheduled_at.is_some(),
            scheduled_at,
            requested_at: Utc::now(),
            accepted_at: None,
            arrived_at: None,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            cancellation_fee: None,
        }
    }

    /// Claim the trip for a driver. Mirrors the store's conditional update:
    /// only an unclaimed, still-requested trip can be taken.
    #[tracing::instrument]
    pub fn accept(
        &mut self,
        driver_id: Uuid,
        vehicle_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        match self.status {
            Status::Requested if self.driver_id.is_none() => {
                self.status = Status::Accepted;
                self.driver_id = Some(driver_id);
                self.vehicle_id = Some(vehicle_id);
                self.accepted_at = Some(now);
                Ok(())
            }
            _ => Err(trip_not_available_error()),
        }
    }

    #[tracing::instrument]
    pub fn mark_arrived(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::Accepted => {
                self.status = Status::DriverArrived;
                self.arrived_at = Some(now);
                Ok(())
            }
            _ => Err(invalid_status_error(format!(
                "cannot mark arrival from {}",
                self.status.name()
            ))),
        }
    }

    #[tracing::instrument]
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::DriverArrived => {
                self.status = Status::InProgress;
                self.started_at = Some(now);
                Ok(())
            }
            _ => Err(invalid_status_error(format!(
                "cannot start trip from {}",
                self.status.name()
            ))),
        }
    }

    #[tracing::instrument]
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::InProgress => {
                self.status = Status::Completed;
                self.completed_at = Some(now);
                Ok(())
            }
            _ => Err(invalid_status_error(format!(
                "cannot complete trip from {}",
                self.status.name()
            ))),
        }
    }

    /// Cancel, enforcing the per-actor legality table. Cancelled trips carry
    /// no assignment, so the driver and vehicle are cleared; the freed driver
    /// is returned for release back to the pool.
    #[tracing::instrument]
    pub fn cancel(
        &mut self,
        actor: CancelActor,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, Error> {
        let status = match (self.status, actor) {
            (Status::Requested, CancelActor::Rider) => Status::CancelledByRider,
            (Status::Requested, CancelActor::Admin) => Status::CancelledByAdmin,
            (Status::Accepted, CancelActor::Rider) => Status::CancelledByRider,
            (Status::Accepted, CancelActor::Driver) => Status::CancelledByDriver,
            _ => return Err(trip_cannot_be_cancelled_error()),
        };

        self.status = status;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason);
        self.vehicle_id = None;

        Ok(self.driver_id.take())
    }
}
