use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Coordinates;
use crate::error::{driver_not_available_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Online,
    Busy,
    Offline,
    Pending,
    Suspended,
}

impl Availability {
    pub fn name(&self) -> String {
        match self {
            Self::Online => "online".into(),
            Self::Busy => "busy".into(),
            Self::Offline => "offline".into(),
            Self::Pending => "pending".into(),
            Self::Suspended => "suspended".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Economy,
    Comfort,
    Premium,
    Van,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub class: VehicleClass,
    pub active: bool,
}

/// A driver's last known position, availability and reputation snapshot.
/// One record per driver, overwritten in place on every ping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverPresence {
    pub id: Uuid,
    pub coordinates: Coordinates,
    pub heading: f64,
    pub speed: f64,
    pub recorded_at: DateTime<Utc>,
    pub availability: Availability,
    pub verified: bool,
    pub rating: f64,
    pub acceptance_rate: Option<f64>,
    pub completion_rate: Option<f64>,
    pub vehicle: Option<Vehicle>,
}

impl DriverPresence {
    pub fn new(id: Uuid, coordinates: Coordinates, vehicle: Option<Vehicle>) -> Self {
        Self {
            id,
            coordinates,
            heading: 0.0,
            speed: 0.0,
            recorded_at: Utc::now(),
            availability: Availability::Offline,
            verified: false,
            rating: 5.0,
            acceptance_rate: None,
            completion_rate: None,
            vehicle,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.recorded_at <= window
    }

    /// Eligible for a dispatch cycle: online, verified, active vehicle and a
    /// location ping inside the freshness window. Stale coordinates exclude
    /// the driver even when everything else checks out.
    pub fn is_dispatchable(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.availability == Availability::Online
            && self.verified
            && self.vehicle.as_ref().map_or(false, |v| v.active)
            && self.is_fresh(now, window)
    }

    pub fn record_ping(
        &mut self,
        coordinates: Coordinates,
        heading: f64,
        speed: f64,
        now: DateTime<Utc>,
    ) {
        self.coordinates = coordinates;
        self.heading = heading;
        self.speed = speed;
        self.recorded_at = now;
    }

    pub fn mark_busy(&mut self) -> Result<(), Error> {
        match self.availability {
            Availability::Online => {
                self.availability = Availability::Busy;
                Ok(())
            }
            _ => Err(driver_not_available_error(format!(
                "driver is {}",
                self.availability.name()
            ))),
        }
    }

    /// Release after a completed or cancelled trip. A no-op for any state
    /// other than busy, so suspensions applied mid-trip stick.
    pub fn release(&mut self) {
        if self.availability == Availability::Busy {
            self.availability = Availability::Online;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online_presence() -> DriverPresence {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            class: VehicleClass::Economy,
            active: true,
        };

        let mut presence =
            DriverPresence::new(Uuid::new_v4(), Coordinates::new(0.0, 0.0), Some(vehicle));
        presence.availability = Availability::Online;
        presence.verified = true;
        presence
    }

    #[test]
    fn stale_ping_is_not_dispatchable() {
        let now = Utc::now();
        let mut presence = online_presence();
        presence.recorded_at = now - Duration::minutes(11);

        assert!(!presence.is_dispatchable(now, Duration::minutes(10)));

        presence.record_ping(Coordinates::new(1.0, 1.0), 90.0, 30.0, now);
        assert!(presence.is_dispatchable(now, Duration::minutes(10)));
    }

    #[test]
    fn unverified_driver_is_not_dispatchable() {
        let now = Utc::now();
        let mut presence = online_presence();
        presence.verified = false;

        assert!(!presence.is_dispatchable(now, Duration::minutes(10)));
    }

    #[test]
    fn inactive_vehicle_is_not_dispatchable() {
        let now = Utc::now();
        let mut presence = online_presence();
        presence.vehicle.as_mut().unwrap().active = false;

        assert!(!presence.is_dispatchable(now, Duration::minutes(10)));
    }

    #[test]
    fn busy_then_release_round_trip() {
        let mut presence = online_presence();

        presence.mark_busy().unwrap();
        assert_eq!(presence.availability, Availability::Busy);
        assert!(presence.mark_busy().is_err());

        presence.release();
        assert_eq!(presence.availability, Availability::Online);
    }

    #[test]
    fn release_leaves_suspended_driver_suspended() {
        let mut presence = online_presence();
        presence.availability = Availability::Suspended;

        presence.release();
        assert_eq!(presence.availability, Availability::Suspended);
    }
}
