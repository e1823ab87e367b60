mod candidate;
mod driver;
mod location;
mod trip;

pub use candidate::Candidate;
pub use driver::{Availability, DriverPresence, Vehicle, VehicleClass};
pub use location::{distance_km, Coordinates};
pub use trip::{CancelActor, Fare, Status, Trip, TripStatusChange};
