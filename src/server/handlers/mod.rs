pub mod drivers;
pub mod trips;
