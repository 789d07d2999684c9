//! Car-following simulation core
//!
//! Vehicles move along a one-dimensional road reference line. Each tick,
//! every vehicle's controller looks at the gap to the vehicle directly ahead
//! and updates the vehicle's speed and position. Nothing here depends on a
//! renderer or on road geometry; a display registers a [`TickObserver`].

mod clock;
mod controller;
mod error;
mod observer;
mod profile;
mod scenario;
mod types;
mod units;
mod vehicle;
mod world;

pub use clock::{DeltaHandle, SimulationClock};
pub use controller::{ControllerParams, VehicleController, VehicleControllerType};
pub use error::{Result, SimError};
pub use observer::{LogObserver, TickFrame, TickObserver};
pub use profile::{ProfileLibrary, VehicleProfile, BUILTIN_PROFILES};
pub use scenario::{generate_traffic, ScenarioType, WALL_POSITION};
pub use types::{
    SimId, Surroundings, VehicleId, DEFAULT_DELTA, MAX_DECELERATION, MIN_EFFECTIVE_GAP,
    UPDATE_RATE,
};
pub use units::{kph_to_mps, meters_to_pixels, mps_to_kph, pixels_to_meters};
pub use vehicle::SimVehicle;
pub use world::SimWorld;
