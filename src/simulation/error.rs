//! Error types for the car-following simulation

use thiserror::Error;

use super::types::VehicleId;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by the simulation core.
///
/// Out-of-range speeds and missing front vehicles are not errors: speeds are
/// clamped and a missing leader is an unobstructed road.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A construction value or argument is out of its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An operation was called in a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The id does not refer to a vehicle of this world.
    #[error("unknown vehicle {0:?}")]
    UnknownVehicle(VehicleId),

    /// The front-vehicle relation loops back onto itself.
    #[error("front-vehicle chain contains a cycle through {0:?}")]
    FollowCycle(VehicleId),

    /// A vehicle profile could not be resolved or parsed.
    #[error("profile error: {0}")]
    Profile(String),
}
