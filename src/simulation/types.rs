//! Core types for the car-following simulation

use std::time::Duration;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for vehicle IDs
///
/// The inner id is the vehicle's slot in the world's vehicle arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

impl VehicleId {
    pub fn index(self) -> usize {
        self.0 .0
    }
}

/// What a controller is allowed to see of the road ahead when it updates a
/// vehicle. Captured for every vehicle before any vehicle of the tick moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surroundings {
    /// Bumper-to-bumper gap to the leader, `f64::INFINITY` without one
    pub front_distance: f64,
    /// Leader speed, if there is a leader
    pub front_speed: Option<f64>,
}

impl Surroundings {
    /// An unobstructed road
    pub fn free() -> Self {
        Self {
            front_distance: f64::INFINITY,
            front_speed: None,
        }
    }

    pub fn has_leader(&self) -> bool {
        self.front_distance.is_finite()
    }
}

impl Default for Surroundings {
    fn default() -> Self {
        Self::free()
    }
}

/// Simulated seconds advanced by one tick until changed
pub const DEFAULT_DELTA: f64 = 0.3;

/// Wall-clock cadence of the tick loop
pub const UPDATE_RATE: Duration = Duration::from_millis(40);

/// Hardest braking any controller will command, in m/s^2
pub const MAX_DECELERATION: f64 = 9.0;

/// Smallest gap fed into a car-following law, avoids dividing by zero
pub const MIN_EFFECTIVE_GAP: f64 = 0.01;
