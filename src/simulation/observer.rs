//! Tick observers
//!
//! Whoever draws the simulation registers an observer with the clock and is
//! called once per tick, after every vehicle has been updated.

use log::{debug, log_enabled, Level};

use super::units::{meters_to_pixels, mps_to_kph};
use super::world::SimWorld;

/// Read-only view of the world handed to observers after a tick
#[derive(Debug, Clone, Copy)]
pub struct TickFrame<'a> {
    /// Number of ticks completed, this one included
    pub tick: u64,
    /// Delta the tick was run with, in simulated seconds
    pub delta: f64,
    /// Pixels per meter of the display
    pub scale: f64,
    pub world: &'a SimWorld,
}

/// Receives a notification after each tick
pub trait TickObserver: Send {
    fn on_tick(&mut self, frame: &TickFrame<'_>);
}

/// Logs every vehicle in display units every `every` ticks
#[derive(Debug, Clone)]
pub struct LogObserver {
    every: u64,
}

impl LogObserver {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(25)
    }
}

impl TickObserver for LogObserver {
    fn on_tick(&mut self, frame: &TickFrame<'_>) {
        if frame.tick % self.every != 0 || !log_enabled!(Level::Debug) {
            return;
        }

        debug!(
            "Tick {} at {:.2}s (delta {}s)",
            frame.tick,
            frame.world.time(),
            frame.delta
        );
        for vehicle in frame.world.vehicles() {
            debug!(
                "  vehicle {}: x={}px, {:.1}km/h",
                vehicle.id().index(),
                meters_to_pixels(frame.scale, vehicle.position()),
                mps_to_kph(vehicle.speed())
            );
        }
    }
}
