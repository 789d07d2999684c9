//! Vehicle state for the car-following simulation
//!
//! A vehicle is a point on the road reference line with a length, a speed
//! clamped to its maximum, and an optional non-owning link to the vehicle
//! directly ahead.

use std::sync::Arc;

use super::controller::VehicleController;
use super::error::{Result, SimError};
use super::types::VehicleId;

/// A vehicle in the simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    id: VehicleId,
    length: f64,
    max_speed: f64,
    position: f64,
    speed: f64,
    /// The vehicle directly ahead, by id into the owning world
    front_vehicle: Option<VehicleId>,
    /// Car-following law, possibly shared with other vehicles
    controller: Arc<VehicleController>,
}

impl SimVehicle {
    /// Create a stationary vehicle at position 0
    ///
    /// Fails with `InvalidParameter` unless `length` and `max_speed` are
    /// finite and strictly positive.
    pub fn new(
        id: VehicleId,
        length: f64,
        max_speed: f64,
        controller: Arc<VehicleController>,
    ) -> Result<Self> {
        if !length.is_finite() || length <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "vehicle length must be finite and > 0, got {length}"
            )));
        }
        if !max_speed.is_finite() || max_speed <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "vehicle max speed must be finite and > 0, got {max_speed}"
            )));
        }

        Ok(Self {
            id,
            length,
            max_speed,
            position: 0.0,
            speed: 0.0,
            front_vehicle: None,
            controller,
        })
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    /// Store `speed` clamped to `[-max_speed, max_speed]`
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(-self.max_speed, self.max_speed);
    }

    pub fn front_vehicle(&self) -> Option<VehicleId> {
        self.front_vehicle
    }

    /// Point this vehicle at the one directly ahead, or clear the link with `None`
    ///
    /// The other vehicle is not touched. A vehicle cannot follow itself.
    /// Links are changed through `SimWorld::set_front_vehicle`, which also
    /// checks that `front` exists.
    pub(crate) fn set_front_vehicle(&mut self, front: Option<VehicleId>) -> Result<()> {
        if front == Some(self.id) {
            return Err(SimError::InvalidParameter(format!(
                "vehicle {:?} cannot follow itself",
                self.id
            )));
        }
        self.front_vehicle = front;
        Ok(())
    }

    pub fn controller(&self) -> &Arc<VehicleController> {
        &self.controller
    }

    pub fn set_controller(&mut self, controller: Arc<VehicleController>) {
        self.controller = controller;
    }

    /// Gap between the rear of `leader` and the front of this vehicle
    ///
    /// Positions are vehicle centres, so half of each length is taken off.
    /// Negative when the two overlap.
    pub fn gap_to(&self, leader: &SimVehicle) -> f64 {
        leader.position - self.position - (self.length / 2.0 + leader.length / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::controller::VehicleControllerType;
    use crate::simulation::profile::VehicleProfile;
    use crate::simulation::types::SimId;

    fn vehicle(id: usize, length: f64, max_speed: f64) -> SimVehicle {
        let controller = VehicleProfile::default().controller(VehicleControllerType::Autonomous);
        SimVehicle::new(VehicleId(SimId(id)), length, max_speed, controller).unwrap()
    }

    #[test]
    fn construction_rejects_non_positive_dimensions() {
        let controller = VehicleProfile::default().controller(VehicleControllerType::Autonomous);
        let id = VehicleId(SimId(0));
        for (length, max_speed) in [(0.0, 10.0), (-1.0, 10.0), (1.0, 0.0), (1.0, -3.0), (f64::NAN, 1.0)] {
            let result = SimVehicle::new(id, length, max_speed, Arc::clone(&controller));
            assert!(matches!(result, Err(SimError::InvalidParameter(_))));
        }
    }

    #[test]
    fn speed_is_clamped_both_ways() {
        let mut v = vehicle(0, 1.6, 145.2);
        v.set_speed(250.0);
        assert_eq!(v.speed(), 145.2);
        v.set_speed(-250.0);
        assert_eq!(v.speed(), -145.2);
        v.set_speed(63.5);
        assert_eq!(v.speed(), 63.5);
    }

    #[test]
    fn self_link_is_rejected() {
        let mut v = vehicle(3, 1.6, 145.2);
        assert!(v.set_front_vehicle(Some(VehicleId(SimId(3)))).is_err());
        assert_eq!(v.front_vehicle(), None);
        v.set_front_vehicle(Some(VehicleId(SimId(4)))).unwrap();
        assert_eq!(v.front_vehicle(), Some(VehicleId(SimId(4))));
        v.set_front_vehicle(None).unwrap();
        assert_eq!(v.front_vehicle(), None);
    }

    #[test]
    fn gap_subtracts_half_lengths() {
        let mut follower = vehicle(0, 1.6, 145.2);
        let mut leader = vehicle(1, 1.7, 145.2);
        follower.set_position(50.0);
        leader.set_position(120.0);
        assert!((follower.gap_to(&leader) - 68.35).abs() < 1e-9);

        leader.set_position(50.5);
        assert!(follower.gap_to(&leader) < 0.0);
    }
}
