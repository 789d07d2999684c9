//! Simulation world: the vehicle arena and the front-vehicle chain
//!
//! Vehicles live in a flat arena and refer to the vehicle ahead by
//! `VehicleId`. One call to [`SimWorld::tick`] advances every vehicle by the
//! same step, with every controller reading the state as it stood at the
//! start of the tick.

use log::{debug, trace};
use ordered_float::OrderedFloat;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::controller::{VehicleController, VehicleControllerType};
use super::error::{Result, SimError};
use super::profile::VehicleProfile;
use super::types::{SimId, Surroundings, VehicleId};
use super::units::mps_to_kph;
use super::vehicle::SimVehicle;

/// The main simulation world
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    /// All vehicles, indexed by `VehicleId`
    vehicles: Vec<SimVehicle>,

    /// Simulated seconds elapsed over all ticks
    time: f64,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_vehicle_id(&self) -> VehicleId {
        VehicleId(SimId(self.vehicles.len()))
    }

    /// Add a stationary vehicle at position 0
    pub fn add_vehicle(
        &mut self,
        length: f64,
        max_speed: f64,
        controller: Arc<VehicleController>,
    ) -> Result<VehicleId> {
        let id = self.next_vehicle_id();
        let vehicle = SimVehicle::new(id, length, max_speed, controller)?;
        trace!("Added vehicle {:?} (length {}, max speed {})", id, length, max_speed);
        self.vehicles.push(vehicle);
        Ok(id)
    }

    /// Add a vehicle sized by `profile` with its own controller of type `kind`
    ///
    /// Use [`VehicleProfile::controller`] with [`SimWorld::add_vehicle`] to
    /// share one controller between many vehicles.
    pub fn add_vehicle_from_profile(
        &mut self,
        profile: &VehicleProfile,
        kind: VehicleControllerType,
    ) -> Result<VehicleId> {
        profile.validate()?;
        self.add_vehicle(profile.length, profile.max_speed, profile.controller(kind))
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.get(id.index())
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut SimVehicle> {
        self.vehicles.get_mut(id.index())
    }

    fn get(&self, id: VehicleId) -> Result<&SimVehicle> {
        self.vehicle(id).ok_or(SimError::UnknownVehicle(id))
    }

    fn get_mut(&mut self, id: VehicleId) -> Result<&mut SimVehicle> {
        self.vehicle_mut(id).ok_or(SimError::UnknownVehicle(id))
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &SimVehicle> {
        self.vehicles.iter()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Simulated time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Make `front` the vehicle directly ahead of `id`, or clear the link
    ///
    /// Only `id` is modified.
    pub fn set_front_vehicle(&mut self, id: VehicleId, front: Option<VehicleId>) -> Result<()> {
        if let Some(front_id) = front {
            self.get(front_id)?;
        }
        self.get_mut(id)?.set_front_vehicle(front)
    }

    pub fn front_vehicle(&self, id: VehicleId) -> Result<Option<VehicleId>> {
        Ok(self.get(id)?.front_vehicle())
    }

    /// Gap between `id` and its leader, `f64::INFINITY` without one
    pub fn front_distance(&self, id: VehicleId) -> Result<f64> {
        Ok(self.surroundings(id)?.front_distance)
    }

    /// What the controller of `id` sees ahead right now
    pub fn surroundings(&self, id: VehicleId) -> Result<Surroundings> {
        let vehicle = self.get(id)?;
        match vehicle.front_vehicle() {
            None => Ok(Surroundings::free()),
            Some(front_id) => {
                let leader = self.get(front_id)?;
                Ok(Surroundings {
                    front_distance: vehicle.gap_to(leader),
                    front_speed: Some(leader.speed()),
                })
            }
        }
    }

    /// Vehicles whose front vehicle is `id`
    pub fn followers_of(&self, id: VehicleId) -> Vec<VehicleId> {
        self.vehicles
            .iter()
            .filter(|v| v.front_vehicle() == Some(id))
            .map(|v| v.id())
            .collect()
    }

    /// Advance every vehicle by `delta_secs`
    ///
    /// Surroundings for all vehicles are captured before any of them moves,
    /// so the arena order has no effect on the result. Fails with
    /// `UnknownVehicle` before anything moves if a front link is stale.
    pub fn tick(&mut self, delta_secs: f64) -> Result<()> {
        debug_assert!(delta_secs > 0.0, "tick delta must be positive");

        let snapshot = self
            .vehicles
            .iter()
            .map(|v| self.surroundings(v.id()))
            .collect::<Result<Vec<Surroundings>>>()?;

        for (vehicle, ahead) in self.vehicles.iter_mut().zip(snapshot.iter()) {
            let controller = Arc::clone(vehicle.controller());
            controller.update(vehicle, ahead, delta_secs);
        }

        self.time += delta_secs;
        Ok(())
    }

    /// Link every vehicle to the nearest vehicle strictly ahead of it
    ///
    /// Vehicles sharing a position follow the one added earlier. The
    /// front-most vehicle ends up with no leader.
    pub fn link_by_position(&mut self) -> Result<()> {
        let ordered: BTreeMap<(OrderedFloat<f64>, usize), VehicleId> = self
            .vehicles
            .iter()
            .map(|v| ((OrderedFloat(v.position()), usize::MAX - v.id().index()), v.id()))
            .collect();

        let chain: Vec<VehicleId> = ordered.values().copied().collect();
        for pair in chain.windows(2) {
            self.set_front_vehicle(pair[0], Some(pair[1]))?;
        }
        if let Some(&front) = chain.last() {
            self.set_front_vehicle(front, None)?;
        }
        debug!("Linked {} vehicle(s) by position", chain.len());
        Ok(())
    }

    /// Fail with `FollowCycle` if following the front-vehicle links from some
    /// vehicle ever leads back to it
    pub fn validate_chain(&self) -> Result<()> {
        let mut graph: DiGraph<VehicleId, ()> = DiGraph::with_capacity(self.len(), self.len());
        let nodes: Vec<NodeIndex> = self.vehicles.iter().map(|v| graph.add_node(v.id())).collect();

        for vehicle in &self.vehicles {
            if let Some(front) = vehicle.front_vehicle() {
                let front_node = *nodes
                    .get(front.index())
                    .ok_or(SimError::UnknownVehicle(front))?;
                graph.add_edge(nodes[vehicle.id().index()], front_node, ());
            }
        }

        if !is_cyclic_directed(&graph) {
            return Ok(());
        }

        // Walk from each vehicle to name one member of the cycle
        for start in &self.vehicles {
            let mut current = start.front_vehicle();
            for _ in 0..self.len() {
                match current {
                    Some(id) if id == start.id() => return Err(SimError::FollowCycle(id)),
                    Some(id) => current = self.vehicles[id.index()].front_vehicle(),
                    None => break,
                }
            }
        }
        Err(SimError::FollowCycle(VehicleId(SimId(0))))
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Car-Following Simulation Summary ===");
        println!("Time: {:.2}s", self.time);
        println!("Vehicles: {}", self.vehicles.len());

        if !self.vehicles.is_empty() {
            println!("--- Vehicles ---");
            for vehicle in &self.vehicles {
                let gap = self.front_distance(vehicle.id()).unwrap_or(f64::INFINITY);
                let leader = match vehicle.front_vehicle() {
                    Some(front) => format!("{}", front.index()),
                    None => "-".to_string(),
                };
                println!(
                    "  Vehicle {} [{}]: position={:.1}m, speed={:.1}km/h, leader={}, gap={:.1}m",
                    vehicle.id().index(),
                    vehicle.controller().kind(),
                    vehicle.position(),
                    mps_to_kph(vehicle.speed()),
                    leader,
                    gap
                );
            }
        }
    }
}
