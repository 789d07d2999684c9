//! Scenarios and traffic generation
//!
//! A scenario decides what the generated traffic drives towards and how
//! large one meter is on screen. Traffic is generated behind a lead vehicle,
//! every vehicle linked to the one directly ahead of it.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;

use super::controller::VehicleControllerType;
use super::error::Result;
use super::profile::VehicleProfile;
use super::units::kph_to_mps;
use super::world::SimWorld;

/// Where the obstacle vehicle stands in the `Wall` scenario, in meters
pub const WALL_POSITION: f64 = 100.0;

/// Speed at which generated vehicles approach the obstacle, km/h
const WALL_APPROACH_SPEED_KPH: f64 = 50.0;

/// Share of its desired speed the platoon leader cruises at
const PLATOON_LEADER_SPEED_RATIO: f64 = 0.6;

/// Scenario the traffic is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioType {
    /// Vehicles queue up behind a leader cruising at constant speed
    Platoon,
    /// Vehicles drive towards a stationary obstacle
    Wall,
}

impl ScenarioType {
    /// Pixels per meter used to display the scenario
    pub fn scale(&self) -> f64 {
        match self {
            ScenarioType::Platoon => 4.0,
            ScenarioType::Wall => 8.0,
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioType::Platoon => f.write_str("platoon"),
            ScenarioType::Wall => f.write_str("wall"),
        }
    }
}

/// Build a world for `scenario` holding `count` vehicles of each listed
/// controller type, all sized by `profile`
///
/// Vehicles of one type share a single controller. The first vehicle added
/// is the lead vehicle (`Cruise`); generated vehicles are placed behind it
/// at their equilibrium gap plus a random margin, starting near the lead
/// vehicle's speed (`Platoon`) or 50 km/h (`Wall`).
/// Pass a `seed` for reproducible traffic.
pub fn generate_traffic(
    scenario: ScenarioType,
    counts: &[(VehicleControllerType, usize)],
    profile: &VehicleProfile,
    seed: Option<u64>,
) -> Result<SimWorld> {
    profile.validate()?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::rng().random()),
    };

    let mut world = SimWorld::new();

    let lead = world.add_vehicle_from_profile(profile, VehicleControllerType::Cruise)?;
    let lead_speed = match scenario {
        ScenarioType::Platoon => profile.desired_speed * PLATOON_LEADER_SPEED_RATIO,
        ScenarioType::Wall => 0.0,
    };
    if let Some(vehicle) = world.vehicle_mut(lead) {
        vehicle.set_position(WALL_POSITION);
        vehicle.set_speed(lead_speed);
    }

    let start_speed = match scenario {
        ScenarioType::Platoon => lead_speed,
        ScenarioType::Wall => kph_to_mps(WALL_APPROACH_SPEED_KPH),
    };
    let mut position = WALL_POSITION;
    if scenario == ScenarioType::Wall {
        // Leave room to brake comfortably before the obstacle
        position -= start_speed * start_speed / (2.0 * profile.comfortable_deceleration);
    }

    for &(kind, count) in counts {
        // One controller for all vehicles of a given type
        let controller = profile.controller(kind);
        let gap = controller
            .equilibrium_gap(start_speed, profile.max_speed)
            .unwrap_or(profile.min_gap + start_speed * profile.time_headway);

        for _ in 0..count {
            position -= profile.length + gap + rng.random_range(0.0..5.0);

            let id = world.add_vehicle(profile.length, profile.max_speed, Arc::clone(&controller))?;
            if let Some(vehicle) = world.vehicle_mut(id) {
                vehicle.set_position(position);
                vehicle.set_speed(start_speed * rng.random_range(0.9..1.1));
            }
        }
    }

    world.link_by_position()?;

    info!(
        "Generated {} scenario: {} vehicle(s) behind a lead vehicle at {}m",
        scenario,
        world.len() - 1,
        WALL_POSITION
    );
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::{SimId, VehicleId};

    #[test]
    fn wall_scenario_queues_behind_stationary_lead() {
        let counts = [
            (VehicleControllerType::Autonomous, 3),
            (VehicleControllerType::Human, 2),
        ];
        let world =
            generate_traffic(ScenarioType::Wall, &counts, &VehicleProfile::default(), Some(7)).unwrap();
        assert_eq!(world.len(), 6);

        let lead = VehicleId(SimId(0));
        let wall = world.vehicle(lead).unwrap();
        assert_eq!(wall.position(), WALL_POSITION);
        assert_eq!(wall.speed(), 0.0);
        assert_eq!(wall.controller().kind(), VehicleControllerType::Cruise);
        assert_eq!(world.front_vehicle(lead).unwrap(), None);

        // Each generated vehicle follows the one added before it
        for i in 1..world.len() {
            let id = VehicleId(SimId(i));
            assert_eq!(world.front_vehicle(id).unwrap(), Some(VehicleId(SimId(i - 1))));
            assert!(world.front_distance(id).unwrap() >= VehicleProfile::default().min_gap);
        }
        world.validate_chain().unwrap();
    }

    #[test]
    fn vehicles_of_one_type_share_a_controller() {
        let counts = [(VehicleControllerType::Human, 3)];
        let world =
            generate_traffic(ScenarioType::Platoon, &counts, &VehicleProfile::default(), Some(1)).unwrap();
        let controllers: Vec<_> = world.vehicles().skip(1).map(|v| Arc::clone(v.controller())).collect();
        assert!(Arc::ptr_eq(&controllers[0], &controllers[1]));
        assert!(Arc::ptr_eq(&controllers[1], &controllers[2]));
        assert!(world.vehicle(VehicleId(SimId(0))).unwrap().speed() > 0.0);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let counts = [(VehicleControllerType::Autonomous, 4)];
        let profile = VehicleProfile::default();
        let a = generate_traffic(ScenarioType::Platoon, &counts, &profile, Some(42)).unwrap();
        let b = generate_traffic(ScenarioType::Platoon, &counts, &profile, Some(42)).unwrap();
        for (x, y) in a.vehicles().zip(b.vehicles()) {
            assert_eq!(x.position(), y.position());
            assert_eq!(x.speed(), y.speed());
        }
    }
}
