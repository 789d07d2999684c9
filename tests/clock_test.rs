//! Simulation clock validation
//!
//! Delta bookkeeping and end-to-end car-following through the clock.

use road_follow::simulation::{
    SimWorld, SimulationClock, VehicleControllerType, VehicleId, VehicleProfile, DEFAULT_DELTA,
};

const LEADER_SPEED: f64 = 20.0;

/// A cruising leader at 100 m and one follower of `kind` at 0 m, both at `LEADER_SPEED`
fn two_vehicle_world(kind: VehicleControllerType) -> (SimWorld, VehicleId, VehicleId) {
    let profile = VehicleProfile::default();
    let mut world = SimWorld::new();

    let leader = world
        .add_vehicle_from_profile(&profile, VehicleControllerType::Cruise)
        .unwrap();
    let follower = world.add_vehicle_from_profile(&profile, kind).unwrap();

    let v = world.vehicle_mut(leader).unwrap();
    v.set_position(100.0);
    v.set_speed(LEADER_SPEED);
    let v = world.vehicle_mut(follower).unwrap();
    v.set_position(0.0);
    v.set_speed(LEADER_SPEED);

    world.set_front_vehicle(follower, Some(leader)).unwrap();
    (world, leader, follower)
}

#[test]
fn test_delta_defaults_and_history() {
    let (world, _, _) = two_vehicle_world(VehicleControllerType::Autonomous);
    let clock = SimulationClock::new(world, 4.0);
    assert_eq!(clock.delta(), DEFAULT_DELTA);
    assert_eq!(clock.prev_delta(), DEFAULT_DELTA);

    clock.set_delta(0.1).unwrap();
    clock.set_delta(0.2).unwrap();
    assert_eq!(clock.prev_delta(), 0.1);
    assert_eq!(clock.delta(), 0.2);

    assert!(clock.set_delta(-0.2).is_err());
    assert_eq!(clock.prev_delta(), 0.1);
    assert_eq!(clock.delta(), 0.2);
}

#[test]
fn test_delta_change_applies_to_next_step() {
    let (world, leader, _) = two_vehicle_world(VehicleControllerType::Autonomous);
    let mut clock = SimulationClock::new(world, 4.0);

    clock.step().unwrap();
    let after_first = clock.with_world(|w| w.vehicle(leader).unwrap().position());
    assert!((after_first - (100.0 + LEADER_SPEED * DEFAULT_DELTA)).abs() < 1e-9);

    clock.set_delta(1.0).unwrap();
    clock.step().unwrap();
    let after_second = clock.with_world(|w| w.vehicle(leader).unwrap().position());
    assert!((after_second - (after_first + LEADER_SPEED)).abs() < 1e-9);
    assert!((clock.with_world(|w| w.time()) - (DEFAULT_DELTA + 1.0)).abs() < 1e-9);
}

fn assert_converges_to_equilibrium(kind: VehicleControllerType) {
    let (world, leader, follower) = two_vehicle_world(kind);
    let profile = VehicleProfile::default();
    let equilibrium = profile
        .controller(kind)
        .equilibrium_gap(LEADER_SPEED, profile.max_speed)
        .expect("leader is slower than the desired speed");

    let mut clock = SimulationClock::new(world, 4.0);
    let mut previous_error = clock.with_world(|w| (w.front_distance(follower).unwrap() - equilibrium).abs());
    assert!(previous_error > 10.0);

    for tick in 0..600 {
        clock.step().unwrap();
        let (gap, leader_speed) = clock.with_world(|w| {
            (
                w.front_distance(follower).unwrap(),
                w.vehicle(leader).unwrap().speed(),
            )
        });
        assert_eq!(leader_speed, LEADER_SPEED);
        assert!(gap > profile.min_gap, "gap collapsed to {gap} at tick {tick}");

        let error = (gap - equilibrium).abs();
        assert!(
            error <= previous_error + 1e-9,
            "gap moved away from equilibrium at tick {tick}: {error} > {previous_error}"
        );
        previous_error = error;
    }

    assert!(previous_error < 1e-3, "final error {previous_error}");
    let follower_speed = clock.with_world(|w| w.vehicle(follower).unwrap().speed());
    assert!((follower_speed - LEADER_SPEED).abs() < 1e-3);
}

#[test]
fn test_autonomous_follower_converges_to_headway() {
    assert_converges_to_equilibrium(VehicleControllerType::Autonomous);
}

#[test]
fn test_human_follower_converges_to_headway() {
    assert_converges_to_equilibrium(VehicleControllerType::Human);
}

#[test]
fn test_free_vehicle_approaches_desired_speed() {
    let profile = VehicleProfile::default();
    let mut world = SimWorld::new();
    let id = world
        .add_vehicle_from_profile(&profile, VehicleControllerType::Autonomous)
        .unwrap();
    let mut clock = SimulationClock::new(world, 4.0);

    let mut previous = 0.0;
    for _ in 0..1000 {
        clock.step().unwrap();
        let speed = clock.with_world(|w| w.vehicle(id).unwrap().speed());
        assert!(speed >= previous);
        assert!(speed <= profile.desired_speed + 1e-9);
        previous = speed;
    }
    assert!(profile.desired_speed - previous < 0.5);
}
