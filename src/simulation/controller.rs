//! Car-following laws
//!
//! A controller turns a vehicle's own speed and what it sees ahead into an
//! acceleration, then integrates that over one tick. Controllers hold no
//! per-call state, so one instance is shared by every vehicle of a type.
//!
//! Laws:
//! - `Autonomous`: Intelligent Driver Model (IDM)
//!   `a = a_max * (1 - (v/v0)^4 - (s*/s)^2)` with
//!   `s* = s0 + max(0, v*T + v*dv / (2*sqrt(a_max*b)))`
//! - `Human`: IDM that perceives the gap shortened by `reaction_time * v`
//!   and keeps a 20% longer time headway
//! - `Cruise`: zero acceleration, holds whatever speed the vehicle has

use std::fmt;

use super::types::{Surroundings, MAX_DECELERATION, MIN_EFFECTIVE_GAP};
use super::vehicle::SimVehicle;

/// Headway multiplier applied by the `Human` law
const HUMAN_HEADWAY_FACTOR: f64 = 1.2;

/// Exponent of the free-road term of the IDM
const IDM_DELTA: i32 = 4;

/// Type of controller driving a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VehicleControllerType {
    /// Adaptive cruise control, reacts instantly
    Autonomous,
    /// Human driver, anticipates late and keeps more distance
    Human,
    /// Holds its current speed regardless of traffic
    Cruise,
}

impl fmt::Display for VehicleControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleControllerType::Autonomous => "autonomous",
            VehicleControllerType::Human => "human",
            VehicleControllerType::Cruise => "cruise",
        };
        f.write_str(name)
    }
}

/// Numeric parameters of a car-following law (SI units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerParams {
    /// Speed sought on a free road, m/s
    pub desired_speed: f64,
    /// Desired time gap to the leader, s
    pub time_headway: f64,
    /// Gap kept when standing still, m
    pub min_gap: f64,
    /// m/s^2
    pub max_acceleration: f64,
    /// m/s^2, positive
    pub comfortable_deceleration: f64,
    /// Perception delay of a human driver, s
    pub reaction_time: f64,
}

/// A car-following policy shared by all vehicles of one controller type
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleController {
    kind: VehicleControllerType,
    params: ControllerParams,
}

impl VehicleController {
    pub fn new(kind: VehicleControllerType, params: ControllerParams) -> Self {
        Self { kind, params }
    }

    pub fn kind(&self) -> VehicleControllerType {
        self.kind
    }

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    /// Acceleration commanded for a vehicle going `speed` with top speed
    /// `max_speed` and the given view of the road ahead
    pub fn acceleration(&self, speed: f64, max_speed: f64, ahead: &Surroundings) -> f64 {
        match self.kind {
            VehicleControllerType::Cruise => 0.0,
            VehicleControllerType::Autonomous => {
                self.idm(speed, max_speed, ahead.front_distance, ahead, self.params.time_headway)
            }
            VehicleControllerType::Human => {
                let perceived_gap = ahead.front_distance - self.params.reaction_time * speed.max(0.0);
                let headway = self.params.time_headway * HUMAN_HEADWAY_FACTOR;
                self.idm(speed, max_speed, perceived_gap, ahead, headway)
            }
        }
    }

    fn idm(
        &self,
        speed: f64,
        max_speed: f64,
        gap: f64,
        ahead: &Surroundings,
        time_headway: f64,
    ) -> f64 {
        let p = &self.params;
        let desired_speed = p.desired_speed.min(max_speed);
        let v = speed.max(0.0);

        let free_road = 1.0 - (v / desired_speed).powi(IDM_DELTA);

        let interaction = match ahead.front_speed {
            Some(front_speed) if ahead.has_leader() => {
                let approach_rate = v - front_speed;
                let dynamic = v * time_headway
                    + v * approach_rate
                        / (2.0 * (p.max_acceleration * p.comfortable_deceleration).sqrt());
                let desired_gap = p.min_gap + dynamic.max(0.0);
                let gap = gap.max(MIN_EFFECTIVE_GAP);
                (desired_gap / gap).powi(2)
            }
            _ => 0.0,
        };

        (p.max_acceleration * (free_road - interaction)).max(-MAX_DECELERATION)
    }

    /// Advance `vehicle` by `dt` seconds and commit its new speed and position
    ///
    /// Braking brings a forward-moving vehicle to a stop but never makes it
    /// reverse. The speed clamp of the vehicle applies to the result.
    pub fn update(&self, vehicle: &mut SimVehicle, ahead: &Surroundings, dt: f64) {
        let speed = vehicle.speed();
        let position = vehicle.position();
        let acceleration = self.acceleration(speed, vehicle.max_speed(), ahead);

        let next_speed = speed + acceleration * dt;
        if speed >= 0.0 && next_speed < 0.0 {
            // Stops inside the step
            let braking_distance = if acceleration < 0.0 {
                -speed * speed / (2.0 * acceleration)
            } else {
                0.0
            };
            vehicle.set_position(position + braking_distance);
            vehicle.set_speed(0.0);
            return;
        }

        vehicle.set_speed(next_speed);
        let mean_speed = (speed + vehicle.speed()) / 2.0;
        vehicle.set_position(position + mean_speed * dt);
    }

    /// Gap at which a vehicle following a leader at the same `speed` stops
    /// accelerating, or `None` when the law has no such gap (`Cruise`, or a
    /// speed at or above the desired speed)
    pub fn equilibrium_gap(&self, speed: f64, max_speed: f64) -> Option<f64> {
        let p = &self.params;
        let desired_speed = p.desired_speed.min(max_speed);
        if speed < 0.0 || speed >= desired_speed {
            return None;
        }

        let free_road = 1.0 - (speed / desired_speed).powi(IDM_DELTA);
        match self.kind {
            VehicleControllerType::Cruise => None,
            VehicleControllerType::Autonomous => {
                let desired_gap = p.min_gap + speed * p.time_headway;
                Some(desired_gap / free_road.sqrt())
            }
            VehicleControllerType::Human => {
                let desired_gap = p.min_gap + speed * p.time_headway * HUMAN_HEADWAY_FACTOR;
                Some(desired_gap / free_road.sqrt() + p.reaction_time * speed)
            }
        }
    }
}
