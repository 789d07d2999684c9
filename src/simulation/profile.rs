//! Vehicle profiles
//!
//! A profile names a kind of vehicle and carries everything needed to build
//! one: its dimensions and the parameters of its car-following law. Three
//! profiles are built in; more can be loaded from a TOML file:
//!
//! ```toml
//! [[profile]]
//! name = "van"
//! length = 5.5
//! max_speed = 40.0
//! desired_speed = 30.0
//! ```
//!
//! Every profile needs a `name`; other fields left out take the value of
//! the `regular` profile.

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::controller::{ControllerParams, VehicleController, VehicleControllerType};
use super::error::{Result, SimError};

/// Names of the built-in profiles
pub const BUILTIN_PROFILES: [&str; 3] = ["regular", "sport", "truck"];

/// Dimensions and driving parameters of one kind of vehicle (SI units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub name: String,
    /// m
    #[serde(default = "default_length")]
    pub length: f64,
    /// m/s
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// m/s
    #[serde(default = "default_desired_speed")]
    pub desired_speed: f64,
    /// s
    #[serde(default = "default_time_headway")]
    pub time_headway: f64,
    /// m
    #[serde(default = "default_min_gap")]
    pub min_gap: f64,
    /// m/s^2
    #[serde(default = "default_max_acceleration")]
    pub max_acceleration: f64,
    /// m/s^2
    #[serde(default = "default_comfortable_deceleration")]
    pub comfortable_deceleration: f64,
    /// s
    #[serde(default = "default_reaction_time")]
    pub reaction_time: f64,
}

// Values of the `regular` profile

fn default_length() -> f64 {
    4.5
}

fn default_max_speed() -> f64 {
    50.0
}

fn default_desired_speed() -> f64 {
    120.0 / 3.6
}

fn default_time_headway() -> f64 {
    1.5
}

fn default_min_gap() -> f64 {
    2.0
}

fn default_max_acceleration() -> f64 {
    1.4
}

fn default_comfortable_deceleration() -> f64 {
    2.0
}

fn default_reaction_time() -> f64 {
    0.8
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self::regular()
    }
}

impl VehicleProfile {
    fn regular() -> Self {
        Self {
            name: "regular".to_string(),
            length: default_length(),
            max_speed: default_max_speed(),
            desired_speed: default_desired_speed(),
            time_headway: default_time_headway(),
            min_gap: default_min_gap(),
            max_acceleration: default_max_acceleration(),
            comfortable_deceleration: default_comfortable_deceleration(),
            reaction_time: default_reaction_time(),
        }
    }

    /// Look up a built-in profile by name
    pub fn builtin(name: &str) -> Result<Self> {
        let profile = match name {
            "regular" => Self::regular(),
            "sport" => Self {
                name: "sport".to_string(),
                length: 4.2,
                max_speed: 70.0,
                desired_speed: 150.0 / 3.6,
                time_headway: 1.2,
                min_gap: 1.5,
                max_acceleration: 2.5,
                comfortable_deceleration: 3.0,
                reaction_time: 0.6,
            },
            "truck" => Self {
                name: "truck".to_string(),
                length: 12.0,
                max_speed: 30.0,
                desired_speed: 90.0 / 3.6,
                time_headway: 2.0,
                min_gap: 3.0,
                max_acceleration: 0.8,
                comfortable_deceleration: 1.5,
                reaction_time: 1.0,
            },
            other => {
                return Err(SimError::Profile(format!(
                    "no built-in profile named '{other}' (known: {})",
                    BUILTIN_PROFILES.join(", ")
                )))
            }
        };
        Ok(profile)
    }

    /// Parse a single profile from a TOML table; `name` is required
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let profile: VehicleProfile =
            toml::from_str(contents).map_err(|e| SimError::Profile(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check that every parameter is usable by the vehicle and its controller
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("length", self.length),
            ("max_speed", self.max_speed),
            ("desired_speed", self.desired_speed),
            ("time_headway", self.time_headway),
            ("min_gap", self.min_gap),
            ("max_acceleration", self.max_acceleration),
            ("comfortable_deceleration", self.comfortable_deceleration),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::InvalidParameter(format!(
                    "profile '{}': {field} must be finite and > 0, got {value}",
                    self.name
                )));
            }
        }
        if !self.reaction_time.is_finite() || self.reaction_time < 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "profile '{}': reaction_time must be finite and >= 0, got {}",
                self.name, self.reaction_time
            )));
        }
        if self.desired_speed > self.max_speed {
            return Err(SimError::InvalidParameter(format!(
                "profile '{}': desired_speed {} exceeds max_speed {}",
                self.name, self.desired_speed, self.max_speed
            )));
        }
        Ok(())
    }

    pub fn controller_params(&self) -> ControllerParams {
        ControllerParams {
            desired_speed: self.desired_speed,
            time_headway: self.time_headway,
            min_gap: self.min_gap,
            max_acceleration: self.max_acceleration,
            comfortable_deceleration: self.comfortable_deceleration,
            reaction_time: self.reaction_time,
        }
    }

    /// Build a controller of the given type tuned by this profile
    pub fn controller(&self, kind: VehicleControllerType) -> Arc<VehicleController> {
        Arc::new(VehicleController::new(kind, self.controller_params()))
    }
}

/// A set of profiles loaded from a file, backed by the built-in ones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileLibrary {
    #[serde(default, rename = "profile")]
    profiles: Vec<VehicleProfile>,
}

impl ProfileLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TOML file of `[[profile]]` tables
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile file: {}", path.display()))?;

        let library = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse profile file: {}", path.display()))?;

        info!(
            "Loaded {} vehicle profile(s) from {}",
            library.profiles.len(),
            path.display()
        );
        Ok(library)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let library: ProfileLibrary =
            toml::from_str(contents).map_err(|e| SimError::Profile(e.to_string()))?;
        for profile in &library.profiles {
            profile.validate()?;
        }
        Ok(library)
    }

    pub fn insert(&mut self, profile: VehicleProfile) -> Result<()> {
        profile.validate()?;
        self.profiles.retain(|p| p.name != profile.name);
        self.profiles.push(profile);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    /// Find a profile by name, loaded profiles shadowing the built-in ones
    pub fn resolve(&self, name: &str) -> Result<VehicleProfile> {
        if let Some(profile) = self.profiles.iter().find(|p| p.name == name) {
            return Ok(profile.clone());
        }
        debug!("Profile '{}' not loaded, falling back to built-in", name);
        VehicleProfile::builtin(name)
    }
}
