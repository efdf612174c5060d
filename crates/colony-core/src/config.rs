//! Configuration loading for the colony simulation.
//!
//! Every tuning constant the engine uses lives here. All sections default
//! so a partial TOML file only overrides what it names.

use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Resource: complete simulation configuration.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub colonists: ColonistSettings,
    /// EVA safety thresholds
    #[serde(default)]
    pub eva: EvaSettings,
    #[serde(default)]
    pub accidents: AccidentSettings,
    #[serde(default)]
    pub walking: WalkSettings,
    #[serde(default)]
    pub suits: SuitSettings,
    /// Fatigue accrual and recovery
    #[serde(default)]
    pub condition: ConditionSettings,
    /// Rates and durations of the concrete activities
    #[serde(default)]
    pub activities: ActivitySettings,
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_millisols <= 0.0 {
            return Err(invalid("simulation.tick_millisols", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.eva.min_suit_resource_fraction) {
            return Err(invalid(
                "eva.min_suit_resource_fraction",
                "must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.eva.min_performance) {
            return Err(invalid("eva.min_performance", "must be between 0 and 1"));
        }
        if self.walking.speed <= 0.0 {
            return Err(invalid("walking.speed", "must be positive"));
        }
        if self.accidents.eva_base_rate < 0.0 || self.accidents.maintenance_base_rate < 0.0 {
            return Err(invalid("accidents", "base rates cannot be negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// Clock and run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Seed for the simulation RNG
    pub seed: u64,
    /// Millisols simulated per tick
    pub tick_millisols: f64,
    /// The settlement sits inside a polar region during its winter night
    pub polar_night: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_millisols: 10.0,
            polar_night: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonistSettings {
    pub count: usize,
    /// Upper bound of the random starting skill level
    pub max_starting_skill: u32,
}

impl Default for ColonistSettings {
    fn default() -> Self {
        Self {
            count: 4,
            max_starting_skill: 4,
        }
    }
}

/// Thresholds that force an EVA to turn back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaSettings {
    /// Oxygen or water at or below this share of capacity aborts
    pub min_suit_resource_fraction: f64,
    /// Performance rating below this aborts
    pub min_performance: f64,
    /// Metres within which the colonist counts as at a location
    pub arrival_tolerance: f64,
}

impl Default for EvaSettings {
    fn default() -> Self {
        Self {
            min_suit_resource_fraction: 0.15,
            min_performance: 0.5,
            arrival_tolerance: 0.5,
        }
    }
}

/// Hazard per millisol before skill and wear modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentSettings {
    pub eva_base_rate: f64,
    pub maintenance_base_rate: f64,
}

impl Default for AccidentSettings {
    fn default() -> Self {
        Self {
            eva_base_rate: 0.0005,
            maintenance_base_rate: 0.0002,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    /// Metres per millisol
    pub speed: f64,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self { speed: 110.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitSettings {
    /// kg
    pub oxygen_capacity: f64,
    /// kg
    pub water_capacity: f64,
    /// kg per millisol outside
    pub oxygen_usage: f64,
    /// kg per millisol outside
    pub water_usage: f64,
}

impl Default for SuitSettings {
    fn default() -> Self {
        Self {
            oxygen_capacity: 1.0,
            water_capacity: 4.0,
            oxygen_usage: 0.0009,
            water_usage: 0.0025,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionSettings {
    /// Fatigue gained per millisol awake
    pub fatigue_rate: f64,
    /// Fatigue at which an idle colonist goes to sleep
    pub sleep_threshold: f64,
}

impl Default for ConditionSettings {
    fn default() -> Self {
        Self {
            fatigue_rate: 0.0008,
            sleep_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySettings {
    /// kg per millisol at skill 1
    pub collect_rate: f64,
    /// kg to gather per collection trip
    pub collect_target: f64,
    /// kg per millisol at skill 1
    pub dig_rate: f64,
    /// Millisols a dig may spend on site
    pub dig_site_time: f64,
    /// Distance from the nearest airlock to dig or collect at
    pub work_site_distance: f64,
    /// Wear removed per millisol of maintenance
    pub maintenance_rate: f64,
    /// Structures below this wear are left alone
    pub maintenance_min_wear: f64,
    /// Fatigue relieved per millisol asleep
    pub sleep_recovery_rate: f64,
    pub sleep_duration: f64,
    pub research_duration: f64,
    pub teach_duration: f64,
    /// Millisols to start or stop a fuel power source
    pub toggle_duration: f64,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            collect_rate: 0.2,
            collect_target: 30.0,
            dig_rate: 0.15,
            dig_site_time: 250.0,
            work_site_distance: 220.0,
            maintenance_rate: 0.002,
            maintenance_min_wear: 0.1,
            sleep_recovery_rate: 0.004,
            sleep_duration: 250.0,
            research_duration: 200.0,
            teach_duration: 150.0,
            toggle_duration: 40.0,
        }
    }
}
