//! Colonist Components
//!
//! Components for individual colonists: identity, skills, aptitudes,
//! physical condition, EVA suit and the activity they are performing.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::activity::Activity;

/// Marker component identifying an entity as a colonist
#[derive(Component, Debug, Clone, Default)]
pub struct Colonist;

/// Unique identifier for a colonist
#[derive(Component, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable name for a colonist
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct ColonistName(pub String);

/// Trainable skills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    EvaOperations,
    Areology,
    Mechanics,
    Science,
    Teaching,
}

impl SkillKind {
    pub fn all() -> &'static [SkillKind] {
        &[
            SkillKind::EvaOperations,
            SkillKind::Areology,
            SkillKind::Mechanics,
            SkillKind::Science,
            SkillKind::Teaching,
        ]
    }
}

/// Experience points needed to go from `level` to `level + 1`
pub fn points_for_next_level(level: u32) -> f64 {
    25.0 * f64::from(level + 1)
}

/// Skill levels and accumulated experience
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skills {
    levels: HashMap<SkillKind, u32>,
    experience: HashMap<SkillKind, f64>,
}

impl Skills {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, skill: SkillKind, level: u32) -> Self {
        self.levels.insert(skill, level);
        self
    }

    pub fn level(&self, skill: SkillKind) -> u32 {
        self.levels.get(&skill).copied().unwrap_or(0)
    }

    pub fn experience(&self, skill: SkillKind) -> f64 {
        self.experience.get(&skill).copied().unwrap_or(0.0)
    }

    /// Add experience, levelling up as thresholds are crossed
    pub fn add_experience(&mut self, skill: SkillKind, points: f64) {
        if points <= 0.0 {
            return;
        }
        let level = self.levels.entry(skill).or_insert(0);
        let pool = self.experience.entry(skill).or_insert(0.0);
        *pool += points;
        while *pool >= points_for_next_level(*level) {
            *pool -= points_for_next_level(*level);
            *level += 1;
        }
    }
}

/// Natural aptitudes, each 0.0 to 100.0 with 50.0 as average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aptitude {
    Agility,
    AcademicAptitude,
    ExperienceAptitude,
    Teaching,
}

/// Component: a colonist's natural aptitudes
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aptitudes(pub HashMap<Aptitude, f64>);

impl Aptitudes {
    pub fn get(&self, aptitude: Aptitude) -> f64 {
        self.0.get(&aptitude).copied().unwrap_or(50.0)
    }

    pub fn with(mut self, aptitude: Aptitude, value: f64) -> Self {
        self.0.insert(aptitude, value.clamp(0.0, 100.0));
        self
    }
}

/// Physical condition
/// All values are 0.0 to 1.0
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// 0.0 = fully rested, 1.0 = exhausted
    pub fatigue: f64,
    /// Current work performance
    pub performance: f64,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            fatigue: 0.0,
            performance: 1.0,
        }
    }
}

impl Condition {
    /// Recompute performance from fatigue
    pub fn refresh_performance(&mut self) {
        self.performance = (1.0 - 0.6 * self.fatigue).clamp(0.0, 1.0);
    }

    pub fn relieve_fatigue(&mut self, amount: f64) {
        self.fatigue = (self.fatigue - amount).clamp(0.0, 1.0);
        self.refresh_performance();
    }
}

/// Consumables carried by an EVA suit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuitResource {
    Oxygen,
    Water,
}

/// Query surface of a piece of EVA equipment
pub trait Equipment {
    fn has_malfunction(&self) -> bool;
    fn resource_level(&self, kind: SuitResource) -> f64;
    fn resource_capacity(&self, kind: SuitResource) -> f64;
    fn life_support_ok(&self) -> bool;
    /// Multiplier applied to accident hazard, 1.0 for pristine gear
    fn wear_accident_modifier(&self) -> f64;
}

/// An EVA suit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaSuit {
    pub oxygen: f64,
    pub oxygen_capacity: f64,
    pub water: f64,
    pub water_capacity: f64,
    /// 0.0 = pristine, 1.0 = worn out
    pub wear: f64,
    pub malfunction: bool,
    pub life_support_ok: bool,
}

impl EvaSuit {
    /// A full suit with the given capacities
    pub fn new(oxygen_capacity: f64, water_capacity: f64) -> Self {
        Self {
            oxygen: oxygen_capacity,
            oxygen_capacity,
            water: water_capacity,
            water_capacity,
            wear: 0.0,
            malfunction: false,
            life_support_ok: true,
        }
    }

    pub fn refill(&mut self) {
        self.oxygen = self.oxygen_capacity;
        self.water = self.water_capacity;
    }

    /// Drain consumables; returns false once either runs dry
    pub fn consume(&mut self, oxygen: f64, water: f64) -> bool {
        self.oxygen = (self.oxygen - oxygen).max(0.0);
        self.water = (self.water - water).max(0.0);
        self.oxygen > 0.0 && self.water > 0.0
    }

    /// Accident damage
    pub fn damage(&mut self) {
        self.malfunction = true;
        self.wear = (self.wear + 0.1).min(1.0);
    }
}

impl Equipment for EvaSuit {
    fn has_malfunction(&self) -> bool {
        self.malfunction
    }

    fn resource_level(&self, kind: SuitResource) -> f64 {
        match kind {
            SuitResource::Oxygen => self.oxygen,
            SuitResource::Water => self.water,
        }
    }

    fn resource_capacity(&self, kind: SuitResource) -> f64 {
        match kind {
            SuitResource::Oxygen => self.oxygen_capacity,
            SuitResource::Water => self.water_capacity,
        }
    }

    fn life_support_ok(&self) -> bool {
        self.life_support_ok
    }

    fn wear_accident_modifier(&self) -> f64 {
        1.0 + self.wear
    }
}

/// Component: the suit a colonist is wearing or has assigned, if any
#[derive(Component, Debug, Clone, Default)]
pub struct SuitSlot(pub Option<EvaSuit>);

/// Component: what the colonist is doing right now
#[derive(Component, Default)]
pub struct CurrentActivity(pub Option<Activity>);

impl CurrentActivity {
    /// True when the scheduler should hand out a new activity
    pub fn is_idle(&self) -> bool {
        self.0.as_ref().map_or(true, Activity::is_complete)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_ref().map(Activity::name)
    }
}
