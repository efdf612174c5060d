//! World Components
//!
//! Positions, structures, the local site map, the settlement store, the
//! Martian surface environment and the simulation clock.

use bevy_ecs::prelude::*;
use colony_events::{MarsTimestamp, MILLISOLS_PER_SOL};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A point in the settlement's local frame, in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalPosition {
    pub x: f64,
    pub y: f64,
}

impl LocalPosition {
    pub const ORIGIN: LocalPosition = LocalPosition { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: LocalPosition) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Move up to `max_distance` metres toward `target`, stopping on it
    pub fn step_toward(&self, target: LocalPosition, max_distance: f64) -> LocalPosition {
        let distance = self.distance_to(target);
        if distance <= max_distance || distance == 0.0 {
            return target;
        }
        let ratio = max_distance / distance;
        LocalPosition {
            x: self.x + (target.x - self.x) * ratio,
            y: self.y + (target.y - self.y) * ratio,
        }
    }
}

/// Component: a colonist's current position
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position(pub LocalPosition);

/// Bulk materials handled by colonists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Ice,
    Regolith,
    RockSamples,
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Material::Ice => write!(f, "ice"),
            Material::Regolith => write!(f, "regolith"),
            Material::RockSamples => write!(f, "rock_samples"),
        }
    }
}

/// Unique identifier for a structure
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(pub String);

impl StructureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for StructureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a structure is and whether reaching it needs an EVA
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureSite {
    pub location: LocalPosition,
    pub outside: bool,
}

/// A building or piece of surface infrastructure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub name: String,
    pub location: LocalPosition,
    /// Sits outside the pressurized habitat
    pub outside: bool,
    /// 0.0 = pristine, 1.0 = worn out
    pub wear: f64,
    pub malfunctions: u32,
    /// `Some(running)` for fuel-burning power sources
    pub power_source: Option<bool>,
}

impl Structure {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: LocalPosition) -> Self {
        Self {
            id: StructureId::new(id),
            name: name.into(),
            location,
            outside: false,
            wear: 0.0,
            malfunctions: 0,
            power_source: None,
        }
    }

    pub fn outside(mut self) -> Self {
        self.outside = true;
        self
    }

    pub fn with_power_source(mut self, running: bool) -> Self {
        self.power_source = Some(running);
        self
    }

    pub fn site(&self) -> StructureSite {
        StructureSite {
            location: self.location,
            outside: self.outside,
        }
    }

    pub fn wear_accident_modifier(&self) -> f64 {
        1.0 + self.wear
    }

    pub fn damage(&mut self) {
        self.malfunctions += 1;
        self.wear = (self.wear + 0.2).min(1.0);
    }
}

/// Resource: every structure in the settlement
#[derive(Resource, Debug, Clone, Default)]
pub struct StructureRegistry {
    structures: BTreeMap<StructureId, Structure>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, structure: Structure) {
        self.structures.insert(structure.id.clone(), structure);
    }

    pub fn get(&self, id: &StructureId) -> Option<&Structure> {
        self.structures.get(id)
    }

    pub fn get_mut(&mut self, id: &StructureId) -> Option<&mut Structure> {
        self.structures.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Structure> {
        self.structures.values_mut()
    }

    /// The structure most in need of maintenance, if any is worn at all
    pub fn most_worn(&self, min_wear: f64) -> Option<&Structure> {
        self.structures
            .values()
            .filter(|s| s.wear >= min_wear)
            .max_by(|a, b| a.wear.partial_cmp(&b.wear).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn power_sources(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values().filter(|s| s.power_source.is_some())
    }

    /// Remove up to `amount` wear; returns the wear left
    pub fn service(&mut self, id: &StructureId, amount: f64) -> f64 {
        match self.structures.get_mut(id) {
            Some(structure) => {
                structure.wear = (structure.wear - amount).max(0.0);
                structure.wear
            }
            None => 0.0,
        }
    }

    /// Start or stop a fuel power source; false if `id` is not one
    pub fn set_power_source(&mut self, id: &StructureId, running: bool) -> bool {
        match self.structures.get_mut(id) {
            Some(structure) if structure.power_source.is_some() => {
                structure.power_source = Some(running);
                true
            }
            _ => false,
        }
    }
}

/// Resource: airlocks, outdoor work sites and the walkable area
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SiteMap {
    pub airlocks: Vec<LocalPosition>,
    /// Points of interest for sampling and digging
    pub work_sites: Vec<LocalPosition>,
    /// Anything within this many metres of an airlock counts as indoors
    pub habitat_radius: f64,
    /// Walking is only possible inside this radius around the origin
    pub walkable_radius: f64,
    /// Where colonists sleep
    pub quarters: LocalPosition,
    /// Where research and teaching happen
    pub laboratory: LocalPosition,
}

impl Default for SiteMap {
    fn default() -> Self {
        Self {
            airlocks: vec![LocalPosition::new(0.0, 0.0)],
            work_sites: Vec::new(),
            habitat_radius: 15.0,
            walkable_radius: 2000.0,
            quarters: LocalPosition::new(4.0, 3.0),
            laboratory: LocalPosition::new(-5.0, 2.0),
        }
    }
}

impl SiteMap {
    pub fn is_walkable(&self, at: LocalPosition) -> bool {
        at.distance_to(LocalPosition::ORIGIN) <= self.walkable_radius
    }

    /// Straight-line route; every step must stay inside the walkable area
    pub fn can_walk_all_steps(&self, from: LocalPosition, to: LocalPosition) -> bool {
        self.is_walkable(from) && self.is_walkable(to)
    }

    pub fn nearest_airlock(&self, from: LocalPosition) -> Option<LocalPosition> {
        self.airlocks
            .iter()
            .copied()
            .min_by(|a, b| {
                a.distance_to(from)
                    .partial_cmp(&b.distance_to(from))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    pub fn is_inside(&self, at: LocalPosition) -> bool {
        self.airlocks
            .iter()
            .any(|airlock| airlock.distance_to(at) <= self.habitat_radius)
    }
}

/// Resource: the settlement's bulk storage
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementStore {
    pub amounts: HashMap<Material, f64>,
    pub capacities: HashMap<Material, f64>,
}

impl SettlementStore {
    pub fn with_capacity(mut self, material: Material, capacity: f64) -> Self {
        self.capacities.insert(material, capacity);
        self
    }

    pub fn amount(&self, material: Material) -> f64 {
        self.amounts.get(&material).copied().unwrap_or(0.0)
    }

    pub fn remaining_capacity(&self, material: Material) -> f64 {
        let capacity = self.capacities.get(&material).copied().unwrap_or(0.0);
        (capacity - self.amount(material)).max(0.0)
    }

    /// Store as much as fits; returns the amount actually stored
    pub fn store(&mut self, material: Material, amount: f64) -> f64 {
        let stored = amount.max(0.0).min(self.remaining_capacity(material));
        *self.amounts.entry(material).or_insert(0.0) += stored;
        stored
    }
}

/// Resource: sunlight model for the settlement's location
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct MarsSurface {
    /// Peak solar irradiance at local noon, W/m²
    pub max_irradiance: f64,
    /// Settlement sits in a polar region during polar night
    pub polar_night: bool,
    /// Millisol of day used for the current tick
    pub millisol_of_day: f64,
}

impl Default for MarsSurface {
    fn default() -> Self {
        Self {
            max_irradiance: 590.0,
            polar_night: false,
            millisol_of_day: 500.0,
        }
    }
}

impl MarsSurface {
    /// Irradiance at the given time of day; zero between dusk and dawn
    pub fn irradiance_at(&self, millisol: f64) -> f64 {
        if self.polar_night {
            return 0.0;
        }
        let angle = 2.0 * std::f64::consts::PI * millisol / MILLISOLS_PER_SOL;
        (-angle.cos()).max(0.0) * self.max_irradiance
    }

    pub fn irradiance(&self) -> f64 {
        self.irradiance_at(self.millisol_of_day)
    }
}

/// Resource: the simulation clock
#[derive(Resource, Debug, Clone)]
pub struct MarsClock {
    pub tick: u64,
    /// Millisols since the simulation start
    pub elapsed: f64,
    /// Millisols advanced per tick
    pub tick_length: f64,
}

impl MarsClock {
    pub fn new(tick_length: f64) -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            tick_length,
        }
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
        self.elapsed += self.tick_length;
    }

    pub fn timestamp(&self) -> MarsTimestamp {
        MarsTimestamp::from_millisols(self.tick, self.elapsed)
    }

    pub fn millisol_of_day(&self) -> f64 {
        self.elapsed % MILLISOLS_PER_SOL
    }
}
