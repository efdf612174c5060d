//! Single-colonist context backed by plain fields.
//!
//! Drives activities without an ECS world. Tests and tools set the fields
//! they care about and inspect the recorded events and accidents afterwards.

use std::collections::HashMap;

use colony_events::{generate_event_id, ActivityEvent, MarsTimestamp};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::components::{
    AgentId, Aptitude, Aptitudes, Condition, Equipment, EvaSuit, LocalPosition, Material,
    SettlementStore, SiteMap, SkillKind, Skills, Structure, StructureId, StructureRegistry,
    StructureSite,
};
use crate::context::{
    AccidentTarget, Crew, Environment, EventSink, Facilities, Gear, Hazards, Navigation, Storage,
    TeachingRequest,
};

pub struct Sandbox {
    pub agent: AgentId,
    pub position: LocalPosition,
    pub condition: Condition,
    pub skills: Skills,
    pub aptitudes: Aptitudes,
    pub suit: Option<EvaSuit>,
    /// W/m² everywhere
    pub sunlight: f64,
    pub polar_night: bool,
    pub sites: SiteMap,
    pub store: SettlementStore,
    pub structures: StructureRegistry,
    pub rng: SmallRng,
    pub timestamp: MarsTimestamp,
    pub events: Vec<ActivityEvent>,
    pub accidents: Vec<AccidentTarget>,
    /// Bonus each known teacher grants
    pub teacher_bonuses: HashMap<AgentId, f64>,
    /// Returned in order by `find_student`
    pub students: Vec<AgentId>,
    pub teacher_requests: Vec<TeachingRequest>,
}

impl Sandbox {
    /// A rested colonist at the origin airlock in a full suit at noon.
    pub fn new(agent: &str) -> Self {
        Self {
            agent: AgentId::new(agent),
            position: LocalPosition::ORIGIN,
            condition: Condition::default(),
            skills: Skills::new(),
            aptitudes: Aptitudes::default(),
            suit: Some(EvaSuit::new(1.0, 4.0)),
            sunlight: 500.0,
            polar_night: false,
            sites: SiteMap::default(),
            store: SettlementStore::default()
                .with_capacity(Material::Ice, 1000.0)
                .with_capacity(Material::Regolith, 1000.0)
                .with_capacity(Material::RockSamples, 1000.0),
            structures: StructureRegistry::new(),
            rng: SmallRng::seed_from_u64(0),
            timestamp: MarsTimestamp::start(),
            events: Vec::new(),
            accidents: Vec::new(),
            teacher_bonuses: HashMap::new(),
            students: Vec::new(),
            teacher_requests: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structures.insert(structure);
        self
    }

    /// Events of one kind, by their serialized tag
    pub fn events_of(&self, kind: &str) -> Vec<&ActivityEvent> {
        self.events
            .iter()
            .filter(|e| e.kind_name() == kind)
            .collect()
    }
}

impl Environment for Sandbox {
    fn sunlight_level(&self, _at: LocalPosition) -> f64 {
        self.sunlight
    }

    fn is_dark_polar_region(&self, _at: LocalPosition) -> bool {
        self.polar_night
    }
}

impl Crew for Sandbox {
    fn agent_id(&self) -> &AgentId {
        &self.agent
    }

    fn performance_rating(&self) -> f64 {
        self.condition.performance
    }

    fn skill_level(&self, skill: SkillKind) -> u32 {
        self.skills.level(skill)
    }

    fn aptitude(&self, aptitude: Aptitude) -> f64 {
        self.aptitudes.get(aptitude)
    }

    fn position(&self) -> LocalPosition {
        self.position
    }

    fn set_position(&mut self, to: LocalPosition) {
        self.position = to;
    }

    fn add_experience(&mut self, skill: SkillKind, points: f64) {
        self.skills.add_experience(skill, points);
    }

    fn relieve_fatigue(&mut self, amount: f64) {
        self.condition.relieve_fatigue(amount);
    }

    fn teacher_bonus(&self, teacher: &AgentId) -> f64 {
        self.teacher_bonuses.get(teacher).copied().unwrap_or(0.0)
    }

    fn find_student(&self, _skill: SkillKind) -> Option<AgentId> {
        self.students.first().cloned()
    }

    fn request_teacher(&mut self, request: TeachingRequest) {
        self.teacher_requests.push(request);
    }
}

impl Gear for Sandbox {
    fn suit(&self) -> Option<&dyn Equipment> {
        self.suit.as_ref().map(|suit| suit as &dyn Equipment)
    }
}

impl Navigation for Sandbox {
    fn can_walk_all_steps(&self, from: LocalPosition, to: LocalPosition) -> bool {
        self.sites.can_walk_all_steps(from, to)
    }

    fn nearest_airlock(&self, from: LocalPosition) -> Option<LocalPosition> {
        self.sites.nearest_airlock(from)
    }
}

impl Hazards for Sandbox {
    fn wear_modifier(&self, target: &AccidentTarget) -> f64 {
        match target {
            AccidentTarget::Suit => self
                .suit
                .as_ref()
                .map_or(1.0, EvaSuit::wear_accident_modifier),
            AccidentTarget::Structure(id) => self
                .structures
                .get(id)
                .map_or(1.0, Structure::wear_accident_modifier),
        }
    }

    fn trigger_accident(&mut self, target: &AccidentTarget) {
        match target {
            AccidentTarget::Suit => {
                if let Some(suit) = self.suit.as_mut() {
                    suit.damage();
                }
            }
            AccidentTarget::Structure(id) => {
                if let Some(structure) = self.structures.get_mut(id) {
                    structure.damage();
                }
            }
        }
        self.accidents.push(target.clone());
    }

    fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }
}

impl Storage for Sandbox {
    fn remaining_capacity(&self, material: Material) -> f64 {
        self.store.remaining_capacity(material)
    }

    fn store_material(&mut self, material: Material, amount: f64) -> f64 {
        self.store.store(material, amount)
    }
}

impl Facilities for Sandbox {
    fn structure_site(&self, id: &StructureId) -> Option<StructureSite> {
        self.structures.get(id).map(Structure::site)
    }

    fn structure_wear(&self, id: &StructureId) -> Option<f64> {
        self.structures.get(id).map(|s| s.wear)
    }

    fn service_structure(&mut self, id: &StructureId, amount: f64) -> f64 {
        self.structures.service(id, amount)
    }

    fn set_power_source(&mut self, id: &StructureId, running: bool) -> bool {
        self.structures.set_power_source(id, running)
    }
}

impl EventSink for Sandbox {
    fn record(&mut self, mut event: ActivityEvent) {
        event.event_id = generate_event_id(self.events.len() as u64);
        event.timestamp = self.timestamp;
        self.events.push(event);
    }
}
