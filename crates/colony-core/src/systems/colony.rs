//! ECS-backed activity context.
//!
//! [`Colony`] borrows the shared resources for the duration of a system and
//! [`ColonistContext`] adds one colonist's components on top, giving
//! activities everything they may touch for that colonist.

use colony_events::{ActivityEvent, MarsTimestamp};
use rand::rngs::SmallRng;
use rand::RngCore;

use crate::components::{
    AgentId, Aptitude, Aptitudes, Condition, Equipment, EvaSuit, LocalPosition, MarsSurface,
    Material, SettlementStore, SiteMap, SkillKind, Skills, Structure, StructureId,
    StructureRegistry, StructureSite,
};
use crate::context::{
    AccidentTarget, Crew, Environment, EventSink, Facilities, Gear, Hazards, Navigation, Storage,
    TeachingRequest,
};
use crate::events::TickEvents;

use super::roster::{CrewRoster, TeachingRequests};

/// Shared resources borrowed for one pass over the crew
pub struct Colony<'w> {
    pub surface: &'w MarsSurface,
    pub sites: &'w SiteMap,
    pub roster: &'w CrewRoster,
    pub structures: &'w mut StructureRegistry,
    pub store: &'w mut SettlementStore,
    pub rng: &'w mut SmallRng,
    pub events: &'w mut TickEvents,
    pub requests: &'w mut TeachingRequests,
    pub timestamp: MarsTimestamp,
}

/// One colonist's view of the colony
pub struct ColonistContext<'a, 'w> {
    pub agent: &'a AgentId,
    pub position: &'a mut LocalPosition,
    pub condition: &'a mut Condition,
    pub skills: &'a mut Skills,
    pub aptitudes: &'a Aptitudes,
    pub suit: &'a mut Option<EvaSuit>,
    pub colony: &'a mut Colony<'w>,
}

impl Environment for ColonistContext<'_, '_> {
    fn sunlight_level(&self, _at: LocalPosition) -> f64 {
        self.colony.surface.irradiance()
    }

    fn is_dark_polar_region(&self, _at: LocalPosition) -> bool {
        self.colony.surface.polar_night
    }
}

impl Crew for ColonistContext<'_, '_> {
    fn agent_id(&self) -> &AgentId {
        self.agent
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
        *self.position
    }

    fn set_position(&mut self, to: LocalPosition) {
        *self.position = to;
    }

    fn add_experience(&mut self, skill: SkillKind, points: f64) {
        self.skills.add_experience(skill, points);
    }

    fn relieve_fatigue(&mut self, amount: f64) {
        self.condition.relieve_fatigue(amount);
    }

    fn teacher_bonus(&self, teacher: &AgentId) -> f64 {
        self.colony
            .roster
            .get(teacher)
            .map_or(0.0, |entry| entry.teaching_bonus())
    }

    fn find_student(&self, skill: SkillKind) -> Option<AgentId> {
        self.colony
            .roster
            .find_student(self.agent, skill, &*self.colony.requests)
    }

    fn request_teacher(&mut self, request: TeachingRequest) {
        self.colony.requests.push(request);
    }
}

impl Gear for ColonistContext<'_, '_> {
    fn suit(&self) -> Option<&dyn Equipment> {
        self.suit.as_ref().map(|suit| suit as &dyn Equipment)
    }
}

impl Navigation for ColonistContext<'_, '_> {
    fn can_walk_all_steps(&self, from: LocalPosition, to: LocalPosition) -> bool {
        self.colony.sites.can_walk_all_steps(from, to)
    }

    fn nearest_airlock(&self, from: LocalPosition) -> Option<LocalPosition> {
        self.colony.sites.nearest_airlock(from)
    }
}

impl Hazards for ColonistContext<'_, '_> {
    fn wear_modifier(&self, target: &AccidentTarget) -> f64 {
        match target {
            AccidentTarget::Suit => self
                .suit
                .as_ref()
                .map_or(1.0, EvaSuit::wear_accident_modifier),
            AccidentTarget::Structure(id) => self
                .colony
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
                if let Some(structure) = self.colony.structures.get_mut(id) {
                    structure.damage();
                }
            }
        }
    }

    fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.colony.rng
    }
}

impl Storage for ColonistContext<'_, '_> {
    fn remaining_capacity(&self, material: Material) -> f64 {
        self.colony.store.remaining_capacity(material)
    }

    fn store_material(&mut self, material: Material, amount: f64) -> f64 {
        self.colony.store.store(material, amount)
    }
}

impl Facilities for ColonistContext<'_, '_> {
    fn structure_site(&self, id: &StructureId) -> Option<StructureSite> {
        self.colony.structures.get(id).map(Structure::site)
    }

    fn structure_wear(&self, id: &StructureId) -> Option<f64> {
        self.colony.structures.get(id).map(|s| s.wear)
    }

    fn service_structure(&mut self, id: &StructureId, amount: f64) -> f64 {
        self.colony.structures.service(id, amount)
    }

    fn set_power_source(&mut self, id: &StructureId, running: bool) -> bool {
        self.colony.structures.set_power_source(id, running)
    }
}

impl EventSink for ColonistContext<'_, '_> {
    fn record(&mut self, event: ActivityEvent) {
        let timestamp = self.colony.timestamp;
        self.colony.events.record(event, timestamp);
    }
}
