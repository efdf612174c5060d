//! Collaborator interfaces consumed by the activity engine.
//!
//! Activities never reach into global state. Everything they need from the
//! surrounding world arrives through an [`ActivityContext`] handed to
//! [`Activity::advance`](crate::activity::Activity::advance). The context is
//! split into narrow traits so each concern can be implemented and tested on
//! its own; any type implementing all of them is an `ActivityContext`.

use colony_events::ActivityEvent;
use rand::RngCore;

use crate::components::{
    AgentId, Aptitude, Equipment, LocalPosition, Material, SkillKind, StructureId, StructureSite,
};

/// Martian surface conditions
pub trait Environment {
    /// Solar irradiance at `at`, W/m²
    fn sunlight_level(&self, at: LocalPosition) -> f64;
    /// Inside a polar region during its months-long night
    fn is_dark_polar_region(&self, at: LocalPosition) -> bool;
}

/// The colonist performing the activity
pub trait Crew {
    fn agent_id(&self) -> &AgentId;
    /// 0.0 to 1.0
    fn performance_rating(&self) -> f64;
    fn skill_level(&self, skill: SkillKind) -> u32;
    /// 0.0 to 100.0
    fn aptitude(&self, aptitude: Aptitude) -> f64;
    fn position(&self) -> LocalPosition;
    fn set_position(&mut self, to: LocalPosition);
    fn add_experience(&mut self, skill: SkillKind, points: f64);
    fn relieve_fatigue(&mut self, amount: f64);
    /// Experience bonus granted by being taught by `teacher`
    fn teacher_bonus(&self, teacher: &AgentId) -> f64;
    /// Someone nearby who could learn `skill` from this colonist
    fn find_student(&self, skill: SkillKind) -> Option<AgentId>;
    /// Deferred change to another colonist's teacher
    fn request_teacher(&mut self, request: TeachingRequest);
}

/// A teacher joining or leaving a student's current activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeachingRequest {
    Attach { student: AgentId, teacher: AgentId },
    /// Ignored unless `teacher` is still the one attached
    Detach { student: AgentId, teacher: AgentId },
}

impl TeachingRequest {
    pub fn student(&self) -> &AgentId {
        match self {
            TeachingRequest::Attach { student, .. } | TeachingRequest::Detach { student, .. } => {
                student
            }
        }
    }

    pub fn teacher(&self) -> &AgentId {
        match self {
            TeachingRequest::Attach { teacher, .. } | TeachingRequest::Detach { teacher, .. } => {
                teacher
            }
        }
    }
}

/// EVA gear worn by the colonist
pub trait Gear {
    fn suit(&self) -> Option<&dyn Equipment>;
}

/// Route planning
pub trait Navigation {
    fn can_walk_all_steps(&self, from: LocalPosition, to: LocalPosition) -> bool;
    /// Closest airlock to return through after an EVA
    fn nearest_airlock(&self, from: LocalPosition) -> Option<LocalPosition>;
}

/// What an accident damages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccidentTarget {
    /// The colonist's EVA suit
    Suit,
    Structure(StructureId),
}

impl std::fmt::Display for AccidentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccidentTarget::Suit => f.write_str("eva_suit"),
            AccidentTarget::Structure(id) => write!(f, "structure:{}", id),
        }
    }
}

/// Stochastic failure injection
pub trait Hazards {
    /// Hazard multiplier from the target's wear, 1.0 for pristine
    fn wear_modifier(&self, target: &AccidentTarget) -> f64;
    fn trigger_accident(&mut self, target: &AccidentTarget);
    fn rng(&mut self) -> &mut dyn RngCore;
}

/// Bulk storage the colonist delivers into
pub trait Storage {
    fn remaining_capacity(&self, material: Material) -> f64;
    /// Returns the amount actually stored
    fn store_material(&mut self, material: Material, amount: f64) -> f64;
}

/// Buildings and surface infrastructure
pub trait Facilities {
    fn structure_site(&self, id: &StructureId) -> Option<StructureSite>;
    fn structure_wear(&self, id: &StructureId) -> Option<f64>;
    /// Reduce wear by `amount`; returns the wear left
    fn service_structure(&mut self, id: &StructureId, amount: f64) -> f64;
    /// Start or stop a fuel power source; false if `id` is not one
    fn set_power_source(&mut self, id: &StructureId, running: bool) -> bool;
}

/// Destination for activity events
pub trait EventSink {
    fn record(&mut self, event: ActivityEvent);
}

/// Everything an activity may touch while advancing.
pub trait ActivityContext:
    Environment + Crew + Gear + Navigation + Hazards + Storage + Facilities + EventSink
{
}

impl<T> ActivityContext for T where
    T: Environment + Crew + Gear + Navigation + Hazards + Storage + Facilities + EventSink
{
}
