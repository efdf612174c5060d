//! ECS Systems
//!
//! Per-tick upkeep, activity assignment and activity advancement.

pub mod colony;
pub mod condition;
pub mod roster;
pub mod scheduler;

pub use colony::{ColonistContext, Colony};
pub use condition::{update_condition, update_suits, update_surface};
pub use roster::{
    apply_teaching_requests, build_crew_roster, CrewRoster, RosterEntry, TeachingRequests,
};
pub use scheduler::{advance_activities, assign_activities, plan_options, weighted_select, Plan};

use bevy_ecs::prelude::*;

/// The per-tick schedule, in execution order
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            update_surface,
            build_crew_roster,
            update_condition,
            update_suits,
            assign_activities,
            advance_activities,
            apply_teaching_requests,
        )
            .chain(),
    );
    schedule
}
