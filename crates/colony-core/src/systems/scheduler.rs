//! Per-colonist activity scheduling.
//!
//! Idle colonists get a new activity picked by weighted random selection
//! over what makes sense right now. Every tick each busy colonist's
//! activity is advanced once by the tick length, one colonist at a time in
//! id order.

use bevy_ecs::prelude::*;
use colony_events::{ActivityEvent, ActivityEventKind};
use rand::Rng;
use tracing::{debug, error};

use crate::activity::Activity;
use crate::components::{
    AgentId, Aptitudes, Colonist, Condition, CurrentActivity, EvaSuit, LocalPosition, MarsClock,
    MarsSurface, Material, Position, SettlementStore, SiteMap, SkillKind, Skills, StructureId,
    StructureRegistry, SuitSlot,
};
use crate::config::SimConfig;
use crate::context::EventSink;
use crate::events::TickEvents;
use crate::tasks::{
    CollectResources, DigLocal, MaintainStructure, PerformResearch, Sleep, TeachSkill,
    ToggleFuelPowerSource,
};
use crate::SimRng;

use super::colony::{ColonistContext, Colony};
use super::roster::{CrewRoster, TeachingRequests};

/// What an idle colonist will do next
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Sleep,
    Research,
    Teach(SkillKind),
    Collect(Material, LocalPosition),
    Dig(Material, LocalPosition),
    Maintain(StructureId),
    TogglePower(StructureId, bool),
}

/// Weighted options for an idle colonist.
pub fn plan_options(
    condition: &Condition,
    skills: &Skills,
    suit: Option<&EvaSuit>,
    surface: &MarsSurface,
    sites: &SiteMap,
    structures: &StructureRegistry,
    store: &SettlementStore,
    config: &SimConfig,
) -> Vec<(Plan, f64)> {
    if condition.fatigue >= config.condition.sleep_threshold {
        return vec![(Plan::Sleep, 1.0)];
    }

    let mut options = vec![(Plan::Research, 1.0)];
    if skills.level(SkillKind::Teaching) > 0 {
        options.push((Plan::Teach(SkillKind::Science), 0.5));
    }
    if let Some(worn) = structures.most_worn(config.activities.maintenance_min_wear) {
        options.push((Plan::Maintain(worn.id.clone()), 1.0 + 2.0 * worn.wear));
    }

    // Generators run through the night and stand down by day.
    let daylight = surface.irradiance() > 0.0;
    if let Some(source) = structures
        .power_sources()
        .find(|s| s.power_source == Some(daylight))
    {
        options.push((Plan::TogglePower(source.id.clone(), !daylight), 2.0));
    }

    if daylight && suit.is_some() {
        let mut sites_iter = sites.work_sites.iter().copied();
        if let Some(site) = sites_iter.next() {
            if store.remaining_capacity(Material::RockSamples) > 0.0 {
                options.push((Plan::Collect(Material::RockSamples, site), 1.0));
            }
            let dig_site = sites_iter.next().unwrap_or(site);
            if store.remaining_capacity(Material::Ice) > 0.0 {
                options.push((Plan::Dig(Material::Ice, dig_site), 1.0));
            }
        }
    }
    options
}

/// Pick one option, each with probability proportional to its weight.
pub fn weighted_select<R: Rng + ?Sized>(rng: &mut R, options: &[(Plan, f64)]) -> Option<Plan> {
    let total: f64 = options.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    let r = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (plan, weight) in options {
        cumulative += weight;
        if r < cumulative {
            return Some(plan.clone());
        }
    }
    options.last().map(|(plan, _)| plan.clone())
}

/// Build the activity for `plan`.
pub fn start_activity(
    plan: &Plan,
    config: &SimConfig,
    quarters: LocalPosition,
    laboratory: LocalPosition,
    ctx: &mut ColonistContext<'_, '_>,
) -> Activity {
    match plan {
        Plan::Sleep => Sleep::activity(quarters, config, ctx),
        Plan::Research => PerformResearch::activity(laboratory, config, ctx),
        Plan::Teach(skill) => TeachSkill::activity(*skill, laboratory, config, ctx),
        Plan::Collect(material, site) => CollectResources::activity(*material, *site, config, ctx),
        Plan::Dig(material, site) => DigLocal::activity(*material, *site, config, ctx),
        Plan::Maintain(id) => MaintainStructure::activity(id.clone(), config, ctx),
        Plan::TogglePower(id, start) => {
            ToggleFuelPowerSource::activity(id.clone(), *start, config, ctx)
        }
    }
}

/// System: hand out activities to idle colonists
#[allow(clippy::too_many_arguments)]
pub fn assign_activities(
    config: Res<SimConfig>,
    clock: Res<MarsClock>,
    surface: Res<MarsSurface>,
    sites: Res<SiteMap>,
    roster: Res<CrewRoster>,
    mut structures: ResMut<StructureRegistry>,
    mut store: ResMut<SettlementStore>,
    mut rng: ResMut<SimRng>,
    mut tick_events: ResMut<TickEvents>,
    mut requests: ResMut<TeachingRequests>,
    mut query: Query<
        (
            &AgentId,
            &mut Position,
            &mut Condition,
            &mut Skills,
            &Aptitudes,
            &mut SuitSlot,
            &mut CurrentActivity,
        ),
        With<Colonist>,
    >,
) {
    let mut colonists: Vec<_> = query.iter_mut().filter(|c| c.6.is_idle()).collect();
    colonists.sort_by(|a, b| a.0.cmp(b.0));

    let mut colony = Colony {
        surface: &surface,
        sites: &sites,
        roster: &roster,
        structures: &mut structures,
        store: &mut store,
        rng: &mut rng.0,
        events: &mut tick_events,
        requests: &mut requests,
        timestamp: clock.timestamp(),
    };

    for (agent, mut position, mut condition, mut skills, aptitudes, mut suit, mut current) in
        colonists
    {
        let options = plan_options(
            &condition,
            &skills,
            suit.0.as_ref(),
            colony.surface,
            colony.sites,
            colony.structures,
            colony.store,
            &config,
        );
        let Some(plan) = weighted_select(colony.rng, &options) else {
            continue;
        };

        let quarters = colony.sites.quarters;
        let laboratory = colony.sites.laboratory;
        let mut ctx = ColonistContext {
            agent,
            position: &mut position.0,
            condition: &mut condition,
            skills: &mut skills,
            aptitudes,
            suit: &mut suit.0,
            colony: &mut colony,
        };
        let activity = start_activity(&plan, &config, quarters, laboratory, &mut ctx);
        if activity.is_complete() {
            debug!(agent = %agent, plan = ?plan, "Planned activity could not start");
            continue;
        }
        debug!(agent = %agent, activity = activity.name(), "Assigned activity");
        current.0 = Some(activity);
    }
}

/// System: advance every colonist's activity by one tick
#[allow(clippy::too_many_arguments)]
pub fn advance_activities(
    clock: Res<MarsClock>,
    surface: Res<MarsSurface>,
    sites: Res<SiteMap>,
    roster: Res<CrewRoster>,
    mut structures: ResMut<StructureRegistry>,
    mut store: ResMut<SettlementStore>,
    mut rng: ResMut<SimRng>,
    mut tick_events: ResMut<TickEvents>,
    mut requests: ResMut<TeachingRequests>,
    mut query: Query<
        (
            &AgentId,
            &mut Position,
            &mut Condition,
            &mut Skills,
            &Aptitudes,
            &mut SuitSlot,
            &mut CurrentActivity,
        ),
        With<Colonist>,
    >,
) {
    let mut colonists: Vec<_> = query.iter_mut().filter(|c| !c.6.is_idle()).collect();
    colonists.sort_by(|a, b| a.0.cmp(b.0));

    let mut colony = Colony {
        surface: &surface,
        sites: &sites,
        roster: &roster,
        structures: &mut structures,
        store: &mut store,
        rng: &mut rng.0,
        events: &mut tick_events,
        requests: &mut requests,
        timestamp: clock.timestamp(),
    };

    for (agent, mut position, mut condition, mut skills, aptitudes, mut suit, mut current) in
        colonists
    {
        let Some(activity) = current.0.as_mut() else {
            continue;
        };
        let mut ctx = ColonistContext {
            agent,
            position: &mut position.0,
            condition: &mut condition,
            skills: &mut skills,
            aptitudes,
            suit: &mut suit.0,
            colony: &mut colony,
        };

        if let Err(err) = activity.advance(clock.tick_length, &mut ctx) {
            error!(
                agent = %agent,
                activity = activity.name(),
                error = %err,
                "Aborting activity stack"
            );
            ctx.record(ActivityEvent::new(
                agent.as_str(),
                activity.id().to_string(),
                activity.name(),
                ActivityEventKind::StackAborted {
                    error: err.to_string(),
                },
            ));
            activity.complete(&mut ctx);
            current.0 = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::activity::{ActivityPolicy, Phase, TaskState};
    use crate::context::{ActivityContext, TeachingRequest};
    use crate::error::ActivityError;
    use crate::setup::build_world;

    const LECTURING: Phase = Phase::new("lecturing");
    const NOWHERE: Phase = Phase::new("nowhere");

    /// Holds a student and then enters a phase it never registered.
    struct Broken {
        cleanups: Arc<AtomicUsize>,
    }

    impl ActivityPolicy for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn phases(&self) -> Vec<Phase> {
            vec![LECTURING]
        }

        fn initial_phase(&self) -> Phase {
            LECTURING
        }

        fn perform_phase(
            &mut self,
            _phase: Phase,
            _time: f64,
            task: &mut TaskState,
            _ctx: &mut dyn ActivityContext,
        ) -> Result<f64, ActivityError> {
            task.set_phase(NOWHERE)?;
            Ok(0.0)
        }

        fn on_complete(&mut self, ctx: &mut dyn ActivityContext) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            let teacher = ctx.agent_id().clone();
            ctx.request_teacher(TeachingRequest::Detach {
                student: AgentId::new("colonist_002"),
                teacher,
            });
        }
    }

    #[test]
    fn test_failed_activity_runs_cleanup() {
        let mut world = build_world(&SimConfig::default());
        let cleanups = Arc::new(AtomicUsize::new(0));
        let activity = Activity::new(Box::new(Broken {
            cleanups: Arc::clone(&cleanups),
        }));

        let mut query = world.query::<(Entity, &AgentId)>();
        let colonist = query
            .iter(&world)
            .find(|(_, id)| id.as_str() == "colonist_001")
            .map(|(entity, _)| entity)
            .expect("colonist_001 is spawned");
        world
            .entity_mut(colonist)
            .insert(CurrentActivity(Some(activity)));

        let mut schedule = Schedule::default();
        schedule.add_systems(advance_activities);
        schedule.run(&mut world);

        assert_eq!(cleanups.load(Ordering::SeqCst), 1);

        let kinds: Vec<_> = world
            .resource_mut::<TickEvents>()
            .drain()
            .iter()
            .map(|e| e.kind_name())
            .collect();
        assert_eq!(kinds, vec!["started", "stack_aborted", "completed"]);

        let requests = world.resource_mut::<TeachingRequests>().drain();
        assert_eq!(
            requests,
            vec![TeachingRequest::Detach {
                student: AgentId::new("colonist_002"),
                teacher: AgentId::new("colonist_001"),
            }]
        );

        let mut query = world.query::<(&AgentId, &CurrentActivity)>();
        assert!(query.iter(&world).all(|(_, current)| current.is_idle()));
    }
}
