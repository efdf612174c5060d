//! Environment and colonist upkeep that runs before activities advance.

use bevy_ecs::prelude::*;
use tracing::warn;

use crate::components::{
    AgentId, Colonist, Condition, CurrentActivity, MarsClock, MarsSurface, Position, SiteMap,
    SuitSlot,
};
use crate::config::SimConfig;

/// System: move the sun
pub fn update_surface(clock: Res<MarsClock>, mut surface: ResMut<MarsSurface>) {
    surface.millisol_of_day = clock.millisol_of_day();
}

/// System: colonists tire while awake
pub fn update_condition(
    config: Res<SimConfig>,
    clock: Res<MarsClock>,
    mut query: Query<(&mut Condition, &CurrentActivity), With<Colonist>>,
) {
    for (mut condition, current) in query.iter_mut() {
        let asleep = current
            .0
            .as_ref()
            .is_some_and(|a| !a.is_complete() && a.name() == "sleep");
        if !asleep {
            condition.fatigue =
                (condition.fatigue + config.condition.fatigue_rate * clock.tick_length).min(1.0);
        }
        condition.refresh_performance();
    }
}

/// System: suits drain outside and are serviced in the habitat
pub fn update_suits(
    config: Res<SimConfig>,
    clock: Res<MarsClock>,
    sites: Res<SiteMap>,
    mut query: Query<(&AgentId, &Position, &mut SuitSlot), With<Colonist>>,
) {
    let usage = config.suits;
    for (agent, position, mut slot) in query.iter_mut() {
        let Some(suit) = slot.0.as_mut() else {
            continue;
        };
        if sites.is_inside(position.0) {
            suit.refill();
            suit.malfunction = false;
            continue;
        }
        let dt = clock.tick_length;
        if !suit.consume(usage.oxygen_usage * dt, usage.water_usage * dt) {
            warn!(agent = %agent, "Suit consumables exhausted");
            suit.life_support_ok = false;
        }
    }
}
