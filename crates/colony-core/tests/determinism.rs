//! Determinism verification tests
//!
//! The same seed and configuration must produce the same event stream.
//! Activity ids are random UUIDs, so they are left out of the comparison.

use bevy_ecs::prelude::*;
use colony_core::events::TickEvents;
use colony_core::setup::build_world;
use colony_core::systems::{build_schedule, weighted_select, Plan};
use colony_core::{AgentId, Colonist, CurrentActivity, MarsClock, SimConfig};
use colony_events::ActivityEvent;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn run(config: &SimConfig, ticks: u64) -> Vec<ActivityEvent> {
    let mut world = build_world(config);
    let mut schedule = build_schedule();
    let mut log = Vec::new();
    for _ in 0..ticks {
        schedule.run(&mut world);
        log.extend(world.resource_mut::<TickEvents>().drain());
        world.resource_mut::<MarsClock>().advance_tick();
    }
    for event in &mut log {
        event.activity_id.clear();
    }
    log
}

/// Test that SmallRng produces identical sequences with the same seed
#[test]
fn test_rng_determinism() {
    let mut rng1 = SmallRng::seed_from_u64(42);
    let values1: Vec<f64> = (0..100).map(|_| rng1.gen()).collect();

    let mut rng2 = SmallRng::seed_from_u64(42);
    let values2: Vec<f64> = (0..100).map(|_| rng2.gen()).collect();

    assert_eq!(values1, values2, "RNG sequences should be identical with same seed");
}

/// Test weighted plan selection determinism
#[test]
fn test_weighted_selection_determinism() {
    let options = vec![
        (Plan::Sleep, 0.1),
        (Plan::Research, 0.3),
        (Plan::Teach(colony_core::SkillKind::Science), 0.4),
        (Plan::Maintain(colony_core::StructureId::new("hab_1")), 0.2),
    ];

    let mut rng1 = SmallRng::seed_from_u64(12345);
    let selections1: Vec<_> = (0..100).map(|_| weighted_select(&mut rng1, &options)).collect();

    let mut rng2 = SmallRng::seed_from_u64(12345);
    let selections2: Vec<_> = (0..100).map(|_| weighted_select(&mut rng2, &options)).collect();

    assert_eq!(selections1, selections2, "Weighted selections should be identical with same seed");
    assert!(selections1.iter().all(Option::is_some));
}

#[test]
fn test_weighted_selection_skips_empty_options() {
    let mut rng = SmallRng::seed_from_u64(1);
    assert_eq!(weighted_select(&mut rng, &[]), None);
    assert_eq!(weighted_select(&mut rng, &[(Plan::Sleep, 0.0)]), None);
}

#[test]
fn test_same_seed_same_events() {
    let config = SimConfig::default();
    let first = run(&config, 300);
    let second = run(&config, 300);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_event_ids_are_sequential() {
    let events = run(&SimConfig::default(), 100);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.event_id, format!("evt_{:08}", i + 1));
    }
    assert!(events
        .windows(2)
        .all(|pair| pair[0].timestamp.tick <= pair[1].timestamp.tick));
}

#[test]
fn test_different_seeds_diverge() {
    let mut config = SimConfig::default();
    let first = run(&config, 300);
    config.simulation.seed = 43;
    let second = run(&config, 300);

    let summary = |events: &[ActivityEvent]| -> Vec<(String, String, &'static str)> {
        events
            .iter()
            .map(|e| (e.agent_id.clone(), e.activity.clone(), e.kind_name()))
            .collect()
    };
    assert_ne!(summary(&first), summary(&second));
}

#[test]
fn test_every_colonist_gets_busy() {
    let config = SimConfig::default();
    let mut world = build_world(&config);
    let mut schedule = build_schedule();
    schedule.run(&mut world);

    let mut query = world.query_filtered::<(&AgentId, &CurrentActivity), With<Colonist>>();
    let busy = query
        .iter(&world)
        .filter(|(_, current)| !current.is_idle())
        .count();
    assert!(busy > 0);
}
