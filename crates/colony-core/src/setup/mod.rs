//! Settlement Setup
//!
//! Builds the starting settlement: site map, structures, storage and a
//! crew with randomized skills and aptitudes.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::components::{
    AgentId, Aptitude, Aptitudes, Colonist, ColonistName, Condition, CurrentActivity, EvaSuit,
    LocalPosition, MarsClock, MarsSurface, Material, Position, SettlementStore, SiteMap,
    SkillKind, Skills, Structure, StructureRegistry, SuitSlot,
};
use crate::config::SimConfig;
use crate::events::TickEvents;
use crate::systems::{CrewRoster, TeachingRequests};
use crate::SimRng;

const COLONIST_NAMES: &[&str] = &[
    "Amara", "Bao", "Chidi", "Dana", "Emeka", "Farah", "Goran", "Hana", "Ilse", "Jun", "Kofi",
    "Lena", "Mateo", "Nadia", "Oskar", "Priya", "Quinn", "Rafael", "Saoirse", "Tomas",
];

/// Airlocks, outdoor work sites and the indoor stations
pub fn create_site_map(config: &SimConfig) -> SiteMap {
    let d = config.activities.work_site_distance;
    SiteMap {
        airlocks: vec![LocalPosition::ORIGIN, LocalPosition::new(12.0, -6.0)],
        work_sites: vec![
            LocalPosition::new(d * 0.8, d * 0.6),
            LocalPosition::new(-d * 0.6, d * 0.8),
        ],
        ..SiteMap::default()
    }
}

pub fn create_structures() -> StructureRegistry {
    let mut registry = StructureRegistry::new();
    registry.insert(Structure::new("hab_1", "Lander Habitat", LocalPosition::new(4.0, 3.0)));
    registry.insert(Structure::new("lab_1", "Laboratory", LocalPosition::new(-5.0, 2.0)));

    let mut workshop = Structure::new("workshop_1", "Workshop", LocalPosition::new(2.0, -8.0));
    workshop.wear = 0.35;
    registry.insert(workshop);

    registry.insert(
        Structure::new("gen_1", "Methane Generator", LocalPosition::new(6.0, -4.0))
            .with_power_source(false),
    );
    registry.insert(
        Structure::new("gen_2", "Methane Generator", LocalPosition::new(60.0, -40.0))
            .outside()
            .with_power_source(false),
    );

    let mut antenna = Structure::new("antenna_1", "Antenna Mast", LocalPosition::new(-40.0, -30.0))
        .outside();
    antenna.wear = 0.25;
    registry.insert(antenna);
    registry
}

pub fn create_store() -> SettlementStore {
    SettlementStore::default()
        .with_capacity(Material::Ice, 500.0)
        .with_capacity(Material::Regolith, 800.0)
        .with_capacity(Material::RockSamples, 200.0)
}

/// Randomized skills, up to `max_level`
fn generate_skills(rng: &mut SmallRng, max_level: u32) -> Skills {
    SkillKind::all()
        .iter()
        .fold(Skills::new(), |skills, &skill| {
            skills.with_level(skill, rng.gen_range(0..=max_level))
        })
}

fn generate_aptitudes(rng: &mut SmallRng) -> Aptitudes {
    [
        Aptitude::Agility,
        Aptitude::AcademicAptitude,
        Aptitude::ExperienceAptitude,
        Aptitude::Teaching,
    ]
    .into_iter()
    .fold(Aptitudes::default(), |aptitudes, aptitude| {
        // Average of two draws keeps most colonists near the middle
        let a: f64 = rng.gen_range(0.0..100.0);
        let b: f64 = rng.gen_range(0.0..100.0);
        aptitudes.with(aptitude, (a + b) / 2.0)
    })
}

/// Spawn the crew in their quarters
pub fn spawn_colonists(world: &mut World, config: &SimConfig, rng: &mut SmallRng) -> usize {
    let quarters = world
        .get_resource::<SiteMap>()
        .map_or(LocalPosition::ORIGIN, |sites| sites.quarters);

    for i in 0..config.colonists.count {
        let name = COLONIST_NAMES[i % COLONIST_NAMES.len()];
        let mut condition = Condition {
            fatigue: rng.gen_range(0.0..0.3),
            ..Condition::default()
        };
        condition.refresh_performance();

        world.spawn((
            Colonist,
            AgentId::new(format!("colonist_{:03}", i + 1)),
            ColonistName(name.to_string()),
            Position(quarters),
            generate_skills(rng, config.colonists.max_starting_skill),
            generate_aptitudes(rng),
            condition,
            SuitSlot(Some(EvaSuit::new(
                config.suits.oxygen_capacity,
                config.suits.water_capacity,
            ))),
            CurrentActivity::default(),
        ));
    }
    config.colonists.count
}

/// A world with every resource the schedule needs and the crew spawned
pub fn build_world(config: &SimConfig) -> World {
    let mut world = World::new();
    let mut rng = SmallRng::seed_from_u64(config.simulation.seed);

    world.insert_resource(config.clone());
    world.insert_resource(MarsClock::new(config.simulation.tick_millisols));
    world.insert_resource(MarsSurface {
        polar_night: config.simulation.polar_night,
        ..MarsSurface::default()
    });
    world.insert_resource(create_site_map(config));
    world.insert_resource(create_structures());
    world.insert_resource(create_store());
    world.insert_resource(CrewRoster::new());
    world.insert_resource(TeachingRequests::default());
    world.insert_resource(TickEvents::new());

    spawn_colonists(&mut world, config, &mut rng);
    world.insert_resource(SimRng(rng));
    world
}
