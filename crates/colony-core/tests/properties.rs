//! Engine-wide properties checked over many random time slices.

use colony_core::activity::accident::{hazard_rate, roll};
use colony_core::activity::Walk;
use colony_core::config::WalkSettings;
use colony_core::tasks::{CollectResources, MaintainStructure, PerformResearch, Sleep};
use colony_core::{
    Activity, ActivityError, LocalPosition, Material, Phase, Sandbox, SimConfig, Structure,
    StructureId,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn activities(config: &SimConfig, ctx: &mut Sandbox) -> Vec<Activity> {
    vec![
        Sleep::activity(LocalPosition::new(4.0, 3.0), config, ctx),
        PerformResearch::activity(LocalPosition::new(-5.0, 2.0), config, ctx),
        CollectResources::activity(
            Material::RockSamples,
            LocalPosition::new(176.0, 132.0),
            config,
            ctx,
        ),
        MaintainStructure::activity(StructureId::new("workshop_1"), config, ctx),
        Walk::create(LocalPosition::new(300.0, -40.0), WalkSettings::default(), 0.5, ctx),
    ]
}

#[test]
fn test_budget_is_conserved() {
    let config = SimConfig::default();
    let mut slices = SmallRng::seed_from_u64(11);

    for index in 0..5 {
        let mut workshop = Structure::new("workshop_1", "Workshop", LocalPosition::new(2.0, -8.0));
        workshop.wear = 0.3;
        let mut ctx = Sandbox::new("colonist_001")
            .with_seed(index)
            .with_structure(workshop);
        ctx.condition.fatigue = 0.5;

        let mut activity = activities(&config, &mut ctx).swap_remove(index as usize);
        for _ in 0..200 {
            let dt = match slices.gen_range(0..4) {
                0 => 0.0,
                1 => slices.gen_range(0.0..1.0),
                _ => slices.gen_range(0.0..40.0),
            };
            let before = activity.elapsed();
            let returned = activity.advance(dt, &mut ctx).unwrap();
            let consumed = activity.elapsed() - before;
            assert!(returned >= 0.0 && returned <= dt + 1e-9);
            assert!(
                (consumed + returned - dt).abs() < 1e-6,
                "{}: consumed {} + returned {} != {}",
                activity.name(),
                consumed,
                returned,
                dt
            );
        }
    }
}

#[test]
fn test_advance_after_completion_has_no_effect() {
    let config = SimConfig::default();
    let mut ctx = Sandbox::new("colonist_001");
    let mut activity = PerformResearch::activity(LocalPosition::ORIGIN, &config, &mut ctx);
    activity.advance(1000.0, &mut ctx).unwrap();
    assert!(activity.is_complete());

    let events = ctx.events.len();
    let elapsed = activity.elapsed();
    let skills = ctx.skills.clone();
    for dt in [0.0, 0.5, 10.0, 250.0] {
        assert_eq!(activity.advance(dt, &mut ctx).unwrap(), dt);
    }
    assert_eq!(ctx.events.len(), events);
    assert_eq!(activity.elapsed(), elapsed);
    assert_eq!(
        ctx.skills.experience(colony_core::SkillKind::Science),
        skills.experience(colony_core::SkillKind::Science)
    );
}

#[test]
fn test_unregistered_phases_are_refused() {
    let config = SimConfig::default();
    let mut ctx = Sandbox::new("colonist_001");
    let mut activity = Sleep::activity(LocalPosition::ORIGIN, &config, &mut ctx);

    for name in ["digging", "travel_back", "researching", ""] {
        let err = activity.set_phase(Phase::new(name)).unwrap_err();
        assert!(matches!(err, ActivityError::InvalidPhase { .. }));
    }
    assert!(activity.set_phase(colony_core::tasks::SLEEPING).is_ok());
}

#[test]
fn test_hazard_rate_falls_with_skill() {
    let base = 0.001;
    let wear = 1.3;
    for skill in 0..3 {
        assert!(hazard_rate(base, skill, wear) > hazard_rate(base, skill + 1, wear));
    }
    for skill in 4..12 {
        assert!(hazard_rate(base, skill, wear) > hazard_rate(base, skill + 1, wear));
    }
    assert!((hazard_rate(base, 0, 1.0) - 4.0 * base).abs() < 1e-15);
    assert!((hazard_rate(base, 5, 1.0) - base / 3.0).abs() < 1e-15);
    assert!((hazard_rate(base, 0, 2.0) - 8.0 * base).abs() < 1e-15);
}

#[test]
fn test_accident_frequency_tracks_hazard() {
    let trials = 200_000;
    let time = 10.0;
    let mut rng = SmallRng::seed_from_u64(5);

    let mut frequencies = Vec::new();
    for skill in [0, 1, 2, 3, 4, 5, 8] {
        let hazard = hazard_rate(0.002, skill, 1.0);
        let hits = (0..trials).filter(|_| roll(&mut rng, hazard, time)).count();
        let frequency = hits as f64 / trials as f64;
        let expected = hazard * time;
        assert!(
            (frequency - expected).abs() < 0.01,
            "skill {}: {} vs {}",
            skill,
            frequency,
            expected
        );
        frequencies.push((skill, frequency));
    }

    // Within each formula, more skill means fewer accidents.
    for pair in frequencies[..4].windows(2) {
        assert!(pair[0].1 > pair[1].1);
    }
    for pair in frequencies[4..].windows(2) {
        assert!(pair[0].1 > pair[1].1);
    }
}
