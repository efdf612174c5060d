//! Accident injection shared by EVA and maintenance work.
//!
//! The hazard per millisol starts at a base rate, is scaled by the
//! colonist's proficiency and by the wear of the equipment involved, and is
//! rolled against a uniform draw every tick of hazardous work.

use colony_events::ActivityEventKind;
use rand::Rng;
use tracing::info;

use crate::components::SkillKind;
use crate::context::{AccidentTarget, ActivityContext};

use super::TaskState;

/// Hazard per millisol.
///
/// Skill up to 3 multiplies the base by `4 - skill`; above 3 it divides by
/// `skill - 2`. Wear multiplies the result.
pub fn hazard_rate(base: f64, skill: u32, wear_modifier: f64) -> f64 {
    let skill = f64::from(skill);
    let mut hazard = base;
    if skill <= 3.0 {
        hazard *= 4.0 - skill;
    } else {
        hazard /= skill - 2.0;
    }
    hazard * wear_modifier
}

/// Roll once for an accident over `time` millisols.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, hazard: f64, time: f64) -> bool {
    rng.gen::<f64>() < hazard * time
}

/// Roll for an accident on `target` and apply it when it happens.
///
/// Returns whether an accident was triggered. Accidents are side effects,
/// never failures of the calling activity.
pub fn check_for_accident(
    task: &TaskState,
    ctx: &mut dyn ActivityContext,
    target: AccidentTarget,
    skill: SkillKind,
    base_rate: f64,
    time: f64,
) -> bool {
    if base_rate <= 0.0 || time <= 0.0 {
        return false;
    }
    let hazard = hazard_rate(base_rate, ctx.skill_level(skill), ctx.wear_modifier(&target));
    if !roll(ctx.rng(), hazard, time) {
        return false;
    }

    info!(
        agent = %ctx.agent_id(),
        activity = task.name(),
        target = %target,
        "Accident during {}",
        task.name()
    );
    ctx.trigger_accident(&target);
    task.record(
        ctx,
        ActivityEventKind::Accident {
            target: target.to_string(),
        },
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_low_skill_multiplies() {
        assert!((hazard_rate(0.01, 0, 1.0) - 0.04).abs() < 1e-12);
        assert!((hazard_rate(0.01, 3, 1.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_high_skill_divides() {
        assert!((hazard_rate(0.03, 5, 1.0) - 0.01).abs() < 1e-12);
        assert!((hazard_rate(0.03, 4, 1.0) - 0.015).abs() < 1e-12);
    }

    #[test]
    fn test_wear_scales() {
        assert!((hazard_rate(0.01, 3, 1.5) - 0.015).abs() < 1e-12);
    }

    #[test]
    fn test_roll_extremes() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(!roll(&mut rng, 0.0, 10.0));
        assert!(roll(&mut rng, 1.0, 1.0));
    }
}
