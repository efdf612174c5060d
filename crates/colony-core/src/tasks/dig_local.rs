//! Dig ice or regolith near the settlement.

use colony_events::ActivityEventKind;

use crate::activity::accident::check_for_accident;
use crate::activity::{Activity, OutdoorActivity, Phase, TaskState, WorkPolicy, WorkSite};
use crate::components::{Aptitude, LocalPosition, Material, SkillKind};
use crate::config::SimConfig;
use crate::context::{AccidentTarget, ActivityContext};
use crate::error::ActivityError;

use super::skill_rate_modifier;

pub const DIGGING: Phase = Phase::new("digging");

const SKILLS: &[SkillKind] = &[SkillKind::Areology];

/// Digging runs until the on-site time is used up or the store fills.
#[derive(Debug, Clone)]
pub struct DigLocal {
    material: Material,
    rate: f64,
    accident_rate: f64,
}

impl DigLocal {
    pub fn new(material: Material, rate: f64, accident_rate: f64) -> Self {
        Self {
            material,
            rate,
            accident_rate,
        }
    }

    pub fn activity(
        material: Material,
        site: LocalPosition,
        config: &SimConfig,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        let work = Self::new(
            material,
            config.activities.dig_rate,
            config.accidents.eva_base_rate,
        );
        OutdoorActivity::new(work, site, config.eva, config.walking)
            .with_site_time(config.activities.dig_site_time)
            .start(ctx)
    }
}

impl WorkPolicy for DigLocal {
    fn name(&self) -> &str {
        match self.material {
            Material::Ice => "dig_local_ice",
            _ => "dig_local_regolith",
        }
    }

    fn work_phases(&self) -> Vec<Phase> {
        vec![DIGGING]
    }

    fn work_phase(&self) -> Phase {
        DIGGING
    }

    fn perform_work(
        &mut self,
        _phase: Phase,
        time: f64,
        task: &mut TaskState,
        site: &mut WorkSite,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        let rate = self.rate * skill_rate_modifier(ctx.skill_level(SkillKind::Areology));
        if rate <= 0.0 || ctx.remaining_capacity(self.material) <= 0.0 {
            site.finish();
            return Ok(time);
        }

        let amount = rate * time;
        let stored = ctx.store_material(self.material, amount);
        if stored > 0.0 {
            task.record(
                ctx,
                ActivityEventKind::ResourceCollected {
                    resource: self.material.to_string(),
                    amount: stored,
                },
            );
        }

        let used = stored / rate;
        check_for_accident(
            task,
            ctx,
            AccidentTarget::Suit,
            SkillKind::EvaOperations,
            self.accident_rate,
            used,
        );

        if stored < amount {
            site.finish();
            return Ok((time - used).max(0.0));
        }
        Ok(0.0)
    }

    fn skills(&self) -> &[SkillKind] {
        SKILLS
    }

    fn experience_aptitude(&self) -> Aptitude {
        Aptitude::Agility
    }
}
