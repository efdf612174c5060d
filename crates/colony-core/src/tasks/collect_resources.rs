//! Collect loose material from the surface around the settlement.

use colony_events::ActivityEventKind;
use tracing::debug;

use crate::activity::accident::check_for_accident;
use crate::activity::{Activity, OutdoorActivity, Phase, TaskState, WorkPolicy, WorkSite};
use crate::components::{LocalPosition, Material, SkillKind};
use crate::config::SimConfig;
use crate::context::{AccidentTarget, ActivityContext};
use crate::error::ActivityError;

use super::skill_rate_modifier;

pub const COLLECTING_RESOURCES: Phase = Phase::new("collecting_resources");

const SKILLS: &[SkillKind] = &[SkillKind::Areology];

#[derive(Debug, Clone)]
pub struct CollectResources {
    material: Material,
    /// kg per millisol at skill 1
    rate: f64,
    target: f64,
    collected: f64,
    accident_rate: f64,
}

impl CollectResources {
    pub fn new(material: Material, rate: f64, target: f64, accident_rate: f64) -> Self {
        Self {
            material,
            rate,
            target,
            collected: 0.0,
            accident_rate,
        }
    }

    /// An EVA collecting `material` at `site`.
    pub fn activity(
        material: Material,
        site: LocalPosition,
        config: &SimConfig,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        let work = Self::new(
            material,
            config.activities.collect_rate,
            config.activities.collect_target,
            config.accidents.eva_base_rate,
        );
        OutdoorActivity::new(work, site, config.eva, config.walking).start(ctx)
    }

    /// kg stored so far
    pub fn collected(&self) -> f64 {
        self.collected
    }
}

impl WorkPolicy for CollectResources {
    fn name(&self) -> &str {
        "collect_resources"
    }

    fn work_phases(&self) -> Vec<Phase> {
        vec![COLLECTING_RESOURCES]
    }

    fn work_phase(&self) -> Phase {
        COLLECTING_RESOURCES
    }

    fn perform_work(
        &mut self,
        _phase: Phase,
        time: f64,
        task: &mut TaskState,
        site: &mut WorkSite,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        let rate = self.rate * skill_rate_modifier(ctx.skill_level(SkillKind::EvaOperations));
        let wanted = (self.target - self.collected).min(ctx.remaining_capacity(self.material));
        if wanted <= 0.0 || rate <= 0.0 {
            site.finish();
            return Ok(time);
        }

        let needed = wanted / rate;
        let (used, amount) = if needed <= time {
            (needed, wanted)
        } else {
            (time, rate * time)
        };
        let stored = ctx.store_material(self.material, amount);
        self.collected += stored;
        if stored > 0.0 {
            task.record(
                ctx,
                ActivityEventKind::ResourceCollected {
                    resource: self.material.to_string(),
                    amount: stored,
                },
            );
        }

        check_for_accident(
            task,
            ctx,
            AccidentTarget::Suit,
            SkillKind::EvaOperations,
            self.accident_rate,
            used,
        );

        if needed <= time || stored < amount {
            debug!(
                agent = %ctx.agent_id(),
                material = %self.material,
                collected = self.collected,
                "Collection finished"
            );
            site.finish();
            return Ok(time - used);
        }
        Ok(0.0)
    }

    fn skills(&self) -> &[SkillKind] {
        SKILLS
    }
}
