//! Routine maintenance of a structure.

use tracing::debug;

use crate::activity::accident::check_for_accident;
use crate::activity::{Activity, Phase, TaskState, WorkPolicy, WorkSite};
use crate::components::{SkillKind, StructureId};
use crate::config::SimConfig;
use crate::context::{AccidentTarget, ActivityContext};
use crate::error::ActivityError;

use super::{at_structure, skill_rate_modifier};

pub const MAINTAINING: Phase = Phase::new("maintaining");

const SKILLS: &[SkillKind] = &[SkillKind::Mechanics];

/// Wear below this counts as fully serviced
const WEAR_EPSILON: f64 = 1e-9;

/// Reduces a structure's wear until it is fully serviced.
#[derive(Debug, Clone)]
pub struct MaintainStructure {
    structure: StructureId,
    rate: f64,
    accident_rate: f64,
}

impl MaintainStructure {
    pub fn new(structure: StructureId, rate: f64, accident_rate: f64) -> Self {
        Self {
            structure,
            rate,
            accident_rate,
        }
    }

    pub fn activity(
        structure: StructureId,
        config: &SimConfig,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        let work = Self::new(
            structure.clone(),
            config.activities.maintenance_rate,
            config.accidents.maintenance_base_rate,
        );
        at_structure(work, &structure, config, ctx)
    }
}

impl WorkPolicy for MaintainStructure {
    fn name(&self) -> &str {
        "maintain_structure"
    }

    fn work_phases(&self) -> Vec<Phase> {
        vec![MAINTAINING]
    }

    fn work_phase(&self) -> Phase {
        MAINTAINING
    }

    fn perform_work(
        &mut self,
        _phase: Phase,
        time: f64,
        task: &mut TaskState,
        site: &mut WorkSite,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        let wear = match ctx.structure_wear(&self.structure) {
            Some(wear) if wear > WEAR_EPSILON => wear,
            _ => {
                site.finish();
                return Ok(time);
            }
        };
        let rate = self.rate * skill_rate_modifier(ctx.skill_level(SkillKind::Mechanics));
        if rate <= 0.0 {
            site.finish();
            return Ok(time);
        }

        let used = time.min(wear / rate);
        let left = ctx.service_structure(&self.structure, rate * used);

        check_for_accident(
            task,
            ctx,
            AccidentTarget::Structure(self.structure.clone()),
            SkillKind::Mechanics,
            self.accident_rate,
            used,
        );

        if left <= WEAR_EPSILON {
            debug!(agent = %ctx.agent_id(), structure = %self.structure, "Maintenance finished");
            site.finish();
        }
        Ok(time - used)
    }

    fn skills(&self) -> &[SkillKind] {
        SKILLS
    }
}
