//! Start or stop a fuel-burning power source.
//!
//! The same work runs inside a building or, for generators standing on the
//! surface, as an EVA. The bracket chosen by the structure's location
//! decides the activity name and who an accident hurts.

use tracing::warn;

use crate::activity::accident::check_for_accident;
use crate::activity::{Activity, Phase, TaskState, WorkPolicy, WorkSite, TIME_EPSILON};
use crate::components::{SkillKind, StructureId};
use crate::config::SimConfig;
use crate::context::ActivityContext;
use crate::error::ActivityError;

use super::at_structure;

pub const TOGGLING_POWER: Phase = Phase::new("toggling_power_source");

const SKILLS: &[SkillKind] = &[SkillKind::Mechanics];

#[derive(Debug, Clone)]
pub struct ToggleFuelPowerSource {
    structure: StructureId,
    start: bool,
    /// Millisols of work needed
    work_time: f64,
    progress: f64,
}

impl ToggleFuelPowerSource {
    pub fn new(structure: StructureId, start: bool, work_time: f64) -> Self {
        Self {
            structure,
            start,
            work_time,
            progress: 0.0,
        }
    }

    /// Start (`start == true`) or stop the power source `structure`.
    pub fn activity(
        structure: StructureId,
        start: bool,
        config: &SimConfig,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        let work = Self::new(structure.clone(), start, config.activities.toggle_duration);
        at_structure(work, &structure, config, ctx)
    }
}

impl WorkPolicy for ToggleFuelPowerSource {
    fn name(&self) -> &str {
        if self.start {
            "start_fuel_power_source"
        } else {
            "stop_fuel_power_source"
        }
    }

    fn work_phases(&self) -> Vec<Phase> {
        vec![TOGGLING_POWER]
    }

    fn work_phase(&self) -> Phase {
        TOGGLING_POWER
    }

    fn perform_work(
        &mut self,
        _phase: Phase,
        time: f64,
        task: &mut TaskState,
        site: &mut WorkSite,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        let used = time.min(self.work_time - self.progress).max(0.0);
        self.progress += used;

        if let Some(hazard) = site.hazard().cloned() {
            check_for_accident(
                task,
                ctx,
                hazard.target,
                SkillKind::Mechanics,
                hazard.base_rate,
                used,
            );
        }

        if self.progress >= self.work_time - TIME_EPSILON {
            if !ctx.set_power_source(&self.structure, self.start) {
                warn!(structure = %self.structure, "Not a fuel power source");
            }
            site.finish();
        }
        Ok(time - used)
    }

    fn skills(&self) -> &[SkillKind] {
        SKILLS
    }
}
