//! Laboratory research.
//!
//! Research builds science experience and is the activity teachers attach
//! to; a taught researcher gains `1 + teacher_bonus` times the experience.

use crate::activity::{Activity, IndoorActivity, Phase, TaskState, WorkPolicy, WorkSite};
use crate::components::{Aptitude, LocalPosition, SkillKind};
use crate::config::SimConfig;
use crate::context::ActivityContext;
use crate::error::ActivityError;

pub const RESEARCHING: Phase = Phase::new("researching");

const SKILLS: &[SkillKind] = &[SkillKind::Science];

#[derive(Debug, Clone, Default)]
pub struct PerformResearch;

impl PerformResearch {
    pub fn activity(
        lab: LocalPosition,
        config: &SimConfig,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        IndoorActivity::new(PerformResearch, lab, config.walking)
            .start(ctx)
            .with_duration(config.activities.research_duration)
    }
}

impl WorkPolicy for PerformResearch {
    fn name(&self) -> &str {
        "perform_research"
    }

    fn work_phases(&self) -> Vec<Phase> {
        vec![RESEARCHING]
    }

    fn work_phase(&self) -> Phase {
        RESEARCHING
    }

    fn perform_work(
        &mut self,
        _phase: Phase,
        _time: f64,
        _task: &mut TaskState,
        _site: &mut WorkSite,
        _ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        Ok(0.0)
    }

    fn skills(&self) -> &[SkillKind] {
        SKILLS
    }

    fn experience_aptitude(&self) -> Aptitude {
        Aptitude::AcademicAptitude
    }

    fn accepts_teacher(&self) -> bool {
        true
    }
}
