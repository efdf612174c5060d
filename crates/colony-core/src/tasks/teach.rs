//! Teach a skill to a colonist who is busy with a teachable activity.
//!
//! The teacher never touches the student's activity directly. It files a
//! request through the context and the scheduler applies it between
//! colonists, so only one colonist is ever mutated at a time.

use colony_events::ActivityEventKind;
use tracing::debug;

use crate::activity::{Activity, IndoorActivity, Phase, TaskState, WorkPolicy, WorkSite};
use crate::components::{AgentId, Aptitude, LocalPosition, SkillKind};
use crate::config::SimConfig;
use crate::context::{ActivityContext, TeachingRequest};
use crate::error::ActivityError;

pub const TEACHING: Phase = Phase::new("teaching");

const SKILLS: &[SkillKind] = &[SkillKind::Teaching];

#[derive(Debug, Clone)]
pub struct TeachSkill {
    skill: SkillKind,
    student: Option<AgentId>,
}

impl TeachSkill {
    pub fn new(skill: SkillKind) -> Self {
        Self {
            skill,
            student: None,
        }
    }

    pub fn activity(
        skill: SkillKind,
        classroom: LocalPosition,
        config: &SimConfig,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        IndoorActivity::new(Self::new(skill), classroom, config.walking)
            .start(ctx)
            .with_duration(config.activities.teach_duration)
    }
}

impl WorkPolicy for TeachSkill {
    fn name(&self) -> &str {
        "teach"
    }

    fn work_phases(&self) -> Vec<Phase> {
        vec![TEACHING]
    }

    fn work_phase(&self) -> Phase {
        TEACHING
    }

    fn perform_work(
        &mut self,
        _phase: Phase,
        _time: f64,
        task: &mut TaskState,
        _site: &mut WorkSite,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        if self.student.is_none() {
            if let Some(student) = ctx.find_student(self.skill) {
                debug!(teacher = %ctx.agent_id(), student = %student, "Teaching");
                let teacher = ctx.agent_id().clone();
                ctx.request_teacher(TeachingRequest::Attach {
                    student: student.clone(),
                    teacher,
                });
                task.record(
                    ctx,
                    ActivityEventKind::TeacherAssigned {
                        student: student.to_string(),
                    },
                );
                self.student = Some(student);
            }
        }
        Ok(0.0)
    }

    fn skills(&self) -> &[SkillKind] {
        SKILLS
    }

    fn experience_aptitude(&self) -> Aptitude {
        Aptitude::Teaching
    }

    fn on_complete(&mut self, ctx: &mut dyn ActivityContext) {
        if let Some(student) = self.student.take() {
            let teacher = ctx.agent_id().clone();
            ctx.request_teacher(TeachingRequest::Detach { student, teacher });
        }
    }
}
