//! Indoor bracket.
//!
//! Walks the colonist to a station inside the settlement and hands over to
//! the work policy. No suit or environment checks apply. The activity
//! completes as soon as the work finishes its site.

use colony_events::ActivityEventKind;
use tracing::{debug, info};

use crate::components::{LocalPosition, SkillKind};
use crate::config::WalkSettings;
use crate::context::ActivityContext;
use crate::error::ActivityError;

use super::experience;
use super::walk::Walk;
use super::{Activity, ActivityPolicy, Phase, SiteHazard, TaskState, WorkPolicy, WorkSite};

pub const WALK_TO_STATION: Phase = Phase::new("walk_to_station");

/// Metres within which the colonist counts as at the station
const STATION_TOLERANCE: f64 = 0.5;

pub struct IndoorActivity<W> {
    work: W,
    site: WorkSite,
    walking: WalkSettings,
}

impl<W: WorkPolicy + 'static> IndoorActivity<W> {
    pub fn new(work: W, station: LocalPosition, walking: WalkSettings) -> Self {
        Self {
            work,
            site: WorkSite::new(station),
            walking,
        }
    }

    pub fn with_site_hazard(mut self, hazard: SiteHazard) -> Self {
        self.site = self.site.with_hazard(hazard);
        self
    }

    /// Build the activity, or an already-complete one when the station
    /// cannot be walked to.
    pub fn start(self, ctx: &mut dyn ActivityContext) -> Activity {
        if !ctx.can_walk_all_steps(ctx.position(), self.site.location()) {
            debug!(agent = %ctx.agent_id(), activity = self.work.name(), "Station unreachable");
            return Activity::abandoned(Box::new(self), ctx);
        }
        Activity::new(Box::new(self))
    }
}

impl<W: WorkPolicy> IndoorActivity<W> {
    fn walk_to_station(
        &mut self,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        let station = self.site.location();
        if ctx.position().distance_to(station) <= STATION_TOLERANCE {
            task.set_phase(self.work.work_phase())?;
            return Ok(time);
        }

        let walk = Walk::create(station, self.walking, STATION_TOLERANCE, ctx);
        if task.attach_subtask(walk).is_err() {
            info!(agent = %ctx.agent_id(), activity = task.name(), "Station unreachable");
            task.record(ctx, ActivityEventKind::Unreachable);
            task.end();
        }
        Ok(time)
    }
}

impl<W: WorkPolicy> ActivityPolicy for IndoorActivity<W> {
    fn name(&self) -> &str {
        self.work.name()
    }

    fn phases(&self) -> Vec<Phase> {
        let mut phases = vec![WALK_TO_STATION];
        phases.extend(self.work.work_phases());
        phases
    }

    fn initial_phase(&self) -> Phase {
        WALK_TO_STATION
    }

    fn perform_phase(
        &mut self,
        phase: Phase,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        if phase == WALK_TO_STATION {
            return self.walk_to_station(time, task, ctx);
        }
        let unused = self
            .work
            .perform_work(phase, time, task, &mut self.site, ctx)?;
        if self.site.is_finished() {
            task.end();
        }
        Ok(unused)
    }

    fn consume_experience(
        &self,
        phase: Phase,
        time: f64,
        task: &TaskState,
        ctx: &mut dyn ActivityContext,
    ) {
        if phase != WALK_TO_STATION {
            experience::award(
                time,
                self.work.skills(),
                self.work.experience_aptitude(),
                task.teacher(),
                ctx,
            );
        }
    }

    fn skills(&self) -> &[SkillKind] {
        self.work.skills()
    }

    fn accepts_teacher(&self) -> bool {
        self.work.accepts_teacher()
    }

    fn on_complete(&mut self, ctx: &mut dyn ActivityContext) {
        self.work.on_complete(ctx);
    }
}
