//! EVA bracket.
//!
//! Wraps a [`WorkPolicy`] with the outdoor lifecycle:
//!
//! ```text
//! [start] -> travel_to_site -> <work phases> -> travel_back -> [complete]
//! ```
//!
//! Before every work dispatch the bracket re-checks the colonist's safety
//! (sunlight, suit, performance, end requests) and turns back as soon as any
//! check fails. Time spent working counts toward an optional on-site cap.

use colony_events::{AbortReason, ActivityEventKind};
use tracing::{debug, info, warn};

use crate::components::{Aptitude, LocalPosition, SkillKind, SuitResource};
use crate::config::{EvaSettings, WalkSettings};
use crate::context::ActivityContext;
use crate::error::ActivityError;

use super::experience;
use super::walk::Walk;
use super::{Activity, ActivityPolicy, Phase, SiteHazard, TaskState, WorkPolicy, WorkSite};

pub const TRAVEL_TO_SITE: Phase = Phase::new("travel_to_site");
pub const TRAVEL_BACK: Phase = Phase::new("travel_back");

const EVA_SKILLS: &[SkillKind] = &[SkillKind::EvaOperations];

/// An activity performed outside the settlement in an EVA suit.
pub struct OutdoorActivity<W> {
    work: W,
    /// Replaces the work's own name in logs and events
    name: Option<String>,
    site: WorkSite,
    return_location: Option<LocalPosition>,
    time_on_site: f64,
    site_time: Option<f64>,
    eva: EvaSettings,
    walking: WalkSettings,
    abort: Option<AbortReason>,
}

impl<W: WorkPolicy + 'static> OutdoorActivity<W> {
    pub fn new(work: W, site: LocalPosition, eva: EvaSettings, walking: WalkSettings) -> Self {
        Self {
            work,
            name: None,
            site: WorkSite::new(site),
            return_location: None,
            time_on_site: 0.0,
            site_time: None,
            eva,
            walking,
            abort: None,
        }
    }

    /// Report as the EVA variant of work that can also run indoors.
    pub fn eva_variant(mut self) -> Self {
        self.name = Some(format!("{}_eva", self.work.name()));
        self
    }

    pub fn with_site_hazard(mut self, hazard: SiteHazard) -> Self {
        self.site = self.site.with_hazard(hazard);
        self
    }

    /// Turn back after `millisols` of work on site.
    pub fn with_site_time(mut self, millisols: f64) -> Self {
        self.site_time = Some(millisols);
        self
    }

    /// Build the activity, or an already-complete one when the EVA cannot
    /// begin safely or the site cannot be walked to.
    pub fn start(self, ctx: &mut dyn ActivityContext) -> Activity {
        let reason = self.hazard(&*ctx);
        let reachable = ctx.can_walk_all_steps(ctx.position(), self.site.location());
        if reason.is_some() || !reachable {
            debug!(
                agent = %ctx.agent_id(),
                activity = ActivityPolicy::name(&self),
                reason = reason.as_ref().map(AbortReason::describe).unwrap_or("site unreachable"),
                "EVA not started"
            );
            return Activity::abandoned(Box::new(self), ctx);
        }
        Activity::new(Box::new(self))
    }
}

impl<W: WorkPolicy> OutdoorActivity<W> {
    pub fn work(&self) -> &W {
        &self.work
    }

    pub fn time_on_site(&self) -> f64 {
        self.time_on_site
    }

    /// Where the colonist heads when the EVA ends, once resolved
    pub fn return_location(&self) -> Option<LocalPosition> {
        self.return_location
    }

    /// Why the EVA was cut short, if it was
    pub fn abort(&self) -> Option<AbortReason> {
        self.abort
    }

    /// Add `time` to the on-site clock; true once the cap is reached.
    pub fn add_time_on_site(&mut self, time: f64) -> bool {
        self.time_on_site += time;
        self.site_time.is_some_and(|cap| self.time_on_site >= cap)
    }

    /// True when the EVA must turn back now.
    pub fn check_should_abort(&self, task: &TaskState, ctx: &dyn ActivityContext) -> bool {
        self.abort_reason(task, ctx).is_some()
    }

    pub fn abort_reason(&self, task: &TaskState, ctx: &dyn ActivityContext) -> Option<AbortReason> {
        if task.end_requested() {
            return Some(AbortReason::PrematureEnd);
        }
        self.hazard(ctx)
    }

    /// Conditions that make being outside unsafe, in priority order.
    fn hazard(&self, ctx: &dyn ActivityContext) -> Option<AbortReason> {
        let position = ctx.position();
        if ctx.sunlight_level(position) <= 0.0 && !ctx.is_dark_polar_region(position) {
            return Some(AbortReason::NoSunlight);
        }

        let Some(suit) = ctx.suit() else {
            return Some(AbortReason::NoSuit);
        };
        let low = |kind: SuitResource| {
            let capacity = suit.resource_capacity(kind);
            capacity <= 0.0
                || suit.resource_level(kind) / capacity <= self.eva.min_suit_resource_fraction
        };
        if low(SuitResource::Oxygen) {
            return Some(AbortReason::SuitOxygenLow);
        }
        if low(SuitResource::Water) {
            return Some(AbortReason::SuitWaterLow);
        }
        if !suit.life_support_ok() {
            return Some(AbortReason::LifeSupportFailed);
        }
        if suit.has_malfunction() {
            return Some(AbortReason::SuitMalfunction);
        }

        if ctx.performance_rating() < self.eva.min_performance {
            return Some(AbortReason::PoorPerformance);
        }
        None
    }

    fn turn_back(
        &mut self,
        reason: AbortReason,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<(), ActivityError> {
        if self.abort.is_none() {
            info!(
                agent = %ctx.agent_id(),
                activity = task.name(),
                reason = reason.describe(),
                "EVA ended early"
            );
            task.record(ctx, ActivityEventKind::EvaAborted { reason });
            self.abort = Some(reason);
        }
        task.set_phase(TRAVEL_BACK)
    }

    fn arrived(&self, at: LocalPosition, ctx: &dyn ActivityContext) -> bool {
        ctx.position().distance_to(at) <= self.eva.arrival_tolerance
    }

    fn travel_to_site(
        &mut self,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        if let Some(reason) = self.abort_reason(task, &*ctx) {
            self.turn_back(reason, task, ctx)?;
            return Ok(time);
        }

        let site = self.site.location();
        if self.arrived(site, &*ctx) {
            task.set_phase(self.work.work_phase())?;
            return Ok(time);
        }

        let walk = Walk::create(site, self.walking, self.eva.arrival_tolerance, ctx);
        if task.attach_subtask(walk).is_err() {
            info!(agent = %ctx.agent_id(), activity = task.name(), "Work site unreachable");
            task.record(ctx, ActivityEventKind::Unreachable);
            task.end();
        }
        Ok(time)
    }

    fn travel_back(
        &mut self,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        let target = match self.return_location {
            Some(location) => location,
            None => match ctx.nearest_airlock(ctx.position()) {
                Some(location) => {
                    self.return_location = Some(location);
                    location
                }
                None => {
                    warn!(
                        agent = %ctx.agent_id(),
                        activity = task.name(),
                        "No airlock to return to"
                    );
                    task.end();
                    return Ok(time);
                }
            },
        };

        if self.arrived(target, &*ctx) {
            task.end();
            return Ok(time);
        }

        let walk = Walk::create(target, self.walking, self.eva.arrival_tolerance, ctx);
        if task.attach_subtask(walk).is_err() {
            warn!(agent = %ctx.agent_id(), activity = task.name(), "No walkable route back inside");
            task.end();
        }
        Ok(time)
    }

    fn perform_work(
        &mut self,
        phase: Phase,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        if let Some(reason) = self.abort_reason(task, &*ctx) {
            self.turn_back(reason, task, ctx)?;
            return Ok(time);
        }

        let unused = self
            .work
            .perform_work(phase, time, task, &mut self.site, ctx)?
            .clamp(0.0, time);
        if task.is_ending() {
            return Ok(unused);
        }

        if self.site.is_finished() {
            task.set_phase(TRAVEL_BACK)?;
            return Ok(unused);
        }

        if self.add_time_on_site(time - unused) {
            self.turn_back(AbortReason::SiteTimeElapsed, task, ctx)?;
        }
        Ok(unused)
    }
}

impl<W: WorkPolicy> ActivityPolicy for OutdoorActivity<W> {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.work.name())
    }

    fn phases(&self) -> Vec<Phase> {
        let mut phases = vec![TRAVEL_TO_SITE, TRAVEL_BACK];
        phases.extend(self.work.work_phases());
        phases
    }

    fn initial_phase(&self) -> Phase {
        TRAVEL_TO_SITE
    }

    fn perform_phase(
        &mut self,
        phase: Phase,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        match phase {
            TRAVEL_TO_SITE => self.travel_to_site(time, task, ctx),
            TRAVEL_BACK => self.travel_back(time, task, ctx),
            work => self.perform_work(work, time, task, ctx),
        }
    }

    fn consume_experience(
        &self,
        phase: Phase,
        time: f64,
        task: &TaskState,
        ctx: &mut dyn ActivityContext,
    ) {
        if phase == TRAVEL_TO_SITE || phase == TRAVEL_BACK {
            return;
        }
        let teacher = task.teacher();
        experience::award(time, self.work.skills(), self.work.experience_aptitude(), teacher, ctx);
        experience::award(time, EVA_SKILLS, Aptitude::Agility, teacher, ctx);
    }

    fn skills(&self) -> &[SkillKind] {
        self.work.skills()
    }

    fn graceful_end(&self) -> bool {
        true
    }

    fn accepts_teacher(&self) -> bool {
        self.work.accepts_teacher()
    }

    fn on_complete(&mut self, ctx: &mut dyn ActivityContext) {
        self.work.on_complete(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Material;
    use crate::sandbox::Sandbox;
    use crate::tasks::{CollectResources, COLLECTING_RESOURCES};

    /// Unskilled collection of 10 kg at 1 kg/msol, without accidents.
    fn collection(site: LocalPosition) -> OutdoorActivity<CollectResources> {
        OutdoorActivity::new(
            CollectResources::new(Material::Ice, 2.0, 10.0, 0.0),
            site,
            EvaSettings::default(),
            WalkSettings::default(),
        )
    }

    fn task_for(eva: &OutdoorActivity<CollectResources>) -> TaskState {
        let mut task = TaskState::new(ActivityPolicy::name(eva));
        for phase in eva.phases() {
            task.register_phase(phase);
        }
        task.set_phase(TRAVEL_TO_SITE).unwrap();
        task
    }

    fn set_oxygen(ctx: &mut Sandbox, fraction: f64) {
        if let Some(suit) = ctx.suit.as_mut() {
            suit.oxygen = fraction * suit.oxygen_capacity;
        }
    }

    #[test]
    fn test_should_abort_at_oxygen_reserve() {
        let eva = collection(LocalPosition::ORIGIN);
        let task = task_for(&eva);
        let mut ctx = Sandbox::new("colonist_001");
        assert!(!eva.check_should_abort(&task, &ctx));

        set_oxygen(&mut ctx, 0.16);
        assert!(!eva.check_should_abort(&task, &ctx));

        set_oxygen(&mut ctx, 0.15);
        assert!(eva.check_should_abort(&task, &ctx));
        assert_eq!(eva.abort_reason(&task, &ctx), Some(AbortReason::SuitOxygenLow));
    }

    #[test]
    fn test_should_abort_on_poor_performance() {
        let eva = collection(LocalPosition::ORIGIN);
        let task = task_for(&eva);
        let mut ctx = Sandbox::new("colonist_001");

        ctx.condition.performance = 0.5;
        assert!(!eva.check_should_abort(&task, &ctx));
        ctx.condition.performance = 0.49;
        assert_eq!(eva.abort_reason(&task, &ctx), Some(AbortReason::PoorPerformance));
    }

    #[test]
    fn test_abort_reason_kept_for_trip_home() {
        let mut eva = collection(LocalPosition::ORIGIN);
        let mut task = task_for(&eva);
        let mut ctx = Sandbox::new("colonist_001");

        // Already at the site, so arrival hands all the time back.
        assert_eq!(eva.perform_phase(TRAVEL_TO_SITE, 3.0, &mut task, &mut ctx).unwrap(), 3.0);
        assert_eq!(task.phase(), Some(COLLECTING_RESOURCES));
        let unused = eva
            .perform_phase(COLLECTING_RESOURCES, 3.0, &mut task, &mut ctx)
            .unwrap();
        assert_eq!(unused, 0.0);
        assert!((eva.work().collected() - 3.0).abs() < 1e-9);

        set_oxygen(&mut ctx, 0.15);
        let unused = eva
            .perform_phase(COLLECTING_RESOURCES, 2.0, &mut task, &mut ctx)
            .unwrap();
        assert_eq!(unused, 2.0);
        assert_eq!(task.phase(), Some(TRAVEL_BACK));
        assert_eq!(eva.abort(), Some(AbortReason::SuitOxygenLow));
        assert!((eva.work().collected() - 3.0).abs() < 1e-9);
        assert!((eva.time_on_site() - 3.0).abs() < 1e-9);

        eva.perform_phase(TRAVEL_BACK, 2.0, &mut task, &mut ctx).unwrap();
        assert_eq!(eva.return_location(), Some(LocalPosition::ORIGIN));
        assert!(task.is_ending());
        assert_eq!(ctx.events_of("eva_aborted").len(), 1);
    }
}
