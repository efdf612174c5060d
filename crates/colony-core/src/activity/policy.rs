//! Pluggable activity behaviour.
//!
//! An [`Activity`](super::Activity) owns the phase bookkeeping and delegates
//! everything domain specific to an [`ActivityPolicy`]. Site-bound work is
//! written once as a [`WorkPolicy`] and wrapped by one of the brackets
//! ([`OutdoorActivity`](super::OutdoorActivity) or
//! [`IndoorActivity`](super::IndoorActivity)) that takes care of getting the
//! colonist to the site and back.

use crate::components::{Aptitude, LocalPosition, SkillKind};
use crate::context::{AccidentTarget, ActivityContext};
use crate::error::ActivityError;

use super::experience;
use super::{Phase, TaskState};

/// Behaviour plugged into an [`Activity`](super::Activity).
pub trait ActivityPolicy: Send + Sync {
    /// Stable identifier used in logs and events
    fn name(&self) -> &str;

    /// Phases registered when the activity is created
    fn phases(&self) -> Vec<Phase>;

    fn initial_phase(&self) -> Phase;

    /// Run `phase` for at most `time` millisols and return the unused time.
    ///
    /// Handlers may call `task.set_phase`, `task.end` or
    /// `task.attach_subtask`; the engine keeps dispatching with whatever
    /// time is returned.
    fn perform_phase(
        &mut self,
        phase: Phase,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError>;

    /// Award experience for `time` millisols spent in `phase`.
    fn consume_experience(
        &self,
        _phase: Phase,
        time: f64,
        task: &TaskState,
        ctx: &mut dyn ActivityContext,
    ) {
        experience::award(time, self.skills(), self.experience_aptitude(), task.teacher(), ctx);
    }

    fn skills(&self) -> &[SkillKind] {
        &[]
    }

    fn experience_aptitude(&self) -> Aptitude {
        Aptitude::ExperienceAptitude
    }

    /// Whether an end request runs a return phase instead of stopping at once
    fn graceful_end(&self) -> bool {
        false
    }

    /// Whether another colonist may teach during this activity
    fn accepts_teacher(&self) -> bool {
        false
    }

    /// Cleanup when the activity completes. Must tolerate being reached from
    /// a constructor whose pre-check failed.
    fn on_complete(&mut self, _ctx: &mut dyn ActivityContext) {}
}

/// Accident exposure of whoever works at a site
#[derive(Debug, Clone, PartialEq)]
pub struct SiteHazard {
    pub target: AccidentTarget,
    /// Hazard per millisol before skill and wear
    pub base_rate: f64,
}

impl SiteHazard {
    pub fn new(target: AccidentTarget, base_rate: f64) -> Self {
        Self { target, base_rate }
    }
}

/// Handle given to a [`WorkPolicy`] for the site it is working at.
///
/// The bracket decides the site's hazard, so a policy that runs both
/// outside and indoors never needs to know which one it is in.
#[derive(Debug, Clone)]
pub struct WorkSite {
    location: LocalPosition,
    finished: bool,
    hazard: Option<SiteHazard>,
}

impl WorkSite {
    pub fn new(location: LocalPosition) -> Self {
        Self {
            location,
            finished: false,
            hazard: None,
        }
    }

    pub fn with_hazard(mut self, hazard: SiteHazard) -> Self {
        self.hazard = Some(hazard);
        self
    }

    pub fn location(&self) -> LocalPosition {
        self.location
    }

    pub fn hazard(&self) -> Option<&SiteHazard> {
        self.hazard.as_ref()
    }

    /// Site work is done; the bracket takes over from here
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// The site-bound part of an activity, independent of how the colonist gets there.
pub trait WorkPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// All phases the work may enter
    fn work_phases(&self) -> Vec<Phase>;

    /// Phase entered on arrival at the site
    fn work_phase(&self) -> Phase;

    fn perform_work(
        &mut self,
        phase: Phase,
        time: f64,
        task: &mut TaskState,
        site: &mut WorkSite,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError>;

    fn skills(&self) -> &[SkillKind] {
        &[]
    }

    fn experience_aptitude(&self) -> Aptitude {
        Aptitude::ExperienceAptitude
    }

    fn accepts_teacher(&self) -> bool {
        false
    }

    fn on_complete(&mut self, _ctx: &mut dyn ActivityContext) {}
}
