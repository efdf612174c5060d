//! Phase-driven activity state machine.
//!
//! An [`Activity`] advances in discrete slices of simulated time. Each call
//! to [`Activity::advance`] dispatches the current phase handler repeatedly
//! until the budget is spent, the handler stops making progress, or the
//! activity completes. Unused time is handed back to the caller so a
//! scheduler can give it to the next activity in the same tick.

use std::collections::HashSet;
use std::fmt;

use colony_events::ActivityEventKind;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::components::AgentId;
use crate::context::ActivityContext;
use crate::error::ActivityError;

use super::{ActivityPolicy, Phase};

/// Budgets below this are treated as spent
pub const TIME_EPSILON: f64 = 1e-9;

/// Consecutive dispatches allowed to consume nothing before the engine
/// hands the remaining time back
const MAX_IDLE_DISPATCHES: usize = 64;

/// Bookkeeping shared by every activity and exposed to phase handlers.
pub struct TaskState {
    id: Uuid,
    name: String,
    phase: Option<Phase>,
    phases: HashSet<Phase>,
    elapsed: f64,
    duration: Option<f64>,
    duration_released: bool,
    started: bool,
    ending: bool,
    complete: bool,
    end_requested: bool,
    subtask: Option<Box<Activity>>,
    teacher: Option<AgentId>,
}

impl TaskState {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phase: None,
            phases: HashSet::new(),
            elapsed: 0.0,
            duration: None,
            duration_released: false,
            started: false,
            ending: false,
            complete: false,
            end_requested: false,
            subtask: None,
            teacher: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn register_phase(&mut self, phase: Phase) {
        self.phases.insert(phase);
    }

    pub fn is_registered(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    /// Move to `phase`, which must have been registered.
    pub fn set_phase(&mut self, phase: Phase) -> Result<(), ActivityError> {
        if !self.phases.contains(&phase) {
            return Err(ActivityError::InvalidPhase {
                activity: self.name.clone(),
                phase,
            });
        }
        self.phase = Some(phase);
        Ok(())
    }

    /// Millisols consumed so far, including time spent in subtasks
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Ask the engine to complete the activity once the current handler returns.
    pub fn end(&mut self) {
        self.ending = true;
    }

    pub fn is_ending(&self) -> bool {
        self.ending
    }

    /// An outside party asked the activity to stop early
    pub fn end_requested(&self) -> bool {
        self.end_requested
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn teacher(&self) -> Option<&AgentId> {
        self.teacher.as_ref()
    }

    pub fn subtask(&self) -> Option<&Activity> {
        self.subtask.as_deref()
    }

    pub fn has_subtask(&self) -> bool {
        self.subtask.is_some()
    }

    /// Run `child` before this activity's own phases resume.
    ///
    /// A child that is already complete, typically because its constructor
    /// rejected it, is refused so the caller can take its failure branch.
    pub fn attach_subtask(&mut self, child: Activity) -> Result<(), ActivityError> {
        if child.is_complete() {
            return Err(ActivityError::SubtaskRejected {
                activity: self.name.clone(),
                subtask: child.name().to_string(),
            });
        }
        self.subtask = Some(Box::new(child));
        Ok(())
    }

    /// Emit an event attributed to this activity.
    pub fn record(&self, ctx: &mut dyn ActivityContext, kind: ActivityEventKind) {
        let agent = ctx.agent_id().as_str().to_string();
        ctx.record(colony_events::ActivityEvent::new(
            agent,
            self.id.to_string(),
            self.name.clone(),
            kind,
        ));
    }

    fn duration_left(&self) -> Option<f64> {
        if self.duration_released {
            return None;
        }
        self.duration.map(|d| (d - self.elapsed).max(0.0))
    }

    fn duration_reached(&self) -> bool {
        !self.duration_released
            && self
                .duration
                .is_some_and(|d| self.elapsed >= d - TIME_EPSILON)
    }
}

/// A running unit of colonist behaviour.
pub struct Activity {
    state: TaskState,
    policy: Box<dyn ActivityPolicy>,
}

impl Activity {
    pub fn new(policy: Box<dyn ActivityPolicy>) -> Self {
        let mut state = TaskState::new(policy.name());
        for phase in policy.phases() {
            state.register_phase(phase);
        }
        let initial = policy.initial_phase();
        state.register_phase(initial);
        state.phase = Some(initial);
        Self { state, policy }
    }

    /// An activity whose pre-checks failed. It is complete before it starts
    /// and its cleanup has already run.
    pub fn abandoned(policy: Box<dyn ActivityPolicy>, ctx: &mut dyn ActivityContext) -> Self {
        let mut activity = Self::new(policy);
        debug!(
            agent = %ctx.agent_id(),
            activity = activity.name(),
            "Activity rejected before starting"
        );
        activity.complete(ctx);
        activity
    }

    /// Complete automatically once `millisols` have elapsed.
    pub fn with_duration(mut self, millisols: f64) -> Self {
        self.state.duration = Some(millisols.max(0.0));
        self
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn phase(&self) -> Option<Phase> {
        self.state.phase
    }

    /// Innermost phase, following subtasks
    pub fn active_phase(&self) -> Option<Phase> {
        match &self.state.subtask {
            Some(subtask) => subtask.active_phase(),
            None => self.state.phase,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.state.elapsed
    }

    pub fn duration(&self) -> Option<f64> {
        self.state.duration
    }

    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    pub fn subtask(&self) -> Option<&Activity> {
        self.state.subtask()
    }

    pub fn teacher(&self) -> Option<&AgentId> {
        self.state.teacher()
    }

    pub fn accepts_teacher(&self) -> bool {
        self.policy.accepts_teacher() && !self.state.complete
    }

    pub fn set_teacher(&mut self, teacher: Option<AgentId>) {
        self.state.teacher = teacher;
    }

    pub fn register_phase(&mut self, phase: Phase) {
        self.state.register_phase(phase);
    }

    pub fn set_phase(&mut self, phase: Phase) -> Result<(), ActivityError> {
        self.state.set_phase(phase)
    }

    pub fn attach_subtask(&mut self, child: Activity) -> Result<(), ActivityError> {
        self.state.attach_subtask(child)
    }

    /// Ask the activity to stop at the next opportunity.
    ///
    /// Graceful activities run their return phase first; the rest complete
    /// on their next advance. The request reaches any running subtask too.
    pub fn request_end(&mut self) {
        self.state.end_requested = true;
        if let Some(subtask) = self.state.subtask.as_mut() {
            subtask.request_end();
        }
    }

    /// Spend up to `time` millisols and return what was not used.
    pub fn advance(
        &mut self,
        time: f64,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        if self.state.complete || time <= 0.0 {
            return Ok(time.max(0.0));
        }

        if !self.state.started {
            self.state.started = true;
            debug!(agent = %ctx.agent_id(), activity = self.name(), "Activity started");
            self.state.record(ctx, ActivityEventKind::Started);
        }

        if self.state.end_requested && !self.policy.graceful_end() {
            self.complete(ctx);
            return Ok(time);
        }

        let mut remaining = time;
        let mut idle_dispatches = 0;

        while remaining > TIME_EPSILON && !self.state.complete {
            if let Some(subtask) = self.state.subtask.as_mut() {
                let before = remaining;
                remaining = subtask.advance(remaining, ctx)?.clamp(0.0, before);
                self.state.elapsed += before - remaining;

                if subtask.is_complete() {
                    let finished = subtask.name().to_string();
                    self.state.subtask = None;
                    self.state
                        .record(ctx, ActivityEventKind::SubtaskFinished { subtask: finished });
                    continue;
                }
                break;
            }

            // Subtask time may have used up the duration.
            if self.state.duration_reached() {
                self.complete(ctx);
                break;
            }

            // `Activity::new` always enters the initial phase, so only a
            // state built by hand can get here without one.
            let phase = self.state.phase.ok_or_else(|| ActivityError::MissingPhase {
                activity: self.state.name.clone(),
            })?;

            let budget = match self.state.duration_left() {
                Some(left) => remaining.min(left),
                None => remaining,
            };

            let unused = self
                .policy
                .perform_phase(phase, budget, &mut self.state, ctx)?
                .clamp(0.0, budget);
            let consumed = budget - unused;
            remaining -= consumed;
            self.state.elapsed += consumed;

            trace!(
                activity = self.name(),
                phase = %phase,
                consumed,
                remaining,
                "Dispatched phase"
            );

            if consumed > 0.0 {
                self.policy
                    .consume_experience(phase, consumed, &self.state, ctx);
            }

            let transitioned = self.state.phase != Some(phase);
            if transitioned {
                self.state.record(
                    ctx,
                    ActivityEventKind::PhaseChanged {
                        from: Some(phase.name().to_string()),
                        to: self.state.phase.map(|p| p.name().to_string()).unwrap_or_default(),
                    },
                );
            }
            if let Some(subtask) = self.state.subtask.as_ref() {
                if !subtask.state.started {
                    let name = subtask.name().to_string();
                    self.state.record(ctx, ActivityEventKind::SubtaskAttached { subtask: name });
                }
            }

            if self.state.ending {
                self.complete(ctx);
                break;
            }

            if self.state.duration_reached() {
                if transitioned {
                    // The handler moved on to a closing phase; let it finish.
                    self.state.duration_released = true;
                } else {
                    self.complete(ctx);
                    break;
                }
            }

            if consumed > 0.0 {
                idle_dispatches = 0;
                continue;
            }
            if !transitioned && !self.state.has_subtask() {
                break;
            }
            idle_dispatches += 1;
            if idle_dispatches >= MAX_IDLE_DISPATCHES {
                warn!(
                    activity = self.name(),
                    phase = %phase,
                    "Phase handlers keep transitioning without consuming time"
                );
                break;
            }
        }

        Ok(remaining.max(0.0))
    }

    /// Finish the activity and run its cleanup.
    ///
    /// Idempotent. A running subtask is completed first.
    pub fn complete(&mut self, ctx: &mut dyn ActivityContext) {
        if let Some(mut subtask) = self.state.subtask.take() {
            subtask.complete(ctx);
        }
        if self.state.complete {
            return;
        }
        self.state.complete = true;
        self.state.ending = false;
        self.policy.on_complete(ctx);

        if self.state.started {
            debug!(
                agent = %ctx.agent_id(),
                activity = self.name(),
                elapsed = self.state.elapsed,
                "Activity completed"
            );
            self.state.record(
                ctx,
                ActivityEventKind::Completed {
                    elapsed: self.state.elapsed,
                },
            );
        }
    }
}

impl fmt::Debug for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activity")
            .field("id", &self.state.id)
            .field("name", &self.state.name)
            .field("phase", &self.state.phase)
            .field("elapsed", &self.state.elapsed)
            .field("duration", &self.state.duration)
            .field("complete", &self.state.complete)
            .field("subtask", &self.state.subtask)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::sandbox::Sandbox;

    const WORKING: Phase = Phase::new("working");
    const WRAPPING_UP: Phase = Phase::new("wrapping_up");
    const UNKNOWN: Phase = Phase::new("unknown");

    /// Consumes time until `work` millisols are done, then ends.
    struct Countdown {
        work: f64,
        cleanups: Arc<AtomicUsize>,
    }

    impl Countdown {
        fn boxed(work: f64) -> (Box<Self>, Arc<AtomicUsize>) {
            let cleanups = Arc::new(AtomicUsize::new(0));
            let policy = Box::new(Self {
                work,
                cleanups: Arc::clone(&cleanups),
            });
            (policy, cleanups)
        }
    }

    impl ActivityPolicy for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }

        fn phases(&self) -> Vec<Phase> {
            vec![WORKING]
        }

        fn initial_phase(&self) -> Phase {
            WORKING
        }

        fn perform_phase(
            &mut self,
            _phase: Phase,
            time: f64,
            task: &mut TaskState,
            _ctx: &mut dyn ActivityContext,
        ) -> Result<f64, ActivityError> {
            let spent = time.min(self.work);
            self.work -= spent;
            if self.work <= TIME_EPSILON {
                task.end();
            }
            Ok(time - spent)
        }

        fn on_complete(&mut self, _ctx: &mut dyn ActivityContext) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Works forever, moving to a closing phase when asked to.
    struct Closing {
        phase_switch_at: f64,
        closing_left: f64,
    }

    impl ActivityPolicy for Closing {
        fn name(&self) -> &str {
            "closing"
        }

        fn phases(&self) -> Vec<Phase> {
            vec![WORKING, WRAPPING_UP]
        }

        fn initial_phase(&self) -> Phase {
            WORKING
        }

        fn perform_phase(
            &mut self,
            phase: Phase,
            time: f64,
            task: &mut TaskState,
            _ctx: &mut dyn ActivityContext,
        ) -> Result<f64, ActivityError> {
            match phase {
                WORKING => {
                    if task.elapsed() + time >= self.phase_switch_at {
                        let spent = (self.phase_switch_at - task.elapsed()).max(0.0);
                        task.set_phase(WRAPPING_UP)?;
                        return Ok(time - spent);
                    }
                    Ok(0.0)
                }
                _ => {
                    let spent = time.min(self.closing_left);
                    self.closing_left -= spent;
                    if self.closing_left <= TIME_EPSILON {
                        task.end();
                    }
                    Ok(time - spent)
                }
            }
        }
    }

    struct Idle;

    impl ActivityPolicy for Idle {
        fn name(&self) -> &str {
            "idle"
        }

        fn phases(&self) -> Vec<Phase> {
            vec![WORKING]
        }

        fn initial_phase(&self) -> Phase {
            WORKING
        }

        fn perform_phase(
            &mut self,
            _phase: Phase,
            time: f64,
            _task: &mut TaskState,
            _ctx: &mut dyn ActivityContext,
        ) -> Result<f64, ActivityError> {
            Ok(time)
        }
    }

    struct Stray;

    impl ActivityPolicy for Stray {
        fn name(&self) -> &str {
            "stray"
        }

        fn phases(&self) -> Vec<Phase> {
            vec![WORKING]
        }

        fn initial_phase(&self) -> Phase {
            WORKING
        }

        fn perform_phase(
            &mut self,
            _phase: Phase,
            time: f64,
            task: &mut TaskState,
            _ctx: &mut dyn ActivityContext,
        ) -> Result<f64, ActivityError> {
            task.set_phase(UNKNOWN)?;
            Ok(time)
        }
    }

    /// Hands its work to a child activity once, then finishes in one slice.
    struct Delegating {
        child_work: f64,
        delegated: bool,
    }

    impl ActivityPolicy for Delegating {
        fn name(&self) -> &str {
            "delegating"
        }

        fn phases(&self) -> Vec<Phase> {
            vec![WORKING]
        }

        fn initial_phase(&self) -> Phase {
            WORKING
        }

        fn perform_phase(
            &mut self,
            _phase: Phase,
            time: f64,
            task: &mut TaskState,
            _ctx: &mut dyn ActivityContext,
        ) -> Result<f64, ActivityError> {
            if !self.delegated {
                self.delegated = true;
                let (child, _) = Countdown::boxed(self.child_work);
                task.attach_subtask(Activity::new(child))?;
                return Ok(time);
            }
            task.end();
            Ok(time - time.min(1.0))
        }
    }

    #[test]
    fn test_returns_unused_time() {
        let mut ctx = Sandbox::new("colonist_001");
        let (policy, _) = Countdown::boxed(10.0);
        let mut activity = Activity::new(policy);

        assert_eq!(activity.advance(4.0, &mut ctx).unwrap(), 0.0);
        assert!(!activity.is_complete());
        let unused = activity.advance(10.0, &mut ctx).unwrap();
        assert!((unused - 4.0).abs() < 1e-9);
        assert!(activity.is_complete());
        assert!((activity.elapsed() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_complete_is_idempotent() {
        let mut ctx = Sandbox::new("colonist_001");
        let (policy, cleanups) = Countdown::boxed(1.0);
        let mut activity = Activity::new(policy);
        activity.advance(5.0, &mut ctx).unwrap();
        activity.complete(&mut ctx);
        activity.complete(&mut ctx);

        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.events_of("completed").len(), 1);
        assert_eq!(activity.advance(3.0, &mut ctx).unwrap(), 3.0);
    }

    #[test]
    fn test_abandoned_runs_cleanup_without_events() {
        let mut ctx = Sandbox::new("colonist_001");
        let (policy, cleanups) = Countdown::boxed(1.0);
        let activity = Activity::abandoned(policy, &mut ctx);

        assert!(activity.is_complete());
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_duration_caps_elapsed_time() {
        let mut ctx = Sandbox::new("colonist_001");
        let (policy, _) = Countdown::boxed(100.0);
        let mut activity = Activity::new(policy).with_duration(5.0);

        let unused = activity.advance(8.0, &mut ctx).unwrap();
        assert!((unused - 3.0).abs() < 1e-9);
        assert!(activity.is_complete());
        assert!((activity.elapsed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_released_for_closing_phase() {
        let mut ctx = Sandbox::new("colonist_001");
        let policy = Box::new(Closing {
            phase_switch_at: 5.0,
            closing_left: 2.0,
        });
        let mut activity = Activity::new(policy).with_duration(5.0);

        let unused = activity.advance(10.0, &mut ctx).unwrap();
        assert!(activity.is_complete());
        assert!((activity.elapsed() - 7.0).abs() < 1e-9);
        assert!((unused - 3.0).abs() < 1e-9);
        assert_eq!(ctx.events_of("phase_changed").len(), 1);
    }

    #[test]
    fn test_idle_handler_hands_time_back() {
        let mut ctx = Sandbox::new("colonist_001");
        let mut activity = Activity::new(Box::new(Idle));
        assert_eq!(activity.advance(6.0, &mut ctx).unwrap(), 6.0);
        assert!(!activity.is_complete());
        assert_eq!(ctx.events_of("started").len(), 1);
    }

    #[test]
    fn test_unregistered_phase_is_an_error() {
        let mut ctx = Sandbox::new("colonist_001");
        let mut activity = Activity::new(Box::new(Stray));
        let err = activity.advance(1.0, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            ActivityError::InvalidPhase {
                activity: "stray".to_string(),
                phase: UNKNOWN,
            }
        );
    }

    #[test]
    fn test_dispatch_without_phase_is_an_error() {
        let mut ctx = Sandbox::new("colonist_001");
        let (policy, cleanups) = Countdown::boxed(5.0);
        let mut activity = Activity::new(policy);
        activity.state.phase = None;

        let err = activity.advance(1.0, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            ActivityError::MissingPhase {
                activity: "countdown".to_string(),
            }
        );
        assert_eq!(activity.elapsed(), 0.0);
        assert_eq!(cleanups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registered_phase_can_be_entered_later() {
        let mut activity = Activity::new(Box::new(Stray));
        assert!(activity.set_phase(UNKNOWN).is_err());
        activity.register_phase(UNKNOWN);
        assert!(activity.set_phase(UNKNOWN).is_ok());
        assert_eq!(activity.phase(), Some(UNKNOWN));
    }

    #[test]
    fn test_subtask_time_counts_toward_parent() {
        let mut ctx = Sandbox::new("colonist_001");
        let policy = Box::new(Delegating {
            child_work: 3.0,
            delegated: false,
        });
        let mut activity = Activity::new(policy);

        assert_eq!(activity.advance(2.0, &mut ctx).unwrap(), 0.0);
        assert!(activity.subtask().is_some());
        assert_eq!(activity.active_phase(), Some(WORKING));

        let unused = activity.advance(5.0, &mut ctx).unwrap();
        assert!(activity.is_complete());
        assert!((activity.elapsed() - 4.0).abs() < 1e-9);
        assert!((unused - 3.0).abs() < 1e-9);
        assert_eq!(ctx.events_of("subtask_attached").len(), 1);
        assert_eq!(ctx.events_of("subtask_finished").len(), 1);
    }

    #[test]
    fn test_rejected_subtask_is_refused() {
        let mut ctx = Sandbox::new("colonist_001");
        let mut parent = Activity::new(Box::new(Stray));
        let (child, _) = Countdown::boxed(1.0);
        let child = Activity::abandoned(child, &mut ctx);
        assert!(matches!(
            parent.attach_subtask(child),
            Err(ActivityError::SubtaskRejected { .. })
        ));
        assert!(parent.subtask().is_none());
    }

    #[test]
    fn test_end_request_stops_non_graceful_activity() {
        let mut ctx = Sandbox::new("colonist_001");
        let (policy, cleanups) = Countdown::boxed(50.0);
        let mut activity = Activity::new(policy);
        activity.advance(1.0, &mut ctx).unwrap();
        activity.request_end();

        assert_eq!(activity.advance(5.0, &mut ctx).unwrap(), 5.0);
        assert!(activity.is_complete());
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }
}
