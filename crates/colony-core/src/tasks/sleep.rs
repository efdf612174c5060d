//! Sleep in quarters.

use crate::activity::{Activity, IndoorActivity, Phase, TaskState, WorkPolicy, WorkSite};
use crate::components::LocalPosition;
use crate::config::SimConfig;
use crate::context::ActivityContext;
use crate::error::ActivityError;

pub const SLEEPING: Phase = Phase::new("sleeping");

#[derive(Debug, Clone)]
pub struct Sleep {
    /// Fatigue relieved per millisol
    recovery_rate: f64,
}

impl Sleep {
    pub fn new(recovery_rate: f64) -> Self {
        Self { recovery_rate }
    }

    pub fn activity(
        quarters: LocalPosition,
        config: &SimConfig,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        IndoorActivity::new(
            Self::new(config.activities.sleep_recovery_rate),
            quarters,
            config.walking,
        )
        .start(ctx)
        .with_duration(config.activities.sleep_duration)
    }
}

impl WorkPolicy for Sleep {
    fn name(&self) -> &str {
        "sleep"
    }

    fn work_phases(&self) -> Vec<Phase> {
        vec![SLEEPING]
    }

    fn work_phase(&self) -> Phase {
        SLEEPING
    }

    fn perform_work(
        &mut self,
        _phase: Phase,
        time: f64,
        _task: &mut TaskState,
        _site: &mut WorkSite,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        ctx.relieve_fatigue(self.recovery_rate * time);
        Ok(0.0)
    }
}
