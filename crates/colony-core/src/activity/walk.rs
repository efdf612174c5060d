//! Walking subtask.

use tracing::trace;

use crate::components::LocalPosition;
use crate::config::WalkSettings;
use crate::context::ActivityContext;
use crate::error::ActivityError;

use super::{Activity, ActivityPolicy, Phase, TaskState};

pub const WALKING: Phase = Phase::new("walking");

/// Moves the colonist in a straight line toward a destination.
pub struct Walk {
    destination: LocalPosition,
    speed: f64,
    tolerance: f64,
}

impl Walk {
    /// A walk to `destination`, or an already-complete one when the route
    /// cannot be walked.
    pub fn create(
        destination: LocalPosition,
        settings: WalkSettings,
        tolerance: f64,
        ctx: &mut dyn ActivityContext,
    ) -> Activity {
        let walk = Box::new(Self {
            destination,
            speed: settings.speed,
            tolerance,
        });
        if !ctx.can_walk_all_steps(ctx.position(), destination) {
            return Activity::abandoned(walk, ctx);
        }
        Activity::new(walk)
    }
}

impl ActivityPolicy for Walk {
    fn name(&self) -> &str {
        "walk"
    }

    fn phases(&self) -> Vec<Phase> {
        vec![WALKING]
    }

    fn initial_phase(&self) -> Phase {
        WALKING
    }

    fn perform_phase(
        &mut self,
        _phase: Phase,
        time: f64,
        task: &mut TaskState,
        ctx: &mut dyn ActivityContext,
    ) -> Result<f64, ActivityError> {
        let position = ctx.position();
        let distance = position.distance_to(self.destination);
        if distance <= self.tolerance {
            ctx.set_position(self.destination);
            task.end();
            return Ok(time);
        }

        let reach = self.speed * time;
        if distance <= reach {
            ctx.set_position(self.destination);
            task.end();
            return Ok(time - distance / self.speed);
        }

        let next = position.step_toward(self.destination, reach);
        trace!(agent = %ctx.agent_id(), x = next.x, y = next.y, "Walking");
        ctx.set_position(next);
        Ok(0.0)
    }
}
