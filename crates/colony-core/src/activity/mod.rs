//! Activity engine
//!
//! Phase-based state machines that colonists run one slice of time at a
//! time, with the EVA and indoor brackets, the walking subtask and the
//! shared accident and experience models.

pub mod accident;
pub mod experience;
pub mod indoor;
pub mod outdoor;
pub mod phase;
pub mod policy;
pub mod task;
pub mod walk;

pub use indoor::{IndoorActivity, WALK_TO_STATION};
pub use outdoor::{OutdoorActivity, TRAVEL_BACK, TRAVEL_TO_SITE};
pub use phase::Phase;
pub use policy::{ActivityPolicy, SiteHazard, WorkPolicy, WorkSite};
pub use task::{Activity, TaskState, TIME_EPSILON};
pub use walk::{Walk, WALKING};
