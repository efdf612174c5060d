//! Mars Colony Activity Engine
//!
//! Phase-driven colonist activities (EVA, maintenance, research, sleep and
//! more) advanced on a Bevy ECS schedule.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod activity;
pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod sandbox;
pub mod setup;
pub mod systems;
pub mod tasks;

pub use components::*;

pub use activity::{Activity, ActivityPolicy, Phase, TaskState, WorkPolicy, WorkSite};
pub use config::SimConfig;
pub use context::ActivityContext;
pub use error::{ActivityError, ConfigError};
pub use sandbox::Sandbox;

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
