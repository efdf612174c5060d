//! ECS Components
//!
//! All entity components and shared world resources for colonists and the settlement.

pub mod colonist;
pub mod world;

pub use colonist::*;
pub use world::*;
