//! Event collection
//!
//! Activities record events through their context; the host collects them
//! per tick in [`TickEvents`] and the binary drains them into the
//! [`EventLogger`].

pub mod logger;

pub use logger::EventLogger;

use bevy_ecs::prelude::*;
use colony_events::{generate_event_id, ActivityEvent, MarsTimestamp};

/// Resource: events recorded during the current tick
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    pub events: Vec<ActivityEvent>,
    last_event_id: u64,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_id(&mut self) -> String {
        self.last_event_id += 1;
        generate_event_id(self.last_event_id)
    }

    /// Stamp `event` with the next id and `timestamp`, then keep it.
    pub fn record(&mut self, mut event: ActivityEvent, timestamp: MarsTimestamp) {
        event.event_id = self.generate_id();
        event.timestamp = timestamp;
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<ActivityEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
