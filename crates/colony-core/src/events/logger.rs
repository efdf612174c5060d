//! Event Logger
//!
//! Append-only JSONL activity event log.

use bevy_ecs::prelude::*;
use colony_events::ActivityEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// Resource for logging events to a JSONL file
#[derive(Resource)]
pub struct EventLogger {
    writer: Option<BufWriter<File>>,
    event_count: u64,
}

impl EventLogger {
    /// Create a new event logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
        })
    }

    /// Create a logger that discards events (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn log(&mut self, event: &ActivityEvent) -> std::io::Result<()> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = event.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn log_batch(&mut self, events: &[ActivityEvent]) -> std::io::Result<()> {
        for event in events {
            self.log(event)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to flush event logger: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_events::{generate_event_id, ActivityEventKind};
    use std::io::BufRead;

    fn event(seq: u64) -> ActivityEvent {
        let mut event = ActivityEvent::new(
            "colonist_001",
            "act-1",
            "dig_local_ice",
            ActivityEventKind::Completed { elapsed: 120.0 },
        );
        event.event_id = generate_event_id(seq);
        event
    }

    #[test]
    fn test_event_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("events.jsonl");

        let mut logger = EventLogger::new(&path).unwrap();
        logger.log_batch(&[event(1), event(2)]).unwrap();
        logger.flush().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let parsed = ActivityEvent::from_jsonl(&lines[1]).unwrap();
        assert_eq!(parsed.event_id, "evt_00000002");
        assert_eq!(parsed.kind, ActivityEventKind::Completed { elapsed: 120.0 });
    }

    #[test]
    fn test_null_logger() {
        let mut logger = EventLogger::null();
        logger.log(&event(1)).unwrap();
        assert_eq!(logger.event_count(), 1);
    }
}
