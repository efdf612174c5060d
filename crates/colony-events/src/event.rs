//! Activity Event Types
//!
//! Records emitted by the activity engine: phase changes, subtask
//! attachment, completion, EVA aborts, accidents and work output.

use serde::{Deserialize, Serialize};

use crate::MarsTimestamp;

/// Why an outdoor activity cut its site work short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Someone asked the activity to end early
    PrematureEnd,
    /// Dark outside and not in a polar night region
    NoSunlight,
    /// The agent is not wearing a suit
    NoSuit,
    /// Suit oxygen at or below the reserve threshold
    SuitOxygenLow,
    /// Suit water at or below the reserve threshold
    SuitWaterLow,
    /// Suit failed its internal life-support check
    LifeSupportFailed,
    /// Suit has an active malfunction
    SuitMalfunction,
    /// Agent performance rating too low to stay outside
    PoorPerformance,
    /// Configured time on site has been used up
    SiteTimeElapsed,
}

impl AbortReason {
    /// Short human-readable description.
    pub fn describe(&self) -> &'static str {
        match self {
            AbortReason::PrematureEnd => "premature end requested",
            AbortReason::NoSunlight => "no sunlight",
            AbortReason::NoSuit => "no EVA suit",
            AbortReason::SuitOxygenLow => "suit oxygen low",
            AbortReason::SuitWaterLow => "suit water low",
            AbortReason::LifeSupportFailed => "suit life support failed",
            AbortReason::SuitMalfunction => "suit malfunction",
            AbortReason::PoorPerformance => "performance too low",
            AbortReason::SiteTimeElapsed => "site time elapsed",
        }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityEventKind {
    Started,
    PhaseChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        to: String,
    },
    SubtaskAttached {
        subtask: String,
    },
    SubtaskFinished {
        subtask: String,
    },
    Completed {
        elapsed: f64,
    },
    EvaAborted {
        reason: AbortReason,
    },
    Unreachable,
    Accident {
        target: String,
    },
    ResourceCollected {
        resource: String,
        amount: f64,
    },
    TeacherAssigned {
        student: String,
    },
    /// A fatal engine error aborted the agent's activity stack
    StackAborted {
        error: String,
    },
}

impl ActivityEventKind {
    /// The serialized `kind` tag
    pub fn name(&self) -> &'static str {
        match self {
            ActivityEventKind::Started => "started",
            ActivityEventKind::PhaseChanged { .. } => "phase_changed",
            ActivityEventKind::SubtaskAttached { .. } => "subtask_attached",
            ActivityEventKind::SubtaskFinished { .. } => "subtask_finished",
            ActivityEventKind::Completed { .. } => "completed",
            ActivityEventKind::EvaAborted { .. } => "eva_aborted",
            ActivityEventKind::Unreachable => "unreachable",
            ActivityEventKind::Accident { .. } => "accident",
            ActivityEventKind::ResourceCollected { .. } => "resource_collected",
            ActivityEventKind::TeacherAssigned { .. } => "teacher_assigned",
            ActivityEventKind::StackAborted { .. } => "stack_aborted",
        }
    }
}

/// A single activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub event_id: String,
    pub timestamp: MarsTimestamp,
    pub agent_id: String,
    pub activity_id: String,
    pub activity: String,
    #[serde(flatten)]
    pub kind: ActivityEventKind,
}

impl ActivityEvent {
    /// Create an event; the id and timestamp are filled in by the recorder.
    pub fn new(
        agent_id: impl Into<String>,
        activity_id: impl Into<String>,
        activity: impl Into<String>,
        kind: ActivityEventKind,
    ) -> Self {
        Self {
            event_id: String::new(),
            timestamp: MarsTimestamp::start(),
            agent_id: agent_id.into(),
            activity_id: activity_id.into(),
            activity: activity.into(),
            kind,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Serializes the event to a JSON line (for JSONL format).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_event_id() {
        assert_eq!(generate_event_id(1), "evt_00000001");
        assert_eq!(generate_event_id(12345678), "evt_12345678");
    }

    #[test]
    fn test_kind_is_flattened_with_tag() {
        let mut event = ActivityEvent::new(
            "colonist_001",
            "act-1",
            "collect_resources",
            ActivityEventKind::EvaAborted {
                reason: AbortReason::SuitOxygenLow,
            },
        );
        event.event_id = generate_event_id(3);

        let json = event.to_jsonl().unwrap();
        assert!(json.contains(r#""kind":"eva_aborted""#));
        assert!(json.contains(r#""reason":"suit_oxygen_low""#));
        assert_eq!(event.kind_name(), "eva_aborted");

        let parsed = ActivityEvent::from_jsonl(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_phase_change_omits_missing_origin() {
        let event = ActivityEvent::new(
            "colonist_001",
            "act-1",
            "sleep",
            ActivityEventKind::PhaseChanged {
                from: None,
                to: "sleeping".to_string(),
            },
        );
        let json = event.to_jsonl().unwrap();
        assert!(!json.contains("\"from\""));
        assert!(json.contains(r#""to":"sleeping""#));
    }

    #[test]
    fn test_abort_reason_describe() {
        assert_eq!(AbortReason::NoSuit.describe(), "no EVA suit");
        assert_eq!(AbortReason::SiteTimeElapsed.describe(), "site time elapsed");
    }
}
