//! Error types for the activity engine and configuration loading.

use thiserror::Error;

use crate::activity::Phase;

/// Invariant violations raised while advancing an activity.
///
/// These are programming errors, not recoverable conditions. The scheduler
/// aborts the colonist's whole activity stack when one surfaces.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivityError {
    /// `advance` reached dispatch with no current phase set
    #[error("activity '{activity}' has no current phase")]
    MissingPhase { activity: String },

    /// A phase was entered without being registered first
    #[error("phase '{phase}' is not registered for activity '{activity}'")]
    InvalidPhase { activity: String, phase: Phase },

    /// A subtask was attached although its own pre-check already failed
    #[error("subtask '{subtask}' was rejected by activity '{activity}'")]
    SubtaskRejected { activity: String, subtask: String },
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Error serializing config back to TOML
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value is outside its allowed range
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
