//! Error types for the storyline engine.
//!
//! Structural problems (unknown names, bad moods, malformed records) are
//! caught when a day loads. Runtime problems during a step leave the
//! history untouched. Navigation errors leave the bounds untouched.

use std::path::PathBuf;

use thiserror::Error;

/// Name resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown character '{0}'")]
    UnknownCharacter(String),
    #[error("name '{name}' is claimed by both '{first}' and '{second}'")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },
}

/// Mood taxonomy failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoodError {
    #[error("'{0}' is not a registered mood")]
    InvalidMood(String),
    #[error("mood '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// A single event that cannot be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("unknown character '{0}'")]
    UnknownCharacter(String),
    #[error("addressee '{0}' does not name a character")]
    UnresolvedAddressee(String),
    #[error(transparent)]
    InvalidMood(#[from] MoodError),
    #[error("malformed {kind} event: {reason}")]
    MalformedEvent { kind: &'static str, reason: String },
}

impl EventError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        EventError::MalformedEvent {
            kind,
            reason: reason.into(),
        }
    }
}

/// Failure to fetch a day's records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no script for day {0}")]
    MissingDay(u32),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A day that could not be loaded.
#[derive(Debug, Error)]
pub enum DayLoadError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("day {day}, event {index}: {source}")]
    InvalidEvent {
        day: u32,
        index: usize,
        #[source]
        source: EventError,
    },
}

/// Rejected navigation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("step {requested} is outside 0..={len}")]
    OutOfRange { requested: isize, len: usize },
    #[error("day {0} is outside the script")]
    DayOutOfRange(u32),
    #[error("no day is loaded")]
    NoDayLoaded,
}

/// Anything the scheduler can report.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Load(#[from] DayLoadError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Errors building an engine from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Mood(#[from] MoodError),
}
