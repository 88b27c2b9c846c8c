//! Shared record types and serialization for the storyline engine.
//!
//! This crate contains pure data structures with no simulation logic:
//! the day-script record format, the step-log entries and the
//! presentation frames the engine hands to renderers.

pub mod frame;
pub mod record;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export record types
pub use record::{
    day_file_name, parse_day, AddresseeField, AffinityRecord, ConditionKind, ConditionRecord,
    MoodOverrideRecord, RecordKind,
};
pub use record::EventRecord;

// Re-export frame and log types
pub use frame::{Controller, Effect, EventView, Frame, MoodView, StepLogEntry, StepOutcome};
