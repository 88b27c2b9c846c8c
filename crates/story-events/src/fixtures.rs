//! Sample day scripts for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // story-events = { path = "../story-events", features = ["test-fixtures"] }
//!
//! use story_events::fixtures;
//!
//! let day = fixtures::sample_day_one();
//! ```

use crate::{parse_day, EventRecord};

/// Raw JSON of the first sample day.
pub const DAY_ONE_JSON: &str = include_str!("../tests/fixtures/day-01.json");

/// Raw JSON of the second sample day.
pub const DAY_TWO_JSON: &str = include_str!("../tests/fixtures/day-02.json");

/// Returns the first sample day.
///
/// Contains 12 records using every alias in the default roster:
/// - staging markers at both ends
/// - addressed, multi-addressed and unaddressed dialogue
/// - a relationship shift, a scripted action, a leave and an enter
pub fn sample_day_one() -> Vec<EventRecord> {
    parse_day(DAY_ONE_JSON).expect("Failed to parse day-01.json")
}

/// Returns the second sample day.
///
/// Contains 8 records:
/// - a quarrel that turns two characters into rivals
/// - a reply gated on that rivalry
/// - an AI control handoff followed by a line with empty text
/// - an offense
pub fn sample_day_two() -> Vec<EventRecord> {
    parse_day(DAY_TWO_JSON).expect("Failed to parse day-02.json")
}
