//! Frame and Step Log Types
//!
//! Serialization structs for what the engine exposes after each step:
//! a presentation frame (moods, affinity matrix, current event) and an
//! append-only log entry describing what the step changed.

use serde::{Deserialize, Serialize};

use crate::RecordKind;

/// Who supplies a character's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    /// Lines come from the day script
    #[default]
    Script,
    /// Lines are generated by the dialogue model
    Ai,
    /// The player picks among generated candidates
    User,
}

/// A character's mood at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodView {
    pub character: String,
    pub mood: String,
    pub valence: String,
    pub intensity: f32,
}

/// The event that produced a step, as shown to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    /// Index of the event within its day
    pub index: usize,
    pub kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addressees: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

/// Everything a renderer needs for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub day: u32,
    pub step: usize,
    pub step_count: usize,
    /// Canonical names, in roster order; rows and columns of `affinity`
    pub characters: Vec<String>,
    pub moods: Vec<MoodView>,
    /// `affinity[source][target]`
    pub affinity: Vec<Vec<f32>>,
    pub tension: f32,
    pub tension_label: String,
    #[serde(default)]
    pub present: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_event: Option<EventView>,
}

/// Whether an event changed state or was gated off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    /// The event's precondition did not hold
    Skipped,
}

/// A single state change recorded in the step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    MoodChanged {
        character: String,
        from: String,
        to: String,
        intensity: f32,
    },
    AffinityChanged {
        source: String,
        target: String,
        from: f32,
        to: f32,
    },
    TensionChanged {
        from: f32,
        to: f32,
    },
    Entered {
        character: String,
    },
    Left {
        character: String,
    },
    Offended {
        character: String,
        by: String,
    },
    ControlChanged {
        character: String,
        controller: Controller,
    },
}

/// One line of the JSONL step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLogEntry {
    pub day: u32,
    /// Step reached by applying the event (1-based)
    pub step: usize,
    pub event: EventView,
    pub outcome: StepOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

impl StepLogEntry {
    /// Serializes the entry as a single JSONL line (without newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses an entry from a JSONL line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_tagging() {
        let effect = Effect::Offended {
            character: "IsoldA".into(),
            by: "Sartrik".into(),
        };
        let json = serde_json::to_string(&effect).unwrap();
        assert!(json.contains(r#""effect":"offended""#));
    }

    #[test]
    fn test_log_entry_jsonl() {
        let entry = StepLogEntry {
            day: 2,
            step: 5,
            event: EventView {
                index: 4,
                kind: RecordKind::Dialogue,
                speaker: Some("Theseus".into()),
                addressees: vec!["Ariadne".into()],
                text: "Thread.".into(),
                mood: Some("hopeful".into()),
            },
            outcome: StepOutcome::Applied,
            effects: vec![Effect::TensionChanged { from: 0.0, to: 0.0 }],
        };
        let line = entry.to_jsonl().unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(StepLogEntry::from_jsonl(&line).unwrap(), entry);
    }

    #[test]
    fn test_controller_default() {
        assert_eq!(Controller::default(), Controller::Script);
        assert_eq!(serde_json::to_string(&Controller::Ai).unwrap(), r#""ai""#);
    }
}
