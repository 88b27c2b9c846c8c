//! Day Script Records
//!
//! The on-disk format of a day: a JSON array of event records, one file per
//! day named `day-NN.json`.
//!
//! # Example
//!
//! ```
//! use story_events::{parse_day, RecordKind};
//!
//! let day = parse_day(r#"[
//!     {"character": "Theseus", "to": "Isolda", "mood": "respectful", "text": "Well met."},
//!     {"event_type": "day_end"}
//! ]"#).unwrap();
//! assert_eq!(day[0].event_type, RecordKind::Dialogue);
//! assert_eq!(day[0].addressee_names(), vec!["Isolda"]);
//! ```

use serde::{Deserialize, Serialize};

/// Returns the script file name for a day number.
pub fn day_file_name(day: u32) -> String {
    format!("day-{:02}.json", day)
}

/// Parses a day script from JSON text.
pub fn parse_day(json: &str) -> Result<Vec<EventRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Event kind as written in a script.
///
/// Records without an `event_type` are dialogue lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Dialogue,
    Action,
    #[serde(alias = "relationship-delta")]
    RelationshipDelta,
    Meta,
    DayStart,
    DayEnd,
    EnvironmentChange,
    Enter,
    Leave,
    Offended,
    AiAssumeControl,
    UserAssumeControl,
}

impl RecordKind {
    /// Staging markers that never touch simulation state.
    pub fn is_staging(&self) -> bool {
        matches!(
            self,
            RecordKind::Meta
                | RecordKind::DayStart
                | RecordKind::DayEnd
                | RecordKind::EnvironmentChange
        )
    }

    /// Snake-case label, matching the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Dialogue => "dialogue",
            RecordKind::Action => "action",
            RecordKind::RelationshipDelta => "relationship_delta",
            RecordKind::Meta => "meta",
            RecordKind::DayStart => "day_start",
            RecordKind::DayEnd => "day_end",
            RecordKind::EnvironmentChange => "environment_change",
            RecordKind::Enter => "enter",
            RecordKind::Leave => "leave",
            RecordKind::Offended => "offended",
            RecordKind::AiAssumeControl => "ai_assume_control",
            RecordKind::UserAssumeControl => "user_assume_control",
        }
    }
}

/// The `to` field: a single name or a list of names.
///
/// An empty string or an empty list means the line is unaddressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddresseeField {
    One(String),
    Many(Vec<String>),
}

/// Explicit mood assignment carried by an action record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodOverrideRecord {
    pub character: String,
    pub mood: String,
    #[serde(default = "full_intensity")]
    pub intensity: f32,
}

fn full_intensity() -> f32 {
    1.0
}

/// Explicit affinity assignment carried by an action record.
///
/// `source` defaults to the record's speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub target: String,
    pub value: f32,
}

/// Group-state condition an event can require before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Both characters regard each other as friends
    Friends,
    /// Either character regards the other as a rival
    Rivals,
    /// The character has no friend links and is viewed negatively
    Isolated,
    /// The character is currently present
    Present,
}

impl ConditionKind {
    /// Number of characters the condition names.
    pub fn arity(&self) -> usize {
        match self {
            ConditionKind::Friends | ConditionKind::Rivals => 2,
            ConditionKind::Isolated | ConditionKind::Present => 1,
        }
    }
}

/// Precondition record: `{"condition": "rivals", "characters": ["A", "B"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub condition: ConditionKind,
    pub characters: Vec<String>,
}

/// One event as written in a day script.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventRecord {
    /// Speaker or actor (any accepted spelling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    /// Addressee(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<AddresseeField>,
    /// Mood the line is delivered with; empty means unspecified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub event_type: RecordKind,
    /// Affinity delta for relationship_delta records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_mood: Vec<MoodOverrideRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_affinity: Vec<AffinityRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<ConditionRecord>,
    /// Spelling the speaker was written with in the source play
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl EventRecord {
    /// Creates a dialogue line.
    pub fn dialogue(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            character: Some(speaker.into()),
            text: text.into(),
            event_type: RecordKind::Dialogue,
            ..Self::default()
        }
    }

    /// Creates a relationship shift from `source` toward `target`.
    pub fn relationship_delta(
        source: impl Into<String>,
        target: impl Into<String>,
        delta: f32,
    ) -> Self {
        Self {
            character: Some(source.into()),
            to: Some(AddresseeField::One(target.into())),
            event_type: RecordKind::RelationshipDelta,
            delta: Some(delta),
            ..Self::default()
        }
    }

    /// Creates a scripted plot beat performed by `actor`.
    pub fn action(actor: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            character: Some(actor.into()),
            text: text.into(),
            event_type: RecordKind::Action,
            ..Self::default()
        }
    }

    /// Creates a staging marker.
    pub fn meta(label: impl Into<String>) -> Self {
        Self {
            text: label.into(),
            event_type: RecordKind::Meta,
            ..Self::default()
        }
    }

    /// Creates a record of the given kind for `character`.
    pub fn of_kind(kind: RecordKind, character: impl Into<String>) -> Self {
        Self {
            character: Some(character.into()),
            event_type: kind,
            ..Self::default()
        }
    }

    /// Addresses the record to one character.
    pub fn to(mut self, name: impl Into<String>) -> Self {
        self.to = Some(AddresseeField::One(name.into()));
        self
    }

    /// Addresses the record to several characters.
    pub fn to_many<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to = Some(AddresseeField::Many(names.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_mood_override(
        mut self,
        character: impl Into<String>,
        mood: impl Into<String>,
        intensity: f32,
    ) -> Self {
        self.set_mood.push(MoodOverrideRecord {
            character: character.into(),
            mood: mood.into(),
            intensity,
        });
        self
    }

    pub fn with_affinity(mut self, target: impl Into<String>, value: f32) -> Self {
        self.set_affinity.push(AffinityRecord {
            source: None,
            target: target.into(),
            value,
        });
        self
    }

    pub fn requiring(mut self, condition: ConditionKind, characters: &[&str]) -> Self {
        self.requires = Some(ConditionRecord {
            condition,
            characters: characters.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Addressee names with blank entries dropped.
    pub fn addressee_names(&self) -> Vec<&str> {
        let names: Vec<&str> = match &self.to {
            None => Vec::new(),
            Some(AddresseeField::One(name)) => vec![name.as_str()],
            Some(AddresseeField::Many(names)) => names.iter().map(String::as_str).collect(),
        };
        names
            .into_iter()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// The mood tag, if one was written.
    pub fn mood_tag(&self) -> Option<&str> {
        self.mood
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}
