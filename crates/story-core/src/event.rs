//! Compiled Events
//!
//! Script records are validated and resolved once, when their day loads.
//! A compiled [`Event`] only holds canonical ids and registered mood tags,
//! so applying it can never hit an unknown name.

use story_events::{Controller, EventRecord, EventView, RecordKind};

use crate::dynamics::Condition;
use crate::emotion::{MoodState, MoodTag, MoodTaxonomy};
use crate::error::{DayLoadError, EventError};
use crate::registry::{CharacterId, CharacterRegistry};

/// Kind-specific data of a compiled event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Dialogue {
        mood: Option<MoodTag>,
        /// The line was aimed at someone. It stays a private line even when
        /// every addressee has been dropped.
        addressed: bool,
    },
    Action {
        moods: Vec<(CharacterId, MoodState)>,
        affinities: Vec<(CharacterId, CharacterId, f32)>,
    },
    RelationshipDelta {
        delta: f32,
    },
    Meta,
    Enter,
    Leave,
    Offended,
    AssumeControl(Controller),
}

/// One validated event of a day.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Position within the day
    pub index: usize,
    pub kind: RecordKind,
    pub speaker: Option<CharacterId>,
    /// Distinct addressees in script order
    pub addressees: Vec<CharacterId>,
    pub text: String,
    pub payload: EventPayload,
    pub requires: Option<Condition>,
}

/// Text (and optionally mood and addressees) supplied for a dialogue line at
/// step time, e.g. by a dialogue model or the player.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DialogueOverride {
    pub text: String,
    pub mood: Option<String>,
    pub addressees: Option<Vec<String>>,
}

impl DialogueOverride {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_addressees<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addressees = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

fn resolve_addressees<'a>(
    names: impl IntoIterator<Item = &'a str>,
    registry: &CharacterRegistry,
) -> Result<Vec<CharacterId>, EventError> {
    let mut ids = Vec::new();
    for name in names {
        let id = registry
            .resolve(name)
            .map_err(|_| EventError::UnresolvedAddressee(name.to_string()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn resolve_character(name: &str, registry: &CharacterRegistry) -> Result<CharacterId, EventError> {
    registry
        .resolve(name)
        .map_err(|_| EventError::UnknownCharacter(name.to_string()))
}

impl Event {
    /// Validates a record and resolves its names.
    pub fn compile(
        index: usize,
        record: &EventRecord,
        registry: &CharacterRegistry,
        taxonomy: &MoodTaxonomy,
    ) -> Result<Self, EventError> {
        let kind = record.event_type;
        let label = kind.label();

        let speaker = match record.character.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(resolve_character(name, registry)?),
            _ if kind.is_staging() => None,
            _ => return Err(EventError::malformed(label, "missing character")),
        };
        let addressees = resolve_addressees(record.addressee_names(), registry)?;
        let mood = record.mood_tag().map(|m| taxonomy.parse(m)).transpose()?;

        let payload = match kind {
            RecordKind::Dialogue => EventPayload::Dialogue {
                mood,
                addressed: !addressees.is_empty(),
            },
            RecordKind::Action => {
                if record.set_mood.is_empty() && record.set_affinity.is_empty() {
                    return Err(EventError::malformed(label, "declares no mood or affinity change"));
                }
                let moods = record
                    .set_mood
                    .iter()
                    .map(|o| {
                        let id = resolve_character(&o.character, registry)?;
                        let tag = taxonomy.parse(&o.mood)?;
                        if !o.intensity.is_finite() {
                            return Err(EventError::malformed(label, "intensity is not a number"));
                        }
                        Ok((id, MoodState::new(tag, o.intensity)))
                    })
                    .collect::<Result<Vec<_>, EventError>>()?;
                let affinities = record
                    .set_affinity
                    .iter()
                    .map(|a| {
                        let source = match a.source.as_deref() {
                            Some(name) => resolve_character(name, registry)?,
                            None => speaker
                                .ok_or_else(|| EventError::malformed(label, "affinity has no source"))?,
                        };
                        let target = registry
                            .resolve(&a.target)
                            .map_err(|_| EventError::UnresolvedAddressee(a.target.clone()))?;
                        if !a.value.is_finite() {
                            return Err(EventError::malformed(label, "affinity is not a number"));
                        }
                        Ok((source, target, a.value))
                    })
                    .collect::<Result<Vec<_>, EventError>>()?;
                EventPayload::Action { moods, affinities }
            }
            RecordKind::RelationshipDelta => {
                let delta = record
                    .delta
                    .filter(|d| d.is_finite())
                    .ok_or_else(|| EventError::malformed(label, "missing delta"))?;
                if addressees.is_empty() {
                    return Err(EventError::malformed(label, "missing target"));
                }
                EventPayload::RelationshipDelta { delta }
            }
            RecordKind::Offended => {
                if addressees.is_empty() {
                    return Err(EventError::malformed(label, "missing offender"));
                }
                EventPayload::Offended
            }
            RecordKind::Enter => EventPayload::Enter,
            RecordKind::Leave => EventPayload::Leave,
            RecordKind::AiAssumeControl => EventPayload::AssumeControl(Controller::Ai),
            RecordKind::UserAssumeControl => EventPayload::AssumeControl(Controller::User),
            RecordKind::Meta
            | RecordKind::DayStart
            | RecordKind::DayEnd
            | RecordKind::EnvironmentChange => EventPayload::Meta,
        };

        let requires = match &record.requires {
            None => None,
            Some(condition) => {
                if condition.characters.len() != condition.condition.arity() {
                    return Err(EventError::malformed(
                        label,
                        format!(
                            "condition {:?} names {} characters",
                            condition.condition,
                            condition.characters.len()
                        ),
                    ));
                }
                let ids = condition
                    .characters
                    .iter()
                    .map(|n| resolve_character(n, registry))
                    .collect::<Result<Vec<_>, _>>()?;
                let gate = Condition::from_kind(condition.condition, &ids)
                    .ok_or_else(|| EventError::malformed(label, "condition arity"))?;
                Some(gate)
            }
        };

        Ok(Self {
            index,
            kind,
            speaker,
            addressees,
            text: record.text.clone(),
            payload,
            requires,
        })
    }

    /// Returns a copy of this dialogue line with supplied content.
    ///
    /// Nothing is changed when any name or mood fails to resolve.
    pub fn with_override(
        &self,
        content: &DialogueOverride,
        registry: &CharacterRegistry,
        taxonomy: &MoodTaxonomy,
    ) -> Result<Self, EventError> {
        let EventPayload::Dialogue { mood, addressed } = &self.payload else {
            return Err(EventError::malformed(
                self.kind.label(),
                "only dialogue lines accept supplied text",
            ));
        };
        let text = content.text.trim();
        if text.is_empty() {
            return Err(EventError::malformed("dialogue", "supplied text is empty"));
        }

        let addressees = match &content.addressees {
            Some(names) => resolve_addressees(
                names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()),
                registry,
            )?,
            None => self.addressees.clone(),
        };
        let mood = match content.mood.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(name) => Some(taxonomy.parse(name)?),
            None => *mood,
        };

        Ok(Self {
            text: text.to_string(),
            payload: EventPayload::Dialogue {
                mood,
                addressed: *addressed || !addressees.is_empty(),
            },
            addressees,
            ..self.clone()
        })
    }

    pub fn is_dialogue(&self) -> bool {
        matches!(self.payload, EventPayload::Dialogue { .. })
    }

    /// Presentation view with canonical names.
    pub fn view(&self, registry: &CharacterRegistry, taxonomy: &MoodTaxonomy) -> EventView {
        let mood = match &self.payload {
            EventPayload::Dialogue { mood: Some(tag), .. } => Some(taxonomy.name(*tag).to_string()),
            _ => None,
        };
        EventView {
            index: self.index,
            kind: self.kind,
            speaker: self.speaker.map(|id| registry.name(id).to_string()),
            addressees: self
                .addressees
                .iter()
                .map(|id| registry.name(*id).to_string())
                .collect(),
            text: self.text.clone(),
            mood,
        }
    }
}

/// An immutable, validated day.
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    pub number: u32,
    pub events: Vec<Event>,
}

impl Day {
    /// Compiles every record; the first invalid one aborts the load.
    pub fn compile(
        number: u32,
        records: &[EventRecord],
        registry: &CharacterRegistry,
        taxonomy: &MoodTaxonomy,
    ) -> Result<Self, DayLoadError> {
        let events = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                Event::compile(index, record, registry, taxonomy).map_err(|source| {
                    DayLoadError::InvalidEvent {
                        day: number,
                        index,
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { number, events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
