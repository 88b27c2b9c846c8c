//! Emotion Model
//!
//! Moods are tags from a closed but extensible taxonomy, grouped into four
//! valence classes. A character holds exactly one tag plus an intensity at
//! every step. Stimuli derived from events move the mood; steps without
//! stimulus decay it back toward the resting tag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::EmotionConfig;
use crate::error::MoodError;

/// Valence class of a mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valence {
    Positive,
    Neutral,
    Negative,
    Complex,
}

impl Valence {
    /// Position on the valence axis used for emotional inertia.
    pub fn axis(self) -> f32 {
        match self {
            Valence::Positive => 1.0,
            Valence::Neutral => 0.0,
            Valence::Complex => -0.5,
            Valence::Negative => -1.0,
        }
    }

    /// Distance between two classes on the valence axis.
    pub fn distance(self, other: Valence) -> f32 {
        (self.axis() - other.axis()).abs()
    }

    pub fn label(self) -> &'static str {
        match self {
            Valence::Positive => "positive",
            Valence::Neutral => "neutral",
            Valence::Negative => "negative",
            Valence::Complex => "complex",
        }
    }
}

impl fmt::Display for Valence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Index of a registered mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoodTag(pub u16);

/// The standard vocabulary, grouped by class.
pub const STANDARD_MOODS: &[(&str, Valence)] = &[
    ("compassionate", Valence::Positive),
    ("excited", Valence::Positive),
    ("flirty", Valence::Positive),
    ("hopeful", Valence::Positive),
    ("humorous", Valence::Positive),
    ("proud", Valence::Positive),
    ("respectful", Valence::Positive),
    ("solemn", Valence::Positive),
    ("friendly", Valence::Positive),
    ("admiration", Valence::Positive),
    ("neutral", Valence::Neutral),
    ("calm", Valence::Neutral),
    ("confused", Valence::Neutral),
    ("contemplative", Valence::Neutral),
    ("curious", Valence::Neutral),
    ("surprised", Valence::Neutral),
    ("resigned", Valence::Neutral),
    ("angry", Valence::Negative),
    ("anxious", Valence::Negative),
    ("down", Valence::Negative),
    ("embarrassed", Valence::Negative),
    ("fearful", Valence::Negative),
    ("irritated", Valence::Negative),
    ("hostile", Valence::Negative),
    ("fear", Valence::Negative),
    ("defensive", Valence::Complex),
    ("desperate", Valence::Complex),
    ("dismissive", Valence::Complex),
    ("jealous", Valence::Complex),
    ("sarcastic", Valence::Complex),
    ("skeptical", Valence::Complex),
];

/// Registered moods. Tags are only created through [`MoodTaxonomy::register`].
#[derive(Debug, Clone, Default)]
pub struct MoodTaxonomy {
    names: Vec<String>,
    valences: Vec<Valence>,
    lookup: HashMap<String, MoodTag>,
}

impl MoodTaxonomy {
    /// An empty taxonomy.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard vocabulary.
    pub fn standard() -> Self {
        let mut taxonomy = Self::new();
        for (name, valence) in STANDARD_MOODS {
            taxonomy
                .register(name, *valence)
                .expect("standard moods are unique");
        }
        taxonomy
    }

    /// Adds a tag. Names are case-insensitive.
    pub fn register(&mut self, name: &str, valence: Valence) -> Result<MoodTag, MoodError> {
        let key = name.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(MoodError::InvalidMood(name.to_string()));
        }
        if self.lookup.contains_key(&key) {
            return Err(MoodError::AlreadyRegistered(key));
        }
        let tag = MoodTag(self.names.len() as u16);
        self.names.push(key.clone());
        self.valences.push(valence);
        self.lookup.insert(key, tag);
        Ok(tag)
    }

    /// Parses a tag; unknown names are rejected, never coerced.
    pub fn parse(&self, name: &str) -> Result<MoodTag, MoodError> {
        self.lookup
            .get(&name.trim().to_ascii_lowercase())
            .copied()
            .ok_or_else(|| MoodError::InvalidMood(name.to_string()))
    }

    pub fn contains(&self, tag: MoodTag) -> bool {
        usize::from(tag.0) < self.names.len()
    }

    pub fn name(&self, tag: MoodTag) -> &str {
        &self.names[usize::from(tag.0)]
    }

    pub fn valence(&self, tag: MoodTag) -> Valence {
        self.valences[usize::from(tag.0)]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = MoodTag> {
        (0..self.names.len() as u16).map(MoodTag)
    }
}

/// A character's current mood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodState {
    pub tag: MoodTag,
    pub intensity: f32,
}

impl MoodState {
    pub fn new(tag: MoodTag, intensity: f32) -> Self {
        Self {
            tag,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }
}

/// A candidate mood with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub tag: MoodTag,
    pub score: f32,
}

/// Signal derived from an event and fed to a character.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    pub valence: Valence,
    /// Strength in [0, 1]
    pub magnitude: f32,
    /// Candidate moods in preference order
    pub candidates: Vec<Candidate>,
}

/// Reaction candidates per valence class. `None` means "the expressed tag".
const POSITIVE_REACTIONS: &[(Option<&str>, f32)] =
    &[(None, 1.0), (Some("friendly"), 0.8), (Some("hopeful"), 0.6)];
const NEUTRAL_REACTIONS: &[(Option<&str>, f32)] = &[(Some("curious"), 1.0), (Some("calm"), 1.0)];
const NEGATIVE_REACTIONS: &[(Option<&str>, f32)] = &[
    (Some("irritated"), 1.0),
    (Some("defensive"), 1.0),
    (Some("anxious"), 0.7),
];
const COMPLEX_REACTIONS: &[(Option<&str>, f32)] = &[
    (Some("skeptical"), 1.0),
    (Some("confused"), 1.0),
    (Some("defensive"), 0.7),
];

/// Tolerance for treating two candidate scores as tied.
const SCORE_EPSILON: f32 = 1e-6;

/// Mood transition rules over a taxonomy.
#[derive(Debug, Clone)]
pub struct EmotionModel {
    taxonomy: MoodTaxonomy,
    config: EmotionConfig,
    resting: MoodTag,
    bridge: MoodTag,
    reactions: [Vec<(Option<MoodTag>, f32)>; 4],
}

impl EmotionModel {
    /// Builds the model, resolving the resting, bridge and reaction tags.
    pub fn new(taxonomy: MoodTaxonomy, config: EmotionConfig) -> Result<Self, MoodError> {
        let resting = taxonomy.parse(&config.resting_mood)?;
        let bridge = taxonomy.parse(&config.bridge_mood)?;

        let resolve = |table: &[(Option<&str>, f32)]| -> Result<Vec<(Option<MoodTag>, f32)>, MoodError> {
            table
                .iter()
                .map(|(name, score)| match name {
                    Some(name) => taxonomy.parse(name).map(|t| (Some(t), *score)),
                    None => Ok((None, *score)),
                })
                .collect()
        };
        let reactions = [
            resolve(POSITIVE_REACTIONS)?,
            resolve(NEUTRAL_REACTIONS)?,
            resolve(NEGATIVE_REACTIONS)?,
            resolve(COMPLEX_REACTIONS)?,
        ];

        Ok(Self {
            taxonomy,
            config,
            resting,
            bridge,
            reactions,
        })
    }

    /// Standard taxonomy with default tuning.
    pub fn standard() -> Self {
        Self::new(MoodTaxonomy::standard(), EmotionConfig::default())
            .expect("standard taxonomy contains the default tags")
    }

    pub fn taxonomy(&self) -> &MoodTaxonomy {
        &self.taxonomy
    }

    pub fn config(&self) -> &EmotionConfig {
        &self.config
    }

    /// The mood every character starts with.
    pub fn resting(&self) -> MoodState {
        MoodState::new(self.resting, 0.0)
    }

    /// Mood a speaker adopts when delivering a line with `tag`.
    pub fn express(&self, tag: MoodTag) -> MoodState {
        MoodState::new(tag, self.config.expression_intensity)
    }

    /// Builds the stimulus a line delivered with `expressed` produces at
    /// the given raw magnitude.
    pub fn stimulus_for(&self, expressed: MoodTag, magnitude: f32) -> Stimulus {
        let valence = self.taxonomy.valence(expressed);
        let table = match valence {
            Valence::Positive => &self.reactions[0],
            Valence::Neutral => &self.reactions[1],
            Valence::Negative => &self.reactions[2],
            Valence::Complex => &self.reactions[3],
        };
        let weight = if valence == Valence::Neutral {
            self.config.neutral_weight
        } else {
            1.0
        };
        let candidates = table
            .iter()
            .map(|(tag, score)| Candidate {
                tag: tag.unwrap_or(expressed),
                score: *score,
            })
            .collect();
        Stimulus {
            valence,
            magnitude: (magnitude * weight).clamp(0.0, 1.0),
            candidates,
        }
    }

    /// Computes the next mood after a stimulus.
    pub fn apply_stimulus(&self, previous: MoodState, stimulus: &Stimulus) -> MoodState {
        let previous_valence = self.taxonomy.valence(previous.tag);
        let magnitude = stimulus.magnitude.clamp(0.0, 1.0);

        if magnitude < previous.intensity {
            if stimulus.valence == previous_valence {
                let reinforced = previous.intensity + magnitude * self.config.reinforce_factor;
                return MoodState::new(previous.tag, reinforced);
            }
            return previous;
        }

        let Some(chosen) = self.choose(previous_valence, &stimulus.candidates) else {
            return previous;
        };

        let distance = previous_valence.distance(self.taxonomy.valence(chosen));
        if distance > 1.0 && magnitude < self.config.swap_threshold {
            return MoodState::new(self.bridge, magnitude);
        }

        MoodState::new(chosen, magnitude)
    }

    /// Highest score wins; ties go to the class nearest the previous mood,
    /// then to candidate order.
    fn choose(&self, previous: Valence, candidates: &[Candidate]) -> Option<MoodTag> {
        let mut best: Option<(Candidate, f32)> = None;
        for candidate in candidates {
            if !self.taxonomy.contains(candidate.tag) {
                continue;
            }
            let distance = previous.distance(self.taxonomy.valence(candidate.tag));
            let better = match best {
                None => true,
                Some((current, current_distance)) => {
                    if candidate.score > current.score + SCORE_EPSILON {
                        true
                    } else if (candidate.score - current.score).abs() <= SCORE_EPSILON {
                        distance < current_distance
                    } else {
                        false
                    }
                }
            };
            if better {
                best = Some((*candidate, distance));
            }
        }
        best.map(|(c, _)| c.tag)
    }

    /// Lets a mood fade for `elapsed_steps` steps.
    pub fn decay(&self, previous: MoodState, elapsed_steps: u32) -> MoodState {
        if elapsed_steps == 0 {
            return previous;
        }
        let intensity = previous.intensity - self.config.decay_per_step * elapsed_steps as f32;
        if intensity <= self.config.rest_threshold {
            return self.resting();
        }
        MoodState::new(previous.tag, intensity)
    }
}
