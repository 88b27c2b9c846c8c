//! Configuration System
//!
//! Loads tuning parameters from a TOML file so stimulus and relationship
//! rules can be adjusted without recompiling. Every section is optional;
//! missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::emotion::Valence;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "storyline.toml";

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryConfig {
    #[serde(default)]
    pub emotion: EmotionConfig,
    #[serde(default)]
    pub relationship: RelationshipConfig,
    #[serde(default)]
    pub tension: TensionConfig,
    #[serde(default)]
    pub offense: OffenseConfig,
    #[serde(default)]
    pub dynamics: DynamicsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Extra mood tags registered on top of the standard taxonomy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moods: Vec<MoodRegistration>,
    /// Cast; the built-in roster is used when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characters: Vec<CharacterConfig>,
}

impl StoryConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from `path`, or uses defaults if it cannot be read.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", path.display(), e);
            Self::default()
        })
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Mood transition parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Intensity a speaker's mood takes when delivering a line
    pub expression_intensity: f32,
    /// Base magnitude of a line aimed at a character
    pub direct_magnitude: f32,
    /// Fraction of the direct magnitude felt by bystanders of an unaddressed line
    pub ambient_factor: f32,
    /// Fraction of the magnitude that full resilience absorbs
    pub resilience_damping: f32,
    /// Multiplier for neutral-valence lines
    pub neutral_weight: f32,
    /// Minimum magnitude for a swap across distant valence classes
    pub swap_threshold: f32,
    /// Share of a weaker same-class stimulus added to the current intensity
    pub reinforce_factor: f32,
    /// Intensity lost per step without stimulus
    pub decay_per_step: f32,
    /// Intensity at or below which a mood returns to rest
    pub rest_threshold: f32,
    /// Tag a character settles on when a swap is too abrupt
    pub bridge_mood: String,
    /// Tag every character starts with and decays to
    pub resting_mood: String,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            expression_intensity: 0.7,
            direct_magnitude: 0.7,
            ambient_factor: 0.35,
            resilience_damping: 0.5,
            neutral_weight: 0.5,
            swap_threshold: 0.55,
            reinforce_factor: 0.25,
            decay_per_step: 0.05,
            rest_threshold: 0.1,
            bridge_mood: "surprised".to_string(),
            resting_mood: "neutral".to_string(),
        }
    }
}

/// Affinity rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Affinity at or above which a character counts as a friend
    pub friend_threshold: f32,
    /// Affinity at or below which a character counts as a rival
    pub rival_threshold: f32,
    pub positive_step: f32,
    pub neutral_step: f32,
    pub negative_step: f32,
    pub complex_step: f32,
    /// Share of the step applied back from addressee to speaker
    pub reciprocity: f32,
    /// Largest delta a single adjustment may carry
    pub max_delta: f32,
    /// Starting affinity toward roster friends (negated for enemies)
    pub seeded_affinity: f32,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            friend_threshold: 0.3,
            rival_threshold: -0.3,
            positive_step: 0.10,
            neutral_step: 0.0,
            negative_step: -0.15,
            complex_step: -0.05,
            reciprocity: 0.5,
            max_delta: 1.0,
            seeded_affinity: 0.5,
        }
    }
}

impl RelationshipConfig {
    /// Affinity step for a line of the given valence.
    pub fn step_for(&self, valence: Valence) -> f32 {
        match valence {
            Valence::Positive => self.positive_step,
            Valence::Neutral => self.neutral_step,
            Valence::Negative => self.negative_step,
            Valence::Complex => self.complex_step,
        }
    }
}

/// Group tension impact per valence class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TensionConfig {
    pub positive: f32,
    pub neutral: f32,
    pub negative: f32,
    pub complex: f32,
}

impl Default for TensionConfig {
    fn default() -> Self {
        Self {
            positive: -0.03,
            neutral: 0.0,
            negative: 0.02,
            complex: 0.01,
        }
    }
}

impl TensionConfig {
    pub fn impact(&self, valence: Valence) -> f32 {
        match valence {
            Valence::Positive => self.positive,
            Valence::Neutral => self.neutral,
            Valence::Negative => self.negative,
            Valence::Complex => self.complex,
        }
    }
}

/// When and how hard characters take offense.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffenseConfig {
    /// Characters with resilience above this never take offense
    pub resilience_cap: u8,
    /// Chance for a negative or complex line from a rival
    pub rival_chance: f64,
    /// Chance for a line in `friend_mood` from a friend
    pub friend_chance: f64,
    /// The one mood a friend can give offense with
    pub friend_mood: String,
    /// Chance for any other negative line
    pub base_chance: f64,
    /// Tension added when someone takes offense
    pub tension: f32,
    /// Affinity change from the offended character toward the offender
    pub affinity_delta: f32,
}

impl Default for OffenseConfig {
    fn default() -> Self {
        Self {
            resilience_cap: 70,
            rival_chance: 0.7,
            friend_chance: 0.3,
            friend_mood: "angry".to_string(),
            base_chance: 0.5,
            tension: 0.015,
            affinity_delta: -0.25,
        }
    }
}

/// Aggregation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Incoming mean affinity below which a friendless character is isolated
    pub isolation_threshold: f32,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            isolation_threshold: 0.0,
        }
    }
}

/// Day scheduling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seed for the offense roll
    pub seed: u64,
    /// Decay steps applied between one day's end and the next day's start
    pub overnight_decay_steps: u32,
    /// Dialogue lines kept as context for generated dialogue
    pub context_lines: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            overnight_decay_steps: 5,
            context_lines: 20,
        }
    }
}

/// `[[moods]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodRegistration {
    pub name: String,
    pub valence: Valence,
}

/// `[[characters]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub name: String,
    #[serde(default = "default_attribute")]
    pub leadership: u8,
    #[serde(default = "default_attribute")]
    pub intelligence: u8,
    #[serde(default = "default_attribute")]
    pub resilience: u8,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub enemies: Vec<String>,
    /// Only talks to characters smarter than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_partner_intelligence: Option<u8>,
}

fn default_attribute() -> u8 {
    50
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}
