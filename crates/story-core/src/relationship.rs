//! Relationship Graph
//!
//! Directed affinity between every ordered pair of characters, bounded to
//! [-1, 1]. A→B and B→A are independent values.

use serde::{Deserialize, Serialize};

use crate::config::RelationshipConfig;
use crate::registry::{CharacterId, CharacterRegistry};

/// Lower bound of affinity.
pub const MIN_AFFINITY: f32 = -1.0;
/// Upper bound of affinity.
pub const MAX_AFFINITY: f32 = 1.0;

/// Class derived from an affinity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationClass {
    Rival,
    Neutral,
    Friend,
}

/// Thresholds for [`RelationClass`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub friend: f32,
    pub rival: f32,
}

impl Thresholds {
    pub fn from_config(config: &RelationshipConfig) -> Self {
        Self {
            friend: config.friend_threshold,
            rival: config.rival_threshold,
        }
    }

    pub fn classify(&self, affinity: f32) -> RelationClass {
        if affinity >= self.friend {
            RelationClass::Friend
        } else if affinity <= self.rival {
            RelationClass::Rival
        } else {
            RelationClass::Neutral
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_config(&RelationshipConfig::default())
    }
}

/// Summary of everything directed at one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomingSummary {
    pub count: usize,
    pub mean: f32,
    pub min: f32,
    pub max: f32,
    pub friends: usize,
    pub rivals: usize,
}

/// Dense `n × n` affinity matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    size: usize,
    affinity: Vec<f32>,
    max_delta: f32,
}

impl RelationshipGraph {
    /// All pairs neutral.
    pub fn new(size: usize, max_delta: f32) -> Self {
        Self {
            size,
            affinity: vec![0.0; size * size],
            max_delta: max_delta.abs(),
        }
    }

    /// Neutral graph with the roster's friend/enemy ties applied.
    pub fn seeded(registry: &CharacterRegistry, config: &RelationshipConfig) -> Self {
        let mut graph = Self::new(registry.len(), config.max_delta);
        for character in registry.iter() {
            for friend in &character.friends {
                graph.set(character.id, *friend, config.seeded_affinity);
            }
            for enemy in &character.enemies {
                graph.set(character.id, *enemy, -config.seeded_affinity);
            }
        }
        graph
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn slot(&self, source: CharacterId, target: CharacterId) -> Option<usize> {
        if source == target || source.0 >= self.size || target.0 >= self.size {
            return None;
        }
        Some(source.0 * self.size + target.0)
    }

    /// Affinity of `source` toward `target`; self-affinity reads as 0.
    pub fn affinity(&self, source: CharacterId, target: CharacterId) -> f32 {
        self.slot(source, target)
            .map_or(0.0, |slot| self.affinity[slot])
    }

    /// Adds a bounded delta; returns the new value. Never symmetrizes.
    pub fn adjust(&mut self, source: CharacterId, target: CharacterId, delta: f32) -> f32 {
        let Some(slot) = self.slot(source, target) else {
            return 0.0;
        };
        let delta = if delta.is_finite() {
            delta.clamp(-self.max_delta, self.max_delta)
        } else {
            0.0
        };
        let value = (self.affinity[slot] + delta).clamp(MIN_AFFINITY, MAX_AFFINITY);
        self.affinity[slot] = value;
        value
    }

    /// Assigns an exact (clamped) value; returns it.
    pub fn set(&mut self, source: CharacterId, target: CharacterId, value: f32) -> f32 {
        let Some(slot) = self.slot(source, target) else {
            return 0.0;
        };
        let value = if value.is_finite() {
            value.clamp(MIN_AFFINITY, MAX_AFFINITY)
        } else {
            0.0
        };
        self.affinity[slot] = value;
        value
    }

    pub fn classify(
        &self,
        source: CharacterId,
        target: CharacterId,
        thresholds: &Thresholds,
    ) -> RelationClass {
        thresholds.classify(self.affinity(source, target))
    }

    /// Summarizes all affinities directed at `target`.
    pub fn aggregate_incoming(&self, target: CharacterId, thresholds: &Thresholds) -> IncomingSummary {
        let values: Vec<f32> = (0..self.size)
            .map(CharacterId)
            .filter(|source| *source != target)
            .map(|source| self.affinity(source, target))
            .collect();

        if values.is_empty() {
            return IncomingSummary {
                count: 0,
                mean: 0.0,
                min: 0.0,
                max: 0.0,
                friends: 0,
                rivals: 0,
            };
        }

        let sum: f32 = values.iter().sum();
        IncomingSummary {
            count: values.len(),
            mean: sum / values.len() as f32,
            min: values.iter().copied().fold(f32::INFINITY, f32::min),
            max: values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            friends: values
                .iter()
                .filter(|v| thresholds.classify(**v) == RelationClass::Friend)
                .count(),
            rivals: values
                .iter()
                .filter(|v| thresholds.classify(**v) == RelationClass::Rival)
                .count(),
        }
    }

    /// Rows of the matrix, `rows[source][target]`.
    pub fn rows(&self) -> Vec<Vec<f32>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.affinity.chunks(self.size).map(<[f32]>::to_vec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_roster;

    fn ids() -> (CharacterId, CharacterId, CharacterId) {
        (CharacterId(0), CharacterId(1), CharacterId(2))
    }

    #[test]
    fn test_defaults_to_neutral() {
        let graph = RelationshipGraph::new(3, 1.0);
        let (a, b, _) = ids();
        assert_eq!(graph.affinity(a, b), 0.0);
        assert_eq!(graph.classify(a, b, &Thresholds::default()), RelationClass::Neutral);
    }

    #[test]
    fn test_adjust_is_directed() {
        let mut graph = RelationshipGraph::new(3, 1.0);
        let (a, b, _) = ids();
        graph.adjust(a, b, 0.4);
        assert_eq!(graph.affinity(a, b), 0.4);
        assert_eq!(graph.affinity(b, a), 0.0);
    }

    #[test]
    fn test_adjust_clamps() {
        let mut graph = RelationshipGraph::new(3, 0.5);
        let (a, b, c) = ids();
        // Delta is bounded to the max step first.
        assert_eq!(graph.adjust(a, b, 5.0), 0.5);
        for _ in 0..10 {
            graph.adjust(a, b, 0.5);
            graph.adjust(a, c, -0.5);
        }
        assert_eq!(graph.affinity(a, b), MAX_AFFINITY);
        assert_eq!(graph.affinity(a, c), MIN_AFFINITY);
        assert_eq!(graph.adjust(a, b, f32::NAN), MAX_AFFINITY);
    }

    #[test]
    fn test_self_affinity_ignored() {
        let mut graph = RelationshipGraph::new(3, 1.0);
        let (a, _, _) = ids();
        graph.adjust(a, a, 0.5);
        assert_eq!(graph.affinity(a, a), 0.0);
    }

    #[test]
    fn test_classify_thresholds() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.classify(0.3), RelationClass::Friend);
        assert_eq!(thresholds.classify(0.29), RelationClass::Neutral);
        assert_eq!(thresholds.classify(-0.3), RelationClass::Rival);
    }

    #[test]
    fn test_aggregate_incoming() {
        let mut graph = RelationshipGraph::new(3, 1.0);
        let (a, b, c) = ids();
        graph.set(a, c, 0.6);
        graph.set(b, c, -0.4);
        graph.set(c, a, 0.9);
        let summary = graph.aggregate_incoming(c, &Thresholds::default());
        assert_eq!(summary.count, 2);
        assert!((summary.mean - 0.1).abs() < 1e-6);
        assert_eq!(summary.min, -0.4);
        assert_eq!(summary.max, 0.6);
        assert_eq!(summary.friends, 1);
        assert_eq!(summary.rivals, 1);
    }

    #[test]
    fn test_seeded_ties() {
        let mut roster = default_roster();
        roster[0].friends.push("Ariadne".into());
        roster[0].enemies.push("TheZeus".into());
        let registry = CharacterRegistry::from_config(&roster).unwrap();
        let graph = RelationshipGraph::seeded(&registry, &RelationshipConfig::default());
        let monstradamus = registry.resolve("Monstradamus").unwrap();
        assert_eq!(graph.affinity(monstradamus, registry.resolve("Ariadne").unwrap()), 0.5);
        assert_eq!(graph.affinity(monstradamus, registry.resolve("Theseus").unwrap()), -0.5);
        assert_eq!(graph.rows().len(), 9);
    }
}
