//! Simulation Snapshot
//!
//! The complete state at one step. Snapshots are immutable once pushed onto
//! a day's history; the interpreter builds each new one from a clone.

use serde::{Deserialize, Serialize};

use story_events::{Controller, EventView, Frame, MoodView};

use crate::dynamics::tension_label;
use crate::emotion::{EmotionModel, MoodState, MoodTaxonomy};
use crate::registry::{CharacterId, CharacterRegistry};
use crate::relationship::RelationshipGraph;

/// All moods, the affinity matrix and group-level state at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Indexed by [`CharacterId`]
    pub moods: Vec<MoodState>,
    pub relationships: RelationshipGraph,
    /// Indexed by [`CharacterId`]
    pub present: Vec<bool>,
    /// Group tension in [0, 1]
    pub tension: f32,
    /// Indexed by [`CharacterId`]
    pub controllers: Vec<Controller>,
    /// Event applied to reach this snapshot
    pub current_event: Option<EventView>,
}

impl Snapshot {
    /// Everyone present, at rest, script-controlled.
    pub fn initial(registry: &CharacterRegistry, emotion: &EmotionModel, relationships: RelationshipGraph) -> Self {
        let n = registry.len();
        Self {
            moods: vec![emotion.resting(); n],
            relationships,
            present: vec![true; n],
            tension: 0.0,
            controllers: vec![Controller::Script; n],
            current_event: None,
        }
    }

    /// Mood of a character of the cast this snapshot was built for.
    pub(crate) fn mood(&self, id: CharacterId) -> MoodState {
        self.moods[id.0]
    }

    pub fn is_present(&self, id: CharacterId) -> bool {
        self.present.get(id.0).copied().unwrap_or(false)
    }

    pub fn controller(&self, id: CharacterId) -> Controller {
        self.controllers.get(id.0).copied().unwrap_or_default()
    }

    pub fn affinity(&self, source: CharacterId, target: CharacterId) -> f32 {
        self.relationships.affinity(source, target)
    }

    /// Ids of characters currently present.
    pub fn present_ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter(|(_, here)| **here)
            .map(|(i, _)| CharacterId(i))
    }

    /// Renders the snapshot for presentation.
    pub fn frame(
        &self,
        day: u32,
        step: usize,
        step_count: usize,
        registry: &CharacterRegistry,
        taxonomy: &MoodTaxonomy,
    ) -> Frame {
        let moods = registry
            .iter()
            .map(|character| {
                let mood = self.mood(character.id);
                MoodView {
                    character: character.name.clone(),
                    mood: taxonomy.name(mood.tag).to_string(),
                    valence: taxonomy.valence(mood.tag).label().to_string(),
                    intensity: mood.intensity,
                }
            })
            .collect();

        Frame {
            day,
            step,
            step_count,
            characters: registry.names(),
            moods,
            affinity: self.relationships.rows(),
            tension: self.tension,
            tension_label: tension_label(self.tension).to_string(),
            present: self
                .present_ids()
                .map(|id| registry.name(id).to_string())
                .collect(),
            current_event: self.current_event.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelationshipConfig;

    #[test]
    fn test_initial_snapshot() {
        let registry = CharacterRegistry::standard();
        let emotion = EmotionModel::standard();
        let graph = RelationshipGraph::seeded(&registry, &RelationshipConfig::default());
        let snapshot = Snapshot::initial(&registry, &emotion, graph);

        assert_eq!(snapshot.moods.len(), registry.len());
        assert_eq!(snapshot.present_ids().count(), registry.len());
        assert_eq!(snapshot.tension, 0.0);
        assert!(snapshot
            .moods
            .iter()
            .all(|m| emotion.taxonomy().name(m.tag) == "neutral"));
    }

    #[test]
    fn test_frame_shape() {
        let registry = CharacterRegistry::standard();
        let emotion = EmotionModel::standard();
        let graph = RelationshipGraph::new(registry.len(), 1.0);
        let snapshot = Snapshot::initial(&registry, &emotion, graph);
        let frame = snapshot.frame(1, 0, 12, &registry, emotion.taxonomy());

        assert_eq!(frame.characters.len(), 9);
        assert_eq!(frame.affinity.len(), 9);
        assert!(frame.affinity.iter().all(|row| row.len() == 9));
        assert_eq!(frame.moods[0].valence, "neutral");
        assert_eq!(frame.tension_label, "relaxed");
        assert!(frame.current_event.is_none());
    }
}
