//! Group Dynamics
//!
//! Read-only derived views over a snapshot: who is close to whom, who is on
//! the outside, and how tense the room feels. Nothing here mutates state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use story_events::ConditionKind;

use crate::emotion::{MoodTag, MoodTaxonomy};
use crate::registry::{CharacterId, CharacterRegistry};
use crate::relationship::{RelationClass, Thresholds};
use crate::snapshot::Snapshot;

/// Human-readable band for a tension value.
pub fn tension_label(tension: f32) -> &'static str {
    if tension < 0.02 {
        "relaxed"
    } else if tension < 0.04 {
        "slightly tense"
    } else if tension < 0.06 {
        "moderately tense"
    } else if tension < 0.08 {
        "very tense"
    } else {
        "extremely tense"
    }
}

/// A predicate over group state, used to gate scripted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Friends(CharacterId, CharacterId),
    Rivals(CharacterId, CharacterId),
    Isolated(CharacterId),
    Present(CharacterId),
}

impl Condition {
    /// Builds a condition from resolved ids, or `None` when their count
    /// does not match the kind's arity.
    pub fn from_kind(kind: ConditionKind, ids: &[CharacterId]) -> Option<Self> {
        match (kind, ids) {
            (ConditionKind::Friends, [a, b]) => Some(Condition::Friends(*a, *b)),
            (ConditionKind::Rivals, [a, b]) => Some(Condition::Rivals(*a, *b)),
            (ConditionKind::Isolated, [a]) => Some(Condition::Isolated(*a)),
            (ConditionKind::Present, [a]) => Some(Condition::Present(*a)),
            _ => None,
        }
    }
}

/// Named summary of a snapshot's group structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub friendships: Vec<(String, String)>,
    pub rivalries: Vec<(String, String)>,
    pub isolated: Vec<String>,
    pub clusters: Vec<Vec<String>>,
    pub dominant_mood: Option<String>,
    pub tension: f32,
    pub tension_label: String,
}

/// Derived views over one snapshot.
pub struct GroupDynamics<'a> {
    registry: &'a CharacterRegistry,
    taxonomy: &'a MoodTaxonomy,
    snapshot: &'a Snapshot,
    thresholds: Thresholds,
    isolation_threshold: f32,
}

impl<'a> GroupDynamics<'a> {
    pub fn new(
        registry: &'a CharacterRegistry,
        taxonomy: &'a MoodTaxonomy,
        snapshot: &'a Snapshot,
        thresholds: Thresholds,
        isolation_threshold: f32,
    ) -> Self {
        Self {
            registry,
            taxonomy,
            snapshot,
            thresholds,
            isolation_threshold,
        }
    }

    fn class(&self, source: CharacterId, target: CharacterId) -> RelationClass {
        self.snapshot
            .relationships
            .classify(source, target, &self.thresholds)
    }

    /// Both directions at or above the friend threshold.
    pub fn are_friends(&self, a: CharacterId, b: CharacterId) -> bool {
        a != b
            && self.class(a, b) == RelationClass::Friend
            && self.class(b, a) == RelationClass::Friend
    }

    /// Either direction at or below the rival threshold.
    pub fn are_rivals(&self, a: CharacterId, b: CharacterId) -> bool {
        a != b
            && (self.class(a, b) == RelationClass::Rival || self.class(b, a) == RelationClass::Rival)
    }

    fn pairs(&self) -> impl Iterator<Item = (CharacterId, CharacterId)> + '_ {
        let n = self.registry.len();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (CharacterId(i), CharacterId(j))))
    }

    /// Mutual friendships, each pair once with the lower id first.
    pub fn friendships(&self) -> Vec<(CharacterId, CharacterId)> {
        self.pairs().filter(|(a, b)| self.are_friends(*a, *b)).collect()
    }

    /// Rivalries, each pair once with the lower id first.
    pub fn rivalries(&self) -> Vec<(CharacterId, CharacterId)> {
        self.pairs().filter(|(a, b)| self.are_rivals(*a, *b)).collect()
    }

    /// Whether a present character has no friend in the room and a low
    /// standing with the group.
    pub fn is_isolated(&self, id: CharacterId) -> bool {
        if !self.snapshot.is_present(id) {
            return false;
        }
        let has_friend = self.snapshot.present_ids().any(|other| {
            other != id
                && (self.class(id, other) == RelationClass::Friend
                    || self.class(other, id) == RelationClass::Friend)
        });
        if has_friend {
            return false;
        }
        let others: Vec<CharacterId> = self.snapshot.present_ids().filter(|o| *o != id).collect();
        if others.is_empty() {
            return true;
        }
        let sum: f32 = others
            .iter()
            .map(|o| self.snapshot.affinity(*o, id))
            .sum();
        sum / (others.len() as f32) < self.isolation_threshold
    }

    pub fn isolated(&self) -> Vec<CharacterId> {
        self.snapshot
            .present_ids()
            .filter(|id| self.is_isolated(*id))
            .collect()
    }

    /// Connected groups of mutual friends with at least two members.
    pub fn clusters(&self) -> Vec<Vec<CharacterId>> {
        let n = self.registry.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for (a, b) in self.friendships() {
            let ra = find(&mut parent, a.0);
            let rb = find(&mut parent, b.0);
            if ra != rb {
                parent[ra.max(rb)] = ra.min(rb);
            }
        }

        let mut groups: BTreeMap<usize, Vec<CharacterId>> = BTreeMap::new();
        for i in 0..n {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(CharacterId(i));
        }
        groups.into_values().filter(|g| g.len() >= 2).collect()
    }

    /// Most common mood among present characters; ties go to the lowest tag.
    pub fn dominant_mood(&self) -> Option<MoodTag> {
        let mut counts: BTreeMap<MoodTag, usize> = BTreeMap::new();
        for id in self.snapshot.present_ids() {
            *counts.entry(self.snapshot.mood(id).tag).or_default() += 1;
        }
        let best = counts.values().copied().max()?;
        counts
            .into_iter()
            .find(|(_, count)| *count == best)
            .map(|(tag, _)| tag)
    }

    pub fn tension_label(&self) -> &'static str {
        tension_label(self.snapshot.tension)
    }

    /// Evaluates a gating condition.
    pub fn holds(&self, condition: &Condition) -> bool {
        match *condition {
            Condition::Friends(a, b) => self.are_friends(a, b),
            Condition::Rivals(a, b) => self.are_rivals(a, b),
            Condition::Isolated(a) => self.is_isolated(a),
            Condition::Present(a) => self.snapshot.is_present(a),
        }
    }

    pub fn report(&self) -> GroupReport {
        let name = |id: CharacterId| self.registry.name(id).to_string();
        let pair = |(a, b): (CharacterId, CharacterId)| (name(a), name(b));
        GroupReport {
            friendships: self.friendships().into_iter().map(pair).collect(),
            rivalries: self.rivalries().into_iter().map(pair).collect(),
            isolated: self.isolated().into_iter().map(name).collect(),
            clusters: self
                .clusters()
                .into_iter()
                .map(|group| group.into_iter().map(name).collect())
                .collect(),
            dominant_mood: self
                .dominant_mood()
                .map(|tag| self.taxonomy.name(tag).to_string()),
            tension: self.snapshot.tension,
            tension_label: self.tension_label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{EmotionModel, MoodState};
    use crate::relationship::RelationshipGraph;

    struct Fixture {
        registry: CharacterRegistry,
        emotion: EmotionModel,
        snapshot: Snapshot,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = CharacterRegistry::standard();
            let emotion = EmotionModel::standard();
            let graph = RelationshipGraph::new(registry.len(), 1.0);
            let snapshot = Snapshot::initial(&registry, &emotion, graph);
            Self {
                registry,
                emotion,
                snapshot,
            }
        }

        fn id(&self, name: &str) -> CharacterId {
            self.registry.resolve(name).unwrap()
        }

        fn dynamics(&self) -> GroupDynamics<'_> {
            GroupDynamics::new(
                &self.registry,
                self.emotion.taxonomy(),
                &self.snapshot,
                Thresholds::default(),
                0.0,
            )
        }
    }

    #[test]
    fn test_tension_labels() {
        assert_eq!(tension_label(0.0), "relaxed");
        assert_eq!(tension_label(0.03), "slightly tense");
        assert_eq!(tension_label(0.05), "moderately tense");
        assert_eq!(tension_label(0.07), "very tense");
        assert_eq!(tension_label(0.5), "extremely tense");
    }

    #[test]
    fn test_condition_arity() {
        let (a, b) = (CharacterId(0), CharacterId(1));
        assert_eq!(
            Condition::from_kind(ConditionKind::Friends, &[a, b]),
            Some(Condition::Friends(a, b))
        );
        assert_eq!(Condition::from_kind(ConditionKind::Present, &[b]), Some(Condition::Present(b)));
        assert_eq!(Condition::from_kind(ConditionKind::Rivals, &[a]), None);
        assert_eq!(Condition::from_kind(ConditionKind::Isolated, &[]), None);
        assert_eq!(Condition::from_kind(ConditionKind::Isolated, &[a, b]), None);
    }

    #[test]
    fn test_friendship_needs_both_directions() {
        let mut f = Fixture::new();
        let (a, b) = (f.id("Theseus"), f.id("Ariadne"));
        f.snapshot.relationships.set(a, b, 0.5);
        assert!(!f.dynamics().are_friends(a, b));
        f.snapshot.relationships.set(b, a, 0.4);
        assert!(f.dynamics().are_friends(a, b));
        assert_eq!(f.dynamics().friendships(), vec![(a.min(b), a.max(b))]);
    }

    #[test]
    fn test_rivalry_needs_one_direction() {
        let mut f = Fixture::new();
        let (a, b) = (f.id("Nutscracker"), f.id("Organizm(-:"));
        f.snapshot.relationships.set(a, b, -0.4);
        assert!(f.dynamics().are_rivals(a, b));
        assert!(f.dynamics().holds(&Condition::Rivals(b, a)));
        assert_eq!(f.dynamics().rivalries().len(), 1);
    }

    #[test]
    fn test_clusters_are_connected_components() {
        let mut f = Fixture::new();
        let (a, b, c) = (f.id("Theseus"), f.id("Ariadne"), f.id("IsoldA"));
        for (x, y) in [(a, b), (b, c)] {
            f.snapshot.relationships.set(x, y, 0.6);
            f.snapshot.relationships.set(y, x, 0.6);
        }
        let clusters = f.dynamics().clusters();
        assert_eq!(clusters.len(), 1);
        let mut expected = vec![a, b, c];
        expected.sort();
        assert_eq!(clusters[0], expected);
    }

    #[test]
    fn test_isolation() {
        let mut f = Fixture::new();
        let romeo = f.id("Romeo");
        // Neutral standing is not isolation.
        assert!(!f.dynamics().is_isolated(romeo));

        for other in f.registry.ids().filter(|o| *o != romeo).collect::<Vec<_>>() {
            f.snapshot.relationships.set(other, romeo, -0.2);
        }
        assert!(f.dynamics().is_isolated(romeo));
        assert_eq!(f.dynamics().isolated(), vec![romeo]);

        // A single friend in the room breaks isolation.
        let ariadne = f.id("Ariadne");
        f.snapshot.relationships.set(romeo, ariadne, 0.5);
        assert!(!f.dynamics().is_isolated(romeo));

        // Absent characters are never isolated.
        f.snapshot.present[romeo.0] = false;
        assert!(!f.dynamics().holds(&Condition::Isolated(romeo)));
        assert!(!f.dynamics().holds(&Condition::Present(romeo)));
    }

    #[test]
    fn test_dominant_mood() {
        let mut f = Fixture::new();
        let angry = f.emotion.taxonomy().parse("angry").unwrap();
        assert_eq!(
            f.dynamics().dominant_mood(),
            Some(f.emotion.resting().tag)
        );
        for name in ["Theseus", "Ariadne", "IsoldA", "Romeo", "Sartrik"] {
            let id = f.id(name);
            f.snapshot.moods[id.0] = MoodState::new(angry, 0.5);
        }
        assert_eq!(f.dynamics().dominant_mood(), Some(angry));

        f.snapshot.present = vec![false; f.registry.len()];
        assert_eq!(f.dynamics().dominant_mood(), None);
    }

    #[test]
    fn test_report_uses_names() {
        let mut f = Fixture::new();
        let (a, b) = (f.id("Theseus"), f.id("Ariadne"));
        f.snapshot.relationships.set(a, b, 0.5);
        f.snapshot.relationships.set(b, a, 0.5);
        f.snapshot.tension = 0.05;
        let report = f.dynamics().report();
        assert_eq!(report.friendships, vec![("Theseus".to_string(), "Ariadne".to_string())]);
        assert_eq!(report.clusters, vec![vec!["Theseus".to_string(), "Ariadne".to_string()]]);
        assert_eq!(report.tension_label, "moderately tense");
        assert_eq!(report.dominant_mood.as_deref(), Some("neutral"));
    }
}
