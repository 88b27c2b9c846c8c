//! Character Registry
//!
//! The fixed cast, their attributes, and the alias table used to resolve
//! the many spellings a script may use for the same character.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::CharacterConfig;
use crate::error::ResolveError;

/// Dense index of a character in roster order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub usize);

impl CharacterId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "char_{:02}", self.0)
    }
}

/// A member of the cast. Attributes never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub leadership: u8,
    pub intelligence: u8,
    pub resilience: u8,
    pub aliases: Vec<String>,
    /// Characters this one starts out liking
    pub friends: Vec<CharacterId>,
    /// Characters this one starts out disliking
    pub enemies: Vec<CharacterId>,
    /// Only talks to characters whose intelligence exceeds this
    pub min_partner_intelligence: Option<u8>,
}

impl Character {
    /// Resilience as a fraction in [0, 1].
    pub fn resilience_ratio(&self) -> f32 {
        f32::from(self.resilience.min(100)) / 100.0
    }
}

/// Canonical cast with precomputed name lookup.
#[derive(Debug, Clone)]
pub struct CharacterRegistry {
    characters: Vec<Character>,
    lookup: HashMap<String, CharacterId>,
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl CharacterRegistry {
    /// Builds the registry from roster entries.
    ///
    /// Fails when two entries or aliases normalize to the same key for
    /// different characters, or when a friend/enemy name does not resolve.
    pub fn from_config(entries: &[CharacterConfig]) -> Result<Self, ResolveError> {
        let mut characters = Vec::with_capacity(entries.len());
        let mut lookup: HashMap<String, CharacterId> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            let id = CharacterId(index);
            let names = std::iter::once(&entry.name).chain(entry.aliases.iter());
            for name in names {
                let key = normalize(name);
                match lookup.get(&key) {
                    Some(existing) if *existing != id => {
                        return Err(ResolveError::DuplicateName {
                            name: name.clone(),
                            first: entries[existing.0].name.clone(),
                            second: entry.name.clone(),
                        });
                    }
                    _ => {
                        lookup.insert(key, id);
                    }
                }
            }

            characters.push(Character {
                id,
                name: entry.name.trim().to_string(),
                leadership: entry.leadership,
                intelligence: entry.intelligence,
                resilience: entry.resilience,
                aliases: entry.aliases.clone(),
                friends: Vec::new(),
                enemies: Vec::new(),
                min_partner_intelligence: entry.min_partner_intelligence,
            });
        }

        let mut registry = Self { characters, lookup };

        // Ties can reference later roster entries, so resolve them last.
        for (index, entry) in entries.iter().enumerate() {
            let friends = entry
                .friends
                .iter()
                .map(|n| registry.resolve(n))
                .collect::<Result<Vec<_>, _>>()?;
            let enemies = entry
                .enemies
                .iter()
                .map(|n| registry.resolve(n))
                .collect::<Result<Vec<_>, _>>()?;
            registry.characters[index].friends = friends;
            registry.characters[index].enemies = enemies;
        }

        Ok(registry)
    }

    /// The built-in cast.
    pub fn standard() -> Self {
        Self::from_config(&default_roster()).expect("built-in roster has no name collisions")
    }

    /// Resolves any accepted spelling to a canonical identity.
    pub fn resolve(&self, name: &str) -> Result<CharacterId, ResolveError> {
        self.lookup
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| ResolveError::UnknownCharacter(name.to_string()))
    }

    /// Resolves a spelling straight to its canonical name.
    pub fn canonical_name(&self, name: &str) -> Result<&str, ResolveError> {
        self.resolve(name).map(|id| self.name(id))
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(id.0)
    }

    /// Canonical name of a character; ids always come from this registry.
    pub fn name(&self, id: CharacterId) -> &str {
        &self.characters[id.0].name
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.characters.iter().map(|c| c.id)
    }

    pub fn names(&self) -> Vec<String> {
        self.characters.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Whether `speaker` is willing to address `listener`.
    pub fn can_talk_to(&self, speaker: CharacterId, listener: CharacterId) -> bool {
        match (self.get(speaker), self.get(listener)) {
            (Some(s), Some(l)) => s
                .min_partner_intelligence
                .map_or(true, |min| l.intelligence > min),
            _ => false,
        }
    }
}

fn entry(name: &str, leadership: u8, intelligence: u8, resilience: u8, aliases: &[&str]) -> CharacterConfig {
    CharacterConfig {
        name: name.to_string(),
        leadership,
        intelligence,
        resilience,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        friends: Vec::new(),
        enemies: Vec::new(),
        min_partner_intelligence: None,
    }
}

/// Roster used when configuration provides none.
pub fn default_roster() -> Vec<CharacterConfig> {
    let mut sartrik = entry("Sartrik", 50, 95, 55, &[]);
    sartrik.min_partner_intelligence = Some(80);

    vec![
        entry("Monstradamus", 85, 95, 75, &[]),
        entry("IsoldA", 60, 75, 65, &["Isolda"]),
        entry("Nutscracker", 70, 90, 55, &["Nut$cracker"]),
        entry("Organizm(-:", 40, 65, 45, &["Organizm)-", "Organizm(-", "Organizm)-:"]),
        entry("Theseus", 80, 70, 75, &["TheZeus"]),
        entry("Ariadne", 65, 85, 65, &[]),
        entry("UGLI 666", 55, 60, 45, &["UGLI666"]),
        entry("Romeo-y-Cohiba", 55, 65, 35, &["Romeo"]),
        sartrik,
    ]
}
