//! Storyline engine: characters, moods, relationships and the day-by-day
//! scheduler that steps a scripted story forward and back.

pub mod config;
pub mod dialogue;
pub mod dynamics;
pub mod emotion;
pub mod error;
pub mod event;
pub mod interpreter;
pub mod logger;
pub mod registry;
pub mod relationship;
pub mod scheduler;
pub mod snapshot;

pub use config::{ConfigError, StoryConfig, DEFAULT_TUNING_PATH};
pub use dialogue::{
    AdapterError, ChoiceSelector, Choice, DialogueDriver, DialogueGenerator, DialogueRequest,
    DriveError, DriveOutcome, FirstChoice, OfflineGenerator,
};
pub use dynamics::{tension_label, Condition, GroupDynamics, GroupReport};
pub use emotion::{EmotionModel, MoodState, MoodTag, MoodTaxonomy, Stimulus, Valence};
pub use error::{
    DayLoadError, EventError, MoodError, NavigationError, ResolveError, SchedulerError,
    SetupError, SourceError,
};
pub use event::{Day, DialogueOverride, Event, EventPayload};
pub use interpreter::{EventInterpreter, Step};
pub use logger::StepLogger;
pub use registry::{Character, CharacterId, CharacterRegistry};
pub use relationship::{RelationClass, RelationshipGraph, Thresholds};
pub use scheduler::{parse_day_range, DayScheduler, DaySource, DirectorySource, MemorySource};
pub use snapshot::Snapshot;
