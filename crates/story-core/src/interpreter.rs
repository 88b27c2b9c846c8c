//! Event Interpreter
//!
//! Applies one compiled event to a snapshot and produces the next snapshot
//! plus a log entry. The previous snapshot is never touched, so a step is
//! all-or-nothing. The same event applied to the same snapshot always
//! yields the same result: offense rolls are seeded from the event's
//! position, not drawn from a shared generator.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use story_events::{Controller, Effect, StepLogEntry, StepOutcome};

use crate::config::{OffenseConfig, RelationshipConfig, StoryConfig, TensionConfig};
use crate::dynamics::{Condition, GroupDynamics};
use crate::emotion::{EmotionModel, MoodState, MoodTag, MoodTaxonomy, Valence};
use crate::error::SetupError;
use crate::event::{Event, EventPayload};
use crate::registry::{CharacterId, CharacterRegistry};
use crate::relationship::{RelationClass, RelationshipGraph, Thresholds};
use crate::snapshot::Snapshot;

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub snapshot: Snapshot,
    pub entry: StepLogEntry,
}

/// Pure transition function over snapshots.
#[derive(Debug, Clone)]
pub struct EventInterpreter {
    registry: CharacterRegistry,
    emotion: EmotionModel,
    relationship: RelationshipConfig,
    tension: TensionConfig,
    offense: OffenseConfig,
    friend_offense: Option<MoodTag>,
    thresholds: Thresholds,
    isolation_threshold: f32,
    seed: u64,
}

impl EventInterpreter {
    pub fn new(registry: CharacterRegistry, emotion: EmotionModel, config: &StoryConfig) -> Self {
        let friend_offense = emotion.taxonomy().parse(&config.offense.friend_mood).ok();
        Self {
            registry,
            emotion,
            relationship: config.relationship.clone(),
            tension: config.tension.clone(),
            offense: config.offense.clone(),
            friend_offense,
            thresholds: Thresholds::from_config(&config.relationship),
            isolation_threshold: config.dynamics.isolation_threshold,
            seed: config.schedule.seed,
        }
    }

    /// Builds the cast, the mood taxonomy and the emotion model from config.
    ///
    /// Uses the built-in roster when the config lists no characters.
    pub fn from_config(config: &StoryConfig) -> Result<Self, SetupError> {
        let registry = if config.characters.is_empty() {
            CharacterRegistry::standard()
        } else {
            CharacterRegistry::from_config(&config.characters)?
        };

        let mut taxonomy = MoodTaxonomy::standard();
        for mood in &config.moods {
            taxonomy.register(&mood.name, mood.valence)?;
        }
        let emotion = EmotionModel::new(taxonomy, config.emotion.clone())?;

        tracing::info!(
            "Engine ready: {} characters, {} moods, seed {}",
            registry.len(),
            emotion.taxonomy().len(),
            config.schedule.seed
        );
        Ok(Self::new(registry, emotion, config))
    }

    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    pub fn emotion(&self) -> &EmotionModel {
        &self.emotion
    }

    pub fn taxonomy(&self) -> &MoodTaxonomy {
        self.emotion.taxonomy()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// State before the first event of the first day.
    pub fn initial_snapshot(&self) -> Snapshot {
        let graph = RelationshipGraph::seeded(&self.registry, &self.relationship);
        Snapshot::initial(&self.registry, &self.emotion, graph)
    }

    /// Group views over a snapshot.
    pub fn dynamics<'a>(&'a self, snapshot: &'a Snapshot) -> GroupDynamics<'a> {
        GroupDynamics::new(
            &self.registry,
            self.emotion.taxonomy(),
            snapshot,
            self.thresholds,
            self.isolation_threshold,
        )
    }

    /// Start-of-day state derived from the previous day's final snapshot.
    ///
    /// Moods fade overnight, the room empties of tension, everyone shows up
    /// again and relationships carry over untouched.
    pub fn overnight(&self, terminal: &Snapshot, decay_steps: u32) -> Snapshot {
        Snapshot {
            moods: terminal
                .moods
                .iter()
                .map(|m| self.emotion.decay(*m, decay_steps))
                .collect(),
            relationships: terminal.relationships.clone(),
            present: vec![true; self.registry.len()],
            tension: 0.0,
            controllers: terminal.controllers.clone(),
            current_event: None,
        }
    }

    /// Applies `event` on top of `previous`.
    pub fn apply(&self, day: u32, previous: &Snapshot, event: &Event) -> Step {
        let view = event.view(&self.registry, self.emotion.taxonomy());
        let mut tx = Transition::new(self, previous);
        tx.next.current_event = Some(view.clone());

        let gated_off = event
            .requires
            .as_ref()
            .is_some_and(|c| !self.condition_holds(previous, c));

        let outcome = if gated_off {
            tracing::debug!("Day {} event {} skipped: precondition failed", day, event.index);
            StepOutcome::Skipped
        } else {
            self.dispatch(&mut tx, day, event);
            tx.decay_untouched();
            tx.close_tension(previous.tension);
            StepOutcome::Applied
        };

        Step {
            snapshot: tx.next,
            entry: StepLogEntry {
                day,
                step: event.index + 1,
                event: view,
                outcome,
                effects: tx.effects,
            },
        }
    }

    fn condition_holds(&self, snapshot: &Snapshot, condition: &Condition) -> bool {
        self.dynamics(snapshot).holds(condition)
    }

    fn dispatch(&self, tx: &mut Transition<'_>, day: u32, event: &Event) {
        match &event.payload {
            EventPayload::Dialogue { mood, addressed } => {
                self.apply_dialogue(tx, day, event, *mood, *addressed)
            }
            EventPayload::Action { moods, affinities } => {
                for (id, state) in moods {
                    tx.set_mood(*id, *state);
                }
                for (source, target, value) in affinities {
                    tx.set_affinity(*source, *target, *value);
                }
            }
            EventPayload::RelationshipDelta { delta } => {
                if let Some(speaker) = event.speaker {
                    for target in &event.addressees {
                        tx.adjust_affinity(speaker, *target, *delta);
                    }
                }
            }
            EventPayload::Meta => {}
            EventPayload::Enter => {
                if let Some(id) = event.speaker {
                    tx.set_presence(id, true);
                }
            }
            EventPayload::Leave => {
                if let Some(id) = event.speaker {
                    tx.set_presence(id, false);
                }
            }
            EventPayload::Offended => {
                if let Some(speaker) = event.speaker {
                    for offender in &event.addressees {
                        tx.offend(speaker, *offender);
                    }
                }
            }
            EventPayload::AssumeControl(controller) => {
                if let Some(id) = event.speaker {
                    tx.set_controller(id, *controller);
                }
            }
        }
    }

    /// Resilience softens what a character takes from a line.
    fn received_magnitude(&self, target: CharacterId, base: f32) -> f32 {
        let resilience = self
            .registry
            .get(target)
            .map_or(0.0, |c| c.resilience_ratio());
        base * (1.0 - resilience * self.emotion.config().resilience_damping)
    }

    fn apply_dialogue(
        &self,
        tx: &mut Transition<'_>,
        day: u32,
        event: &Event,
        mood: Option<MoodTag>,
        addressed: bool,
    ) {
        let Some(speaker) = event.speaker else {
            return;
        };
        if !tx.previous.is_present(speaker) {
            tracing::debug!(
                "Day {} event {}: {} is not present, line recorded only",
                day,
                event.index,
                self.registry.name(speaker)
            );
            return;
        }

        let expressed = match mood {
            Some(tag) => {
                tx.set_mood(speaker, self.emotion.express(tag));
                tag
            }
            None => {
                tx.touch(speaker);
                tx.previous.mood(speaker).tag
            }
        };
        let valence = self.emotion.taxonomy().valence(expressed);
        tx.add_tension(self.tension.impact(valence));

        let direct = self.emotion.config().direct_magnitude;

        // Aimed at someone, but nobody is left to hear it.
        if addressed && event.addressees.is_empty() {
            return;
        }

        if event.addressees.is_empty() {
            let ambient = direct * self.emotion.config().ambient_factor;
            let listeners: Vec<CharacterId> = tx
                .previous
                .present_ids()
                .filter(|id| *id != speaker)
                .collect();
            for listener in listeners {
                let stimulus = self
                    .emotion
                    .stimulus_for(expressed, self.received_magnitude(listener, ambient));
                let next = self.emotion.apply_stimulus(tx.previous.mood(listener), &stimulus);
                tx.set_mood(listener, next);
            }
            return;
        }

        let step = self.relationship.step_for(valence);
        for target in &event.addressees {
            let target = *target;
            if target == speaker || !tx.previous.is_present(target) {
                continue;
            }

            let stimulus = self
                .emotion
                .stimulus_for(expressed, self.received_magnitude(target, direct));
            let next = self.emotion.apply_stimulus(tx.previous.mood(target), &stimulus);
            tx.set_mood(target, next);

            if step != 0.0 {
                tx.adjust_affinity(speaker, target, step);
                tx.adjust_affinity(target, speaker, step * self.relationship.reciprocity);
            }

            if self.rolls_offense(day, event.index, tx.previous, speaker, target, expressed) {
                tx.offend(target, speaker);
            }
        }
    }

    /// Chance that `listener` takes offense at a line `speaker` delivers
    /// with mood `expressed`.
    pub fn offense_chance(
        &self,
        snapshot: &Snapshot,
        speaker: CharacterId,
        listener: CharacterId,
        expressed: MoodTag,
    ) -> f64 {
        let Some(character) = self.registry.get(listener) else {
            return 0.0;
        };
        if character.resilience > self.offense.resilience_cap {
            return 0.0;
        }
        let class = snapshot
            .relationships
            .classify(listener, speaker, &self.thresholds);
        let valence = self.emotion.taxonomy().valence(expressed);
        let chance = match (class, valence) {
            (RelationClass::Rival, Valence::Negative | Valence::Complex) => self.offense.rival_chance,
            (RelationClass::Friend, _) if self.friend_offense == Some(expressed) => {
                self.offense.friend_chance
            }
            (_, Valence::Negative) => self.offense.base_chance,
            _ => 0.0,
        };
        chance.clamp(0.0, 1.0)
    }

    fn rolls_offense(
        &self,
        day: u32,
        index: usize,
        snapshot: &Snapshot,
        speaker: CharacterId,
        listener: CharacterId,
        expressed: MoodTag,
    ) -> bool {
        let chance = self.offense_chance(snapshot, speaker, listener, expressed);
        if chance <= 0.0 {
            return false;
        }
        let mut rng = SmallRng::seed_from_u64(roll_seed(self.seed, day, index, listener));
        rng.gen::<f64>() < chance
    }
}

/// Seed for one offense roll, fixed by the roll's position in the story.
fn roll_seed(seed: u64, day: u32, index: usize, listener: CharacterId) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (u64::from(day) << 40)
        ^ ((index as u64) << 16)
        ^ listener.0 as u64
}

/// Working state of one step.
struct Transition<'a> {
    interpreter: &'a EventInterpreter,
    previous: &'a Snapshot,
    next: Snapshot,
    effects: Vec<Effect>,
    touched: Vec<bool>,
}

impl<'a> Transition<'a> {
    fn new(interpreter: &'a EventInterpreter, previous: &'a Snapshot) -> Self {
        Self {
            interpreter,
            previous,
            next: previous.clone(),
            effects: Vec::new(),
            touched: vec![false; previous.moods.len()],
        }
    }

    fn name(&self, id: CharacterId) -> String {
        self.interpreter.registry.name(id).to_string()
    }

    fn mood_name(&self, tag: MoodTag) -> String {
        self.interpreter.taxonomy().name(tag).to_string()
    }

    fn touch(&mut self, id: CharacterId) {
        if let Some(flag) = self.touched.get_mut(id.0) {
            *flag = true;
        }
    }

    fn set_mood(&mut self, id: CharacterId, state: MoodState) {
        self.touch(id);
        let current = self.next.moods[id.0];
        if current == state {
            return;
        }
        self.next.moods[id.0] = state;
        self.effects.push(Effect::MoodChanged {
            character: self.name(id),
            from: self.mood_name(current.tag),
            to: self.mood_name(state.tag),
            intensity: state.intensity,
        });
    }

    fn record_affinity(&mut self, source: CharacterId, target: CharacterId, from: f32, to: f32) {
        if from != to {
            self.effects.push(Effect::AffinityChanged {
                source: self.name(source),
                target: self.name(target),
                from,
                to,
            });
        }
    }

    fn adjust_affinity(&mut self, source: CharacterId, target: CharacterId, delta: f32) {
        let from = self.next.relationships.affinity(source, target);
        let to = self.next.relationships.adjust(source, target, delta);
        self.record_affinity(source, target, from, to);
    }

    fn set_affinity(&mut self, source: CharacterId, target: CharacterId, value: f32) {
        let from = self.next.relationships.affinity(source, target);
        let to = self.next.relationships.set(source, target, value);
        self.record_affinity(source, target, from, to);
    }

    fn add_tension(&mut self, amount: f32) {
        self.next.tension = (self.next.tension + amount).clamp(0.0, 1.0);
    }

    /// `character` takes offense at `offender`.
    fn offend(&mut self, character: CharacterId, offender: CharacterId) {
        let offense = &self.interpreter.offense;
        let (delta, tension) = (offense.affinity_delta, offense.tension);
        self.adjust_affinity(character, offender, delta);
        self.add_tension(tension);
        self.effects.push(Effect::Offended {
            character: self.name(character),
            by: self.name(offender),
        });
    }

    fn set_presence(&mut self, id: CharacterId, present: bool) {
        if self.next.present[id.0] == present {
            return;
        }
        self.next.present[id.0] = present;
        let character = self.name(id);
        self.effects.push(if present {
            Effect::Entered { character }
        } else {
            Effect::Left { character }
        });
    }

    fn set_controller(&mut self, id: CharacterId, controller: Controller) {
        if self.next.controllers[id.0] == controller {
            return;
        }
        self.next.controllers[id.0] = controller;
        self.effects.push(Effect::ControlChanged {
            character: self.name(id),
            controller,
        });
    }

    /// Characters that received no stimulus this step fade by one step.
    fn decay_untouched(&mut self) {
        for i in 0..self.touched.len() {
            if self.touched[i] {
                continue;
            }
            let current = self.next.moods[i];
            let faded = self.interpreter.emotion.decay(current, 1);
            if faded.tag != current.tag {
                self.effects.push(Effect::MoodChanged {
                    character: self.name(CharacterId(i)),
                    from: self.mood_name(current.tag),
                    to: self.mood_name(faded.tag),
                    intensity: faded.intensity,
                });
            }
            self.next.moods[i] = faded;
        }
    }

    fn close_tension(&mut self, before: f32) {
        if self.next.tension != before {
            self.effects.push(Effect::TensionChanged {
                from: before,
                to: self.next.tension,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DialogueOverride;
    use story_events::{EventRecord, RecordKind};

    fn interpreter() -> EventInterpreter {
        EventInterpreter::from_config(&StoryConfig::default()).unwrap()
    }

    fn compile(interp: &EventInterpreter, record: EventRecord) -> Event {
        Event::compile(0, &record, interp.registry(), interp.taxonomy()).unwrap()
    }

    fn id(interp: &EventInterpreter, name: &str) -> CharacterId {
        interp.registry().resolve(name).unwrap()
    }

    fn tag(interp: &EventInterpreter, name: &str) -> MoodTag {
        interp.taxonomy().parse(name).unwrap()
    }

    #[test]
    fn test_praise_raises_affinity_and_mood() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let event = compile(
            &interp,
            EventRecord::dialogue("Theseus", "Well done").to("Ariadne").with_mood("admiration"),
        );
        let step = interp.apply(1, &start, &event);
        let (theseus, ariadne) = (id(&interp, "Theseus"), id(&interp, "Ariadne"));

        assert_eq!(step.entry.outcome, StepOutcome::Applied);
        assert!(step.snapshot.affinity(theseus, ariadne) > start.affinity(theseus, ariadne));
        assert!(step.snapshot.affinity(ariadne, theseus) > 0.0);
        let mood = step.snapshot.mood(ariadne);
        assert_eq!(interp.taxonomy().valence(mood.tag), Valence::Positive);
        assert!(mood.intensity > 0.0);
        assert_eq!(step.snapshot.mood(theseus).tag, tag(&interp, "admiration"));
        // Positive lines ease tension; it never drops below zero.
        assert_eq!(step.snapshot.tension, 0.0);
    }

    #[test]
    fn test_apply_leaves_previous_untouched() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let copy = start.clone();
        let event = compile(&interp, EventRecord::dialogue("Nutscracker", "Fool").to("Organizm(-:").with_mood("angry"));
        let _ = interp.apply(1, &start, &event);
        assert_eq!(start, copy);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let event = compile(
            &interp,
            EventRecord::dialogue("Nutscracker", "Fool").to_many(["Organizm(-:", "Romeo", "UGLI 666"]).with_mood("angry"),
        );
        let a = interp.apply(2, &start, &event);
        let b = interp.apply(2, &start, &event);
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_line_raises_tension() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let event = compile(&interp, EventRecord::dialogue("Theseus", "Go away").to("Monstradamus").with_mood("irritated"));
        let step = interp.apply(1, &start, &event);
        // Monstradamus is too resilient to take offense.
        assert!((step.snapshot.tension - 0.02).abs() < 1e-6);
        assert!(step
            .entry
            .effects
            .iter()
            .any(|e| matches!(e, Effect::TensionChanged { .. })));
    }

    #[test]
    fn test_unaddressed_line_reaches_the_room_without_affinity() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let event = compile(&interp, EventRecord::dialogue("Monstradamus", "Hear me").with_mood("solemn"));
        let step = interp.apply(1, &start, &event);
        assert_eq!(step.snapshot.relationships, start.relationships);
        let romeo = id(&interp, "Romeo");
        assert_eq!(step.snapshot.mood(romeo).tag, tag(&interp, "solemn"));
    }

    #[test]
    fn test_listed_addressees_alone_are_stimulated() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let theseus = id(&interp, "Theseus");
        let listed = [id(&interp, "Organizm(-:"), id(&interp, "Romeo")];

        let addressed = compile(
            &interp,
            EventRecord::dialogue("Theseus", "Glad you're both here").to_many(["Organizm(-:", "Romeo"]).with_mood("friendly"),
        );
        let step = interp.apply(1, &start, &addressed);

        for target in listed {
            assert_ne!(step.snapshot.mood(target), start.mood(target));
        }
        for other in interp.registry().ids() {
            if other == theseus || listed.contains(&other) {
                continue;
            }
            assert_eq!(
                step.snapshot.mood(other),
                interp.emotion().decay(start.mood(other), 1),
                "{} was not addressed",
                interp.registry().name(other)
            );
        }

        // The same line to the whole room lands softer.
        let ambient = compile(&interp, EventRecord::dialogue("Theseus", "Glad you're all here").with_mood("friendly"));
        let room = interp.apply(1, &start, &ambient);
        let romeo = listed[1];
        assert!(room.snapshot.mood(romeo).intensity > 0.0);
        assert!(room.snapshot.mood(romeo).intensity < step.snapshot.mood(romeo).intensity);
    }

    #[test]
    fn test_addressed_line_with_no_addressees_left_reaches_nobody() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let sartrik = id(&interp, "Sartrik");
        let event = compile(&interp, EventRecord::dialogue("Sartrik", "").to("UGLI 666").with_mood("sarcastic"));
        let emptied = event
            .with_override(
                &DialogueOverride::text("Never mind.").with_addressees(Vec::<String>::new()),
                interp.registry(),
                interp.taxonomy(),
            )
            .unwrap();

        let step = interp.apply(1, &start, &emptied);
        assert_eq!(step.snapshot.mood(sartrik).tag, tag(&interp, "sarcastic"));
        for other in interp.registry().ids().filter(|id| *id != sartrik) {
            assert_eq!(step.snapshot.mood(other), start.mood(other));
        }
        assert_eq!(step.snapshot.relationships, start.relationships);
    }

    #[test]
    fn test_absent_speaker_only_records() {
        let interp = interpreter();
        let mut start = interp.initial_snapshot();
        let romeo = id(&interp, "Romeo");
        start.present[romeo.0] = false;
        let event = compile(&interp, EventRecord::dialogue("Romeo", "Hello?").to("Ariadne").with_mood("angry"));
        let step = interp.apply(1, &start, &event);
        assert_eq!(step.snapshot.moods, start.moods);
        assert_eq!(step.snapshot.relationships, start.relationships);
        assert!(step.snapshot.current_event.is_some());
    }

    #[test]
    fn test_absent_addressee_skipped() {
        let interp = interpreter();
        let mut start = interp.initial_snapshot();
        let (theseus, romeo) = (id(&interp, "Theseus"), id(&interp, "Romeo"));
        start.present[romeo.0] = false;
        let event = compile(&interp, EventRecord::dialogue("Theseus", "Welcome").to("Romeo").with_mood("friendly"));
        let step = interp.apply(1, &start, &event);
        assert_eq!(step.snapshot.affinity(theseus, romeo), 0.0);
        assert_eq!(step.snapshot.mood(romeo), start.mood(romeo));
    }

    #[test]
    fn test_action_sets_exact_values() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let event = compile(
            &interp,
            EventRecord::action("Monstradamus", "calms the room")
                .with_mood_override("UGLI666", "calm", 0.6)
                .with_affinity("Sartrik", 0.5),
        );
        let step = interp.apply(1, &start, &event);
        let ugli = id(&interp, "UGLI 666");
        assert_eq!(step.snapshot.mood(ugli), MoodState::new(tag(&interp, "calm"), 0.6));
        assert_eq!(
            step.snapshot.affinity(id(&interp, "Monstradamus"), id(&interp, "Sartrik")),
            0.5
        );
    }

    #[test]
    fn test_presence_and_control() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let romeo = id(&interp, "Romeo");

        let leave = compile(&interp, EventRecord::of_kind(RecordKind::Leave, "Romeo"));
        let gone = interp.apply(1, &start, &leave).snapshot;
        assert!(!gone.is_present(romeo));

        let enter = compile(&interp, EventRecord::of_kind(RecordKind::Enter, "Romeo"));
        assert!(interp.apply(1, &gone, &enter).snapshot.is_present(romeo));

        let control = compile(&interp, EventRecord::of_kind(RecordKind::AiAssumeControl, "Romeo"));
        let step = interp.apply(1, &start, &control);
        assert_eq!(step.snapshot.controller(romeo), Controller::Ai);
        assert!(matches!(step.entry.effects[0], Effect::ControlChanged { .. }));
    }

    #[test]
    fn test_offended_event() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let event = compile(&interp, EventRecord::of_kind(RecordKind::Offended, "UGLI 666").to("Romeo"));
        let step = interp.apply(1, &start, &event);
        let (ugli, romeo) = (id(&interp, "UGLI 666"), id(&interp, "Romeo"));
        assert!((step.snapshot.affinity(ugli, romeo) + 0.25).abs() < 1e-6);
        assert!((step.snapshot.tension - 0.015).abs() < 1e-6);
    }

    #[test]
    fn test_failed_precondition_skips() {
        let interp = interpreter();
        let start = interp.initial_snapshot();
        let event = compile(
            &interp,
            EventRecord::dialogue("Theseus", "Old friend!")
                .to("Ariadne")
                .with_mood("friendly")
                .requiring(story_events::ConditionKind::Friends, &["Theseus", "Ariadne"]),
        );
        let step = interp.apply(1, &start, &event);
        assert_eq!(step.entry.outcome, StepOutcome::Skipped);
        assert!(step.entry.effects.is_empty());
        assert_eq!(step.snapshot.moods, start.moods);
        assert_eq!(step.snapshot.relationships, start.relationships);
    }

    #[test]
    fn test_unstimulated_characters_decay() {
        let interp = interpreter();
        let mut start = interp.initial_snapshot();
        let romeo = id(&interp, "Romeo");
        start.moods[romeo.0] = MoodState::new(tag(&interp, "angry"), 0.5);
        let step = interp.apply(1, &start, &compile(&interp, EventRecord::meta("Noon")));
        assert_eq!(step.snapshot.mood(romeo).tag, tag(&interp, "angry"));
        assert!(step.snapshot.mood(romeo).intensity < 0.5);
    }

    #[test]
    fn test_offense_chance_policy() {
        let interp = interpreter();
        let mut snapshot = interp.initial_snapshot();
        let (nuts, org, monst) = (id(&interp, "Nutscracker"), id(&interp, "Organizm(-:"), id(&interp, "Monstradamus"));

        let (angry, irritated) = (tag(&interp, "angry"), tag(&interp, "irritated"));

        assert_eq!(interp.offense_chance(&snapshot, nuts, monst, angry), 0.0);
        assert_eq!(interp.offense_chance(&snapshot, nuts, org, irritated), 0.5);
        assert_eq!(interp.offense_chance(&snapshot, nuts, org, tag(&interp, "friendly")), 0.0);

        snapshot.relationships.set(org, nuts, -0.5);
        assert_eq!(interp.offense_chance(&snapshot, nuts, org, tag(&interp, "sarcastic")), 0.7);

        // From a friend only anger gives a friend's chance; other negative
        // lines fall back to the general one.
        snapshot.relationships.set(org, nuts, 0.5);
        assert_eq!(interp.offense_chance(&snapshot, nuts, org, angry), 0.3);
        assert_eq!(interp.offense_chance(&snapshot, nuts, org, irritated), 0.5);
        assert_eq!(interp.offense_chance(&snapshot, nuts, org, tag(&interp, "sarcastic")), 0.0);
    }

    #[test]
    fn test_overnight_baseline() {
        let interp = interpreter();
        let mut terminal = interp.initial_snapshot();
        let romeo = id(&interp, "Romeo");
        terminal.present[romeo.0] = false;
        terminal.tension = 0.3;
        terminal.moods[romeo.0] = MoodState::new(tag(&interp, "angry"), 0.9);
        terminal.relationships.set(romeo, CharacterId(0), 0.4);

        let morning = interp.overnight(&terminal, 5);
        assert!(morning.is_present(romeo));
        assert_eq!(morning.tension, 0.0);
        assert!(morning.mood(romeo).intensity < 0.9);
        assert_eq!(morning.relationships, terminal.relationships);
        assert!(morning.current_event.is_none());
    }
}
