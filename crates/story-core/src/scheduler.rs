//! Day Scheduler
//!
//! Owns the story timeline. Days load from a [`DaySource`], compile up
//! front, and are then stepped through one event at a time. Every reached
//! snapshot is kept, so stepping back restores the exact earlier state
//! instead of trying to invert an event.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use story_events::{
    day_file_name, parse_day, EventRecord, EventView, Frame, RecordKind, StepLogEntry,
};

use crate::config::{ScheduleConfig, StoryConfig};
use crate::dynamics::GroupDynamics;
use crate::error::{DayLoadError, NavigationError, SchedulerError, SetupError, SourceError};
use crate::event::{Day, DialogueOverride, Event};
use crate::interpreter::EventInterpreter;
use crate::snapshot::Snapshot;

/// Where day scripts come from.
pub trait DaySource {
    /// Raw records of day `day` (1-based).
    fn fetch(&self, day: u32) -> Result<Vec<EventRecord>, SourceError>;

    /// Whether a script exists for `day`.
    fn has_day(&self, day: u32) -> bool;
}

/// Reads `day-NN.json` files from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, day: u32) -> PathBuf {
        self.root.join(day_file_name(day))
    }
}

impl DaySource for DirectorySource {
    fn fetch(&self, day: u32) -> Result<Vec<EventRecord>, SourceError> {
        let path = self.path_for(day);
        if !path.is_file() {
            return Err(SourceError::MissingDay(day));
        }
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        parse_day(&content).map_err(|source| SourceError::Json { path, source })
    }

    fn has_day(&self, day: u32) -> bool {
        self.path_for(day).is_file()
    }
}

/// Days held in memory, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    days: BTreeMap<u32, Vec<EventRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, day: u32, records: Vec<EventRecord>) -> Self {
        self.days.insert(day, records);
        self
    }

    pub fn insert(&mut self, day: u32, records: Vec<EventRecord>) {
        self.days.insert(day, records);
    }
}

impl DaySource for MemorySource {
    fn fetch(&self, day: u32) -> Result<Vec<EventRecord>, SourceError> {
        self.days.get(&day).cloned().ok_or(SourceError::MissingDay(day))
    }

    fn has_day(&self, day: u32) -> bool {
        self.days.contains_key(&day)
    }
}

/// Parses a day argument such as `"01"` or `"01-03"`.
pub fn parse_day_range(arg: &str) -> Result<Vec<u32>, String> {
    let parse = |s: &str| -> Result<u32, String> {
        let day: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a day number", s.trim()))?;
        if day == 0 {
            return Err("days start at 1".to_string());
        }
        Ok(day)
    };
    match arg.split_once('-') {
        None => Ok(vec![parse(arg)?]),
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if end < start {
                return Err(format!("range {}-{} runs backwards", start, end));
            }
            Ok((start..=end).collect())
        }
    }
}

/// The loaded day and every snapshot reached on it.
#[derive(Debug)]
struct LoadedDay {
    day: Day,
    /// `history[0]` is the baseline; `history[k]` follows event `k - 1`.
    history: Vec<Snapshot>,
    log: Vec<StepLogEntry>,
}

impl LoadedDay {
    fn new(day: Day, baseline: Snapshot) -> Self {
        Self {
            day,
            history: vec![baseline],
            log: Vec::new(),
        }
    }

    fn step(&self) -> usize {
        self.history.len() - 1
    }

    fn current(&self) -> &Snapshot {
        &self.history[self.history.len() - 1]
    }
}

/// Steps a multi-day story forward and back.
pub struct DayScheduler {
    interpreter: EventInterpreter,
    source: Box<dyn DaySource>,
    schedule: ScheduleConfig,
    initial: Snapshot,
    current: Option<LoadedDay>,
    /// Final snapshot of each day's most recent completion
    completed: BTreeMap<u32, Snapshot>,
}

impl DayScheduler {
    pub fn new(interpreter: EventInterpreter, source: Box<dyn DaySource>, schedule: ScheduleConfig) -> Self {
        let initial = interpreter.initial_snapshot();
        Self {
            interpreter,
            source,
            schedule,
            initial,
            current: None,
            completed: BTreeMap::new(),
        }
    }

    /// Builds the engine from configuration and attaches a source.
    pub fn from_config(config: &StoryConfig, source: Box<dyn DaySource>) -> Result<Self, SetupError> {
        let interpreter = EventInterpreter::from_config(config)?;
        Ok(Self::new(interpreter, source, config.schedule.clone()))
    }

    pub fn interpreter(&self) -> &EventInterpreter {
        &self.interpreter
    }

    fn loaded(&self) -> Result<&LoadedDay, NavigationError> {
        self.current.as_ref().ok_or(NavigationError::NoDayLoaded)
    }

    fn compile(&self, day: u32) -> Result<Day, DayLoadError> {
        let records = self.source.fetch(day)?;
        Day::compile(day, &records, self.interpreter.registry(), self.interpreter.taxonomy())
    }

    /// Start-of-day snapshot for `day`.
    ///
    /// Days before it that were never completed are replayed from their
    /// scripts first.
    fn baseline_for(&mut self, day: u32) -> Result<Snapshot, DayLoadError> {
        let mut first = day;
        while first > 1 && !self.completed.contains_key(&(first - 1)) {
            first -= 1;
        }

        let mut baseline = match first {
            1 => self.initial.clone(),
            n => self
                .interpreter
                .overnight(&self.completed[&(n - 1)], self.schedule.overnight_decay_steps),
        };

        for earlier in first..day {
            tracing::debug!("Replaying day {} to reach day {}", earlier, day);
            let compiled = self.compile(earlier)?;
            let mut snapshot = baseline;
            for event in &compiled.events {
                snapshot = self.interpreter.apply(earlier, &snapshot, event).snapshot;
            }
            self.completed.insert(earlier, snapshot.clone());
            baseline = self
                .interpreter
                .overnight(&snapshot, self.schedule.overnight_decay_steps);
        }

        Ok(baseline)
    }

    /// Loads and validates day `day`, positioning at its baseline.
    ///
    /// On failure the previously loaded day stays current.
    pub fn load_day(&mut self, day: u32) -> Result<&Snapshot, SchedulerError> {
        if day == 0 {
            return Err(NavigationError::DayOutOfRange(day).into());
        }
        let compiled = match self.compile(day) {
            Ok(compiled) => compiled,
            Err(DayLoadError::Source(SourceError::MissingDay(_))) => {
                return Err(NavigationError::DayOutOfRange(day).into());
            }
            Err(err) => {
                tracing::warn!("Failed to load day {}: {}", day, err);
                return Err(err.into());
            }
        };
        let baseline = self.baseline_for(day)?;

        tracing::info!("Loaded day {} ({} events)", day, compiled.len());
        let loaded = self.current.insert(LoadedDay::new(compiled, baseline));
        Ok(&loaded.history[0])
    }

    /// Jumps to the baseline of `day`.
    pub fn goto_day(&mut self, day: u32) -> Result<&Snapshot, SchedulerError> {
        if self.current_day() == Some(day) {
            let loaded = self.current.as_mut().ok_or(NavigationError::NoDayLoaded)?;
            loaded.history.truncate(1);
            loaded.log.clear();
            return Ok(&loaded.history[0]);
        }
        self.load_day(day)
    }

    pub fn next_day(&mut self) -> Result<&Snapshot, SchedulerError> {
        let day = self.loaded()?.day.number;
        if !self.source.has_day(day + 1) {
            return Err(NavigationError::DayOutOfRange(day + 1).into());
        }
        self.load_day(day + 1)
    }

    pub fn previous_day(&mut self) -> Result<&Snapshot, SchedulerError> {
        let day = self.loaded()?.day.number;
        if day <= 1 {
            return Err(NavigationError::DayOutOfRange(0).into());
        }
        self.load_day(day - 1)
    }

    /// Applies the next scripted event.
    pub fn advance(&mut self) -> Result<&Snapshot, SchedulerError> {
        let event = self.pending()?.clone();
        self.commit(&event)
    }

    /// Applies the next event with supplied dialogue content.
    ///
    /// Nothing changes when the content does not resolve.
    pub fn advance_with(&mut self, content: &DialogueOverride) -> Result<&Snapshot, SchedulerError> {
        let supplied = self.pending()?.with_override(
            content,
            self.interpreter.registry(),
            self.interpreter.taxonomy(),
        );
        match supplied {
            Ok(event) => self.commit(&event),
            Err(err) => {
                tracing::warn!("Rejected supplied dialogue at step {}: {}", self.current_step(), err);
                Err(err.into())
            }
        }
    }

    fn pending(&self) -> Result<&Event, NavigationError> {
        let loaded = self.loaded()?;
        let step = loaded.step();
        loaded
            .day
            .events
            .get(step)
            .ok_or(NavigationError::OutOfRange {
                requested: step as isize + 1,
                len: loaded.day.len(),
            })
    }

    fn commit(&mut self, event: &Event) -> Result<&Snapshot, SchedulerError> {
        let loaded = self.current.as_mut().ok_or(NavigationError::NoDayLoaded)?;
        let day = loaded.day.number;
        let step = self.interpreter.apply(day, loaded.current(), event);
        tracing::debug!(
            "Day {} step {}: {} ({} effects)",
            day,
            step.entry.step,
            step.entry.event.kind.label(),
            step.entry.effects.len()
        );
        loaded.history.push(step.snapshot);
        loaded.log.push(step.entry);

        if loaded.step() == loaded.day.len() {
            // Later baselines derive from this completion; drop stale ones.
            self.completed.retain(|d, _| *d <= day);
            self.completed.insert(day, loaded.current().clone());
            tracing::info!("Day {} complete", day);
        }
        Ok(loaded.current())
    }

    /// Steps back one event, restoring the earlier snapshot exactly.
    pub fn retreat(&mut self) -> Result<&Snapshot, SchedulerError> {
        let loaded = self.current.as_mut().ok_or(NavigationError::NoDayLoaded)?;
        if loaded.step() == 0 {
            return Err(NavigationError::OutOfRange {
                requested: -1,
                len: loaded.day.len(),
            }
            .into());
        }
        loaded.history.pop();
        loaded.log.pop();
        Ok(loaded.current())
    }

    pub fn current_day(&self) -> Option<u32> {
        self.current.as_ref().map(|l| l.day.number)
    }

    pub fn current_step(&self) -> usize {
        self.current.as_ref().map_or(0, LoadedDay::step)
    }

    pub fn step_count(&self) -> usize {
        self.current.as_ref().map_or(0, |l| l.day.len())
    }

    pub fn is_day_complete(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|l| l.step() == l.day.len())
    }

    pub fn snapshot(&self) -> Result<&Snapshot, NavigationError> {
        Ok(self.loaded()?.current())
    }

    /// The event the next `advance` would apply.
    pub fn peek_next(&self) -> Option<&Event> {
        self.pending().ok()
    }

    /// Log of applied steps on the current day.
    pub fn log(&self) -> &[StepLogEntry] {
        self.current
            .as_ref()
            .map(|l| l.log.as_slice())
            .unwrap_or_default()
    }

    /// Up to `limit` most recent dialogue lines of the current day, oldest first.
    pub fn recent_dialogue(&self, limit: usize) -> Vec<&EventView> {
        let mut lines: Vec<&EventView> = self
            .log()
            .iter()
            .rev()
            .map(|entry| &entry.event)
            .filter(|event| event.kind == RecordKind::Dialogue && !event.text.is_empty())
            .take(limit)
            .collect();
        lines.reverse();
        lines
    }

    /// Group views over the current snapshot.
    pub fn dynamics(&self) -> Result<GroupDynamics<'_>, NavigationError> {
        Ok(self.interpreter.dynamics(self.snapshot()?))
    }

    /// Presentation frame of the current snapshot.
    pub fn frame(&self) -> Result<Frame, NavigationError> {
        let loaded = self.loaded()?;
        Ok(loaded.current().frame(
            loaded.day.number,
            loaded.step(),
            loaded.day.len(),
            self.interpreter.registry(),
            self.interpreter.taxonomy(),
        ))
    }
}
