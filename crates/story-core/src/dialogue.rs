//! Dialogue adapters.
//!
//! The engine never talks to a model or a terminal directly. When a line
//! belongs to an AI- or user-controlled character, the driver asks a
//! [`DialogueGenerator`] for text and, for the user, a [`ChoiceSelector`]
//! for a pick among candidates. Generated text is only ever fed back
//! through [`DayScheduler::advance_with`], so the core stays deterministic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use story_events::Controller;

use crate::error::SchedulerError;
use crate::event::DialogueOverride;
use crate::scheduler::DayScheduler;

/// A prior line given to a generator as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextLine {
    pub speaker: String,
    pub text: String,
}

/// Everything a generator may use to voice a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub speaker: String,
    pub leadership: u8,
    pub intelligence: u8,
    pub resilience: u8,
    pub mood: String,
    pub addressees: Vec<String>,
    /// Scripted text for this line, possibly empty
    pub scripted: String,
    pub context: Vec<ContextLine>,
    /// Which of several candidates this request is for
    pub variant: usize,
}

/// Adapter failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The caller gave up; the step should be retried later.
    #[error("dialogue request cancelled")]
    Cancelled,
    #[error("generator returned no text for {0}")]
    EmptyResponse(String),
    #[error("choice {choice} is outside 0..{len}")]
    InvalidChoice { choice: usize, len: usize },
    #[error("provider failure: {0}")]
    Provider(String),
}

/// Produces a line for a character.
pub trait DialogueGenerator: Send + Sync {
    fn generate(&self, request: &DialogueRequest) -> Result<String, AdapterError>;
}

/// What the player picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Candidate(usize),
    Custom(String),
    /// Keep the scripted line
    Skip,
}

/// Lets the player pick among candidate lines.
pub trait ChoiceSelector: Send + Sync {
    fn select(&self, character: &str, candidates: &[String]) -> Result<Choice, AdapterError>;
}

/// Stand-in generator used when no model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl DialogueGenerator for OfflineGenerator {
    fn generate(&self, request: &DialogueRequest) -> Result<String, AdapterError> {
        Ok(format!(
            "[{} would respond here, but AI is not configured]",
            request.speaker
        ))
    }
}

/// Always takes the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoice;

impl ChoiceSelector for FirstChoice {
    fn select(&self, _character: &str, candidates: &[String]) -> Result<Choice, AdapterError> {
        if candidates.is_empty() {
            return Ok(Choice::Skip);
        }
        Ok(Choice::Candidate(0))
    }
}

/// Outcome of a driven step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The scheduler moved one step forward
    Advanced,
    /// An adapter cancelled; nothing changed
    Deferred,
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Steps a scheduler, routing controlled lines through adapters.
pub struct DialogueDriver<G, S> {
    generator: G,
    selector: S,
    candidates: usize,
    context_lines: usize,
}

impl<G: DialogueGenerator, S: ChoiceSelector> DialogueDriver<G, S> {
    pub fn new(generator: G, selector: S) -> Self {
        Self {
            generator,
            selector,
            candidates: 3,
            context_lines: 20,
        }
    }

    /// Number of candidate lines offered to the player.
    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = candidates.max(1);
        self
    }

    /// Prior lines of the day passed as context.
    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    fn request(&self, scheduler: &DayScheduler, variant: usize) -> Option<DialogueRequest> {
        let event = scheduler.peek_next()?;
        let speaker = event.speaker?;
        let interpreter = scheduler.interpreter();
        let character = interpreter.registry().get(speaker)?;
        let snapshot = scheduler.snapshot().ok()?;
        let mood = interpreter.taxonomy().name(snapshot.mood(speaker).tag).to_string();

        Some(DialogueRequest {
            speaker: character.name.clone(),
            leadership: character.leadership,
            intelligence: character.intelligence,
            resilience: character.resilience,
            mood,
            addressees: self.willing_addressees(scheduler),
            scripted: event.text.clone(),
            context: scheduler
                .recent_dialogue(self.context_lines)
                .into_iter()
                .map(|line| ContextLine {
                    speaker: line.speaker.clone().unwrap_or_default(),
                    text: line.text.clone(),
                })
                .collect(),
            variant,
        })
    }

    /// Addressees of the next line that its speaker is willing to talk to.
    fn willing_addressees(&self, scheduler: &DayScheduler) -> Vec<String> {
        let Some(event) = scheduler.peek_next() else {
            return Vec::new();
        };
        let Some(speaker) = event.speaker else {
            return Vec::new();
        };
        let registry = scheduler.interpreter().registry();
        event
            .addressees
            .iter()
            .filter(|id| registry.can_talk_to(speaker, **id))
            .map(|id| registry.name(*id).to_string())
            .collect()
    }

    fn generate(&self, request: &DialogueRequest) -> Result<String, AdapterError> {
        let text = self.generator.generate(request)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AdapterError::EmptyResponse(request.speaker.clone()));
        }
        Ok(text.to_string())
    }

    /// Advances one step.
    ///
    /// Scripted lines apply as written. AI lines take generated text. User
    /// lines offer candidates to the selector. A cancelled adapter defers
    /// the step; any other adapter failure leaves the scheduler untouched.
    pub fn step(&self, scheduler: &mut DayScheduler) -> Result<DriveOutcome, DriveError> {
        let controller = match scheduler.peek_next() {
            Some(event) if event.is_dialogue() => match (event.speaker, scheduler.snapshot()) {
                (Some(speaker), Ok(snapshot)) => snapshot.controller(speaker),
                _ => Controller::Script,
            },
            _ => Controller::Script,
        };

        let content = match controller {
            Controller::Script => None,
            Controller::Ai => match self.request(scheduler, 0).map(|r| self.generate(&r)) {
                None => None,
                Some(Ok(text)) => Some(text),
                Some(Err(AdapterError::Cancelled)) => return Ok(DriveOutcome::Deferred),
                Some(Err(e)) => return Err(e.into()),
            },
            Controller::User => match self.choose(scheduler) {
                Ok(content) => content,
                Err(AdapterError::Cancelled) => return Ok(DriveOutcome::Deferred),
                Err(e) => return Err(e.into()),
            },
        };

        match content {
            Some(text) => {
                let mut supplied = DialogueOverride::text(text);
                let willing = self.willing_addressees(scheduler);
                if scheduler.peek_next().is_some_and(|e| e.addressees.len() != willing.len()) {
                    supplied = supplied.with_addressees(willing);
                }
                scheduler.advance_with(&supplied)?
            }
            None => scheduler.advance()?,
        };
        Ok(DriveOutcome::Advanced)
    }

    fn choose(&self, scheduler: &DayScheduler) -> Result<Option<String>, AdapterError> {
        let mut candidates = Vec::with_capacity(self.candidates);
        let mut speaker = String::new();
        for variant in 0..self.candidates {
            let Some(request) = self.request(scheduler, variant) else {
                return Ok(None);
            };
            speaker = request.speaker.clone();
            candidates.push(self.generate(&request)?);
        }

        match self.selector.select(&speaker, &candidates)? {
            Choice::Candidate(i) => candidates
                .get(i)
                .cloned()
                .map(Some)
                .ok_or(AdapterError::InvalidChoice {
                    choice: i,
                    len: candidates.len(),
                }),
            Choice::Custom(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(AdapterError::EmptyResponse(speaker));
                }
                Ok(Some(text.to_string()))
            }
            Choice::Skip => Ok(None),
        }
    }
}
