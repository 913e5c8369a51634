use std::{
    collections::{BTreeSet, HashSet},
    fmt,
    time::{Duration, SystemTime},
};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::{AnswerOptionEntity, QuestionEntity, QuestionKindEntity},
    state::state_machine::{
        AbortError, ApplyError, Plan, PlanError, PlanId, SessionEvent, SessionPhase,
        SessionStateMachine,
    },
};

/// Identifier of a game definition in the catalog.
pub type GameId = Uuid;
/// Identifier of a question inside a game.
pub type QuestionId = Uuid;
/// Identifier of an answer option, unique within its question.
pub type OptionId = String;

/// Short numeric join code identifying a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u32);

impl SessionId {
    const MIN: u32 = 100_000;
    const MAX: u32 = 999_999;

    /// Draw a random six digit session id.
    pub fn random() -> Self {
        Self(rand::rng().random_range(Self::MIN..=Self::MAX))
    }

    /// Raw numeric value exposed to clients.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for SessionId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Question flavours; all of them are judged by the same exact-set rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Exactly one correct option.
    Single,
    /// One or more correct options.
    Multiple,
    /// Two options, exactly one correct.
    TrueFalse,
}

impl QuestionKind {
    /// Whether a submission may carry more than one option.
    pub fn allows_many(self) -> bool {
        matches!(self, QuestionKind::Multiple)
    }
}

/// A selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    /// Identifier submitted by players.
    pub id: OptionId,
    /// Display text.
    pub text: String,
    /// Whether choosing this option is part of the correct answer.
    pub correct: bool,
}

/// Question captured into a session; never mutated once the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Stable identifier inherited from the game definition.
    pub id: QuestionId,
    /// Question prompt.
    pub text: String,
    /// Question flavour.
    pub kind: QuestionKind,
    /// Length of the answer window.
    pub duration: Duration,
    /// Points awarded for a correct answer.
    pub points: u32,
    /// Ordered answer options.
    pub options: Vec<AnswerOption>,
    /// Optional media reference (URL or asset key).
    pub media: Option<String>,
}

impl Question {
    /// Ids of every correct option.
    pub fn correct_ids(&self) -> BTreeSet<&str> {
        self.options
            .iter()
            .filter(|option| option.correct)
            .map(|option| option.id.as_str())
            .collect()
    }

    /// Whether `id` names one of this question's options.
    pub fn has_option(&self, id: &str) -> bool {
        self.options.iter().any(|option| option.id == id)
    }
}

/// Reasons a stored question cannot be played.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    #[error("question `{0}` has an empty text")]
    EmptyText(QuestionId),
    #[error("question `{0}` must last at least one second")]
    ZeroDuration(QuestionId),
    #[error("question `{0}` has no answer options")]
    NoOptions(QuestionId),
    #[error("question `{question}` declares option `{option}` more than once")]
    DuplicateOption { question: QuestionId, option: OptionId },
    #[error("question `{question}` has an option with an empty id")]
    EmptyOptionId { question: QuestionId },
    #[error("question `{question}` must have exactly {expected} options, got {actual}")]
    OptionCount {
        question: QuestionId,
        expected: usize,
        actual: usize,
    },
    #[error("question `{question}` must have exactly one correct option, got {actual}")]
    SingleCorrect { question: QuestionId, actual: usize },
    #[error("question `{0}` must have at least one correct option")]
    NoCorrect(QuestionId),
}

impl TryFrom<QuestionEntity> for Question {
    type Error = InvalidQuestion;

    fn try_from(value: QuestionEntity) -> Result<Self, Self::Error> {
        let id = value.id;
        if value.text.trim().is_empty() {
            return Err(InvalidQuestion::EmptyText(id));
        }
        if value.duration.is_zero() {
            return Err(InvalidQuestion::ZeroDuration(id));
        }
        if value.options.is_empty() {
            return Err(InvalidQuestion::NoOptions(id));
        }

        let mut seen = HashSet::new();
        for option in &value.options {
            if option.id.trim().is_empty() {
                return Err(InvalidQuestion::EmptyOptionId { question: id });
            }
            if !seen.insert(option.id.as_str()) {
                return Err(InvalidQuestion::DuplicateOption {
                    question: id,
                    option: option.id.clone(),
                });
            }
        }

        let kind = match value.kind {
            QuestionKindEntity::Single => QuestionKind::Single,
            QuestionKindEntity::Multiple => QuestionKind::Multiple,
            QuestionKindEntity::TrueFalse => QuestionKind::TrueFalse,
        };

        if kind == QuestionKind::TrueFalse && value.options.len() != 2 {
            return Err(InvalidQuestion::OptionCount {
                question: id,
                expected: 2,
                actual: value.options.len(),
            });
        }

        let correct = value.options.iter().filter(|option| option.correct).count();
        match kind {
            QuestionKind::Single | QuestionKind::TrueFalse if correct != 1 => {
                return Err(InvalidQuestion::SingleCorrect {
                    question: id,
                    actual: correct,
                });
            }
            QuestionKind::Multiple if correct == 0 => return Err(InvalidQuestion::NoCorrect(id)),
            _ => {}
        }

        Ok(Self {
            id,
            text: value.text,
            kind,
            duration: value.duration,
            points: value.points,
            options: value.options.into_iter().map(Into::into).collect(),
            media: value.media,
        })
    }
}

impl From<AnswerOptionEntity> for AnswerOption {
    fn from(value: AnswerOptionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            correct: value.correct,
        }
    }
}

/// Authoritative countdown of a question window.
///
/// Computed as `max(0, duration - (now - started_at))` on every read; a `now`
/// earlier than `started_at` counts as no time elapsed.
pub fn remaining_time(duration: Duration, started_at: SystemTime, now: SystemTime) -> Duration {
    let elapsed = now.duration_since(started_at).unwrap_or(Duration::ZERO);
    duration.saturating_sub(elapsed)
}

/// Coarse status exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Waiting for the first question.
    Lobby,
    /// Questions are running.
    Active,
    /// Finished, read-only.
    Ended,
}

/// One timed run of a game's questions.
#[derive(Debug, Clone)]
pub struct Session {
    /// Join code of the session.
    pub id: SessionId,
    /// Game the session was started from.
    pub game_id: GameId,
    /// Owner of the game at start time.
    pub owner: String,
    /// Deep copy of the game's questions taken at start.
    pub questions: Vec<Question>,
    /// When the session was started.
    pub created_at: SystemTime,
    question_started_at: Option<SystemTime>,
    machine: SessionStateMachine,
}

impl Session {
    /// Create a session in the lobby.
    pub fn new(
        id: SessionId,
        game_id: GameId,
        owner: String,
        questions: Vec<Question>,
        now: SystemTime,
    ) -> Self {
        let machine = SessionStateMachine::new(questions.len());
        Self {
            id,
            game_id,
            owner,
            questions,
            created_at: now,
            question_started_at: None,
            machine,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// Coarse status derived from the phase.
    pub fn status(&self) -> SessionStatus {
        match self.machine.phase() {
            SessionPhase::Lobby => SessionStatus::Lobby,
            SessionPhase::Active { .. } => SessionStatus::Active,
            SessionPhase::Ended { .. } => SessionStatus::Ended,
        }
    }

    /// Whether the session is still running (lobby or active).
    pub fn is_live(&self) -> bool {
        !self.machine.phase().is_ended()
    }

    /// Current question index, `None` before the first advance.
    pub fn position(&self) -> Option<usize> {
        self.machine.phase().position()
    }

    /// Committed transition counter.
    pub fn version(&self) -> usize {
        self.machine.version()
    }

    /// Timestamp of the last advance.
    pub fn question_started_at(&self) -> Option<SystemTime> {
        self.question_started_at
    }

    /// Current (or last opened) question with its index.
    pub fn current_question(&self) -> Option<(usize, &Question)> {
        let position = self.position()?;
        self.questions.get(position).map(|question| (position, question))
    }

    /// Remaining time of the open window; zero outside of the active phase.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        if self.status() != SessionStatus::Active {
            return Duration::ZERO;
        }
        match (self.current_question(), self.question_started_at) {
            (Some((_, question)), Some(started_at)) => {
                remaining_time(question.duration, started_at, now)
            }
            _ => Duration::ZERO,
        }
    }

    /// Whether submissions for the current position are still accepted.
    pub fn window_open(&self, now: SystemTime) -> bool {
        !self.remaining(now).is_zero()
    }

    /// Reserve a transition; see [`SessionStateMachine::plan`].
    pub fn plan(&mut self, event: SessionEvent) -> Result<Plan, PlanError> {
        self.machine.plan(event)
    }

    /// Commit a planned transition, stamping the window start when a question opens.
    pub fn apply(&mut self, plan_id: PlanId, now: SystemTime) -> Result<SessionPhase, ApplyError> {
        let phase = self.machine.apply(plan_id)?;
        if let SessionPhase::Active { .. } = phase {
            self.question_started_at = Some(now);
        }
        Ok(phase)
    }

    /// Drop a planned transition.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        self.machine.abort(plan_id)
    }
}
