use thiserror::Error;
use uuid::Uuid;

/// Lifecycle phases of a single quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session exists and accepts players, no question has been opened yet.
    Lobby,
    /// A question is open (or was opened and its window has elapsed).
    Active {
        /// Index of the current question in the captured question list.
        position: usize,
    },
    /// Session is finished; the last opened position is kept for reveal and results.
    Ended {
        /// Last position reached before ending, if any question was ever opened.
        position: Option<usize>,
    },
}

impl SessionPhase {
    /// Position of the current (or last) question, `None` before the first one.
    pub fn position(&self) -> Option<usize> {
        match self {
            SessionPhase::Lobby => None,
            SessionPhase::Active { position } => Some(*position),
            SessionPhase::Ended { position } => *position,
        }
    }

    /// Whether the phase is terminal.
    pub fn is_ended(&self) -> bool {
        matches!(self, SessionPhase::Ended { .. })
    }
}

/// Events the admin can apply to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Open the next question, or finish when the list is exhausted.
    Advance,
    /// Finish the session immediately.
    End,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: SessionPhase,
        /// Current phase.
        actual: SessionPhase,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the session is currently in.
    pub from: SessionPhase,
    /// Phase the session will transition to.
    pub to: SessionPhase,
    /// Event that triggered this transition.
    pub event: SessionEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
}

/// State machine driving a session through lobby, questions and the end.
///
/// Transitions are two-step: [`plan`](Self::plan) validates an event and
/// reserves the machine, [`apply`](Self::apply) commits it once any side work
/// (catalog writes) succeeded, and [`abort`](Self::abort) drops it otherwise.
/// The phase is never observed half-way through a transition.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    question_count: usize,
    version: usize,
    pending: Option<Plan>,
}

impl SessionStateMachine {
    /// Create a machine in the lobby for a session with `question_count` questions.
    pub fn new(question_count: usize) -> Self {
        Self {
            phase: SessionPhase::Lobby,
            question_count,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of committed transitions; changes on every advance or end.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Validate `event` against the current phase and reserve the transition.
    pub fn plan(&mut self, event: SessionEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Commit a planned transition and return the new phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase)
    }

    /// Drop a planned transition, leaving the phase untouched.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Lobby, SessionEvent::Advance) => self.open_or_finish(0, None),
            (SessionPhase::Active { position }, SessionEvent::Advance) => {
                self.open_or_finish(position + 1, Some(position))
            }
            (SessionPhase::Lobby, SessionEvent::End) => SessionPhase::Ended { position: None },
            (SessionPhase::Active { position }, SessionEvent::End) => SessionPhase::Ended {
                position: Some(position),
            },
            (from @ SessionPhase::Ended { .. }, event) => {
                return Err(InvalidTransition { from, event });
            }
        };

        Ok(next)
    }

    fn open_or_finish(&self, next: usize, last: Option<usize>) -> SessionPhase {
        if next < self.question_count {
            SessionPhase::Active { position: next }
        } else {
            SessionPhase::Ended { position: last }
        }
    }
}
