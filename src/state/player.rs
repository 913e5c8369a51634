use std::{
    collections::BTreeSet,
    time::{Duration, SystemTime},
};

use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::LateJoinPolicy,
    services::scoring,
    state::{
        session::{OptionId, SessionId, SessionStatus},
        store::SessionRecord,
    },
};

/// Identifier of a player.
pub type PlayerId = Uuid;

/// Longest display name accepted at join time.
pub const MAX_NAME_LENGTH: usize = 64;

/// One judged submission, stored in the slot of its question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Index of the question in the session.
    pub question_index: usize,
    /// Chosen option ids.
    pub option_ids: BTreeSet<OptionId>,
    /// When the last submission for this slot was accepted.
    pub submitted_at: SystemTime,
    /// Window start copied from the session at submit time.
    pub question_started_at: SystemTime,
    /// Judged correctness.
    pub correct: bool,
    /// Points awarded for this slot.
    pub points_awarded: u32,
}

impl AnswerRecord {
    /// Time between the window opening and the submission.
    pub fn response_time(&self) -> Duration {
        self.submitted_at
            .duration_since(self.question_started_at)
            .unwrap_or(Duration::ZERO)
    }
}

/// A participant of one session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Player identifier handed back at join.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Session the player belongs to.
    pub session_id: SessionId,
    /// Join timestamp.
    pub joined_at: SystemTime,
    /// Zero-based join rank inside the session, used as the last leaderboard tie-break.
    pub join_order: usize,
    /// One slot per session question, `None` until answered.
    pub answers: Vec<Option<AnswerRecord>>,
}

impl Player {
    /// Total of awarded points across all slots.
    pub fn score(&self) -> u32 {
        self.answered().map(|record| record.points_awarded).sum()
    }

    /// Iterate over the submitted records.
    pub fn answered(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.answers.iter().flatten()
    }
}

/// Rejections raised by player-facing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("session `{0}` has already ended")]
    SessionEnded(SessionId),
    #[error("session `{0}` no longer accepts new players")]
    LateJoinClosed(SessionId),
    #[error("player name must be between 1 and {MAX_NAME_LENGTH} characters")]
    InvalidName,
    #[error("player `{0}` is not part of this session")]
    UnknownPlayer(PlayerId),
    #[error("session has not started yet")]
    NotStarted,
    #[error("session has finished")]
    Finished,
    #[error("answer window for question {0} is closed")]
    WindowClosed(usize),
    #[error("answer window for question {0} is still open")]
    WindowOpen(usize),
    #[error("at least one answer must be submitted")]
    EmptyAnswer,
    #[error("answer `{0}` is not an option of the current question")]
    UnknownOption(OptionId),
    #[error("this question accepts a single answer")]
    TooManyOptions,
}

/// Index from player ids to their session.
#[derive(Default)]
pub struct PlayerRegistry {
    sessions: DashMap<PlayerId, SessionId>,
}

impl PlayerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that `player_id` belongs to `session_id`.
    pub fn register(&self, player_id: PlayerId, session_id: SessionId) {
        self.sessions.insert(player_id, session_id);
    }

    /// Session of a player, if known.
    pub fn session_of(&self, player_id: PlayerId) -> Option<SessionId> {
        self.sessions.get(&player_id).map(|entry| *entry.value())
    }

    /// Drop the index entries of `players`.
    pub fn forget(&self, players: impl IntoIterator<Item = PlayerId>) {
        for player_id in players {
            self.sessions.remove(&player_id);
        }
    }
}

impl SessionRecord {
    /// Add a player to the roster, allocating one empty slot per question.
    pub fn join(
        &mut self,
        name: &str,
        policy: LateJoinPolicy,
        now: SystemTime,
    ) -> Result<PlayerId, PlayError> {
        match (self.session.status(), policy) {
            (SessionStatus::Ended, _) => return Err(PlayError::SessionEnded(self.session.id)),
            (SessionStatus::Active, LateJoinPolicy::LobbyOnly) => {
                return Err(PlayError::LateJoinClosed(self.session.id));
            }
            _ => {}
        }

        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(PlayError::InvalidName);
        }

        let id = Uuid::new_v4();
        let player = Player {
            id,
            name: name.to_owned(),
            session_id: self.session.id,
            joined_at: now,
            join_order: self.players.len(),
            answers: vec![None; self.session.questions.len()],
        };
        self.players.insert(id, player);
        Ok(id)
    }

    /// Judge and store a submission for the current question.
    ///
    /// A later submission inside the same window replaces the earlier one.
    pub fn submit(
        &mut self,
        player_id: PlayerId,
        answers: &[OptionId],
        now: SystemTime,
    ) -> Result<AnswerRecord, PlayError> {
        if !self.players.contains_key(&player_id) {
            return Err(PlayError::UnknownPlayer(player_id));
        }

        let session = &self.session;
        let (position, question) = session.current_question().ok_or(PlayError::NotStarted)?;
        let started_at = session
            .question_started_at()
            .ok_or(PlayError::NotStarted)?;
        if !session.window_open(now) {
            return Err(PlayError::WindowClosed(position));
        }

        let chosen: BTreeSet<OptionId> = answers.iter().cloned().collect();
        if chosen.is_empty() {
            return Err(PlayError::EmptyAnswer);
        }
        if let Some(unknown) = chosen.iter().find(|id| !question.has_option(id)) {
            return Err(PlayError::UnknownOption(unknown.clone()));
        }
        if chosen.len() > 1 && !question.kind.allows_many() {
            return Err(PlayError::TooManyOptions);
        }

        let judged = scoring::score(question, &chosen);
        let record = AnswerRecord {
            question_index: position,
            option_ids: chosen,
            submitted_at: now,
            question_started_at: started_at,
            correct: judged.correct,
            points_awarded: judged.points,
        };

        if let Some(player) = self.players.get_mut(&player_id) {
            player.answers[position] = Some(record.clone());
        }
        Ok(record)
    }

    /// Correct option ids of the current question, once its window has closed.
    pub fn reveal(&self, now: SystemTime) -> Result<Vec<OptionId>, PlayError> {
        let (position, question) = self
            .session
            .current_question()
            .ok_or(PlayError::NotStarted)?;
        if self.session.window_open(now) {
            return Err(PlayError::WindowOpen(position));
        }

        Ok(question
            .correct_ids()
            .into_iter()
            .map(str::to_owned)
            .collect())
    }

    /// Whether the question at `index` can no longer be answered, so its outcome may be shown.
    pub fn is_revealed(&self, index: usize, now: SystemTime) -> bool {
        match self.session.position() {
            Some(position) if position == index => !self.session.window_open(now),
            Some(position) => index < position,
            None => false,
        }
    }
}
