use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{admin::SessionStatusDto, format_system_time, millis},
    services::results::{AnswerOutcome, PlayerStanding, QuestionStats, SessionResults},
    state::session::SessionStatus,
};

/// One player's outcome on one question.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcomeDto {
    pub question_index: usize,
    pub question_id: Uuid,
    pub answered: bool,
    /// `false` while the answer window is open; `correct` and `pointsAwarded` are then withheld.
    pub revealed: bool,
    pub answer_ids: Vec<String>,
    pub correct: bool,
    pub points_awarded: u32,
    pub submitted_at: Option<String>,
    pub response_time_ms: Option<u64>,
}

impl From<AnswerOutcome> for AnswerOutcomeDto {
    fn from(outcome: AnswerOutcome) -> Self {
        Self {
            question_index: outcome.question_index,
            question_id: outcome.question_id,
            answered: outcome.answered,
            revealed: outcome.revealed,
            answer_ids: outcome.option_ids,
            correct: outcome.correct,
            points_awarded: outcome.points_awarded,
            submitted_at: outcome.submitted_at.map(format_system_time),
            response_time_ms: outcome.response_time.map(millis),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStandingDto {
    pub rank: usize,
    pub player_id: Uuid,
    pub name: String,
    pub score: u32,
    pub correct_count: usize,
    pub answered_count: usize,
    pub average_response_time_ms: Option<u64>,
    pub answers: Vec<AnswerOutcomeDto>,
}

impl From<PlayerStanding> for PlayerStandingDto {
    fn from(standing: PlayerStanding) -> Self {
        Self {
            rank: standing.rank,
            player_id: standing.player_id,
            name: standing.name,
            score: standing.score,
            correct_count: standing.correct_count,
            answered_count: standing.answered_count,
            average_response_time_ms: standing.average_response_time.map(millis),
            answers: standing.outcomes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStatsDto {
    pub question_index: usize,
    pub question_id: Uuid,
    pub text: String,
    pub total_responses: usize,
    pub correct_responses: usize,
    pub accuracy: f64,
    pub average_response_time_ms: Option<u64>,
}

impl From<QuestionStats> for QuestionStatsDto {
    fn from(stats: QuestionStats) -> Self {
        Self {
            question_index: stats.question_index,
            question_id: stats.question_id,
            text: stats.text,
            total_responses: stats.total_responses,
            correct_responses: stats.correct_responses,
            accuracy: stats.accuracy,
            average_response_time_ms: stats.average_response_time.map(millis),
        }
    }
}

/// Leaderboard and statistics of a session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResultsResponse {
    pub session_id: u32,
    pub status: SessionStatusDto,
    pub leaderboard: Vec<PlayerStandingDto>,
    pub questions: Vec<QuestionStatsDto>,
    pub average_score: f64,
    pub highest_score: u32,
    pub lowest_score: u32,
    pub average_accuracy: f64,
}

impl SessionResultsResponse {
    /// Wrap computed results of session `session_id`.
    pub fn new(session_id: u32, status: SessionStatus, results: SessionResults) -> Self {
        Self {
            session_id,
            status: status.into(),
            leaderboard: results.leaderboard.into_iter().map(Into::into).collect(),
            questions: results.questions.into_iter().map(Into::into).collect(),
            average_score: results.average_score,
            highest_score: results.highest_score,
            lowest_score: results.lowest_score,
            average_accuracy: results.average_accuracy,
        }
    }
}
