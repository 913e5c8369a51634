use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, game::QuestionKindDto, millis, results::AnswerOutcomeDto},
    services::results::PlayerSummary,
    state::session::Question,
};

/// Payload used to join a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub player_id: Uuid,
}

/// Whether the session has opened its first question, and whether it is over.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct PlayerStatusResponse {
    pub started: bool,
    pub finished: bool,
}

/// Question as shown to players; correct flags are never included.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKindDto,
    /// Answer window in seconds.
    pub duration: u64,
    pub points: u32,
    pub options: Vec<PublicOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicOption {
    pub id: String,
    pub text: String,
}

impl From<&Question> for PublicQuestion {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            kind: question.kind.into(),
            duration: question.duration.as_secs(),
            points: question.points,
            options: question
                .options
                .iter()
                .map(|option| PublicOption {
                    id: option.id.clone(),
                    text: option.text.clone(),
                })
                .collect(),
            media: question.media.clone(),
        }
    }
}

/// Current question with its server-side countdown.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerQuestionResponse {
    pub question: PublicQuestion,
    pub position: usize,
    pub question_started_at: String,
    pub remaining_ms: u64,
}

impl PlayerQuestionResponse {
    /// Build the response for the question at `position`.
    pub fn new(
        position: usize,
        question: &Question,
        started_at: SystemTime,
        remaining: Duration,
    ) -> Self {
        Self {
            question: question.into(),
            position,
            question_started_at: format_system_time(started_at),
            remaining_ms: millis(remaining),
        }
    }
}

/// Option ids chosen by a player for the current question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1))]
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectAnswerResponse {
    pub answer_ids: Vec<String>,
}

/// A player's own outcomes.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResultsResponse {
    pub answers: Vec<AnswerOutcomeDto>,
    pub total_score: u32,
}

impl From<PlayerSummary> for PlayerResultsResponse {
    fn from(summary: PlayerSummary) -> Self {
        Self {
            answers: summary.outcomes.into_iter().map(Into::into).collect(),
            total_score: summary.total_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{state::player::MAX_NAME_LENGTH, test_support::question};

    #[test]
    fn public_question_hides_answer_key() {
        let question = question(15, 100, &[("a1", true), ("a2", false)]);
        let value = serde_json::to_value(PublicQuestion::from(&question)).unwrap();

        assert_eq!(value["type"], "single");
        assert_eq!(value["duration"], 15);
        assert_eq!(value["options"][0], serde_json::json!({"id": "a1", "text": "option a1"}));
        assert!(!value.to_string().contains("correct"));
    }

    #[test]
    fn join_name_length_is_validated() {
        let ok = JoinRequest { name: "Ada".into() };
        assert!(ok.validate().is_ok());

        let empty = JoinRequest { name: String::new() };
        assert!(empty.validate().is_err());

        let long = JoinRequest {
            name: "x".repeat(MAX_NAME_LENGTH + 1),
        };
        assert!(long.validate().is_err());
    }
}
