use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{AnswerOptionEntity, GameEntity, QuestionEntity, QuestionKindEntity},
    dto::validation::{validate_option_id, validate_unique_option_ids},
    state::session::{AnswerOption, Question, QuestionKind},
};

/// Longest accepted answer window, in seconds.
pub const MAX_QUESTION_DURATION_SECS: u64 = 3600;

/// Question kind as exchanged with clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKindDto {
    Single,
    Multiple,
    #[serde(rename = "truefalse")]
    TrueFalse,
}

/// Full replacement of the caller's game definitions.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReplaceGamesRequest {
    #[validate(nested)]
    pub games: Vec<GameInput>,
}

/// Incoming game definition. Omitting `id` creates a new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GameInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// Incoming question definition; `duration` is in seconds.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKindDto,
    pub duration: u64,
    pub points: u32,
    pub options: Vec<AnswerOptionInput>,
    #[serde(default)]
    pub media: Option<String>,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            let mut err = validator::ValidationError::new("question_text");
            err.message = Some("Question text must not be empty".into());
            errors.add("text", err);
        }

        if !(1..=MAX_QUESTION_DURATION_SECS).contains(&self.duration) {
            let mut err = validator::ValidationError::new("question_duration");
            err.message = Some(
                format!(
                    "Duration must be between 1 and {MAX_QUESTION_DURATION_SECS} seconds (got {})",
                    self.duration
                )
                .into(),
            );
            errors.add("duration", err);
        }

        if self.options.is_empty() {
            let mut err = validator::ValidationError::new("question_options");
            err.message = Some("A question needs at least one option".into());
            errors.add("options", err);
        }

        for option in &self.options {
            if let Err(e) = validate_option_id(&option.id) {
                errors.add("options", e);
            }
        }

        if let Err(e) = validate_unique_option_ids(&self.options) {
            errors.add("options", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Incoming answer option.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerOptionInput {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

impl GameInput {
    /// Build the catalog entity for `owner`; session bookkeeping is left empty.
    pub fn into_entity(self, id: Uuid, owner: &str) -> GameEntity {
        GameEntity {
            id,
            name: self.name.trim().to_owned(),
            owner: owner.to_owned(),
            questions: self.questions.into_iter().map(Into::into).collect(),
            active: None,
            history: Vec::new(),
        }
    }
}

impl From<QuestionInput> for QuestionEntity {
    fn from(input: QuestionInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            text: input.text,
            kind: input.kind.into(),
            duration: Duration::from_secs(input.duration),
            points: input.points,
            options: input
                .options
                .into_iter()
                .map(|option| AnswerOptionEntity {
                    id: option.id,
                    text: option.text,
                    correct: option.correct,
                })
                .collect(),
            media: input.media,
        }
    }
}

/// Games owned by the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamesResponse {
    pub games: Vec<GameSummary>,
}

/// Game definition returned to its owner, including correct flags.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub questions: Vec<QuestionSummary>,
    /// Join code of the running session, if any.
    pub active: Option<u32>,
    /// Join codes of past sessions, oldest first.
    pub history: Vec<u32>,
}

/// Question with its answer key.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKindDto,
    /// Answer window in seconds.
    pub duration: u64,
    pub points: u32,
    pub options: Vec<AnswerOptionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerOptionSummary {
    pub id: String,
    pub text: String,
    pub correct: bool,
}

impl From<QuestionKindDto> for QuestionKindEntity {
    fn from(kind: QuestionKindDto) -> Self {
        match kind {
            QuestionKindDto::Single => QuestionKindEntity::Single,
            QuestionKindDto::Multiple => QuestionKindEntity::Multiple,
            QuestionKindDto::TrueFalse => QuestionKindEntity::TrueFalse,
        }
    }
}

impl From<QuestionKindEntity> for QuestionKindDto {
    fn from(kind: QuestionKindEntity) -> Self {
        match kind {
            QuestionKindEntity::Single => QuestionKindDto::Single,
            QuestionKindEntity::Multiple => QuestionKindDto::Multiple,
            QuestionKindEntity::TrueFalse => QuestionKindDto::TrueFalse,
        }
    }
}

impl From<QuestionKind> for QuestionKindDto {
    fn from(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::Single => QuestionKindDto::Single,
            QuestionKind::Multiple => QuestionKindDto::Multiple,
            QuestionKind::TrueFalse => QuestionKindDto::TrueFalse,
        }
    }
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            name: game.name,
            owner: game.owner,
            questions: game.questions.into_iter().map(Into::into).collect(),
            active: game.active.map(|id| id.value()),
            history: game.history.into_iter().map(|id| id.value()).collect(),
        }
    }
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            text: question.text,
            kind: question.kind.into(),
            duration: question.duration.as_secs(),
            points: question.points,
            options: question
                .options
                .into_iter()
                .map(|option| AnswerOptionSummary {
                    id: option.id,
                    text: option.text,
                    correct: option.correct,
                })
                .collect(),
            media: question.media,
        }
    }
}

impl From<&Question> for QuestionSummary {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            kind: question.kind.into(),
            duration: question.duration.as_secs(),
            points: question.points,
            options: question.options.iter().map(Into::into).collect(),
            media: question.media.clone(),
        }
    }
}

impl From<&AnswerOption> for AnswerOptionSummary {
    fn from(option: &AnswerOption) -> Self {
        Self {
            id: option.id.clone(),
            text: option.text.clone(),
            correct: option.correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "games": [{
                "name": "Capitals",
                "questions": [{
                    "text": "Capital of France?",
                    "type": "single",
                    "duration": 20,
                    "points": 100,
                    "options": [
                        {"id": "a1", "text": "Paris", "correct": true},
                        {"id": "a2", "text": "Lyon"}
                    ]
                }]
            }]
        })
    }

    #[test]
    fn replace_request_parses_and_validates() {
        let request: ReplaceGamesRequest = serde_json::from_value(payload()).unwrap();
        assert!(request.validate().is_ok());

        let game = request.games.into_iter().next().unwrap();
        let entity = game.into_entity(Uuid::nil(), "owner@example.com");
        assert_eq!(entity.owner, "owner@example.com");
        assert_eq!(entity.questions[0].duration, Duration::from_secs(20));
        assert!(!entity.questions[0].options[1].correct);
        assert!(entity.active.is_none());
    }

    #[test]
    fn invalid_questions_fail_validation() {
        let mut value = payload();
        value["games"][0]["questions"][0]["duration"] = json!(0);
        value["games"][0]["questions"][0]["options"][1]["id"] = json!("a1");
        let request: ReplaceGamesRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());

        let question = &request.games[0].questions[0];
        let errors = question.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("duration"));
        assert!(fields.contains_key("options"));
        assert!(!fields.contains_key("text"));
    }

    #[test]
    fn blank_game_name_fails_validation() {
        let mut value = payload();
        value["games"][0]["name"] = json!("");
        let request: ReplaceGamesRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());
    }
}
