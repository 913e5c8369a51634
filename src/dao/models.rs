use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use uuid::Uuid;

use crate::state::session::SessionId;

/// Game definition as held by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the quiz.
    pub name: String,
    /// Account owning the game; only the owner may drive its sessions.
    pub owner: String,
    /// Ordered questions.
    #[serde(default)]
    pub questions: Vec<QuestionEntity>,
    /// Session currently running for this game, if any.
    #[serde(default)]
    pub active: Option<SessionId>,
    /// Past sessions, oldest first.
    #[serde(default)]
    pub history: Vec<SessionId>,
}

/// Question kind tag as stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKindEntity {
    /// One correct option.
    Single,
    /// At least one correct option.
    Multiple,
    /// Two options, one correct.
    #[serde(rename = "truefalse")]
    TrueFalse,
}

/// Question entry of a game.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier of the question.
    pub id: Uuid,
    /// Question prompt.
    pub text: String,
    /// Question kind.
    #[serde(rename = "type")]
    pub kind: QuestionKindEntity,
    /// Answer window, stored in whole seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub duration: Duration,
    /// Points for a correct answer.
    pub points: u32,
    /// Ordered answer options.
    pub options: Vec<AnswerOptionEntity>,
    /// Optional media reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

/// Answer option of a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerOptionEntity {
    /// Identifier players submit.
    pub id: String,
    /// Display text.
    pub text: String,
    /// Whether the option belongs to the correct answer set.
    pub correct: bool,
}
