//! Fixtures shared by unit tests.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        memory::MemoryCatalog,
        models::{AnswerOptionEntity, GameEntity, QuestionEntity, QuestionKindEntity},
    },
    state::{
        AppState, SharedState,
        session::{AnswerOption, Question, QuestionKind, Session, SessionId},
        store::SessionRecord,
    },
};

pub const OWNER: &str = "quizmaster@example.com";

/// Fixed instant `seconds` after an arbitrary epoch.
pub fn at(seconds: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + seconds)
}

pub fn option(id: &str, correct: bool) -> AnswerOption {
    AnswerOption {
        id: id.into(),
        text: format!("option {id}"),
        correct,
    }
}

/// Single-choice question unless more than one option is correct.
pub fn question(duration_secs: u64, points: u32, options: &[(&str, bool)]) -> Question {
    let correct = options.iter().filter(|(_, correct)| *correct).count();
    Question {
        id: Uuid::new_v4(),
        text: "Which one?".into(),
        kind: if correct > 1 {
            QuestionKind::Multiple
        } else {
            QuestionKind::Single
        },
        duration: Duration::from_secs(duration_secs),
        points,
        options: options
            .iter()
            .map(|(id, correct)| option(id, *correct))
            .collect(),
        media: None,
    }
}

pub fn question_entity(kind: QuestionKindEntity, options: &[(&str, bool)]) -> QuestionEntity {
    QuestionEntity {
        id: Uuid::new_v4(),
        text: "Which one?".into(),
        kind,
        duration: Duration::from_secs(10),
        points: 100,
        options: options
            .iter()
            .map(|(id, correct)| AnswerOptionEntity {
                id: id.to_string(),
                text: format!("option {id}"),
                correct: *correct,
            })
            .collect(),
        media: None,
    }
}

/// Single-choice question entity with custom timing and points.
pub fn timed_question_entity(
    duration_secs: u64,
    points: u32,
    options: &[(&str, bool)],
) -> QuestionEntity {
    QuestionEntity {
        duration: Duration::from_secs(duration_secs),
        points,
        ..question_entity(QuestionKindEntity::Single, options)
    }
}

pub fn game_entity(owner: &str, questions: Vec<QuestionEntity>) -> GameEntity {
    GameEntity {
        id: Uuid::new_v4(),
        name: "Trivia night".into(),
        owner: owner.into(),
        questions,
        active: None,
        history: Vec::new(),
    }
}

/// Lobby session record holding `questions`.
pub fn record_with(questions: Vec<Question>) -> SessionRecord {
    SessionRecord {
        session: Session::new(
            SessionId::from(424_242),
            Uuid::new_v4(),
            OWNER.into(),
            questions,
            at(0),
        ),
        players: IndexMap::new(),
    }
}

/// Application state over an in-memory catalog holding `games`.
pub fn state_with(config: AppConfig, games: Vec<GameEntity>) -> (SharedState, MemoryCatalog) {
    let catalog = MemoryCatalog::with_games(games);
    let state = AppState::new(config, Arc::new(catalog.clone()));
    (state, catalog)
}
