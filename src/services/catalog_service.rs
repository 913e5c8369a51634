use std::collections::{BTreeSet, HashSet};

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::game::{GameSummary, GamesResponse, ReplaceGamesRequest},
    error::ServiceError,
    services::session_service::ensure_owner,
    state::{SharedState, session::Question},
};

/// Games owned by `owner`.
pub async fn list_games(state: &SharedState, owner: &str) -> Result<GamesResponse, ServiceError> {
    let games = state
        .call_catalog("list_games", state.catalog().list_games(owner))
        .await?;
    Ok(GamesResponse {
        games: games.into_iter().map(GameSummary::from).collect(),
    })
}

/// Replace every game owned by `owner` with `request.games`.
///
/// Session bookkeeping (`active`, `history`) of kept games is preserved, and
/// a game with a running session cannot be dropped.
pub async fn replace_games(
    state: &SharedState,
    owner: &str,
    request: ReplaceGamesRequest,
) -> Result<GamesResponse, ServiceError> {
    let existing = state
        .call_catalog("list_games", state.catalog().list_games(owner))
        .await?;

    let mut seen = HashSet::new();
    let mut incoming = Vec::with_capacity(request.games.len());
    for input in request.games {
        let id = input.id.unwrap_or_else(Uuid::new_v4);
        if !seen.insert(id) {
            return Err(ServiceError::InvalidInput(format!(
                "game `{id}` is listed more than once"
            )));
        }
        let game = input.into_entity(id, owner);
        for question in &game.questions {
            Question::try_from(question.clone())?;
        }
        incoming.push(game);
    }

    let removed: Vec<Uuid> = existing
        .iter()
        .map(|game| game.id)
        .filter(|id| !seen.contains(id))
        .collect();

    // Gates are taken in id order so two replacements never wait on each other in a cycle.
    let involved: BTreeSet<Uuid> = seen.iter().copied().chain(removed.iter().copied()).collect();
    let mut gates = Vec::with_capacity(involved.len());
    for id in &involved {
        gates.push(state.sessions().lock_game(*id).await);
    }

    for game in &mut incoming {
        let current = state
            .call_catalog("find_game", state.catalog().find_game(game.id))
            .await?;
        if let Some(current) = current {
            ensure_owner(&current.owner, owner, &format!("game `{}`", current.id))?;
            game.active = current.active;
            game.history = current.history;
        }
    }

    for id in &removed {
        let current = state
            .call_catalog("find_game", state.catalog().find_game(*id))
            .await?;
        let running = state.sessions().active_for(*id).is_some()
            || current.is_some_and(|game| game.active.is_some());
        if running {
            return Err(ServiceError::InvalidState(format!(
                "game `{id}` has a running session and cannot be removed"
            )));
        }
    }

    let kept = incoming.len();
    for game in incoming {
        state
            .call_catalog("replace_game", state.catalog().replace_game(game))
            .await?;
    }
    for id in &removed {
        state
            .call_catalog("delete_game", state.catalog().delete_game(*id))
            .await?;
    }
    drop(gates);
    info!(owner, kept, removed = removed.len(), "games replaced");

    list_games(state, owner).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::catalog::GameCatalog,
        services::session_service::start_session,
        test_support::{OWNER, at, game_entity, state_with, timed_question_entity},
    };

    fn request(value: serde_json::Value) -> ReplaceGamesRequest {
        serde_json::from_value(value).unwrap()
    }

    fn one_question() -> serde_json::Value {
        json!([{
            "text": "2 + 2?",
            "type": "single",
            "duration": 10,
            "points": 10,
            "options": [
                {"id": "four", "text": "4", "correct": true},
                {"id": "five", "text": "5"}
            ]
        }])
    }

    #[tokio::test]
    async fn replace_creates_updates_and_removes() {
        let kept = game_entity(OWNER, Vec::new());
        let dropped = game_entity(OWNER, Vec::new());
        let foreign = game_entity("other@example.com", Vec::new());
        let (kept_id, dropped_id, foreign_id) = (kept.id, dropped.id, foreign.id);
        let (state, catalog) = state_with(AppConfig::default(), vec![kept, dropped, foreign]);

        let response = replace_games(
            &state,
            OWNER,
            request(json!({"games": [
                {"id": kept_id, "name": "Renamed", "questions": one_question()},
                {"name": "Brand new"}
            ]})),
        )
        .await
        .unwrap();

        assert_eq!(response.games.len(), 2);
        let renamed = catalog.find_game(kept_id).await.unwrap().unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.questions.len(), 1);
        assert!(catalog.find_game(dropped_id).await.unwrap().is_none());
        assert!(catalog.find_game(foreign_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn replace_keeps_session_bookkeeping_and_running_games() {
        let game = game_entity(OWNER, vec![timed_question_entity(10, 10, &[("a", true)])]);
        let game_id = game.id;
        let (state, catalog) = state_with(AppConfig::default(), vec![game]);
        let session_id = start_session(&state, OWNER, game_id, || at(0)).await.unwrap();

        let err = replace_games(&state, OWNER, request(json!({"games": []})))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        replace_games(
            &state,
            OWNER,
            request(json!({"games": [{"id": game_id, "name": "Edited"}]})),
        )
        .await
        .unwrap();
        let stored = catalog.find_game(game_id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Edited");
        assert_eq!(stored.active, Some(session_id));
    }

    #[tokio::test]
    async fn replace_rejects_foreign_ids_and_bad_questions() {
        let foreign = game_entity("other@example.com", Vec::new());
        let foreign_id = foreign.id;
        let (state, _) = state_with(AppConfig::default(), vec![foreign]);

        let err = replace_games(
            &state,
            OWNER,
            request(json!({"games": [{"id": foreign_id, "name": "Mine now"}]})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let mut questions = one_question();
        questions[0]["options"][0]["correct"] = json!(false);
        let err = replace_games(
            &state,
            OWNER,
            request(json!({"games": [{"name": "Broken", "questions": questions}]})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(list_games(&state, OWNER).await.unwrap().games.is_empty());
    }
}
