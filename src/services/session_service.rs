use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::models::GameEntity,
    dto::{
        admin::{MutationResponse, MutationStatus, MutationType, SessionStatusResponse},
        results::SessionResultsResponse,
    },
    error::ServiceError,
    services::results,
    state::{
        SharedState,
        session::{GameId, Question, Session, SessionId},
        state_machine::{SessionEvent, SessionPhase},
        store::SessionHandle,
    },
};

/// Result of an advance command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The question at `position` is now open.
    Opened {
        /// Index of the opened question.
        position: usize,
    },
    /// The last question was already open; the session has ended.
    Finished,
}

/// Fail with an access error unless `caller` is `owner`.
pub(crate) fn ensure_owner(owner: &str, caller: &str, what: &str) -> Result<(), ServiceError> {
    if owner == caller {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!("{what} is not owned by the caller")))
    }
}

/// Resolve a session by join code.
pub(crate) fn session_handle(
    state: &SharedState,
    session_id: SessionId,
) -> Result<SessionHandle, ServiceError> {
    state
        .sessions()
        .get(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))
}

async fn load_owned_game(
    state: &SharedState,
    owner: &str,
    game_id: GameId,
) -> Result<GameEntity, ServiceError> {
    let game = state
        .call_catalog("find_game", state.catalog().find_game(game_id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;
    ensure_owner(&game.owner, owner, &format!("game `{game_id}`"))?;
    Ok(game)
}

/// Running session of `game_id`, checked against the owner captured at start.
///
/// The catalog is only consulted when nothing is running, to tell an unknown
/// or foreign game apart from one that is merely idle.
async fn owned_running_session(
    state: &SharedState,
    owner: &str,
    game_id: GameId,
) -> Result<(SessionId, SessionHandle), ServiceError> {
    let Some(session_id) = state.sessions().active_for(game_id) else {
        load_owned_game(state, owner, game_id).await?;
        return Err(ServiceError::InvalidState(format!(
            "game `{game_id}` has no running session"
        )));
    };
    let handle = session_handle(state, session_id)?;
    ensure_owner(
        &handle.read().await.session.owner,
        owner,
        &format!("game `{game_id}`"),
    )?;
    Ok((session_id, handle))
}

/// Clear the game's active pointer and append `session_id` to its history.
async fn archive(
    state: &SharedState,
    mut game: GameEntity,
    session_id: SessionId,
) -> Result<(), ServiceError> {
    game.active = None;
    if !game.history.contains(&session_id) {
        game.history.push(session_id);
    }
    state
        .call_catalog("replace_game", state.catalog().replace_game(game))
        .await
}

/// Create a session in the lobby for `game_id`, capturing its questions.
///
/// Nothing is registered unless the catalog accepted the new active pointer.
pub async fn start_session(
    state: &SharedState,
    owner: &str,
    game_id: GameId,
    clock: impl FnOnce() -> SystemTime,
) -> Result<SessionId, ServiceError> {
    let _gate = state.sessions().lock_game(game_id).await;
    let mut game = load_owned_game(state, owner, game_id).await?;

    if let Some(running) = state.sessions().active_for(game_id).or(game.active) {
        return Err(ServiceError::InvalidState(format!(
            "game `{game_id}` already has a running session `{running}`"
        )));
    }

    let questions = game
        .questions
        .iter()
        .cloned()
        .map(Question::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let question_count = questions.len();

    let session_id = state.sessions().reserve_id();
    game.active = Some(session_id);
    if let Err(err) = state
        .call_catalog("replace_game", state.catalog().replace_game(game))
        .await
    {
        state.sessions().release_id(session_id);
        return Err(err);
    }

    state.sessions().insert(Session::new(
        session_id,
        game_id,
        owner.to_owned(),
        questions,
        clock(),
    ));
    info!(%game_id, %session_id, question_count, "session started");
    Ok(session_id)
}

/// Open the next question, or end the session when the last one is already open.
///
/// Only the advance that ends the session touches the catalog.
pub async fn advance_session(
    state: &SharedState,
    owner: &str,
    game_id: GameId,
    clock: impl FnOnce() -> SystemTime,
) -> Result<(SessionId, AdvanceOutcome), ServiceError> {
    let _gate = state.sessions().lock_game(game_id).await;
    let (session_id, handle) = owned_running_session(state, owner, game_id).await?;

    let ((), phase) = state
        .run_transition(&handle, SessionEvent::Advance, clock, |plan| async move {
            if plan.to.is_ended() {
                let game = load_owned_game(state, owner, game_id).await?;
                archive(state, game, session_id).await
            } else {
                Ok(())
            }
        })
        .await?;

    match phase {
        SessionPhase::Active { position } => {
            info!(%game_id, %session_id, position, "question opened");
            Ok((session_id, AdvanceOutcome::Opened { position }))
        }
        SessionPhase::Ended { .. } => {
            state.sessions().mark_ended(game_id, session_id);
            info!(%game_id, %session_id, "session finished after last question");
            Ok((session_id, AdvanceOutcome::Finished))
        }
        SessionPhase::Lobby => Err(ServiceError::InvalidState(
            "advance left the session in the lobby".into(),
        )),
    }
}

/// End the running session of `game_id`.
///
/// A catalog pointer naming a session this process does not hold is cleared
/// and archived so the game can be started again.
pub async fn end_session(
    state: &SharedState,
    owner: &str,
    game_id: GameId,
    clock: impl FnOnce() -> SystemTime,
) -> Result<SessionId, ServiceError> {
    let _gate = state.sessions().lock_game(game_id).await;

    let Some(session_id) = state.sessions().active_for(game_id) else {
        let game = load_owned_game(state, owner, game_id).await?;
        return match game.active {
            Some(stale) => {
                warn!(%game_id, session_id = %stale, "clearing stale active session pointer");
                archive(state, game, stale).await?;
                Ok(stale)
            }
            None => Err(ServiceError::InvalidState(format!(
                "game `{game_id}` has no running session"
            ))),
        };
    };
    let handle = session_handle(state, session_id)?;
    ensure_owner(
        &handle.read().await.session.owner,
        owner,
        &format!("game `{game_id}`"),
    )?;

    state
        .run_transition(&handle, SessionEvent::End, clock, |_| async move {
            let game = load_owned_game(state, owner, game_id).await?;
            archive(state, game, session_id).await
        })
        .await?;
    state.sessions().mark_ended(game_id, session_id);
    info!(%game_id, %session_id, "session ended");
    Ok(session_id)
}

/// Dispatch a lifecycle command.
pub async fn mutate_game(
    state: &SharedState,
    owner: &str,
    game_id: GameId,
    mutation: MutationType,
    clock: impl FnOnce() -> SystemTime,
) -> Result<MutationResponse, ServiceError> {
    let response = match mutation {
        MutationType::Start => {
            let session_id = start_session(state, owner, game_id, clock).await?;
            MutationResponse {
                status: MutationStatus::Started,
                session_id: session_id.value(),
                position: None,
            }
        }
        MutationType::Advance => match advance_session(state, owner, game_id, clock).await? {
            (session_id, AdvanceOutcome::Opened { position }) => MutationResponse {
                status: MutationStatus::Advanced,
                session_id: session_id.value(),
                position: Some(position),
            },
            (session_id, AdvanceOutcome::Finished) => MutationResponse {
                status: MutationStatus::Ended,
                session_id: session_id.value(),
                position: None,
            },
        },
        MutationType::End => {
            let session_id = end_session(state, owner, game_id, clock).await?;
            MutationResponse {
                status: MutationStatus::Ended,
                session_id: session_id.value(),
                position: None,
            }
        }
    };
    Ok(response)
}

/// Owner view of a session.
pub async fn session_status(
    state: &SharedState,
    owner: &str,
    session_id: SessionId,
    now: SystemTime,
) -> Result<SessionStatusResponse, ServiceError> {
    let handle = session_handle(state, session_id)?;
    let record = handle.read().await;
    ensure_owner(&record.session.owner, owner, &format!("session `{session_id}`"))?;
    Ok(SessionStatusResponse::snapshot(&record, now))
}

/// Leaderboard and statistics of a session.
pub async fn session_results(
    state: &SharedState,
    owner: &str,
    session_id: SessionId,
) -> Result<SessionResultsResponse, ServiceError> {
    let handle = session_handle(state, session_id)?;
    let record = handle.read().await;
    ensure_owner(&record.session.owner, owner, &format!("session `{session_id}`"))?;
    let computed = results::compute(&record.session, record.players.values());
    Ok(SessionResultsResponse::new(
        session_id.value(),
        record.session.status(),
        computed,
    ))
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use futures::{FutureExt, future::BoxFuture};
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            catalog::{CatalogError, CatalogResult, GameCatalog},
            memory::MemoryCatalog,
        },
        services::player_service::{join_session, player_question, submit_answer},
        state::{AppState, session::SessionStatus},
        test_support::{OWNER, at, game_entity, state_with, timed_question_entity},
    };

    fn two_question_game() -> GameEntity {
        game_entity(
            OWNER,
            vec![
                timed_question_entity(10, 100, &[("a1", true), ("a2", false)]),
                timed_question_entity(20, 50, &[("b1", true), ("b2", false)]),
            ],
        )
    }

    async fn status(state: &SharedState, session_id: SessionId) -> SessionStatus {
        let handle = session_handle(state, session_id).unwrap();
        let record = handle.read().await;
        record.session.status()
    }

    #[tokio::test]
    async fn start_registers_session_and_catalog_pointer() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, catalog) = state_with(AppConfig::default(), vec![game]);

        let session_id = start_session(&state, OWNER, game_id, || at(0)).await.unwrap();

        assert_eq!(status(&state, session_id).await, SessionStatus::Lobby);
        assert_eq!(state.sessions().active_for(game_id), Some(session_id));
        let stored = catalog.find_game(game_id).await.unwrap().unwrap();
        assert_eq!(stored.active, Some(session_id));
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_running() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);

        start_session(&state, OWNER, game_id, || at(0)).await.unwrap();
        let err = start_session(&state, OWNER, game_id, || at(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(state.sessions().session_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_starts_yield_a_single_session() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);

        let (left, right) = tokio::join!(
            start_session(&state, OWNER, game_id, || at(0)),
            start_session(&state, OWNER, game_id, || at(0)),
        );
        assert_eq!(left.is_ok() as u8 + right.is_ok() as u8, 1);
        assert_eq!(state.sessions().session_count(), 1);
    }

    #[tokio::test]
    async fn unknown_or_foreign_game_is_an_access_error() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);

        let err = start_session(&state, OWNER, Uuid::new_v4(), || at(0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = start_session(&state, "intruder@example.com", game_id, || at(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn invalid_questions_prevent_start() {
        let mut game = two_question_game();
        game.questions[0].options.iter_mut().for_each(|o| o.correct = false);
        let game_id = game.id;
        let (state, catalog) = state_with(AppConfig::default(), vec![game]);

        let err = start_session(&state, OWNER, game_id, || at(0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(state.sessions().session_count(), 0);
        assert!(catalog.find_game(game_id).await.unwrap().unwrap().active.is_none());
    }

    #[tokio::test]
    async fn advancing_walks_questions_then_archives() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, catalog) = state_with(AppConfig::default(), vec![game]);
        let session_id = start_session(&state, OWNER, game_id, || at(0)).await.unwrap();

        let first = advance_session(&state, OWNER, game_id, || at(1)).await.unwrap();
        assert_eq!(first, (session_id, AdvanceOutcome::Opened { position: 0 }));
        let second = advance_session(&state, OWNER, game_id, || at(20)).await.unwrap();
        assert_eq!(second, (session_id, AdvanceOutcome::Opened { position: 1 }));
        let last = advance_session(&state, OWNER, game_id, || at(50)).await.unwrap();
        assert_eq!(last, (session_id, AdvanceOutcome::Finished));

        assert_eq!(status(&state, session_id).await, SessionStatus::Ended);
        assert_eq!(state.sessions().active_for(game_id), None);
        let stored = catalog.find_game(game_id).await.unwrap().unwrap();
        assert_eq!(stored.active, None);
        assert_eq!(stored.history, vec![session_id]);

        let err = advance_session(&state, OWNER, game_id, || at(60)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let restarted = start_session(&state, OWNER, game_id, || at(70)).await.unwrap();
        assert_ne!(restarted, session_id);
    }

    #[tokio::test]
    async fn end_from_lobby_keeps_session_readable() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);
        let session_id = start_session(&state, OWNER, game_id, || at(0)).await.unwrap();

        let ended = end_session(&state, OWNER, game_id, || at(2)).await.unwrap();
        assert_eq!(ended, session_id);

        let snapshot = session_status(&state, OWNER, session_id, at(3)).await.unwrap();
        assert!(!snapshot.active);
        assert_eq!(snapshot.position, -1);

        let err = end_session(&state, OWNER, game_id, || at(4)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn end_clears_stale_catalog_pointer() {
        let mut game = two_question_game();
        let stale = SessionId::from(777_777);
        game.active = Some(stale);
        let game_id = game.id;
        let (state, catalog) = state_with(AppConfig::default(), vec![game]);

        let err = start_session(&state, OWNER, game_id, || at(0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        assert_eq!(end_session(&state, OWNER, game_id, || at(1)).await.unwrap(), stale);
        let stored = catalog.find_game(game_id).await.unwrap().unwrap();
        assert_eq!(stored.active, None);
        assert_eq!(stored.history, vec![stale]);
        assert!(start_session(&state, OWNER, game_id, || at(2)).await.is_ok());
    }

    #[tokio::test]
    async fn status_and_results_are_owner_only() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);
        let session_id = start_session(&state, OWNER, game_id, || at(0)).await.unwrap();

        let err = session_status(&state, "intruder@example.com", session_id, at(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = session_results(&state, "intruder@example.com", session_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = session_status(&state, OWNER, SessionId::from(1), at(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let results = session_results(&state, OWNER, session_id).await.unwrap();
        assert_eq!(results.average_score, 0.0);
        assert!(results.leaderboard.is_empty());
    }

    /// Catalog that serves reads from memory but fails every write.
    struct ReadOnlyCatalog {
        inner: MemoryCatalog,
        hang: bool,
    }

    impl GameCatalog for ReadOnlyCatalog {
        fn find_game(&self, id: GameId) -> BoxFuture<'static, CatalogResult<Option<GameEntity>>> {
            self.inner.find_game(id)
        }

        fn list_games(&self, owner: &str) -> BoxFuture<'static, CatalogResult<Vec<GameEntity>>> {
            self.inner.list_games(owner)
        }

        fn replace_game(&self, _game: GameEntity) -> BoxFuture<'static, CatalogResult<()>> {
            if self.hang {
                return futures::future::pending().boxed();
            }
            futures::future::ready(Err(CatalogError::unavailable(
                "read-only catalog".into(),
                std::io::Error::other("writes disabled"),
            )))
            .boxed()
        }

        fn delete_game(&self, id: GameId) -> BoxFuture<'static, CatalogResult<bool>> {
            self.inner.delete_game(id)
        }

        fn health_check(&self) -> BoxFuture<'static, CatalogResult<()>> {
            self.inner.health_check()
        }
    }

    #[tokio::test]
    async fn failing_catalog_write_leaves_no_session() {
        let game = two_question_game();
        let game_id = game.id;
        let catalog = ReadOnlyCatalog {
            inner: MemoryCatalog::with_games(vec![game]),
            hang: false,
        };
        let state = AppState::new(AppConfig::default(), Arc::new(catalog));

        let err = start_session(&state, OWNER, game_id, || at(0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(state.sessions().session_count(), 0);
        assert_eq!(state.sessions().active_for(game_id), None);
    }

    #[tokio::test]
    async fn timed_out_archive_aborts_the_end_transition() {
        let game = two_question_game();
        let game_id = game.id;
        let memory = MemoryCatalog::with_games(vec![game.clone()]);
        let healthy = AppState::new(AppConfig::default(), Arc::new(memory.clone()));
        let session_id = start_session(&healthy, OWNER, game_id, || at(0)).await.unwrap();
        advance_session(&healthy, OWNER, game_id, || at(1)).await.unwrap();
        let handle = session_handle(&healthy, session_id).unwrap();

        // Re-host the same session record behind a catalog whose writes never finish.
        let hanging = AppState::new(
            AppConfig::default().with_catalog_timeout(Some(Duration::from_millis(20))),
            Arc::new(ReadOnlyCatalog {
                inner: memory,
                hang: true,
            }),
        );
        let version_before = handle.read().await.session.version();

        let err = hanging
            .run_transition(&handle, SessionEvent::End, || at(2), |_| {
                hanging.call_catalog("replace_game", hanging.catalog().replace_game(game))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));

        let record = handle.read().await;
        assert_eq!(record.session.status(), SessionStatus::Active);
        assert_eq!(record.session.version(), version_before);
        drop(record);

        let retried = advance_session(&healthy, OWNER, game_id, || at(3)).await.unwrap();
        assert_eq!(retried, (session_id, AdvanceOutcome::Opened { position: 1 }));
    }

    /// Memory catalog whose lookups are slow and counted.
    struct SlowCatalog {
        inner: MemoryCatalog,
        delay: Duration,
        finds: Arc<AtomicUsize>,
    }

    impl GameCatalog for SlowCatalog {
        fn find_game(&self, id: GameId) -> BoxFuture<'static, CatalogResult<Option<GameEntity>>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            let lookup = self.inner.find_game(id);
            async move {
                tokio::time::sleep(delay).await;
                lookup.await
            }
            .boxed()
        }

        fn list_games(&self, owner: &str) -> BoxFuture<'static, CatalogResult<Vec<GameEntity>>> {
            self.inner.list_games(owner)
        }

        fn replace_game(&self, game: GameEntity) -> BoxFuture<'static, CatalogResult<()>> {
            self.inner.replace_game(game)
        }

        fn delete_game(&self, id: GameId) -> BoxFuture<'static, CatalogResult<bool>> {
            self.inner.delete_game(id)
        }

        fn health_check(&self) -> BoxFuture<'static, CatalogResult<()>> {
            self.inner.health_check()
        }
    }

    fn three_question_game() -> GameEntity {
        game_entity(
            OWNER,
            vec![
                timed_question_entity(10, 10, &[("a1", true), ("a2", false)]),
                timed_question_entity(10, 10, &[("b1", true), ("b2", false)]),
                timed_question_entity(10, 10, &[("c1", true), ("c2", false)]),
            ],
        )
    }

    #[tokio::test]
    async fn slow_catalog_does_not_shorten_opened_windows() {
        let game = two_question_game();
        let game_id = game.id;
        let finds = Arc::new(AtomicUsize::new(0));
        let catalog = SlowCatalog {
            inner: MemoryCatalog::with_games(vec![game]),
            delay: Duration::from_millis(200),
            finds: finds.clone(),
        };
        let state = AppState::new(AppConfig::default(), Arc::new(catalog));
        let session_id = start_session(&state, OWNER, game_id, SystemTime::now)
            .await
            .unwrap();
        let player = join_session(&state, session_id, "P1", SystemTime::now())
            .await
            .unwrap()
            .player_id;

        let lookups = finds.load(Ordering::SeqCst);
        advance_session(&state, OWNER, game_id, SystemTime::now)
            .await
            .unwrap();
        assert_eq!(finds.load(Ordering::SeqCst), lookups);

        let question = player_question(&state, player, SystemTime::now())
            .await
            .unwrap();
        assert!(question.remaining_ms > 9_900, "{}", question.remaining_ms);

        advance_session(&state, OWNER, game_id, SystemTime::now)
            .await
            .unwrap();
        let last = advance_session(&state, OWNER, game_id, SystemTime::now)
            .await
            .unwrap();
        assert_eq!(last, (session_id, AdvanceOutcome::Finished));
        assert_eq!(finds.load(Ordering::SeqCst), lookups + 1);
    }

    #[tokio::test]
    async fn queued_advance_opens_its_window_when_it_commits() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);
        let session_id = start_session(&state, OWNER, game_id, SystemTime::now)
            .await
            .unwrap();

        let gate = state.sessions().lock_game(game_id).await;
        let queued = tokio::spawn({
            let state = state.clone();
            async move { advance_session(&state, OWNER, game_id, SystemTime::now).await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        let released = SystemTime::now();
        drop(gate);

        let outcome = queued.await.unwrap().unwrap();
        assert_eq!(outcome, (session_id, AdvanceOutcome::Opened { position: 0 }));
        let handle = session_handle(&state, session_id).unwrap();
        let started_at = handle.read().await.session.question_started_at().unwrap();
        assert!(started_at >= released);
    }

    #[tokio::test]
    async fn concurrent_advances_open_consecutive_positions() {
        let game = three_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);
        let session_id = start_session(&state, OWNER, game_id, || at(0)).await.unwrap();
        let handle = session_handle(&state, session_id).unwrap();
        let version_before = handle.read().await.session.version();

        let advances = (0..3).map(|_| {
            let state = state.clone();
            tokio::spawn(async move { advance_session(&state, OWNER, game_id, || at(1)).await })
        });
        let mut positions: Vec<usize> = futures::future::join_all(advances)
            .await
            .into_iter()
            .map(|joined| match joined.unwrap().unwrap() {
                (_, AdvanceOutcome::Opened { position }) => position,
                (_, AdvanceOutcome::Finished) => panic!("session finished early"),
            })
            .collect();
        positions.sort_unstable();

        assert_eq!(positions, vec![0, 1, 2]);
        let record = handle.read().await;
        assert_eq!(record.session.version(), version_before + 3);
        assert_eq!(record.session.position(), Some(2));
    }

    #[tokio::test]
    async fn submissions_racing_an_advance_land_on_the_open_question() {
        let game = two_question_game();
        let game_id = game.id;
        let (state, _) = state_with(AppConfig::default(), vec![game]);
        let session_id = start_session(&state, OWNER, game_id, || at(0)).await.unwrap();
        let mut players = Vec::new();
        for index in 0..8 {
            let name = format!("P{index}");
            players.push(join_session(&state, session_id, &name, at(0)).await.unwrap().player_id);
        }
        advance_session(&state, OWNER, game_id, || at(1)).await.unwrap();

        let mut submissions = Vec::new();
        for player in &players {
            for choice in ["a1", "b1"] {
                let state = state.clone();
                let player = *player;
                submissions.push(tokio::spawn(async move {
                    let accepted =
                        submit_answer(&state, player, &[choice.to_string()], at(2)).await;
                    (choice, accepted.is_ok())
                }));
            }
        }
        let advance = tokio::spawn({
            let state = state.clone();
            async move { advance_session(&state, OWNER, game_id, || at(2)).await }
        });

        let mut accepted = Vec::new();
        for handle in futures::future::join_all(submissions).await {
            accepted.push(handle.unwrap());
        }
        assert_eq!(
            advance.await.unwrap().unwrap(),
            (session_id, AdvanceOutcome::Opened { position: 1 })
        );

        let handle = session_handle(&state, session_id).unwrap();
        let record = handle.read().await;
        let mut recorded = [0usize; 2];
        for player in record.players.values() {
            for (index, slot) in player.answers.iter().enumerate() {
                let Some(answer) = slot else { continue };
                let (expected, started) = if index == 0 { ("a1", at(1)) } else { ("b1", at(2)) };
                assert_eq!(answer.question_index, index);
                assert_eq!(answer.question_started_at, started);
                assert!(answer.option_ids.contains(expected));
                assert!(answer.correct);
                recorded[index] += 1;
            }
        }
        let accepted_first = accepted.iter().filter(|(c, ok)| *ok && *c == "a1").count();
        let accepted_second = accepted.iter().filter(|(c, ok)| *ok && *c == "b1").count();
        assert_eq!(recorded, [accepted_first, accepted_second]);
    }
}
