use std::time::SystemTime;

use tracing::{debug, info};

use crate::{
    dto::play::{
        CorrectAnswerResponse, JoinResponse, PlayerQuestionResponse, PlayerResultsResponse,
        PlayerStatusResponse,
    },
    error::ServiceError,
    services::{results, session_service::session_handle},
    state::{
        SharedState,
        player::{PlayError, PlayerId},
        session::{OptionId, SessionId, SessionStatus},
        store::SessionHandle,
    },
};

fn player_handle(state: &SharedState, player_id: PlayerId) -> Result<SessionHandle, ServiceError> {
    let session_id = state
        .players()
        .session_of(player_id)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?;
    session_handle(state, session_id)
}

/// Add a player to a session in the lobby (or a running one when late joins are allowed).
pub async fn join_session(
    state: &SharedState,
    session_id: SessionId,
    name: &str,
    now: SystemTime,
) -> Result<JoinResponse, ServiceError> {
    let handle = session_handle(state, session_id)?;
    let player_id = {
        let mut record = handle.write().await;
        record.join(name, state.config().late_join(), now)?
    };
    state.players().register(player_id, session_id);
    info!(%session_id, %player_id, "player joined");
    Ok(JoinResponse { player_id })
}

/// Whether the player's session has started and whether it is over.
pub async fn player_status(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<PlayerStatusResponse, ServiceError> {
    let handle = player_handle(state, player_id)?;
    let record = handle.read().await;
    if !record.players.contains_key(&player_id) {
        return Err(PlayError::UnknownPlayer(player_id).into());
    }
    Ok(PlayerStatusResponse {
        started: record.session.position().is_some(),
        finished: record.session.status() == SessionStatus::Ended,
    })
}

/// Current question without its answer key, plus the remaining time.
pub async fn player_question(
    state: &SharedState,
    player_id: PlayerId,
    now: SystemTime,
) -> Result<PlayerQuestionResponse, ServiceError> {
    let handle = player_handle(state, player_id)?;
    let record = handle.read().await;
    let session = &record.session;
    if session.status() == SessionStatus::Ended {
        return Err(PlayError::Finished.into());
    }
    let (position, question) = session.current_question().ok_or(PlayError::NotStarted)?;
    let started_at = session
        .question_started_at()
        .ok_or(PlayError::NotStarted)?;
    Ok(PlayerQuestionResponse::new(
        position,
        question,
        started_at,
        session.remaining(now),
    ))
}

/// Judge and record an answer to the open question.
pub async fn submit_answer(
    state: &SharedState,
    player_id: PlayerId,
    answers: &[OptionId],
    now: SystemTime,
) -> Result<(), ServiceError> {
    let handle = player_handle(state, player_id)?;
    let mut record = handle.write().await;
    match record.submit(player_id, answers, now) {
        Ok(accepted) => {
            debug!(
                %player_id,
                question = accepted.question_index,
                correct = accepted.correct,
                "answer recorded"
            );
            Ok(())
        }
        Err(err) => {
            debug!(%player_id, error = %err, "answer rejected");
            Err(err.into())
        }
    }
}

/// Correct options of the current question once its window has closed.
pub async fn correct_answer(
    state: &SharedState,
    player_id: PlayerId,
    now: SystemTime,
) -> Result<CorrectAnswerResponse, ServiceError> {
    let handle = player_handle(state, player_id)?;
    let record = handle.read().await;
    if !record.players.contains_key(&player_id) {
        return Err(PlayError::UnknownPlayer(player_id).into());
    }
    Ok(CorrectAnswerResponse {
        answer_ids: record.reveal(now)?,
    })
}

/// The player's own outcomes; open questions stay unrevealed.
pub async fn player_results(
    state: &SharedState,
    player_id: PlayerId,
    now: SystemTime,
) -> Result<PlayerResultsResponse, ServiceError> {
    let handle = player_handle(state, player_id)?;
    let record = handle.read().await;
    let player = record
        .players
        .get(&player_id)
        .ok_or(PlayError::UnknownPlayer(player_id))?;
    Ok(results::player_summary(&record, player, now).into())
}
