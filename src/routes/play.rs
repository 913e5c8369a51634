use std::time::SystemTime;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::play::{
        CorrectAnswerResponse, JoinRequest, JoinResponse, PlayerQuestionResponse,
        PlayerResultsResponse, PlayerStatusResponse, SubmitAnswerRequest,
    },
    error::AppError,
    services::player_service,
    state::{SharedState, player::PlayerId, session::SessionId},
};

/// Player endpoints; the player id returned at join is the only credential.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/play/join/{sessionId}", post(join_session))
        .route("/play/{playerId}/status", get(player_status))
        .route("/play/{playerId}/question", get(player_question))
        .route(
            "/play/{playerId}/answer",
            get(correct_answer).put(submit_answer),
        )
        .route("/play/{playerId}/results", get(player_results))
}

/// Join a session with a display name.
#[utoipa::path(
    post,
    path = "/play/join/{sessionId}",
    tag = "play",
    params(("sessionId" = u32, Path, description = "Join code of the session")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Player registered", body = JoinResponse),
        (status = 400, description = "Invalid name or late joins are closed"),
        (status = 403, description = "Unknown or ended session")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(session_id): Path<SessionId>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        player_service::join_session(&state, session_id, &payload.name, SystemTime::now())
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/play/{playerId}/status",
    tag = "play",
    params(("playerId" = String, Path, description = "Identifier returned at join")),
    responses(
        (status = 200, description = "Session progress", body = PlayerStatusResponse),
        (status = 403, description = "Unknown player")
    )
)]
pub async fn player_status(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerStatusResponse>, AppError> {
    Ok(Json(player_service::player_status(&state, player_id).await?))
}

/// Current question without its answer key, with the remaining time.
#[utoipa::path(
    get,
    path = "/play/{playerId}/question",
    tag = "play",
    params(("playerId" = String, Path, description = "Identifier returned at join")),
    responses(
        (status = 200, description = "Open question", body = PlayerQuestionResponse),
        (status = 400, description = "Session not started or already finished"),
        (status = 403, description = "Unknown player")
    )
)]
pub async fn player_question(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerQuestionResponse>, AppError> {
    Ok(Json(
        player_service::player_question(&state, player_id, SystemTime::now()).await?,
    ))
}

/// Submit (or replace) the answer to the open question.
#[utoipa::path(
    put,
    path = "/play/{playerId}/answer",
    tag = "play",
    params(("playerId" = String, Path, description = "Identifier returned at join")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded"),
        (status = 400, description = "Window closed or invalid options"),
        (status = 403, description = "Unknown player")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate()?;
    player_service::submit_answer(&state, player_id, &payload.answers, SystemTime::now()).await?;
    Ok(Json(serde_json::json!({})))
}

/// Answer key of the current question, once its window has closed.
#[utoipa::path(
    get,
    path = "/play/{playerId}/answer",
    tag = "play",
    params(("playerId" = String, Path, description = "Identifier returned at join")),
    responses(
        (status = 200, description = "Correct option ids", body = CorrectAnswerResponse),
        (status = 400, description = "Window still open or nothing asked yet"),
        (status = 403, description = "Unknown player")
    )
)]
pub async fn correct_answer(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<CorrectAnswerResponse>, AppError> {
    Ok(Json(
        player_service::correct_answer(&state, player_id, SystemTime::now()).await?,
    ))
}

/// The caller's own outcomes and score.
#[utoipa::path(
    get,
    path = "/play/{playerId}/results",
    tag = "play",
    params(("playerId" = String, Path, description = "Identifier returned at join")),
    responses(
        (status = 200, description = "Per-question outcomes", body = PlayerResultsResponse),
        (status = 403, description = "Unknown player")
    )
)]
pub async fn player_results(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerResultsResponse>, AppError> {
    Ok(Json(
        player_service::player_results(&state, player_id, SystemTime::now()).await?,
    ))
}
