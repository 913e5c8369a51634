use std::time::SystemTime;

use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::{MutateGameRequest, MutationResponse, SessionStatusResponse},
        game::{GamesResponse, ReplaceGamesRequest},
        results::SessionResultsResponse,
    },
    error::AppError,
    services::{catalog_service, session_service},
    state::{SharedState, session::SessionId},
};

const OWNER_HEADER: &str = "x-owner";

/// Identity of the game owner, taken from the `X-Owner` header.
#[derive(Debug, Clone)]
pub struct Owner(pub String);

/// Owner-only endpoints for editing games and driving their sessions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/games", get(list_games).put(replace_games))
        .route("/admin/game/{gameId}/mutate", post(mutate_game))
        .route("/admin/session/{sessionId}/status", get(session_status))
        .route("/admin/session/{sessionId}/results", get(session_results))
        .route_layer(middleware::from_fn(require_owner))
}

/// List the caller's games, answer keys included.
#[utoipa::path(
    get,
    path = "/admin/games",
    tag = "admin",
    params(("X-Owner" = String, Header, description = "Identity of the game owner")),
    responses(
        (status = 200, description = "Games owned by the caller", body = GamesResponse),
        (status = 403, description = "Missing owner identity")
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
    Extension(Owner(owner)): Extension<Owner>,
) -> Result<Json<GamesResponse>, AppError> {
    Ok(Json(catalog_service::list_games(&state, &owner).await?))
}

/// Replace all of the caller's games.
#[utoipa::path(
    put,
    path = "/admin/games",
    tag = "admin",
    params(("X-Owner" = String, Header, description = "Identity of the game owner")),
    request_body = ReplaceGamesRequest,
    responses(
        (status = 200, description = "Games after replacement", body = GamesResponse),
        (status = 400, description = "Invalid game definition or a running game would be removed"),
        (status = 403, description = "A listed game belongs to someone else")
    )
)]
pub async fn replace_games(
    State(state): State<SharedState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(payload): Json<ReplaceGamesRequest>,
) -> Result<Json<GamesResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        catalog_service::replace_games(&state, &owner, payload).await?,
    ))
}

/// Start, advance or end the session of a game.
#[utoipa::path(
    post,
    path = "/admin/game/{gameId}/mutate",
    tag = "admin",
    params(
        ("X-Owner" = String, Header, description = "Identity of the game owner"),
        ("gameId" = Uuid, Path, description = "Identifier of the game")
    ),
    request_body = MutateGameRequest,
    responses(
        (status = 200, description = "Command applied", body = MutationResponse),
        (status = 400, description = "Command not valid in the current state"),
        (status = 403, description = "Unknown game or not owned by the caller")
    )
)]
pub async fn mutate_game(
    State(state): State<SharedState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(game_id): Path<Uuid>,
    Json(payload): Json<MutateGameRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    Ok(Json(
        session_service::mutate_game(
            &state,
            &owner,
            game_id,
            payload.mutation_type,
            SystemTime::now,
        )
        .await?,
    ))
}

/// Poll the state of a session.
#[utoipa::path(
    get,
    path = "/admin/session/{sessionId}/status",
    tag = "admin",
    params(
        ("X-Owner" = String, Header, description = "Identity of the game owner"),
        ("sessionId" = u32, Path, description = "Join code of the session")
    ),
    responses(
        (status = 200, description = "Session snapshot", body = SessionStatusResponse),
        (status = 403, description = "Unknown session or not owned by the caller")
    )
)]
pub async fn session_status(
    State(state): State<SharedState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    Ok(Json(
        session_service::session_status(&state, &owner, session_id, SystemTime::now()).await?,
    ))
}

/// Leaderboard and per-question statistics of a session.
#[utoipa::path(
    get,
    path = "/admin/session/{sessionId}/results",
    tag = "admin",
    params(
        ("X-Owner" = String, Header, description = "Identity of the game owner"),
        ("sessionId" = u32, Path, description = "Join code of the session")
    ),
    responses(
        (status = 200, description = "Session results", body = SessionResultsResponse),
        (status = 403, description = "Unknown session or not owned by the caller")
    )
)]
pub async fn session_results(
    State(state): State<SharedState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResultsResponse>, AppError> {
    Ok(Json(
        session_service::session_results(&state, &owner, session_id).await?,
    ))
}

async fn require_owner(mut req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let owner = req
        .headers()
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Forbidden("missing owner header `X-Owner`".into()))?;

    req.extensions_mut().insert(Owner(owner));
    Ok(next.run(req).await)
}
