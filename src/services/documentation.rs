use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the quiz session backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::admin::list_games,
        crate::routes::admin::replace_games,
        crate::routes::admin::mutate_game,
        crate::routes::admin::session_status,
        crate::routes::admin::session_results,
        crate::routes::play::join_session,
        crate::routes::play::player_status,
        crate::routes::play::player_question,
        crate::routes::play::submit_answer,
        crate::routes::play::correct_answer,
        crate::routes::play::player_results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GamesResponse,
            crate::dto::game::GameSummary,
            crate::dto::game::QuestionSummary,
            crate::dto::game::AnswerOptionSummary,
            crate::dto::game::QuestionKindDto,
            crate::dto::game::ReplaceGamesRequest,
            crate::dto::game::GameInput,
            crate::dto::game::QuestionInput,
            crate::dto::game::AnswerOptionInput,
            crate::dto::admin::MutateGameRequest,
            crate::dto::admin::MutationType,
            crate::dto::admin::MutationStatus,
            crate::dto::admin::MutationResponse,
            crate::dto::admin::SessionStatusDto,
            crate::dto::admin::SessionStatusResponse,
            crate::dto::admin::RosterEntry,
            crate::dto::play::JoinRequest,
            crate::dto::play::JoinResponse,
            crate::dto::play::PlayerStatusResponse,
            crate::dto::play::PublicQuestion,
            crate::dto::play::PublicOption,
            crate::dto::play::PlayerQuestionResponse,
            crate::dto::play::SubmitAnswerRequest,
            crate::dto::play::CorrectAnswerResponse,
            crate::dto::play::PlayerResultsResponse,
            crate::dto::results::AnswerOutcomeDto,
            crate::dto::results::PlayerStandingDto,
            crate::dto::results::QuestionStatsDto,
            crate::dto::results::SessionResultsResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Game editing and session control for game owners"),
        (name = "play", description = "Joining, answering and results for players"),
    )
)]
pub struct ApiDoc;
