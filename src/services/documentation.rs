use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Scorebook Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::scorekeeper_stream,
        crate::routes::game::create_game,
        crate::routes::game::list_games,
        crate::routes::game::get_game,
        crate::routes::tracker::start_tracking,
        crate::routes::tracker::append_event,
        crate::routes::tracker::substitute,
        crate::routes::tracker::replace_opponent_stats,
        crate::routes::tracker::resume_game,
        crate::routes::tracker::finalize_game,
        crate::routes::tracker::reopen_game,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameStatusDto,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::StartTrackingRequest,
            crate::dto::game::AppendEventRequest,
            crate::dto::game::UndoInput,
            crate::dto::game::SubstitutionRequest,
            crate::dto::game::SubstitutionResponse,
            crate::dto::game::OpponentStatsRequest,
            crate::dto::game::FinalizeRequest,
            crate::dto::game::FinalizeResponse,
            crate::dto::game::GameSummary,
            crate::dto::game::GameDetail,
            crate::dto::game::EventView,
            crate::dto::game::UndoView,
            crate::dto::game::ResumeResponse,
            crate::dto::sse::ScorekeeperHandshake,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Game scheduling and lookup"),
        (name = "tracker", description = "Live tracking operations"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
