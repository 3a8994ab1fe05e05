use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::game::{
        AppendEventRequest, EventView, FinalizeRequest, FinalizeResponse, GameDetail,
        OpponentStatsRequest, ResumeResponse, StartTrackingRequest, SubstitutionRequest,
        SubstitutionResponse,
    },
    error::AppError,
    services::tracker_service,
    state::SharedState,
    tracker::opponent::StatRecord,
};

/// Routes driving a live tracking session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{id}/start", post(start_tracking))
        .route("/games/{id}/events", post(append_event))
        .route("/games/{id}/substitutions", post(substitute))
        .route("/games/{id}/opponent-stats", put(replace_opponent_stats))
        .route("/games/{id}/resume", get(resume_game))
        .route("/games/{id}/finalize", post(finalize_game))
        .route("/games/{id}/reopen", post(reopen_game))
}

/// Begin tracking a scheduled game with its starting lineup.
#[utoipa::path(
    post,
    path = "/games/{id}/start",
    tag = "tracker",
    params(("id" = String, Path, description = "Identifier of the game")),
    request_body = StartTrackingRequest,
    responses(
        (status = 200, description = "Tracking started", body = GameDetail),
        (status = 400, description = "Lineup does not fit the sport profile"),
        (status = 409, description = "Game is not in a startable phase")
    )
)]
pub async fn start_tracking(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<StartTrackingRequest>>,
) -> Result<Json<GameDetail>, AppError> {
    Ok(Json(
        tracker_service::start_tracking(&state, id, payload).await?,
    ))
}

/// Append one entry to a live game's event log.
#[utoipa::path(
    post,
    path = "/games/{id}/events",
    tag = "tracker",
    params(("id" = String, Path, description = "Identifier of the game")),
    request_body = AppendEventRequest,
    responses(
        (status = 200, description = "Entry appended", body = EventView),
        (status = 409, description = "Game is not live")
    )
)]
pub async fn append_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AppendEventRequest>>,
) -> Result<Json<EventView>, AppError> {
    Ok(Json(
        tracker_service::append_event(&state, id, payload).await?,
    ))
}

/// Attempt a substitution. Rejections come back as `applied: false`, not an
/// HTTP error.
#[utoipa::path(
    post,
    path = "/games/{id}/substitutions",
    tag = "tracker",
    params(("id" = String, Path, description = "Identifier of the game")),
    request_body = SubstitutionRequest,
    responses(
        (status = 200, description = "Substitution verdict", body = SubstitutionResponse),
        (status = 409, description = "Game is not live")
    )
)]
pub async fn substitute(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubstitutionRequest>>,
) -> Result<Json<SubstitutionResponse>, AppError> {
    Ok(Json(
        tracker_service::substitute(&state, id, payload).await?,
    ))
}

/// Replace the opponent stat record for a live game.
#[utoipa::path(
    put,
    path = "/games/{id}/opponent-stats",
    tag = "tracker",
    params(("id" = String, Path, description = "Identifier of the game")),
    request_body = OpponentStatsRequest,
    responses(
        (status = 200, description = "Normalised opponent record", body = Object),
        (status = 409, description = "Game is not live")
    )
)]
pub async fn replace_opponent_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OpponentStatsRequest>,
) -> Result<Json<StatRecord>, AppError> {
    Ok(Json(
        tracker_service::replace_opponent_stats(&state, id, payload).await?,
    ))
}

/// One-shot payload for a reconnecting tracking console.
#[utoipa::path(
    get,
    path = "/games/{id}/resume",
    tag = "tracker",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Resume payload", body = ResumeResponse),
        (status = 409, description = "Game is not live")
    )
)]
pub async fn resume_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeResponse>, AppError> {
    Ok(Json(tracker_service::resume_game(&state, id).await?))
}

/// Finalize a live game, reconciling the requested score against the log.
#[utoipa::path(
    post,
    path = "/games/{id}/finalize",
    tag = "tracker",
    params(("id" = String, Path, description = "Identifier of the game")),
    request_body = FinalizeRequest,
    responses(
        (status = 200, description = "Reconciled final score", body = FinalizeResponse),
        (status = 409, description = "Game is not live")
    )
)]
pub async fn finalize_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<FinalizeRequest>>,
) -> Result<Json<FinalizeResponse>, AppError> {
    Ok(Json(
        tracker_service::finalize_game(&state, id, payload).await?,
    ))
}

/// Reopen a finalized game for corrections.
#[utoipa::path(
    post,
    path = "/games/{id}/reopen",
    tag = "tracker",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game reopened", body = GameDetail),
        (status = 409, description = "Game is not finalized")
    )
)]
pub async fn reopen_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDetail>, AppError> {
    Ok(Json(tracker_service::reopen_game(&state, id).await?))
}
