use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    responses((status = 200, description = "Public SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime game events to any number of followers.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    info!("new public SSE connection");
    sse_service::to_sse_stream(receiver, StreamKind::Public)
}

#[utoipa::path(
    get,
    path = "/sse/scorekeeper",
    responses(
        (status = 200, description = "Scorekeeper SSE stream", content_type = "text/event-stream", body = String),
        (status = 401, description = "Another scorekeeper console is already connected")
    )
)]
/// Stream scorekeeper events, claiming the exclusive console token.
pub async fn scorekeeper_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, token) = sse_service::subscribe_scorekeeper(&state).await?;
    info!("new scorekeeper SSE connection");
    sse_service::broadcast_scorekeeper_handshake(state.scorekeeper_sse(), &token);
    Ok(sse_service::to_sse_stream(
        receiver,
        StreamKind::Scorekeeper(state),
    ))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/scorekeeper", get(scorekeeper_stream))
}
