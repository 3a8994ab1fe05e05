/// OpenAPI documentation generation.
pub mod documentation;
/// Game scheduling, listing, and session loading.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervision and degraded-mode handling.
pub mod storage_supervisor;
/// Live tracking operations: events, lineups, resume, finalization.
pub mod tracker_service;
