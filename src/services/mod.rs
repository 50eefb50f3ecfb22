/// OpenAPI documentation generation.
pub mod documentation;
/// Game authoring, lookup and listing.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Gameplay actions applied under the per-game gate.
pub mod play_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervision and degraded mode.
pub mod storage_supervisor;
