use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Game authoring and lookup.
pub mod game;
/// Health endpoint.
pub mod health;
/// Gameplay transitions.
pub mod play;
/// Event streams.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(game::router())
        .merge(play::router());

    api_router.merge(docs::router()).with_state(state)
}
