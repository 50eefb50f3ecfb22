use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::game::create_game,
        crate::routes::game::list_active,
        crate::routes::game::current_game,
        crate::routes::game::list_history,
        crate::routes::game::get_game,
        crate::routes::game::delete_game,
        crate::routes::game::scores,
        crate::routes::game::fill_question,
        crate::routes::play::enter_round,
        crate::routes::play::select_question,
        crate::routes::play::open_question,
        crate::routes::play::answer,
        crate::routes::play::extra_answer,
        crate::routes::play::finish,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::AnswerRequest,
            crate::dto::game::FillQuestionRequest,
            crate::dto::game::QuestionQuery,
            crate::dto::game::GameView,
            crate::dto::game::QuestionView,
            crate::dto::game::Scoreboard,
            crate::dto::game::GameListItem,
            crate::dto::common::GamePage,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::GameCreatedEvent,
            crate::dto::sse::GameUpdatedEvent,
            crate::dto::sse::GameFinishedEvent,
            crate::dto::sse::GameRemovedEvent,
            crate::state::game::Game,
            crate::state::state_machine::GamePhase,
            crate::state::question::QuestionState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "Game authoring, listing and history"),
        (name = "play", description = "Rounds, questions and answers of an active game"),
    )
)]
/// OpenAPI document of the HTTP API.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_gameplay_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/games", "/games/{id}/answers", "/games/{id}/finish", "/sse/public"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
