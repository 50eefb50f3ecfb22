use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        common::{GamePage, PageQuery},
        game::{CreateGameRequest, FillQuestionRequest, GameListItem, GameView, Scoreboard},
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes authoring, listing and removing games.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/active", get(list_active))
        .route("/games/current", get(current_game))
        .route("/games/history", get(list_history))
        .route("/games/{id}", get(get_game).delete(delete_game))
        .route("/games/{id}/scores", get(scores))
        .route("/games/{id}/rounds/{round_id}/questions", put(fill_question))
}

/// Author a game and store it as active, in setup until a round is entered.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameView),
        (status = 400, description = "Invalid game definition"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<GameView>), AppError> {
    let view = game_service::create_game(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// List active games.
#[utoipa::path(
    get,
    path = "/games/active",
    tag = "game",
    responses((status = 200, description = "Active games", body = [GameListItem]))
)]
pub async fn list_active(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    Ok(Json(game_service::list_active(&state).await?))
}

/// Most recently updated active game.
#[utoipa::path(
    get,
    path = "/games/current",
    tag = "game",
    responses(
        (status = 200, description = "Current game", body = GameView),
        (status = 404, description = "No active game")
    )
)]
pub async fn current_game(State(state): State<SharedState>) -> Result<Json<GameView>, AppError> {
    Ok(Json(game_service::current_game(&state).await?))
}

/// Finished games, newest first.
#[utoipa::path(
    get,
    path = "/games/history",
    tag = "game",
    params(PageQuery),
    responses((status = 200, description = "Page of finished games", body = GamePage))
)]
pub async fn list_history(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<PageQuery>>,
) -> Result<Json<GamePage>, AppError> {
    Ok(Json(game_service::list_history(&state, &query).await?))
}

#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "game",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game snapshot", body = GameView),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(game_service::get_game(&state, id).await?))
}

/// Remove a game from the active set.
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "game",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 204, description = "Game removed"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/games/{id}/scores",
    tag = "game",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Scoreboard", body = Scoreboard))
)]
pub async fn scores(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Scoreboard>, AppError> {
    Ok(Json(game_service::scores(&state, id).await?))
}

/// Fill a generated question slot of a game still in setup.
#[utoipa::path(
    put,
    path = "/games/{id}/rounds/{round_id}/questions",
    tag = "game",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("round_id" = String, Path, description = "Round identifier")
    ),
    request_body = FillQuestionRequest,
    responses(
        (status = 200, description = "Question filled", body = GameView),
        (status = 400, description = "Unknown slot or blank text"),
        (status = 409, description = "Game already started")
    )
)]
pub async fn fill_question(
    State(state): State<SharedState>,
    Path((id, round_id)): Path<(Uuid, String)>,
    Valid(Json(request)): Valid<Json<FillQuestionRequest>>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(
        game_service::fill_question(&state, id, &round_id, &request).await?,
    ))
}
