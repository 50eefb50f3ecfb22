use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::game::{AnswerRequest, GameView, QuestionQuery, QuestionView},
    error::AppError,
    services::play_service,
    state::SharedState,
};

/// Routes driving an active game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{id}/rounds/{round_id}/enter", post(enter_round))
        .route("/games/{id}/questions", get(select_question))
        .route("/games/{id}/questions/open", post(open_question))
        .route("/games/{id}/answers", post(answer))
        .route("/games/{id}/answers/extra", post(extra_answer))
        .route("/games/{id}/finish", post(finish))
}

fn json_or_no_content<T: serde::Serialize>(value: Option<T>) -> Response {
    match value {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Enter a round, starting the game when it is still in setup.
#[utoipa::path(
    post,
    path = "/games/{id}/rounds/{round_id}/enter",
    tag = "play",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("round_id" = String, Path, description = "Round identifier")
    ),
    responses(
        (status = 200, description = "Round entered", body = GameView),
        (status = 404, description = "Unknown game or round"),
        (status = 409, description = "Game finished or not ready")
    )
)]
pub async fn enter_round(
    State(state): State<SharedState>,
    Path((id, round_id)): Path<(Uuid, String)>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(play_service::enter_round(&state, id, &round_id).await?))
}

/// Question of the current round at a board cell, for display.
#[utoipa::path(
    get,
    path = "/games/{id}/questions",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier"), QuestionQuery),
    responses(
        (status = 200, description = "Question at the board cell", body = QuestionView),
        (status = 204, description = "No question at the board cell")
    )
)]
pub async fn select_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(query)): Valid<Query<QuestionQuery>>,
) -> Result<Response, AppError> {
    let view = play_service::select_question(&state, id, &query).await?;
    Ok(json_or_no_content(view))
}

/// Put a question on the board.
#[utoipa::path(
    post,
    path = "/games/{id}/questions/open",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = QuestionQuery,
    responses(
        (status = 200, description = "Question opened", body = GameView),
        (status = 204, description = "No question at the board cell"),
        (status = 409, description = "Question already answered")
    )
)]
pub async fn open_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(query)): Valid<Json<QuestionQuery>>,
) -> Result<Response, AppError> {
    let view = play_service::open_question(&state, id, &query).await?;
    Ok(json_or_no_content(view))
}

/// Record the verdict of a question.
#[utoipa::path(
    post,
    path = "/games/{id}/answers",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = GameView),
        (status = 404, description = "Unknown game or question"),
        (status = 409, description = "Question already answered")
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(request)): Valid<Json<AnswerRequest>>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(play_service::answer(&state, id, &request).await?))
}

/// Record an answer from a player without the turn.
#[utoipa::path(
    post,
    path = "/games/{id}/answers/extra",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Extra answer recorded", body = GameView),
        (status = 409, description = "Player holds the turn or already answered")
    )
)]
pub async fn extra_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(request)): Valid<Json<AnswerRequest>>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(play_service::extra_answer(&state, id, &request).await?))
}

/// Finish the game and archive it.
#[utoipa::path(
    post,
    path = "/games/{id}/finish",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game finished", body = GameView),
        (status = 409, description = "Game not in progress")
    )
)]
pub async fn finish(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(play_service::finish(&state, id).await?))
}
