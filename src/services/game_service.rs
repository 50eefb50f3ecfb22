use std::{cmp::Reverse, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::GameEntity,
    dto::{
        common::{GamePage, PageQuery},
        game::{CreateGameRequest, FillQuestionRequest, GameListItem, GameView, Scoreboard},
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState, authoring,
        error::EngineError,
        game::Game,
        state_machine::GamePhase,
    },
};

/// Author a new game from the request and store it as active.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameView, ServiceError> {
    let store = state.require_game_store().await?;
    let game = authoring::assemble_game(request.into_draft(state.config()))?;

    store
        .save_game(GameEntity::from_game(game.clone(), SystemTime::now()))
        .await?;
    info!(
        game_id = %game.id,
        users = game.users.len(),
        rounds = game.rounds.len(),
        "game created"
    );

    sse_events::broadcast_game_created(state, &game);
    Ok(game.into())
}

/// Write the text and answer of one question slot while the game is in setup.
pub async fn fill_question(
    state: &SharedState,
    id: Uuid,
    round_id: &str,
    request: &FillQuestionRequest,
) -> Result<GameView, ServiceError> {
    let game = state
        .run_exclusive(id, move || async move {
            let store = state.require_game_store().await?;
            let Some(entity) = store.load_game(Some(id)).await? else {
                return Err(ServiceError::NotFound(format!("active game `{id}` not found")));
            };
            let mut game = Game::from(entity);
            if GamePhase::of(&game) != GamePhase::Setup {
                return Err(EngineError::InvalidTurn(
                    "questions can only be filled during setup".into(),
                )
                .into());
            }
            let index = game
                .round_index(round_id)
                .ok_or_else(|| EngineError::RoundNotFound {
                    round_id: round_id.to_owned(),
                })?;
            game.rounds[index] = authoring::fill_question(
                &game.rounds[index],
                &request.theme_id,
                request.rank_id,
                &request.text,
                &request.answer,
            )?;

            store
                .save_game(GameEntity::from_game(game.clone(), SystemTime::now()))
                .await?;
            Ok(game)
        })
        .await?;

    info!(game_id = %id, round_id, rank_id = request.rank_id, "question filled");
    let view = GameView::from(game);
    sse_events::broadcast_game_updated(state, &view);
    Ok(view)
}

/// Snapshot of a game, looked up among active games first and then in history.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameView, ServiceError> {
    find_game(state, id).await.map(Into::into)
}

/// Most recently updated active game.
pub async fn current_game(state: &SharedState) -> Result<GameView, ServiceError> {
    let store = state.require_game_store().await?;
    let Some(entity) = store.load_game(None).await? else {
        return Err(ServiceError::NotFound("no active game".into()));
    };
    Ok(Game::from(entity).into())
}

/// Scores of every player of a game.
pub async fn scores(state: &SharedState, id: Uuid) -> Result<Scoreboard, ServiceError> {
    let game = find_game(state, id).await?;
    Ok(Scoreboard::of(&game))
}

/// Active games, most recently updated first.
pub async fn list_active(state: &SharedState) -> Result<Vec<GameListItem>, ServiceError> {
    let store = state.require_game_store().await?;
    let mut games = store.list_active().await?;
    games.sort_by_key(|game| Reverse(game.updated_at));
    Ok(games.into_iter().map(Into::into).collect())
}

/// One page of finished games, most recently finished first.
pub async fn list_history(
    state: &SharedState,
    query: &PageQuery,
) -> Result<GamePage, ServiceError> {
    let store = state.require_game_store().await?;
    let mut games = store.list_history().await?;
    games.sort_by_key(|game| Reverse(game.finish_date.unwrap_or(game.updated_at)));
    let items = games.into_iter().map(Into::into).collect();
    Ok(GamePage::paginate(items, query))
}

/// Drop a game from the active set.
pub async fn delete_game(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let removed = state
        .run_exclusive(id, move || async move {
            let store = state.require_game_store().await?;
            Ok(store.remove_active(id).await?)
        })
        .await?;
    if !removed {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    }

    state.release_game(id);
    info!(game_id = %id, "game removed");
    sse_events::broadcast_game_removed(state, id);
    Ok(())
}

async fn find_game(state: &SharedState, id: Uuid) -> Result<Game, ServiceError> {
    let store = state.require_game_store().await?;
    if let Some(entity) = store.load_game(Some(id)).await? {
        return Ok(entity.into());
    }
    match store.find_history(id).await? {
        Some(entity) => Ok(entity.into()),
        None => Err(ServiceError::NotFound(format!("game `{id}` not found"))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::{GameStore, memory::InMemoryGameStore},
        state::AppState,
    };

    async fn ready_state() -> (SharedState, Arc<InMemoryGameStore>) {
        let state = AppState::new(AppConfig::default());
        let store = Arc::new(InMemoryGameStore::new());
        state.install_game_store(store.clone()).await;
        (state, store)
    }

    fn request() -> CreateGameRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Friday quiz",
            "users": [{ "name": "Alice", "isAdmin": true }, { "name": "Bob" }],
            "rounds": [{ "name": "Warm-up", "themes": [{ "name": "Science" }] }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn created_game_is_active_and_current() {
        let (state, store) = ready_state().await;
        let mut events = state.public_sse().subscribe();

        let view = create_game(&state, request()).await.unwrap();
        let id = view.game.id;

        assert!(store.load_game(Some(id)).await.unwrap().is_some());
        assert_eq!(current_game(&state).await.unwrap().game.id, id);
        assert_eq!(list_active(&state).await.unwrap().len(), 1);
        assert_eq!(events.recv().await.unwrap().event.as_deref(), Some("game.created"));
    }

    #[tokio::test]
    async fn deleted_game_is_gone() {
        let (state, _store) = ready_state().await;
        let id = create_game(&state, request()).await.unwrap().game.id;

        delete_game(&state, id).await.unwrap();

        assert!(matches!(get_game(&state, id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(delete_game(&state, id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn degraded_state_rejects_reads() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(list_active(&state).await, Err(ServiceError::Degraded)));
    }
}
