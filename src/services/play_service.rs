//! Gameplay actions on an active game.
//!
//! Each mutation loads the stored snapshot, applies one engine operation and
//! persists the result while holding the game's gate. A snapshot that ends up
//! finished is archived to history and removed from the active set.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, models::GameEntity},
    dto::game::{AnswerRequest, GameView, QuestionQuery, QuestionView},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        error::EngineError,
        game::Game,
        question, scoring,
        state_machine::{self, GamePhase},
    },
};

/// Make `round_id` the current round.
pub async fn enter_round(
    state: &SharedState,
    game_id: Uuid,
    round_id: &str,
) -> Result<GameView, ServiceError> {
    let game = state
        .run_exclusive(game_id, move || async move {
            let store = state.require_game_store().await?;
            let game = load_active(&store, game_id).await?;
            let next = state_machine::enter_round(&game, round_id)?;
            persist(state, &store, next).await
        })
        .await?;

    info!(game_id = %game_id, round_id, "round entered");
    Ok(settle(state, game))
}

/// Look up a question of the current round for display, without changing the game.
pub async fn select_question(
    state: &SharedState,
    game_id: Uuid,
    query: &QuestionQuery,
) -> Result<Option<QuestionView>, ServiceError> {
    let store = state.require_game_store().await?;
    let game = load_active(&store, game_id).await?;
    let round = game
        .active_round()
        .ok_or_else(|| EngineError::InvalidTurn("no current round".into()))?;

    let view = question::select_question(round, &query.theme_id, query.rank_id).map(|found| {
        QuestionView {
            theme_id: query.theme_id.clone(),
            state: question::question_state(&game, found),
            question: found.clone(),
        }
    });
    if view.is_none() {
        debug!(
            game_id = %game_id,
            theme_id = %query.theme_id,
            rank_id = query.rank_id,
            "no question at board cell"
        );
    }
    Ok(view)
}

/// Put a question of the current round on the board.
///
/// `Ok(None)` when the board cell does not exist; nothing is stored then.
pub async fn open_question(
    state: &SharedState,
    game_id: Uuid,
    query: &QuestionQuery,
) -> Result<Option<GameView>, ServiceError> {
    let opened = state
        .run_exclusive(game_id, move || async move {
            let store = state.require_game_store().await?;
            let game = load_active(&store, game_id).await?;
            match question::open_question(&game, &query.theme_id, query.rank_id)? {
                Some(next) => persist(state, &store, next).await.map(Some),
                None => Ok(None),
            }
        })
        .await?;

    Ok(opened.map(|game| {
        info!(
            game_id = %game_id,
            question_id = game.current_question.as_deref().unwrap_or_default(),
            "question opened"
        );
        settle(state, game)
    }))
}

/// Record the verdict of a question; the turn holder answering passes the turn on.
pub async fn answer(
    state: &SharedState,
    game_id: Uuid,
    request: &AnswerRequest,
) -> Result<GameView, ServiceError> {
    let game = state
        .run_exclusive(game_id, move || async move {
            let store = state.require_game_store().await?;
            let game = load_active(&store, game_id).await?;
            let next = scoring::record_answer(
                &game,
                &request.question_id,
                &request.user_id,
                request.is_correct,
            )?;
            persist(state, &store, next).await
        })
        .await?;

    info!(
        game_id = %game_id,
        question_id = %request.question_id,
        user_id = %request.user_id,
        correct = request.is_correct,
        "answer recorded"
    );
    Ok(settle(state, game))
}

/// Record an answer from a player who does not hold the turn.
pub async fn extra_answer(
    state: &SharedState,
    game_id: Uuid,
    request: &AnswerRequest,
) -> Result<GameView, ServiceError> {
    let game = state
        .run_exclusive(game_id, move || async move {
            let store = state.require_game_store().await?;
            let game = load_active(&store, game_id).await?;
            let next = scoring::record_extra_answer(
                &game,
                &request.question_id,
                &request.user_id,
                request.is_correct,
            )?;
            persist(state, &store, next).await
        })
        .await?;

    info!(
        game_id = %game_id,
        question_id = %request.question_id,
        user_id = %request.user_id,
        correct = request.is_correct,
        "extra answer recorded"
    );
    Ok(settle(state, game))
}

/// Finish the game and move it to history.
///
/// A game already present in history is returned as archived, so a retry after
/// an interrupted archive keeps the recorded winner and finish date.
pub async fn finish(state: &SharedState, game_id: Uuid) -> Result<GameView, ServiceError> {
    let (game, archived_now) = state
        .run_exclusive(game_id, move || async move {
            let store = state.require_game_store().await?;
            if let Some(archived) = store.find_history(game_id).await? {
                let completed = store.remove_active(game_id).await?;
                if completed {
                    warn!(game_id = %game_id, "completed an interrupted archive");
                }
                return Ok((Game::from(archived), completed));
            }

            let game = load_active(&store, game_id).await?;
            let next = state_machine::finish(&game)?;
            persist(state, &store, next).await.map(|game| (game, true))
        })
        .await?;

    if archived_now {
        return Ok(settle(state, game));
    }
    state.release_game(game_id);
    Ok(game.into())
}

/// Load an active game that has not been archived yet.
///
/// A copy left behind by an interrupted archive is dropped from the active set
/// and the action is rejected as on any finished game.
async fn load_active(store: &Arc<dyn GameStore>, game_id: Uuid) -> Result<Game, ServiceError> {
    let Some(entity) = store.load_game(Some(game_id)).await? else {
        return Err(ServiceError::NotFound(format!(
            "active game `{game_id}` not found"
        )));
    };
    if store.find_history(game_id).await?.is_some() {
        store.remove_active(game_id).await?;
        warn!(game_id = %game_id, "dropped active copy of an archived game");
        return Err(EngineError::InvalidTurn("game is already finished".into()).into());
    }
    Ok(entity.into())
}

/// Store `game`, finishing it first when auto-finish applies.
async fn persist(
    state: &SharedState,
    store: &Arc<dyn GameStore>,
    mut game: Game,
) -> Result<Game, ServiceError> {
    if state.config().auto_finish
        && GamePhase::of(&game) == GamePhase::InProgress
        && state_machine::is_exhausted(&game)
    {
        debug!(game_id = %game.id, "every question answered; finishing automatically");
        game = state_machine::finish(&game)?;
    }

    let entity = GameEntity::from_game(game.clone(), SystemTime::now());
    if game.is_finished {
        store.append_history(entity).await?;
        store.remove_active(game.id).await?;
    } else {
        store.save_game(entity).await?;
    }
    Ok(game)
}

/// Broadcast the stored snapshot and build the response view.
fn settle(state: &SharedState, game: Game) -> GameView {
    if game.is_finished {
        state.release_game(game.id);
        info!(
            game_id = %game.id,
            winner = game.winner.as_deref().unwrap_or_default(),
            "game finished and archived"
        );
        sse_events::broadcast_game_finished(state, &game);
    }

    let view = GameView::from(game);
    sse_events::broadcast_game_updated(state, &view);
    view
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::memory::InMemoryGameStore,
            models::GameListItemEntity,
            storage::{StorageError, StorageResult},
        },
        state::{
            AppState,
            game::fixtures::{round, started_game},
        },
    };

    async fn with_game(config: AppConfig, game: Game) -> (SharedState, Arc<InMemoryGameStore>) {
        let state = AppState::new(config);
        let store = Arc::new(InMemoryGameStore::new());
        store
            .save_game(GameEntity::from_game(game, SystemTime::now()))
            .await
            .unwrap();
        state.install_game_store(store.clone()).await;
        (state, store)
    }

    fn answer_request(question_id: &str, user_id: &str, is_correct: bool) -> AnswerRequest {
        AnswerRequest {
            question_id: question_id.into(),
            user_id: user_id.into(),
            is_correct,
        }
    }

    fn board_cell(theme_id: &str, rank_id: u16) -> QuestionQuery {
        QuestionQuery {
            theme_id: theme_id.into(),
            rank_id,
        }
    }

    #[tokio::test]
    async fn answers_are_persisted_and_turn_moves() {
        let game = started_game(&["alice", "bob"], vec![round("r1", &[100, 200], &[("t1", &["q1", "q2"])])]);
        let id = game.id;
        let (state, store) = with_game(AppConfig::default(), game).await;

        let view = answer(&state, id, &answer_request("q1", "alice", true))
            .await
            .unwrap();
        assert_eq!(view.game.current_user.as_deref(), Some("bob"));

        let stored: Game = store.load_game(Some(id)).await.unwrap().unwrap().into();
        assert_eq!(stored.users[0].round_score["r1"], 100);

        let err = answer(&state, id, &answer_request("q1", "bob", true))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Engine(EngineError::AlreadyAnswered { .. })
        ));
    }

    #[tokio::test]
    async fn missing_board_cell_changes_nothing() {
        let game = started_game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        let id = game.id;
        let (state, store) = with_game(AppConfig::default(), game).await;
        let before = store.load_game(Some(id)).await.unwrap();

        assert!(select_question(&state, id, &board_cell("t1", 999)).await.unwrap().is_none());
        assert!(open_question(&state, id, &board_cell("nope", 100)).await.unwrap().is_none());
        assert_eq!(store.load_game(Some(id)).await.unwrap(), before);

        let opened = open_question(&state, id, &board_cell("t1", 100)).await.unwrap().unwrap();
        assert_eq!(opened.game.current_question.as_deref(), Some("q1"));
    }

    #[tokio::test]
    async fn finish_archives_the_game() {
        let game = started_game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        let id = game.id;
        let (state, store) = with_game(AppConfig::default(), game).await;

        let view = finish(&state, id).await.unwrap();
        assert_eq!(view.phase, GamePhase::Finished);
        assert!(store.load_game(Some(id)).await.unwrap().is_none());
        assert!(store.find_history(id).await.unwrap().unwrap().is_finished);

        let again = finish(&state, id).await.unwrap();
        assert_eq!(again.game.finish_date, view.game.finish_date);
        assert_eq!(again.game.winner, view.game.winner);
    }

    #[tokio::test]
    async fn last_answer_finishes_when_enabled() {
        let config = AppConfig {
            auto_finish: true,
            ..AppConfig::default()
        };
        let game = started_game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        let id = game.id;
        let (state, store) = with_game(config, game).await;

        let view = answer(&state, id, &answer_request("q1", "alice", true))
            .await
            .unwrap();
        assert!(view.game.is_finished);
        assert_eq!(view.game.winner.as_deref(), Some("alice"));
        assert!(store.find_history(id).await.unwrap().is_some());
    }

    /// In-memory store whose next `remove_active` fails once.
    struct FailingRemoveStore {
        inner: InMemoryGameStore,
        fail_remove: AtomicBool,
    }

    impl GameStore for FailingRemoveStore {
        fn load_game(&self, id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.load_game(id)
        }
        fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_game(game)
        }
        fn append_history(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.append_history(game)
        }
        fn remove_active(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            if self.fail_remove.swap(false, Ordering::SeqCst) {
                return Box::pin(async {
                    Err(StorageError::unavailable(
                        "remove failed".into(),
                        std::io::Error::other("disk full"),
                    ))
                });
            }
            self.inner.remove_active(id)
        }
        fn find_history(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.find_history(id)
        }
        fn list_active(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
            self.inner.list_active()
        }
        fn list_history(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
            self.inner.list_history()
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    #[tokio::test]
    async fn interrupted_archive_is_completed_on_retry() {
        let game = started_game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        let id = game.id;
        let inner = InMemoryGameStore::new();
        inner
            .save_game(GameEntity::from_game(game, SystemTime::now()))
            .await
            .unwrap();
        let store = Arc::new(FailingRemoveStore {
            inner: inner.clone(),
            fail_remove: AtomicBool::new(true),
        });
        let state = AppState::new(AppConfig::default());
        state.install_game_store(store).await;

        assert!(matches!(
            finish(&state, id).await,
            Err(ServiceError::Unavailable(_))
        ));
        let archived = inner.find_history(id).await.unwrap().unwrap();
        assert!(inner.load_game(Some(id)).await.unwrap().is_some());

        let err = answer(&state, id, &answer_request("q1", "alice", true))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Engine(EngineError::InvalidTurn(_))));
        assert!(inner.load_game(Some(id)).await.unwrap().is_none());

        let retried = finish(&state, id).await.unwrap();
        assert_eq!(retried.game.finish_date, archived.finish_date);
        assert_eq!(retried.game.winner, archived.winner);
        assert_eq!(inner.find_history(id).await.unwrap(), Some(archived));
    }
}
