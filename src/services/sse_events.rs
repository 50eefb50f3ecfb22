use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        game::{GameView, Scoreboard},
        sse::{
            GameCreatedEvent, GameFinishedEvent, GameRemovedEvent, GameUpdatedEvent, ServerEvent,
            SystemStatus,
        },
    },
    state::{SharedState, game::Game},
};

const EVENT_GAME_CREATED: &str = "game.created";
const EVENT_GAME_UPDATED: &str = "game.updated";
const EVENT_GAME_FINISHED: &str = "game.finished";
const EVENT_GAME_REMOVED: &str = "game.removed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Announce a freshly authored game.
pub fn broadcast_game_created(state: &SharedState, game: &Game) {
    let payload = GameCreatedEvent {
        game_id: game.id,
        name: game.name.clone(),
    };
    send_public_event(state, EVENT_GAME_CREATED, &payload);
}

/// Broadcast the new snapshot of a game after any accepted action.
pub fn broadcast_game_updated(state: &SharedState, view: &GameView) {
    let payload = GameUpdatedEvent(view.clone());
    send_public_event(state, EVENT_GAME_UPDATED, &payload);
}

/// Broadcast the final standings of a finished game.
pub fn broadcast_game_finished(state: &SharedState, game: &Game) {
    let payload = GameFinishedEvent {
        game_id: game.id,
        winner: game.winner.clone(),
        scores: Scoreboard::of(game).lines,
    };
    send_public_event(state, EVENT_GAME_FINISHED, &payload);
}

/// Broadcast that an active game was dropped.
pub fn broadcast_game_removed(state: &SharedState, game_id: Uuid) {
    send_public_event(state, EVENT_GAME_REMOVED, &GameRemovedEvent { game_id });
}

/// Broadcast the degraded flag.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, game::fixtures::*},
    };

    #[tokio::test]
    async fn updates_carry_event_name_and_snapshot() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.public_sse().subscribe();
        let game = started_game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);

        broadcast_game_updated(&state, &GameView::from(game.clone()));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_GAME_UPDATED));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["game"]["id"], game.id.to_string());
        assert_eq!(payload["phase"], "in_progress");
    }
}
