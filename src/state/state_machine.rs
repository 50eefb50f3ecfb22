use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    error::EngineError,
    game::{Game, RoundId},
    scoring::determine_winner,
};

/// High-level phases a game goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Players and rounds are authored, nothing has been played yet.
    Setup,
    /// A round has been entered; answers are being recorded.
    InProgress,
    /// The game is closed; the snapshot is an immutable record.
    Finished,
}

impl GamePhase {
    /// Derive the phase of a snapshot.
    pub fn of(game: &Game) -> Self {
        if game.is_finished {
            Self::Finished
        } else if game.current_round.is_some() || game.has_answers() {
            Self::InProgress
        } else {
            Self::Setup
        }
    }
}

/// Events that can be applied to a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Start (or switch to) the given round.
    EnterRound(RoundId),
    /// Close the game and elect the winner.
    Finish,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the game was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Compute the phase reached by applying `event` from `from`.
pub fn compute_transition(from: GamePhase, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
    let next = match (from, event) {
        (GamePhase::Setup | GamePhase::InProgress, GameEvent::EnterRound(_)) => {
            GamePhase::InProgress
        }
        (GamePhase::InProgress, GameEvent::Finish) => GamePhase::Finished,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

/// Enter a round. From setup the game must be playable first.
pub fn enter_round(game: &Game, round_id: &str) -> Result<Game, EngineError> {
    let from = GamePhase::of(game);
    compute_transition(from, GameEvent::EnterRound(round_id.to_owned()))?;

    if game.round(round_id).is_none() {
        return Err(EngineError::RoundNotFound {
            round_id: round_id.to_owned(),
        });
    }
    if from == GamePhase::Setup {
        ensure_ready(game)?;
    }

    let mut next = game.clone();
    next.current_round = Some(round_id.to_owned());
    next.current_question = None;
    if next.current_user.is_none() {
        next.current_user = next.users.first().map(|user| user.id.clone());
    }

    Ok(next)
}

/// Finish the game now.
pub fn finish(game: &Game) -> Result<Game, EngineError> {
    finish_at(game, SystemTime::now())
}

/// Finish the game with an explicit timestamp.
///
/// Only an in-progress game can finish; a second call is rejected instead of
/// recomputing the winner.
pub fn finish_at(game: &Game, now: SystemTime) -> Result<Game, EngineError> {
    compute_transition(GamePhase::of(game), GameEvent::Finish)?;

    let mut next = game.clone();
    next.winner = determine_winner(&next.users).map(|user| user.id.clone());
    next.is_finished = true;
    next.finish_date = Some(now);
    next.current_round = None;
    next.current_question = None;
    next.current_user = None;

    Ok(next)
}

/// Whether every question of every round has been answered.
pub fn is_exhausted(game: &Game) -> bool {
    game.rounds.iter().all(|round| round.is_exhausted())
}

fn ensure_ready(game: &Game) -> Result<(), EngineError> {
    if game.users.len() < 2 {
        return Err(EngineError::NotReady(format!(
            "at least 2 players are required, got {}",
            game.users.len()
        )));
    }
    let playable = game.rounds.iter().any(|round| {
        round
            .themes
            .iter()
            .any(|theme| round.is_theme_populated(theme))
    });
    if !playable {
        return Err(EngineError::NotReady(
            "at least one round needs a fully populated theme".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::state::{
        game::fixtures::*,
        scoring::{record_answer, round_score},
    };

    fn two_rounds() -> Game {
        game(
            &["alice", "bob"],
            vec![
                round("r1", &[100, 200], &[("t1", &["q1", "q2"])]),
                round("r2", &[300], &[("t2", &["q3"])]),
            ],
        )
    }

    #[test]
    fn fresh_game_is_in_setup() {
        assert_eq!(GamePhase::of(&two_rounds()), GamePhase::Setup);
    }

    #[test]
    fn transition_table() {
        assert_eq!(
            compute_transition(GamePhase::Setup, GameEvent::EnterRound("r".into())),
            Ok(GamePhase::InProgress)
        );
        assert_eq!(
            compute_transition(GamePhase::InProgress, GameEvent::Finish),
            Ok(GamePhase::Finished)
        );
        let err = compute_transition(GamePhase::Setup, GameEvent::Finish).unwrap_err();
        assert_eq!(err.from, GamePhase::Setup);
        assert_eq!(err.event, GameEvent::Finish);
        assert!(
            compute_transition(GamePhase::Finished, GameEvent::EnterRound("r".into())).is_err()
        );
    }

    #[test]
    fn entering_a_round_starts_the_game() {
        let game = enter_round(&two_rounds(), "r1").unwrap();

        assert_eq!(GamePhase::of(&game), GamePhase::InProgress);
        assert_eq!(game.current_round.as_deref(), Some("r1"));
        assert_eq!(game.current_user.as_deref(), Some("alice"));
    }

    #[test]
    fn switching_rounds_keeps_the_turn() {
        let game = enter_round(&two_rounds(), "r1").unwrap();
        let game = record_answer(&game, "q1", "alice", true).unwrap();
        let game = enter_round(&game, "r2").unwrap();

        assert_eq!(game.current_round.as_deref(), Some("r2"));
        assert_eq!(game.current_user.as_deref(), Some("bob"));
    }

    #[test]
    fn unknown_round_is_rejected() {
        let err = enter_round(&two_rounds(), "r9").unwrap_err();
        assert_eq!(
            err,
            EngineError::RoundNotFound {
                round_id: "r9".into()
            }
        );
    }

    #[test]
    fn single_player_game_is_not_ready() {
        let game = game(&["alice"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        assert!(matches!(
            enter_round(&game, "r1").unwrap_err(),
            EngineError::NotReady(_)
        ));
    }

    #[test]
    fn game_without_populated_theme_is_not_ready() {
        let mut game = two_rounds();
        for round in &mut game.rounds {
            for theme in &mut round.themes {
                theme.questions[0].text.clear();
            }
        }
        assert!(matches!(
            enter_round(&game, "r1").unwrap_err(),
            EngineError::NotReady(_)
        ));
    }

    #[test]
    fn finishing_from_setup_is_invalid() {
        let err = finish(&two_rounds()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(InvalidTransition {
                from: GamePhase::Setup,
                ..
            })
        ));
    }

    #[test]
    fn second_finish_is_rejected_without_recomputing() {
        let game = enter_round(&two_rounds(), "r1").unwrap();
        let game = record_answer(&game, "q1", "alice", true).unwrap();
        let finished = finish(&game).unwrap();
        let snapshot = finished.clone();

        let err = finish(&finished).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(InvalidTransition {
                from: GamePhase::Finished,
                event: GameEvent::Finish,
            })
        ));
        assert_eq!(finished, snapshot);
        assert_eq!(finished.winner.as_deref(), Some("alice"));
    }

    #[test]
    fn finished_game_rejects_answers() {
        let game = enter_round(&two_rounds(), "r1").unwrap();
        let finished = finish(&game).unwrap();
        assert!(matches!(
            record_answer(&finished, "q1", "alice", true).unwrap_err(),
            EngineError::InvalidTurn(_)
        ));
    }

    #[test]
    fn alice_and_bob_play_one_round() {
        let game = game(
            &["alice", "bob"],
            vec![round("r1", &[100, 200], &[("t1", &["q1", "q2"])])],
        );
        let game = enter_round(&game, "r1").unwrap();

        let game = record_answer(&game, "q1", "alice", true).unwrap();
        assert_eq!(game.current_user.as_deref(), Some("bob"));
        assert_eq!(round_score(&game.users[0], "r1"), 100);

        let game = record_answer(&game, "q2", "bob", false).unwrap();
        assert_eq!(game.current_user.as_deref(), Some("alice"));
        assert_eq!(round_score(&game.users[1], "r1"), -200);
        assert!(is_exhausted(&game));

        let finished_at = UNIX_EPOCH + Duration::from_secs(1_800_000_000);
        let game = finish_at(&game, finished_at).unwrap();
        assert!(game.is_finished);
        assert_eq!(game.winner.as_deref(), Some("alice"));
        assert_eq!(game.finish_date, Some(finished_at));
        assert_eq!(game.current_round, None);
        assert_eq!(game.current_user, None);
        assert_eq!(GamePhase::of(&game), GamePhase::Finished);
    }
}
