use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    error::EngineError,
    game::{Game, Points, Question, Round},
};

/// Board status of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestionState {
    /// Not answered and not on screen.
    Unanswered,
    /// Currently opened on the board.
    Active,
    /// A verdict was recorded.
    Answered {
        /// Verdict of the turn holder.
        correct: bool,
    },
}

/// Locate the question of `theme_id` worth `rank_id` points.
///
/// An unknown pair yields `None`; answered questions stay selectable so the board
/// can display them.
pub fn select_question<'a>(round: &'a Round, theme_id: &str, rank_id: Points) -> Option<&'a Question> {
    round
        .themes
        .iter()
        .find(|theme| theme.id == theme_id)?
        .questions
        .iter()
        .find(|question| question.points == rank_id)
}

/// Open a question of the current round on the board.
///
/// Returns `Ok(None)` without touching the snapshot when the pair does not exist.
pub fn open_question(game: &Game, theme_id: &str, rank_id: Points) -> Result<Option<Game>, EngineError> {
    if game.is_finished {
        return Err(EngineError::InvalidTurn("game is already finished".into()));
    }
    if game.current_user.is_none() {
        return Err(EngineError::InvalidTurn("no current user".into()));
    }
    let round = game
        .active_round()
        .ok_or_else(|| EngineError::InvalidTurn("no current round".into()))?;

    let Some(question) = select_question(round, theme_id, rank_id) else {
        return Ok(None);
    };
    if question.is_answered() {
        return Err(EngineError::AlreadyAnswered {
            question_id: question.id.clone(),
        });
    }

    let mut next = game.clone();
    next.current_question = Some(question.id.clone());
    Ok(Some(next))
}

/// Board status of `question` within `game`.
pub fn question_state(game: &Game, question: &Question) -> QuestionState {
    match question.is_correct {
        Some(correct) => QuestionState::Answered { correct },
        None if game.current_question.as_deref() == Some(question.id.as_str()) => {
            QuestionState::Active
        }
        None => QuestionState::Unanswered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{game::fixtures::*, scoring::record_answer};

    fn board() -> Game {
        started_game(
            &["alice", "bob"],
            vec![round(
                "r1",
                &[100, 200],
                &[("t1", &["q1", "q2"]), ("t2", &["q3", "q4"])],
            )],
        )
    }

    #[test]
    fn selects_question_by_theme_and_rank() {
        let game = board();
        let question = select_question(&game.rounds[0], "t2", 200).unwrap();
        assert_eq!(question.id, "q4");
    }

    #[test]
    fn absent_pair_is_a_no_op() {
        let game = board();
        let before = game.clone();

        assert!(select_question(&game.rounds[0], "t9", 100).is_none());
        assert!(select_question(&game.rounds[0], "t1", 500).is_none());
        assert_eq!(open_question(&game, "t1", 500).unwrap(), None);
        assert_eq!(game, before);
    }

    #[test]
    fn opening_marks_question_active() {
        let game = board();
        let opened = open_question(&game, "t1", 200).unwrap().unwrap();

        assert_eq!(opened.current_question.as_deref(), Some("q2"));
        let question = select_question(&opened.rounds[0], "t1", 200).unwrap();
        assert_eq!(question_state(&opened, question), QuestionState::Active);
        let other = select_question(&opened.rounds[0], "t1", 100).unwrap();
        assert_eq!(question_state(&opened, other), QuestionState::Unanswered);
    }

    #[test]
    fn answered_question_stays_selectable_but_cannot_reopen() {
        let game = record_answer(&board(), "q1", "alice", false).unwrap();

        let question = select_question(&game.rounds[0], "t1", 100).unwrap();
        assert_eq!(
            question_state(&game, question),
            QuestionState::Answered { correct: false }
        );
        assert!(matches!(
            open_question(&game, "t1", 100).unwrap_err(),
            EngineError::AlreadyAnswered { .. }
        ));
    }

    #[test]
    fn opening_requires_a_current_round() {
        let mut game = board();
        game.current_round = None;
        assert!(matches!(
            open_question(&game, "t1", 100).unwrap_err(),
            EngineError::InvalidTurn(_)
        ));
    }
}
