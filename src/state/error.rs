use thiserror::Error;

use crate::state::{
    game::{QuestionId, RoundId, UserId},
    state_machine::InvalidTransition,
};

/// Failures raised by the progression engine. Every rejection leaves the input
/// snapshot untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The question already carries a verdict, or the user already answered it.
    #[error("question `{question_id}` has already been answered")]
    AlreadyAnswered {
        /// Question targeted by the rejected answer.
        question_id: QuestionId,
    },
    /// The question is not part of the current round.
    #[error("question `{question_id}` is not part of the current round")]
    QuestionNotFound {
        /// Question that could not be located.
        question_id: QuestionId,
    },
    /// The action needs a current round and a current user.
    #[error("invalid turn: {0}")]
    InvalidTurn(String),
    /// The answering user does not belong to the game.
    #[error("user `{user_id}` is not part of this game")]
    UnknownUser {
        /// Unknown user identifier.
        user_id: UserId,
    },
    /// The requested round does not exist.
    #[error("round `{round_id}` not found")]
    RoundNotFound {
        /// Unknown round identifier.
        round_id: RoundId,
    },
    /// The game cannot start yet.
    #[error("game is not ready to start: {0}")]
    NotReady(String),
    /// The lifecycle does not allow this event from the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}
