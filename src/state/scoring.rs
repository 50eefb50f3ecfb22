//! Turn rotation, score accrual and winner selection.
//!
//! Every operation takes a snapshot by reference and hands back a new one so
//! the caller decides when the result becomes canonical (usually after the
//! persistence driver accepted it).

use indexmap::IndexMap;

use crate::state::{
    error::EngineError,
    game::{Game, RoundId, User, UserId},
};

/// Score line of one player, in turn order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLine {
    /// Player identifier.
    pub user_id: UserId,
    /// Player name.
    pub name: String,
    /// Score per round.
    pub rounds: IndexMap<RoundId, i32>,
    /// Sum over all rounds.
    pub total: i32,
}

/// Player who takes the turn after `current`, wrapping around the roster.
pub fn next_user<'a>(users: &'a [User], current: &str) -> Option<&'a User> {
    let index = users.iter().position(|user| user.id == current)?;
    users.get((index + 1) % users.len())
}

/// Score of a player in one round (zero when the round was never scored).
pub fn round_score(user: &User, round_id: &str) -> i32 {
    user.round_score.get(round_id).copied().unwrap_or(0)
}

/// Sum of a player's round scores.
pub fn total_score(user: &User) -> i32 {
    user.round_score.values().sum()
}

/// Score lines of every player, in turn order.
pub fn scoreboard(game: &Game) -> Vec<ScoreLine> {
    game.users
        .iter()
        .map(|user| ScoreLine {
            user_id: user.id.clone(),
            name: user.name.clone(),
            rounds: user.round_score.clone(),
            total: total_score(user),
        })
        .collect()
}

/// Player with the strictly highest total. Ties go to the earliest player in
/// turn order.
pub fn determine_winner(users: &[User]) -> Option<&User> {
    let mut best: Option<(&User, i32)> = None;
    for user in users {
        let total = total_score(user);
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((user, total)),
        }
    }
    best.map(|(user, _)| user)
}

/// Record the verdict for a question of the current round.
///
/// When the answering player holds the turn, the turn moves to the next player.
/// Any other player only sees their own score change.
pub fn record_answer(
    game: &Game,
    question_id: &str,
    user_id: &str,
    is_correct: bool,
) -> Result<Game, EngineError> {
    let (round_index, current_user) = turn_context(game)?;
    let user_index = game
        .user_index(user_id)
        .ok_or_else(|| EngineError::UnknownUser {
            user_id: user_id.to_owned(),
        })?;

    let question = game.rounds[round_index]
        .question(question_id)
        .ok_or_else(|| EngineError::QuestionNotFound {
            question_id: question_id.to_owned(),
        })?;
    if question.is_answered() || question.answered_by.contains_key(user_id) {
        return Err(EngineError::AlreadyAnswered {
            question_id: question_id.to_owned(),
        });
    }
    let points = question.points;

    let mut next = game.clone();
    let round_id = next.rounds[round_index].id.clone();
    if let Some(question) = next.rounds[round_index].question_mut(question_id) {
        question.is_correct = Some(is_correct);
        question.answered_by.insert(user_id.to_owned(), is_correct);
    }
    if next.current_question.as_deref() == Some(question_id) {
        next.current_question = None;
    }

    apply_points(&mut next.users[user_index], &round_id, points, is_correct);

    if user_id == current_user {
        next.current_user = next_user(&next.users, user_id).map(|user| user.id.clone());
    }

    Ok(next)
}

/// Record an answer from a player other than the turn holder.
///
/// The question verdict and the turn are left untouched; only the answering
/// player's score and the `answered_by` ledger change.
pub fn record_extra_answer(
    game: &Game,
    question_id: &str,
    user_id: &str,
    is_correct: bool,
) -> Result<Game, EngineError> {
    let (round_index, current_user) = turn_context(game)?;
    if user_id == current_user {
        return Err(EngineError::InvalidTurn(format!(
            "user `{user_id}` holds the turn and must answer through the regular flow"
        )));
    }
    let user_index = game
        .user_index(user_id)
        .ok_or_else(|| EngineError::UnknownUser {
            user_id: user_id.to_owned(),
        })?;

    let question = game.rounds[round_index]
        .question(question_id)
        .ok_or_else(|| EngineError::QuestionNotFound {
            question_id: question_id.to_owned(),
        })?;
    if question.answered_by.contains_key(user_id) {
        return Err(EngineError::AlreadyAnswered {
            question_id: question_id.to_owned(),
        });
    }
    let points = question.points;

    let mut next = game.clone();
    let round_id = next.rounds[round_index].id.clone();
    if let Some(question) = next.rounds[round_index].question_mut(question_id) {
        question.answered_by.insert(user_id.to_owned(), is_correct);
    }
    apply_points(&mut next.users[user_index], &round_id, points, is_correct);

    Ok(next)
}

/// Resolve the current round position and turn holder, or reject the action.
fn turn_context(game: &Game) -> Result<(usize, &str), EngineError> {
    if game.is_finished {
        return Err(EngineError::InvalidTurn("game is already finished".into()));
    }
    let round_id = game
        .current_round
        .as_deref()
        .ok_or_else(|| EngineError::InvalidTurn("no current round".into()))?;
    let current_user = game
        .current_user
        .as_deref()
        .ok_or_else(|| EngineError::InvalidTurn("no current user".into()))?;
    let round_index = game.round_index(round_id).ok_or_else(|| {
        EngineError::InvalidTurn(format!("current round `{round_id}` does not exist"))
    })?;
    if game.user_index(current_user).is_none() {
        return Err(EngineError::InvalidTurn(format!(
            "current user `{current_user}` is not part of this game"
        )));
    }
    Ok((round_index, current_user))
}

fn apply_points(user: &mut User, round_id: &str, points: u16, is_correct: bool) {
    let delta = i32::from(points);
    let score = user.round_score.entry(round_id.to_owned()).or_insert(0);
    if is_correct {
        *score += delta;
    } else {
        *score -= delta;
    }
}
