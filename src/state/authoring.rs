//! Admission rules for rounds and games built by a game master.

use std::{collections::HashSet, time::SystemTime};

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::state::game::{Game, Points, Question, Round, RoundRank, RoundTime, Theme, User};

/// Rejections raised while authoring rounds and games.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    /// A required name is empty or whitespace.
    #[error("{0} must not be blank")]
    BlankName(&'static str),
    /// No rank is selected for the round.
    #[error("round `{round}` needs at least one selected rank")]
    NoSelectedRank {
        /// Round name.
        round: String,
    },
    /// The same point value is declared twice.
    #[error("rank {points} is declared more than once in round `{round}`")]
    DuplicateRank {
        /// Round name.
        round: String,
        /// Duplicated point value.
        points: Points,
    },
    /// The round does not select exactly one time limit.
    #[error("round `{round}` must select exactly one time limit, got {selected}")]
    SelectedTimeCount {
        /// Round name.
        round: String,
        /// Number of selected time limits.
        selected: usize,
    },
    /// A theme has no name.
    #[error("theme #{index} of round `{round}` has a blank name")]
    BlankThemeName {
        /// Round name.
        round: String,
        /// Position of the theme in the draft.
        index: usize,
    },
    /// No question matches the theme and rank pair.
    #[error("no question for theme `{theme_id}` at rank {rank_id}")]
    QuestionSlotNotFound {
        /// Theme identifier.
        theme_id: String,
        /// Requested rank.
        rank_id: Points,
    },
    /// A question text or answer is blank.
    #[error("question text and answer must not be blank")]
    BlankQuestion,
    /// Fewer than two players.
    #[error("a game needs at least 2 players, got {0}")]
    TooFewUsers(usize),
    /// Two players share a name (case-insensitive).
    #[error("player name `{0}` is used more than once")]
    DuplicateUser(String),
    /// The roster does not designate exactly one admin.
    #[error("a game needs exactly one admin player, got {0}")]
    AdminCount(usize),
    /// The game carries no round.
    #[error("a game needs at least one round")]
    NoRounds,
}

/// Theme declared in a round draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDraft {
    /// Theme title.
    pub name: String,
    /// Optional `(points, text, answer)` triples filled right away.
    pub questions: Vec<(Points, String, String)>,
}

/// Round as submitted by the game master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundDraft {
    /// Round title.
    pub name: String,
    /// Offered rank tiers.
    pub ranks: Vec<RoundRank>,
    /// Offered time limits.
    pub times: Vec<RoundTime>,
    /// Declared themes.
    pub themes: Vec<ThemeDraft>,
}

/// Player as submitted by the game master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    /// Display name.
    pub name: String,
    /// Whether this player creates the game.
    pub is_admin: bool,
}

/// Game as submitted by the game master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDraft {
    /// Optional title.
    pub name: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Players in the desired turn order.
    pub users: Vec<UserDraft>,
    /// Rounds in play order.
    pub rounds: Vec<RoundDraft>,
    /// Template the game was generated from.
    pub template_id: Option<String>,
}

/// Validate a round draft and expand each theme into one empty question per
/// selected rank, ascending by points.
pub fn admit_round(draft: RoundDraft) -> Result<Round, AuthoringError> {
    let name = draft.name.trim().to_owned();
    if name.is_empty() {
        return Err(AuthoringError::BlankName("round name"));
    }

    let mut seen = HashSet::new();
    for rank in &draft.ranks {
        if !seen.insert(rank.id) {
            return Err(AuthoringError::DuplicateRank {
                round: name,
                points: rank.id,
            });
        }
    }

    let mut points = draft
        .ranks
        .iter()
        .filter(|rank| rank.is_selected)
        .map(|rank| rank.id)
        .collect::<Vec<_>>();
    if points.is_empty() {
        return Err(AuthoringError::NoSelectedRank { round: name });
    }
    points.sort_unstable();

    let mut selected_times = draft.times.into_iter().filter(|time| time.is_selected);
    let time = match (selected_times.next(), selected_times.count()) {
        (Some(time), 0) => time,
        (first, rest) => {
            return Err(AuthoringError::SelectedTimeCount {
                round: name,
                selected: usize::from(first.is_some()) + rest,
            });
        }
    };

    let mut themes = Vec::with_capacity(draft.themes.len());
    for (index, theme) in draft.themes.into_iter().enumerate() {
        let theme_name = theme.name.trim().to_owned();
        if theme_name.is_empty() {
            return Err(AuthoringError::BlankThemeName {
                round: name,
                index,
            });
        }

        let mut questions = points
            .iter()
            .map(|points| Question {
                id: Uuid::new_v4().to_string(),
                text: String::new(),
                answer: String::new(),
                points: *points,
                is_correct: None,
                answered_by: IndexMap::new(),
            })
            .collect::<Vec<_>>();
        for (rank_id, text, answer) in theme.questions {
            let slot = questions
                .iter_mut()
                .find(|question| question.points == rank_id)
                .ok_or_else(|| AuthoringError::QuestionSlotNotFound {
                    theme_id: theme_name.clone(),
                    rank_id,
                })?;
            fill_slot(slot, &text, &answer)?;
        }

        themes.push(Theme {
            id: Uuid::new_v4().to_string(),
            name: theme_name,
            questions,
        });
    }

    Ok(Round {
        id: Uuid::new_v4().to_string(),
        name,
        ranks: draft.ranks,
        themes,
        time,
    })
}

/// Fill the question generated for `theme_id` at `rank_id`.
pub fn fill_question(
    round: &Round,
    theme_id: &str,
    rank_id: Points,
    text: &str,
    answer: &str,
) -> Result<Round, AuthoringError> {
    let mut next = round.clone();
    let slot = next
        .themes
        .iter_mut()
        .find(|theme| theme.id == theme_id)
        .and_then(|theme| {
            theme
                .questions
                .iter_mut()
                .find(|question| question.points == rank_id)
        })
        .ok_or_else(|| AuthoringError::QuestionSlotNotFound {
            theme_id: theme_id.to_owned(),
            rank_id,
        })?;
    fill_slot(slot, text, answer)?;
    Ok(next)
}

/// Build a game in setup from a draft. The admin becomes the creator and
/// takes the first turn; other players keep their relative order.
pub fn assemble_game(draft: GameDraft) -> Result<Game, AuthoringError> {
    assemble_game_at(draft, SystemTime::now())
}

/// [`assemble_game`] with an explicit creation time.
pub fn assemble_game_at(draft: GameDraft, now: SystemTime) -> Result<Game, AuthoringError> {
    if draft.users.len() < 2 {
        return Err(AuthoringError::TooFewUsers(draft.users.len()));
    }

    let mut names = HashSet::new();
    for user in &draft.users {
        let name = user.name.trim();
        if name.is_empty() {
            return Err(AuthoringError::BlankName("player name"));
        }
        if !names.insert(name.to_lowercase()) {
            return Err(AuthoringError::DuplicateUser(name.to_owned()));
        }
    }

    let admins = draft.users.iter().filter(|user| user.is_admin).count();
    if admins != 1 {
        return Err(AuthoringError::AdminCount(admins));
    }
    if draft.rounds.is_empty() {
        return Err(AuthoringError::NoRounds);
    }

    let rounds = draft
        .rounds
        .into_iter()
        .map(admit_round)
        .collect::<Result<Vec<_>, _>>()?;

    let (admin, others): (Vec<_>, Vec<_>) =
        draft.users.into_iter().partition(|user| user.is_admin);
    let users = admin
        .into_iter()
        .chain(others)
        .map(|user| User::new(Uuid::new_v4().to_string(), user.name.trim(), user.is_admin))
        .collect::<Vec<_>>();
    let creator_id = users
        .first()
        .map(|user| user.id.clone())
        .unwrap_or_default();

    Ok(Game {
        id: Uuid::new_v4(),
        name: non_blank(draft.name),
        description: non_blank(draft.description),
        users,
        rounds,
        current_round: None,
        current_question: None,
        current_user: None,
        is_finished: false,
        winner: None,
        finish_date: None,
        created_at: now,
        creator_id,
        template_id: draft.template_id,
    })
}

fn fill_slot(question: &mut Question, text: &str, answer: &str) -> Result<(), AuthoringError> {
    let (text, answer) = (text.trim(), answer.trim());
    if text.is_empty() || answer.is_empty() {
        return Err(AuthoringError::BlankQuestion);
    }
    question.text = text.to_owned();
    question.answer = answer.to_owned();
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
