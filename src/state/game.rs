use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{TimestampMilliSeconds, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;

/// Identifier of a player inside a game.
pub type UserId = String;
/// Identifier of a round inside a game.
pub type RoundId = String;
/// Identifier of a theme inside a round.
pub type ThemeId = String;
/// Identifier of a question inside a theme.
pub type QuestionId = String;
/// Point value of a rank; doubles as the rank identifier.
pub type Points = u16;

/// Player taking part in a game together with the score earned in each round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier of the player.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Whether this player created the game.
    #[serde(default)]
    pub is_admin: bool,
    /// Accumulated score per round, in the order rounds were first scored.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub round_score: IndexMap<RoundId, i32>,
}

impl User {
    /// Build a player without any score yet.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_admin,
            round_score: IndexMap::new(),
        }
    }
}

/// Selectable point tier of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundRank {
    /// Points awarded by questions of this tier.
    pub id: Points,
    /// Label displayed on the board.
    pub label: String,
    /// Whether the tier is part of the round.
    pub is_selected: bool,
}

/// Answer time limit option of a round, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundTime {
    /// Time limit in seconds.
    pub id: u16,
    /// Label displayed to players.
    pub label: String,
    /// Whether this limit applies to the round.
    pub is_selected: bool,
}

/// A single board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Stable identifier of the question.
    pub id: QuestionId,
    /// Question text read to the players.
    pub text: String,
    /// Expected answer.
    pub answer: String,
    /// Points at stake, equal to the rank it was generated from.
    pub points: Points,
    /// `None` while unanswered, then the verdict of the turn holder.
    #[serde(default)]
    pub is_correct: Option<bool>,
    /// Every player who answered this question with their verdict.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schema(value_type = Object)]
    pub answered_by: IndexMap<UserId, bool>,
}

impl Question {
    /// Whether a verdict has already been recorded.
    pub fn is_answered(&self) -> bool {
        self.is_correct.is_some()
    }
}

/// Topical column of a round: one question per selected rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// Stable identifier of the theme.
    pub id: ThemeId,
    /// Theme title.
    pub name: String,
    /// Questions ordered by ascending points.
    pub questions: Vec<Question>,
}

/// Themed block of questions sharing a rank structure and time limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Stable identifier of the round.
    pub id: RoundId,
    /// Round title.
    pub name: String,
    /// Point tiers offered while authoring, selected ones are in play.
    pub ranks: Vec<RoundRank>,
    /// Themes of the round.
    pub themes: Vec<Theme>,
    /// Selected answer time limit.
    pub time: RoundTime,
}

impl Round {
    /// Point values of the selected ranks, in declaration order.
    pub fn selected_points(&self) -> Vec<Points> {
        self.ranks
            .iter()
            .filter(|rank| rank.is_selected)
            .map(|rank| rank.id)
            .collect()
    }

    /// Find a question of this round by id.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.themes
            .iter()
            .flat_map(|theme| theme.questions.iter())
            .find(|question| question.id == question_id)
    }

    /// Find a question of this round by id, mutably.
    pub fn question_mut(&mut self, question_id: &str) -> Option<&mut Question> {
        self.themes
            .iter_mut()
            .flat_map(|theme| theme.questions.iter_mut())
            .find(|question| question.id == question_id)
    }

    /// Whether a theme is fully populated: one question per selected rank with
    /// matching points, each carrying a text and an answer.
    pub fn is_theme_populated(&self, theme: &Theme) -> bool {
        let mut expected = self.selected_points();
        let mut actual = theme.questions.iter().map(|q| q.points).collect::<Vec<_>>();
        expected.sort_unstable();
        actual.sort_unstable();

        !expected.is_empty()
            && expected == actual
            && theme
                .questions
                .iter()
                .all(|q| !q.text.trim().is_empty() && !q.answer.trim().is_empty())
    }

    /// Whether every question of the round has been answered.
    pub fn is_exhausted(&self) -> bool {
        self.themes
            .iter()
            .flat_map(|theme| theme.questions.iter())
            .all(Question::is_answered)
    }
}

/// Aggregate snapshot of a trivia game.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Primary key of the game.
    pub id: Uuid,
    /// Optional title.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Players in turn order.
    pub users: Vec<User>,
    /// Rounds in play order.
    pub rounds: Vec<Round>,
    /// Round being played.
    #[serde(default)]
    pub current_round: Option<RoundId>,
    /// Question currently opened on the board.
    #[serde(default)]
    pub current_question: Option<QuestionId>,
    /// Player holding the turn.
    #[serde(default)]
    pub current_user: Option<UserId>,
    /// Terminal flag; a finished game is an immutable record.
    #[serde(default)]
    pub is_finished: bool,
    /// Winner, set when the game finishes.
    #[serde(default)]
    pub winner: Option<UserId>,
    /// Finish timestamp (epoch milliseconds).
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[schema(value_type = Option<i64>)]
    pub finish_date: Option<SystemTime>,
    /// Creation timestamp (epoch milliseconds).
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    #[schema(value_type = i64)]
    pub created_at: SystemTime,
    /// Identifier of the admin player who created the game.
    pub creator_id: UserId,
    /// Template the game was generated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl Game {
    /// Find a player by id.
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == user_id)
    }

    /// Position of a player in turn order.
    pub fn user_index(&self, user_id: &str) -> Option<usize> {
        self.users.iter().position(|user| user.id == user_id)
    }

    /// Find a round by id.
    pub fn round(&self, round_id: &str) -> Option<&Round> {
        self.rounds.iter().find(|round| round.id == round_id)
    }

    /// Position of a round in play order.
    pub fn round_index(&self, round_id: &str) -> Option<usize> {
        self.rounds.iter().position(|round| round.id == round_id)
    }

    /// Round currently being played, if any.
    pub fn active_round(&self) -> Option<&Round> {
        self.current_round
            .as_deref()
            .and_then(|round_id| self.round(round_id))
    }

    /// Whether any question of the game has been answered.
    pub fn has_answers(&self) -> bool {
        self.rounds
            .iter()
            .flat_map(|round| round.themes.iter())
            .flat_map(|theme| theme.questions.iter())
            .any(|question| question.is_answered() || !question.answered_by.is_empty())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    /// Build a ready-to-play question.
    pub fn question(id: &str, points: Points) -> Question {
        Question {
            id: id.into(),
            text: format!("question {id}"),
            answer: format!("answer {id}"),
            points,
            is_correct: None,
            answered_by: IndexMap::new(),
        }
    }

    /// Round with every listed rank selected and one theme per `(id, questions)` entry.
    pub fn round(id: &str, points: &[Points], themes: &[(&str, &[&str])]) -> Round {
        Round {
            id: id.into(),
            name: format!("round {id}"),
            ranks: points
                .iter()
                .map(|p| RoundRank {
                    id: *p,
                    label: p.to_string(),
                    is_selected: true,
                })
                .collect(),
            themes: themes
                .iter()
                .map(|(theme_id, question_ids)| Theme {
                    id: (*theme_id).into(),
                    name: format!("theme {theme_id}"),
                    questions: question_ids
                        .iter()
                        .zip(points)
                        .map(|(qid, p)| question(qid, *p))
                        .collect(),
                })
                .collect(),
            time: RoundTime {
                id: 30,
                label: "30s".into(),
                is_selected: true,
            },
        }
    }

    /// Game in setup with the given players (first one is the admin).
    pub fn game(users: &[&str], rounds: Vec<Round>) -> Game {
        Game {
            id: Uuid::new_v4(),
            name: Some("friday night".into()),
            description: None,
            users: users
                .iter()
                .enumerate()
                .map(|(index, name)| User::new(*name, *name, index == 0))
                .collect(),
            rounds,
            current_round: None,
            current_question: None,
            current_user: None,
            is_finished: false,
            winner: None,
            finish_date: None,
            created_at: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            creator_id: users.first().map(|u| u.to_string()).unwrap_or_default(),
            template_id: None,
        }
    }

    /// Game already in progress on its first round, turn on the first player.
    pub fn started_game(users: &[&str], rounds: Vec<Round>) -> Game {
        let mut game = game(users, rounds);
        game.current_round = game.rounds.first().map(|r| r.id.clone());
        game.current_user = game.users.first().map(|u| u.id.clone());
        game
    }
}
