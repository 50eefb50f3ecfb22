use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{TimestampMilliSeconds, serde_as};
use uuid::Uuid;

use crate::state::game::{Game, Question, Round, RoundRank, RoundTime, Theme, User};

/// Player stored alongside the game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Stable identifier of the player.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether this player created the game.
    pub is_admin: bool,
    /// Score per round identifier.
    pub round_score: IndexMap<String, i32>,
}

/// Rank or time tier stored with a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierEntity {
    /// Numeric value (points or seconds).
    pub id: u16,
    /// Display label.
    pub label: String,
    /// Whether the tier is selected.
    pub is_selected: bool,
}

/// Question stored inside a theme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Question identifier.
    pub id: String,
    /// Question text.
    pub text: String,
    /// Expected answer.
    pub answer: String,
    /// Points awarded by a correct answer.
    pub points: u16,
    /// Verdict of the player on turn, `None` while unanswered.
    pub is_correct: Option<bool>,
    /// Verdicts of extra answerers keyed by player id.
    #[serde(default)]
    pub answered_by: IndexMap<String, bool>,
}

/// Theme stored inside a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeEntity {
    /// Theme identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Questions ordered by points.
    pub questions: Vec<QuestionEntity>,
}

/// Round stored inside a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Round identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Point tiers.
    pub ranks: Vec<TierEntity>,
    /// Themes of the board.
    pub themes: Vec<ThemeEntity>,
    /// Answer time limit.
    pub time: TierEntity,
}

/// Aggregate game entity persisted by the storage layer.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Optional title.
    pub name: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Players in turn order.
    pub users: Vec<UserEntity>,
    /// Rounds in play order.
    pub rounds: Vec<RoundEntity>,
    /// Round being played.
    pub current_round: Option<String>,
    /// Question currently shown.
    pub current_question: Option<String>,
    /// Player on turn.
    pub current_user: Option<String>,
    /// Whether the game has been finished.
    pub is_finished: bool,
    /// Winner once finished.
    pub winner: Option<String>,
    /// Finish timestamp.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    pub finish_date: Option<SystemTime>,
    /// Creation timestamp.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub updated_at: SystemTime,
    /// Id of the admin player.
    pub creator_id: String,
    /// Template the game was authored from.
    pub template_id: Option<String>,
}

/// Player summary shown in game listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummaryEntity {
    /// Stable identifier of the player.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Aggregate game list item entity (subset of GameEntity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListItemEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Optional title.
    pub name: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
    /// Finish timestamp, if finished.
    pub finish_date: Option<SystemTime>,
    /// Participating players.
    pub users: Vec<UserSummaryEntity>,
    /// Winner identifier, if finished.
    pub winner: Option<String>,
}

impl GameEntity {
    /// Snapshot a game for persistence, stamping the update time.
    pub fn from_game(game: Game, updated_at: SystemTime) -> Self {
        Self {
            id: game.id,
            name: game.name,
            description: game.description,
            users: game.users.into_iter().map(Into::into).collect(),
            rounds: game.rounds.into_iter().map(Into::into).collect(),
            current_round: game.current_round,
            current_question: game.current_question,
            current_user: game.current_user,
            is_finished: game.is_finished,
            winner: game.winner,
            finish_date: game.finish_date,
            created_at: game.created_at,
            updated_at,
            creator_id: game.creator_id,
            template_id: game.template_id,
        }
    }
}

impl From<GameEntity> for Game {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            users: entity.users.into_iter().map(Into::into).collect(),
            rounds: entity.rounds.into_iter().map(Into::into).collect(),
            current_round: entity.current_round,
            current_question: entity.current_question,
            current_user: entity.current_user,
            is_finished: entity.is_finished,
            winner: entity.winner,
            finish_date: entity.finish_date,
            created_at: entity.created_at,
            creator_id: entity.creator_id,
            template_id: entity.template_id,
        }
    }
}

impl From<GameEntity> for GameListItemEntity {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            finish_date: entity.finish_date,
            users: entity
                .users
                .into_iter()
                .map(|user| UserSummaryEntity {
                    id: user.id,
                    name: user.name,
                })
                .collect(),
            winner: entity.winner,
        }
    }
}

impl From<User> for UserEntity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            is_admin: user.is_admin,
            round_score: user.round_score,
        }
    }
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            is_admin: entity.is_admin,
            round_score: entity.round_score,
        }
    }
}

impl From<RoundRank> for TierEntity {
    fn from(rank: RoundRank) -> Self {
        Self {
            id: rank.id,
            label: rank.label,
            is_selected: rank.is_selected,
        }
    }
}

impl From<TierEntity> for RoundRank {
    fn from(tier: TierEntity) -> Self {
        Self {
            id: tier.id,
            label: tier.label,
            is_selected: tier.is_selected,
        }
    }
}

impl From<RoundTime> for TierEntity {
    fn from(time: RoundTime) -> Self {
        Self {
            id: time.id,
            label: time.label,
            is_selected: time.is_selected,
        }
    }
}

impl From<TierEntity> for RoundTime {
    fn from(tier: TierEntity) -> Self {
        Self {
            id: tier.id,
            label: tier.label,
            is_selected: tier.is_selected,
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            text: question.text,
            answer: question.answer,
            points: question.points,
            is_correct: question.is_correct,
            answered_by: question.answered_by,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(entity: QuestionEntity) -> Self {
        Self {
            id: entity.id,
            text: entity.text,
            answer: entity.answer,
            points: entity.points,
            is_correct: entity.is_correct,
            answered_by: entity.answered_by,
        }
    }
}

impl From<Theme> for ThemeEntity {
    fn from(theme: Theme) -> Self {
        Self {
            id: theme.id,
            name: theme.name,
            questions: theme.questions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ThemeEntity> for Theme {
    fn from(entity: ThemeEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            questions: entity.questions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Round> for RoundEntity {
    fn from(round: Round) -> Self {
        Self {
            id: round.id,
            name: round.name,
            ranks: round.ranks.into_iter().map(Into::into).collect(),
            themes: round.themes.into_iter().map(Into::into).collect(),
            time: round.time.into(),
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(entity: RoundEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            ranks: entity.ranks.into_iter().map(Into::into).collect(),
            themes: entity.themes.into_iter().map(Into::into).collect(),
            time: entity.time.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::state::{game::fixtures::*, scoring::record_answer};

    #[test]
    fn entity_preserves_the_snapshot() {
        let game = started_game(
            &["alice", "bob"],
            vec![round("r1", &[100, 200], &[("t1", &["q1", "q2"])])],
        );
        let game = record_answer(&game, "q2", "alice", false).unwrap();
        let updated_at = UNIX_EPOCH + Duration::from_millis(1_700_000_123_456);

        let entity = GameEntity::from_game(game.clone(), updated_at);
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["updated_at"], 1_700_000_123_456_i64);
        assert_eq!(json["users"][0]["round_score"]["r1"], -200);

        let decoded: GameEntity = serde_json::from_value(json).unwrap();
        assert_eq!(Game::from(decoded), game);
    }

    #[test]
    fn list_item_summarizes_players() {
        let game = game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        let item = GameListItemEntity::from(GameEntity::from_game(game.clone(), game.created_at));
        let names = item.users.iter().map(|u| u.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(item.id, game.id);
    }
}
