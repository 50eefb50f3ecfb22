use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    dao::models::GameListItemEntity,
    dto::{format_system_time, validation::validate_non_blank},
    state::{
        authoring::{GameDraft, RoundDraft, ThemeDraft, UserDraft},
        game::{Game, Points, Question, RoundRank, RoundTime, ThemeId, UserId},
        question::QuestionState,
        scoring::{self, ScoreLine},
        state_machine::GamePhase,
    },
};

/// Payload used to author a brand-new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Optional title.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Players; exactly one must be flagged as admin.
    #[validate(length(min = 2), nested)]
    pub users: Vec<UserInput>,
    /// Rounds in play order.
    #[validate(length(min = 1), nested)]
    pub rounds: Vec<RoundInput>,
    /// Template the game is authored from.
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Incoming player definition.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    /// Display name.
    #[validate(custom(function = "validate_non_blank"))]
    pub name: String,
    /// Whether the player creates and runs the game.
    #[serde(default)]
    pub is_admin: bool,
}

/// Incoming round definition. Omitted ranks or times fall back to the
/// configured catalogues.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoundInput {
    /// Display name.
    #[validate(custom(function = "validate_non_blank"))]
    pub name: String,
    /// Point tiers, the configured catalogue when omitted.
    #[serde(default)]
    #[validate(nested)]
    pub ranks: Option<Vec<RankInput>>,
    /// Time limits, the configured catalogue when omitted.
    #[serde(default)]
    #[validate(nested)]
    pub times: Option<Vec<TimeInput>>,
    /// Themes of the board.
    #[serde(default)]
    #[validate(nested)]
    pub themes: Vec<ThemeInput>,
}

/// Point tier offered by a round.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RankInput {
    /// Points of the tier.
    #[validate(range(min = 1))]
    pub points: Points,
    /// Display label, the points when omitted.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether the tier is in play.
    #[serde(default = "selected_by_default")]
    pub is_selected: bool,
}

/// Answer time limit offered by a round.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeInput {
    /// Time limit in seconds.
    #[validate(range(min = 1))]
    pub seconds: u16,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether this limit applies to the round.
    #[serde(default)]
    pub is_selected: bool,
}

/// Theme declared by a round, optionally with its questions.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ThemeInput {
    /// Display name.
    #[validate(custom(function = "validate_non_blank"))]
    pub name: String,
    /// Questions, matched to tiers by points.
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// Question filled in at creation time.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    /// Tier the question belongs to.
    pub points: Points,
    /// Question text.
    #[validate(custom(function = "validate_non_blank"))]
    pub text: String,
    /// Expected answer.
    #[validate(custom(function = "validate_non_blank"))]
    pub answer: String,
}

fn selected_by_default() -> bool {
    true
}

impl CreateGameRequest {
    /// Turn the request into an authoring draft, filling tier catalogues from config.
    pub fn into_draft(self, config: &AppConfig) -> GameDraft {
        GameDraft {
            name: self.name,
            description: self.description,
            users: self
                .users
                .into_iter()
                .map(|user| UserDraft {
                    name: user.name,
                    is_admin: user.is_admin,
                })
                .collect(),
            rounds: self
                .rounds
                .into_iter()
                .map(|round| round.into_draft(config))
                .collect(),
            template_id: self.template_id,
        }
    }
}

impl RoundInput {
    fn into_draft(self, config: &AppConfig) -> RoundDraft {
        let ranks = match self.ranks {
            Some(ranks) => ranks
                .into_iter()
                .map(|rank| RoundRank {
                    id: rank.points,
                    label: rank.label.unwrap_or_else(|| rank.points.to_string()),
                    is_selected: rank.is_selected,
                })
                .collect(),
            None => config.default_ranks.clone(),
        };
        let times = match self.times {
            Some(times) => times
                .into_iter()
                .map(|time| RoundTime {
                    id: time.seconds,
                    label: time.label.unwrap_or_else(|| format!("{}s", time.seconds)),
                    is_selected: time.is_selected,
                })
                .collect(),
            None => config.default_times.clone(),
        };

        RoundDraft {
            name: self.name,
            ranks,
            times,
            themes: self
                .themes
                .into_iter()
                .map(|theme| ThemeDraft {
                    name: theme.name,
                    questions: theme
                        .questions
                        .into_iter()
                        .map(|q| (q.points, q.text, q.answer))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Query locating a board cell by theme and rank.
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QuestionQuery {
    /// Theme of the cell.
    #[validate(custom(function = "validate_non_blank"))]
    pub theme_id: ThemeId,
    /// Points of the cell.
    pub rank_id: Points,
}

/// Verdict recorded for a question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    /// Question being answered.
    #[validate(custom(function = "validate_non_blank"))]
    pub question_id: String,
    /// Player giving the answer.
    #[validate(custom(function = "validate_non_blank"))]
    pub user_id: UserId,
    /// Whether the answer is correct.
    pub is_correct: bool,
}

/// Text and answer for a generated question slot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FillQuestionRequest {
    /// Theme of the cell.
    #[validate(custom(function = "validate_non_blank"))]
    pub theme_id: ThemeId,
    /// Points of the cell.
    pub rank_id: Points,
    /// Question text.
    #[validate(custom(function = "validate_non_blank"))]
    pub text: String,
    /// Expected answer.
    #[validate(custom(function = "validate_non_blank"))]
    pub answer: String,
}

/// Score line of one player.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreLineDto {
    /// Player id.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Score per round id.
    #[schema(value_type = Object)]
    pub rounds: IndexMap<String, i32>,
    /// Sum over all rounds.
    pub total: i32,
}

impl From<ScoreLine> for ScoreLineDto {
    fn from(line: ScoreLine) -> Self {
        Self {
            user_id: line.user_id,
            name: line.name,
            rounds: line.rounds,
            total: line.total,
        }
    }
}

/// Scores of every player together with the current leader.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scoreboard {
    /// One line per player, in turn order.
    pub lines: Vec<ScoreLineDto>,
    /// Winner once finished, otherwise the player currently ahead.
    pub leader: Option<UserId>,
}

impl Scoreboard {
    /// Compute the scoreboard of a snapshot.
    pub fn of(game: &Game) -> Self {
        let leader = match &game.winner {
            Some(winner) => Some(winner.clone()),
            None => scoring::determine_winner(&game.users).map(|user| user.id.clone()),
        };
        Self {
            lines: scoring::scoreboard(game)
                .into_iter()
                .map(Into::into)
                .collect(),
            leader,
        }
    }
}

/// Game snapshot returned by every endpoint that reads or changes a game.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    /// Progression phase derived from the snapshot.
    pub phase: GamePhase,
    /// The game itself.
    pub game: Game,
    /// Current scores.
    pub scoreboard: Scoreboard,
}

impl From<Game> for GameView {
    fn from(game: Game) -> Self {
        Self {
            phase: GamePhase::of(&game),
            scoreboard: Scoreboard::of(&game),
            game,
        }
    }
}

/// Board cell returned when a question is selected for display.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// Theme of the cell.
    pub theme_id: ThemeId,
    /// The selected question.
    pub question: Question,
    /// Lifecycle of the question.
    pub state: QuestionState,
}

/// Row of a game listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameListItem {
    /// Game id.
    pub id: Uuid,
    /// Optional title.
    pub name: Option<String>,
    /// Creation time, RFC 3339.
    pub created_at: String,
    /// Last update, RFC 3339.
    pub updated_at: String,
    /// Finish time of archived games.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
    /// Player names.
    pub users: Vec<String>,
    /// Winner of archived games.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl From<GameListItemEntity> for GameListItem {
    fn from(entity: GameListItemEntity) -> Self {
        let winner = entity.winner.and_then(|winner_id| {
            entity
                .users
                .iter()
                .find(|user| user.id == winner_id)
                .map(|user| user.name.clone())
        });
        Self {
            id: entity.id,
            name: entity.name,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
            finish_date: entity.finish_date.map(format_system_time),
            users: entity.users.into_iter().map(|user| user.name).collect(),
            winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::authoring::assemble_game;

    fn request(json: serde_json::Value) -> CreateGameRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn omitted_tiers_come_from_config() {
        let config = AppConfig::default();
        let payload = request(serde_json::json!({
            "users": [{ "name": "Alice", "isAdmin": true }, { "name": "Bob" }],
            "rounds": [{ "name": "Warm-up", "themes": [{ "name": "Science" }] }]
        }));
        assert!(payload.validate().is_ok());

        let game = assemble_game(payload.into_draft(&config)).unwrap();
        let round = &game.rounds[0];
        assert_eq!(round.ranks, config.default_ranks);
        assert_eq!(round.themes[0].questions.len(), config.default_ranks.len());
        assert_eq!(round.time.id, 60);
    }

    #[test]
    fn blank_names_and_short_rosters_fail_validation() {
        let payload = request(serde_json::json!({
            "users": [{ "name": " ", "isAdmin": true }],
            "rounds": [{ "name": "R", "themes": [] }]
        }));
        assert!(payload.validate().is_err());
    }

    #[test]
    fn roster_and_round_counts_are_checked() {
        let payload = request(serde_json::json!({
            "users": [{ "name": "Alice", "isAdmin": true }],
            "rounds": []
        }));
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("users"));
        assert!(errors.errors().contains_key("rounds"));
    }

    #[test]
    fn game_view_reports_phase_and_leader() {
        use crate::state::game::fixtures::*;

        let mut game = started_game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        game.users[1].round_score.insert("r1".into(), 100);
        let view = GameView::from(game);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["phase"], "in_progress");
        assert_eq!(json["scoreboard"]["leader"], "bob");
        assert_eq!(json["scoreboard"]["lines"][1]["total"], 100);
        assert_eq!(json["game"]["currentRound"], "r1");
    }
}
