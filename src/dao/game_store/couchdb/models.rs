use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::GameEntity;

/// Id prefix of games still being played.
pub const ACTIVE_PREFIX: &str = "active::";
/// Id prefix of finished games.
pub const HISTORY_PREFIX: &str = "history::";
/// Upper bound appended to a prefix for `_all_docs` range queries.
pub const END_SUFFIX: &str = "\u{ffff}";

/// Body of an `_all_docs` query.
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    /// Matching documents in key order.
    pub rows: Vec<AllDocsRow>,
}

/// One row of an `_all_docs` answer.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    /// Document id.
    pub id: String,
    /// Full document, present with `include_docs=true`.
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Revision-only view of a document, used before overwrites and deletes.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    /// Current revision token.
    #[serde(rename = "_rev")]
    pub rev: String,
}

/// Game snapshot stored under `active::<id>` or `history::<id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    /// Prefixed document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision to overwrite, `None` for a new document.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// The stored game.
    #[serde(flatten)]
    pub game: GameEntity,
}

impl CouchGameDocument {
    /// Wrap a game under the given id prefix.
    pub fn new(prefix: &str, game: GameEntity) -> Self {
        Self {
            id: doc_id(prefix, game.id),
            rev: None,
            game,
        }
    }
}

/// Document id of a game under a prefix.
pub fn doc_id(prefix: &str, id: Uuid) -> String {
    format!("{prefix}{id}")
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;
    use crate::state::game::fixtures::{game, round};

    #[test]
    fn document_flattens_the_game_next_to_couch_keys() {
        let game = game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        let entity = GameEntity::from_game(game, UNIX_EPOCH);
        let doc = CouchGameDocument::new(HISTORY_PREFIX, entity.clone());

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["_id"], format!("history::{}", entity.id));
        assert!(json.get("_rev").is_none());
        assert_eq!(json["creator_id"], "alice");

        let back: CouchGameDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back.game, entity);
    }
}
