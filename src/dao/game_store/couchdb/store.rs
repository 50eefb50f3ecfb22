use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::warn;
use uuid::Uuid;

use crate::dao::{
    game_store::{GameStore, latest},
    models::{GameEntity, GameListItemEntity},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        ACTIVE_PREFIX, AllDocsResponse, CouchGameDocument, END_SUFFIX, HISTORY_PREFIX,
        RevisionOnly, doc_id,
    },
};

/// Stores active and finished games as CouchDB documents of one database.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::Client { source })?;

        let auth = config
            .credentials()
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));
        let store = Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            database: Arc::<str>::from(config.database),
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseUnreachable {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseUnreachable {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::Request {
                doc_id: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let value = response.json::<serde_json::Value>().await.map_err(|source| {
                    CouchDaoError::Body {
                        doc_id: doc_id.to_string(),
                        source,
                    }
                })?;
                from_value(value)
                    .map(Some)
                    .map_err(|source| CouchDaoError::CorruptedDocument {
                        doc_id: doc_id.to_string(),
                        source,
                    })
            }
            other => Err(CouchDaoError::from_status(doc_id, other)),
        }
    }

    async fn current_revision(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self
            .get_document::<RevisionOnly>(doc_id)
            .await?
            .map(|doc| doc.rev))
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Request {
                doc_id: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::from_status(doc_id, response.status()))
        }
    }

    /// Insert or overwrite a game document, carrying over the stored revision.
    async fn upsert_game(&self, prefix: &str, game: GameEntity) -> CouchResult<()> {
        let mut doc = CouchGameDocument::new(prefix, game);
        doc.rev = self.current_revision(&doc.id).await?;
        self.put_document(&doc.id, &doc).await
    }

    async fn delete_document(&self, doc_id: &str) -> CouchResult<bool> {
        let Some(rev) = self.current_revision(doc_id).await? else {
            return Ok(false);
        };

        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::Request {
                doc_id: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::from_status(doc_id, other)),
        }
    }

    async fn list_documents(&self, prefix: &str) -> CouchResult<Vec<CouchGameDocument>> {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::Request {
                doc_id: prefix.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::from_status(prefix, response.status()));
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::Body {
                doc_id: prefix.to_string(),
                source,
            }
        })?;

        Ok(decode_rows(payload))
    }

    async fn list_games(&self, prefix: &str) -> CouchResult<Vec<GameEntity>> {
        let docs = self.list_documents(prefix).await?;
        Ok(docs.into_iter().map(|doc| doc.game).collect())
    }
}

impl GameStore for CouchGameStore {
    fn load_game(&self, id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            match id {
                Some(id) => {
                    let doc = store
                        .get_document::<CouchGameDocument>(&doc_id(ACTIVE_PREFIX, id))
                        .await?;
                    Ok(doc.map(|doc| doc.game))
                }
                None => Ok(latest(store.list_games(ACTIVE_PREFIX).await?)),
            }
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_game(ACTIVE_PREFIX, game).await.map_err(Into::into) })
    }

    fn append_history(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_game(HISTORY_PREFIX, game).await.map_err(Into::into) })
    }

    fn remove_active(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_document(&doc_id(ACTIVE_PREFIX, id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_history(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = store
                .get_document::<CouchGameDocument>(&doc_id(HISTORY_PREFIX, id))
                .await?;
            Ok(doc.map(|doc| doc.game))
        })
    }

    fn list_active(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let games = store.list_games(ACTIVE_PREFIX).await?;
            Ok(games.into_iter().map(Into::into).collect())
        })
    }

    fn list_history(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let games = store.list_games(HISTORY_PREFIX).await?;
            Ok(games.into_iter().map(Into::into).collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::DatabaseUnreachable {
                    database: store.database.to_string(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::DatabaseStatus {
                    database: store.database.to_string(),
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

/// Decode the documents of an `_all_docs` page, skipping rows that no longer
/// match the game model.
fn decode_rows(payload: AllDocsResponse) -> Vec<CouchGameDocument> {
    payload
        .rows
        .into_iter()
        .filter_map(|row| {
            let doc = row.doc?;
            match from_value::<CouchGameDocument>(doc) {
                Ok(doc) => Some(doc),
                Err(err) => {
                    warn!(doc_id = %row.id, error = %err, "skipping undecodable game document");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use serde_json::json;

    use super::*;
    use crate::state::game::fixtures::{game, round};

    #[test]
    fn listing_skips_undecodable_rows() {
        let game = game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        let entity = GameEntity::from_game(game, UNIX_EPOCH);
        let good = CouchGameDocument::new(ACTIVE_PREFIX, entity.clone());
        let good_id = good.id.clone();
        let payload: AllDocsResponse = serde_json::from_value(json!({
            "rows": [
                { "id": "active::broken", "doc": { "_id": "active::broken", "name": 3 } },
                { "id": good_id, "doc": serde_json::to_value(&good).unwrap() },
                { "id": "active::deleted" }
            ]
        }))
        .unwrap();

        let docs = decode_rows(payload);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].game, entity);
        assert_eq!(latest(docs.into_iter().map(|doc| doc.game)), Some(entity));
    }
}
