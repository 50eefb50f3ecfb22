//! Failures of the CouchDB game store.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias of the CouchDB driver.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Errors raised while talking to CouchDB.
///
/// Document variants carry the full document id (`active::<uuid>` or
/// `history::<uuid>`), listing variants the `_all_docs` prefix.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB client")]
    Client {
        /// Underlying failure.
        #[source]
        source: reqwest::Error,
    },
    /// The games database could not be reached or created.
    #[error("CouchDB database `{database}` is unreachable")]
    DatabaseUnreachable {
        /// Database name.
        database: String,
        /// Underlying failure.
        #[source]
        source: reqwest::Error,
    },
    /// The games database answered with an unexpected status.
    #[error("CouchDB database `{database}` answered {status}")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status answered by CouchDB.
        status: StatusCode,
    },
    /// A document request could not be sent.
    #[error("request for game document `{doc_id}` failed")]
    Request {
        /// Document id or listing prefix.
        doc_id: String,
        /// Underlying failure.
        #[source]
        source: reqwest::Error,
    },
    /// A document request answered with an unexpected status.
    #[error("game document `{doc_id}` request answered {status}")]
    Status {
        /// Document id or listing prefix.
        doc_id: String,
        /// Status answered by CouchDB.
        status: StatusCode,
    },
    /// The stored revision moved between our read and our write.
    #[error("game document `{doc_id}` was changed by another writer")]
    RevisionConflict {
        /// Document id or listing prefix.
        doc_id: String,
    },
    /// The response body was not JSON.
    #[error("response for game document `{doc_id}` is not valid JSON")]
    Body {
        /// Document id or listing prefix.
        doc_id: String,
        /// Underlying failure.
        #[source]
        source: reqwest::Error,
    },
    /// A stored document does not match the game model.
    #[error("game document `{doc_id}` cannot be decoded")]
    CorruptedDocument {
        /// Document id or listing prefix.
        doc_id: String,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}

impl CouchDaoError {
    /// Classify a non-success status of a document request.
    pub(crate) fn from_status(doc_id: &str, status: StatusCode) -> Self {
        match status {
            StatusCode::CONFLICT => Self::RevisionConflict {
                doc_id: doc_id.to_owned(),
            },
            status => Self::Status {
                doc_id: doc_id.to_owned(),
                status,
            },
        }
    }
}
