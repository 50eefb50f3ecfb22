mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchGameStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::CorruptedDocument { doc_id, source } => {
                StorageError::corrupted(doc_id, source)
            }
            CouchDaoError::RevisionConflict { doc_id } => StorageError::Conflict { key: doc_id },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn conflicting_writes_are_not_reported_as_outages() {
        let err = CouchDaoError::from_status("active::42", StatusCode::CONFLICT);
        assert!(matches!(
            StorageError::from(err),
            StorageError::Conflict { ref key } if key == "active::42"
        ));

        let err = CouchDaoError::from_status("history::42", StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(StorageError::from(err), StorageError::Unavailable { .. }));
    }
}
