mod config;
mod error;
mod store;

pub use config::FileStoreConfig;
pub use error::FileDaoError;
pub use store::FileGameStore;

use crate::dao::storage::StorageError;

impl From<FileDaoError> for StorageError {
    fn from(err: FileDaoError) -> Self {
        match err {
            FileDaoError::Decode { path, source } => StorageError::corrupted(path, source),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
