use std::path::{Path, PathBuf};

const ACTIVE_DIR: &str = "active";
const HISTORY_DIR: &str = "history";

/// Location of the JSON documents written by [`super::FileGameStore`].
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Data directory holding `active/` and `history/`.
    pub root: PathBuf,
}

impl FileStoreConfig {
    /// Use `root` as data directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory of games still being played.
    pub fn active_dir(&self) -> PathBuf {
        self.root.join(ACTIVE_DIR)
    }

    /// Directory of finished games.
    pub fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
