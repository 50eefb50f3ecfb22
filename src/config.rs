//! Application-level configuration loading: storage backend, listening port and
//! the tier catalogues offered to round authors.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

#[cfg(feature = "couch-store")]
use crate::dao::game_store::couchdb::CouchConfig;
use crate::state::game::{RoundRank, RoundTime};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BACK_CONFIG_PATH";
const STORAGE_ENV: &str = "TRIVIA_STORAGE";
const DATA_DIR_ENV: &str = "TRIVIA_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RANKS: [u16; 5] = [100, 200, 300, 400, 500];
const DEFAULT_TIMES: [(u16, bool); 3] = [(30, false), (60, true), (90, false)];

/// Persistence driver selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps, lost on restart.
    Memory,
    /// JSON documents under the data directory.
    File,
    /// CouchDB database.
    Couch,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "file" => Some(Self::File),
            "couch" | "couchdb" => Some(Self::Couch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Selected persistence driver.
    pub storage: StorageBackend,
    /// Root directory of the file driver.
    pub data_dir: PathBuf,
    /// CouchDB connection settings.
    #[cfg(feature = "couch-store")]
    pub couch: CouchConfig,
    /// HTTP listening port.
    pub port: u16,
    /// Rank tiers offered when a round does not declare its own.
    pub default_ranks: Vec<RoundRank>,
    /// Time limits offered when a round does not declare its own.
    pub default_times: Vec<RoundTime>,
    /// Finish and archive a game as soon as its last question is answered.
    pub auto_finish: bool,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to
    /// built-in defaults for anything missing.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = env::var(STORAGE_ENV) {
            match StorageBackend::parse(&value) {
                Some(storage) => self.storage = storage,
                None => warn!(
                    value = %value,
                    storage = ?self.storage,
                    "unknown storage backend in environment; keeping configured one"
                ),
            }
        }
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(port) = env::var("PORT")
            .or_else(|_| env::var("SERVER_PORT"))
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
        {
            self.port = port;
        }
        #[cfg(feature = "couch-store")]
        {
            self.couch = self.couch.with_env_overrides();
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::File,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            #[cfg(feature = "couch-store")]
            couch: CouchConfig::default(),
            port: DEFAULT_PORT,
            default_ranks: default_ranks(),
            default_times: default_times(),
            auto_finish: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    storage: Option<StorageBackend>,
    data_dir: Option<PathBuf>,
    #[cfg(feature = "couch-store")]
    #[serde(default)]
    couch: CouchConfig,
    port: Option<u16>,
    ranks: Option<Vec<u16>>,
    times: Option<Vec<RawTime>>,
    #[serde(default)]
    auto_finish: bool,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a time limit entry.
struct RawTime {
    seconds: u16,
    #[serde(default)]
    selected: bool,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            storage: value.storage.unwrap_or(defaults.storage),
            data_dir: value.data_dir.unwrap_or(defaults.data_dir),
            #[cfg(feature = "couch-store")]
            couch: value.couch,
            port: value.port.unwrap_or(defaults.port),
            default_ranks: value
                .ranks
                .filter(|ranks| !ranks.is_empty())
                .map(|ranks| ranks.into_iter().map(rank).collect())
                .unwrap_or(defaults.default_ranks),
            default_times: value
                .times
                .filter(|times| !times.is_empty())
                .map(|times| {
                    times
                        .into_iter()
                        .map(|time| round_time(time.seconds, time.selected))
                        .collect()
                })
                .unwrap_or(defaults.default_times),
            auto_finish: value.auto_finish,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn rank(points: u16) -> RoundRank {
    RoundRank {
        id: points,
        label: points.to_string(),
        is_selected: true,
    }
}

fn round_time(seconds: u16, selected: bool) -> RoundTime {
    RoundTime {
        id: seconds,
        label: format!("{seconds}s"),
        is_selected: selected,
    }
}

fn default_ranks() -> Vec<RoundRank> {
    DEFAULT_RANKS.into_iter().map(rank).collect()
}

fn default_times() -> Vec<RoundTime> {
    DEFAULT_TIMES
        .into_iter()
        .map(|(seconds, selected)| round_time(seconds, selected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "storage": "memory", "ranks": [50, 150], "autoFinish": true }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.auto_finish);
        let ranks = config.default_ranks.iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ranks, vec![50, 150]);
        assert_eq!(
            config.default_times.iter().filter(|t| t.is_selected).count(),
            1
        );
    }

    #[test]
    fn storage_names_are_case_insensitive() {
        assert_eq!(StorageBackend::parse("CouchDB"), Some(StorageBackend::Couch));
        assert_eq!(StorageBackend::parse(" file "), Some(StorageBackend::File));
        assert_eq!(StorageBackend::parse("redis"), None);
    }
}
