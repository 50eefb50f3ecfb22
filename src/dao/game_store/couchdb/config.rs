use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "http://localhost:5984";
const DEFAULT_DATABASE: &str = "trivia";

/// Connection settings for the CouchDB store.
///
/// Read from the `couch` section of the application config, then overridden by
/// `COUCH_BASE_URL`, `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CouchConfig {
    /// CouchDB server URL.
    pub base_url: String,
    /// Database holding the game documents.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
}

impl Default for CouchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            database: DEFAULT_DATABASE.into(),
            username: None,
            password: None,
        }
    }
}

impl CouchConfig {
    /// Apply the CouchDB environment variables on top of the file settings.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var("COUCH_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(database) = std::env::var("COUCH_DB") {
            self.database = database;
        }
        if let (Ok(username), Ok(password)) = (
            std::env::var("COUCH_USERNAME"),
            std::env::var("COUCH_PASSWORD"),
        ) {
            self.username = Some(username);
            self.password = Some(password);
        }
        self
    }

    /// Basic-auth credentials, when both parts are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username.as_deref().zip(self.password.as_deref())
    }
}
