use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Configured persistence backend.
    pub storage: String,
}

impl HealthResponse {
    /// Storage is installed and answering.
    pub fn ok(storage: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            storage: storage.into(),
        }
    }

    /// No storage backend is available.
    pub fn degraded(storage: impl Into<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            storage: storage.into(),
        }
    }
}
