use tracing::warn;

use crate::{config::StorageBackend, dto::health::HealthResponse, state::SharedState};

/// Report degraded mode and probe the installed store.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let backend = backend_name(state.config().storage);
    let Some(store) = state.game_store().await else {
        warn!("storage unavailable (degraded mode)");
        return HealthResponse::degraded(backend);
    };

    match store.health_check().await {
        Ok(()) => HealthResponse::ok(backend),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(backend)
        }
    }
}

fn backend_name(backend: StorageBackend) -> &'static str {
    match backend {
        StorageBackend::Memory => "memory",
        StorageBackend::File => "file",
        StorageBackend::Couch => "couch",
    }
}
