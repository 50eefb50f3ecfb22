//! Trivia Back binary entrypoint wiring configuration, storage supervision, REST and SSE layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_back::{
    config::{AppConfig, StorageBackend},
    dao::{
        game_store::{
            GameStore,
            file::{FileGameStore, FileStoreConfig},
            memory::InMemoryGameStore,
        },
        storage::StorageError,
    },
    routes,
    services::{sse_events, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;
    info!(storage = ?config.storage, auto_finish = config.auto_finish, "configuration ready");

    let app_state = AppState::new(config.clone());

    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        connect_store(config.clone())
    }));
    tokio::spawn(relay_degraded_status(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Open the storage driver selected by the configuration.
async fn connect_store(config: AppConfig) -> Result<Arc<dyn GameStore>, StorageError> {
    match config.storage {
        StorageBackend::Memory => Ok(Arc::new(InMemoryGameStore::new())),
        StorageBackend::File => {
            let store = FileGameStore::open(FileStoreConfig::new(&config.data_dir)).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use trivia_back::dao::game_store::couchdb::CouchGameStore;

            let store = CouchGameStore::connect(config.couch.clone()).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "couch-store"))]
        StorageBackend::Couch => Err(StorageError::unavailable(
            "couch storage requires the `couch-store` feature".into(),
            std::io::Error::other("couch-store feature disabled"),
        )),
    }
}

/// Forward degraded mode changes to SSE subscribers.
async fn relay_degraded_status(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        if degraded {
            warn!("storage lost; serving in degraded mode");
        } else {
            info!("storage available");
        }
        sse_events::broadcast_system_status(&state, degraded);
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
