pub mod authoring;
/// Engine errors.
pub mod error;
/// Game model.
pub mod game;
/// Question lifecycle.
pub mod question;
pub mod scoring;
mod sse;
/// Phase transitions.
pub mod state_machine;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{config::AppConfig, dao::game_store::GameStore, error::ServiceError};

pub use self::sse::SseHub;

/// State shared by every handler.
pub type SharedState = Arc<AppState>;
/// Longest wait for the lock of a game.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

const PUBLIC_SSE_CAPACITY: usize = 32;

/// Central application state: storage handle, degraded flag, broadcast hub
/// and the per-game gates serializing mutations.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    sse: SseHub,
    config: Arc<AppConfig>,
    degraded: watch::Sender<bool>,
    game_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_timeout(config, Some(DEFAULT_TRANSITION_TIMEOUT))
    }

    /// Same as [`AppState::new`] with a custom limit on gated actions.
    pub fn with_timeout(config: AppConfig, transition_timeout: Option<Duration>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            config: Arc::new(config),
            degraded: degraded_tx,
            game_gates: DashMap::new(),
            transition_timeout,
        })
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current game store or [`ServiceError::Degraded`].
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn install_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.game_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Loaded application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Forget the gate of a game that left the active set.
    pub fn release_game(&self, game_id: Uuid) {
        self.game_gates.remove(&game_id);
    }

    /// Broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    fn gate(&self, game_id: Uuid) -> Arc<Mutex<()>> {
        self.game_gates
            .entry(game_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `work` while holding the gate of `game_id`.
    ///
    /// Actions on the same game are applied one at a time. When the configured
    /// limit elapses first the action is dropped and reported as timed out.
    pub async fn run_exclusive<F, Fut, T>(&self, game_id: Uuid, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.gate(game_id);
        let _guard = gate.lock().await;

        let work_future = work();
        match self.transition_timeout {
            Some(limit) => match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(game_id = %game_id, ?limit, "game action timed out");
                    Err(ServiceError::Timeout)
                }
            },
            None => work_future.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_game_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .install_game_store(Arc::new(crate::dao::game_store::memory::InMemoryGameStore::new()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
    }

    #[tokio::test]
    async fn actions_on_one_game_do_not_overlap() {
        let state = AppState::new(AppConfig::default());
        let game_id = Uuid::new_v4();
        let running = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4).map(|_| {
            let state = state.clone();
            let running = running.clone();
            tokio::spawn(async move {
                state
                    .run_exclusive(game_id, move || async move {
                        assert_eq!(running.fetch_add(1, Ordering::SeqCst), 0);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, ServiceError>(())
                    })
                    .await
            })
        });

        for task in tasks.collect::<Vec<_>>() {
            task.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn slow_action_times_out() {
        let state = AppState::with_timeout(AppConfig::default(), Some(Duration::from_millis(10)));
        let result = state
            .run_exclusive(Uuid::new_v4(), || async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ServiceError>(())
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Timeout)));
    }
}
