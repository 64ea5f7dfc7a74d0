//! Shared application state: storage handle, country pool, and the live
//! session registry.

pub mod engine;
pub mod game;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::score_store::ScoreStore,
    error::ServiceError,
    state::{engine::QuizEngine, game::Country},
};

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Shared handle to one session's runtime, locked per event.
pub type SessionHandle = Arc<Mutex<SessionRuntime>>;

/// Everything attached to one live quiz session.
///
/// The mutex around this struct is the session's logical event queue: HTTP
/// events, countdown ticks, and settle continuations all serialize through
/// it. The countdown handle lives here so the cancel-then-arm discipline is
/// enforced under the same lock that mutates the engine.
pub struct SessionRuntime {
    /// The pure state machine for this playthrough.
    pub engine: QuizEngine,
    /// Active countdown task, if a question is live. At most one per session.
    pub countdown: Option<JoinHandle<()>>,
    /// Player name used for the game-over leaderboard submission.
    pub player_name: Option<String>,
    /// Guards against submitting the same playthrough's score twice.
    pub score_submitted: bool,
}

impl SessionRuntime {
    /// Wrap a fresh engine; no countdown armed yet.
    pub fn new(engine: QuizEngine, player_name: Option<String>) -> Self {
        Self {
            engine,
            countdown: None,
            player_name,
            score_submitted: false,
        }
    }

    /// Abort the active countdown task, if any. Called before every
    /// evaluation and before arming a replacement, so a stale timer can
    /// never fire into a new question or epoch.
    pub fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }
}

/// Central application state storing the storage backend, the ingested
/// country pool, and all live sessions.
pub struct AppState {
    config: AppConfig,
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    pool: RwLock<Option<Arc<Vec<Country>>>>,
    sessions: DashMap<Uuid, SessionHandle>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply. The application starts in degraded mode until a
    /// storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            score_store: RwLock::new(None),
            pool: RwLock::new(None),
            sessions: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Like [`AppState::score_store`] but failing with
    /// [`ServiceError::Degraded`] when no backend is installed.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Flip the degraded flag; used by the storage supervisor when health
    /// checks fail without the backend being torn down.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_replace(value);
    }

    /// Country pool ingested at startup, if available yet.
    pub async fn country_pool(&self) -> Option<Arc<Vec<Country>>> {
        let guard = self.pool.read().await;
        guard.as_ref().cloned()
    }

    /// Install the ingested country pool. Done once; the pool is immutable
    /// for the process lifetime.
    pub async fn install_pool(&self, pool: Arc<Vec<Country>>) {
        let mut guard = self.pool.write().await;
        *guard = Some(pool);
    }

    /// Registry of live sessions keyed by their identifier.
    pub fn sessions(&self) -> &DashMap<Uuid, SessionHandle> {
        &self.sessions
    }
}
