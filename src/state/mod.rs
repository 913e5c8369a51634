/// Players, their answers and the per-session join/submit/reveal rules.
pub mod player;
/// Sessions, questions and the countdown.
pub mod session;
/// Lobby/active/ended transitions with plan, apply and abort.
pub mod state_machine;
/// Registry of sessions and per-game gates.
pub mod store;

use std::{future::Future, sync::Arc, time::SystemTime};

use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    dao::catalog::{CatalogResult, GameCatalog},
    error::ServiceError,
    state::{
        player::{PlayerId, PlayerRegistry},
        state_machine::{Plan, SessionEvent, SessionPhase},
        session::SessionId,
        store::{SessionHandle, SessionStore},
    },
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the game catalog, and the
/// session and player registries.
///
/// Constructed once per process (or per test) and torn down by dropping the
/// last [`SharedState`] handle.
pub struct AppState {
    config: AppConfig,
    catalog: Arc<dyn GameCatalog>,
    sessions: SessionStore,
    players: PlayerRegistry,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, catalog: Arc<dyn GameCatalog>) -> SharedState {
        Arc::new(Self {
            config,
            catalog,
            sessions: SessionStore::new(),
            players: PlayerRegistry::new(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the game catalog.
    pub fn catalog(&self) -> Arc<dyn GameCatalog> {
        self.catalog.clone()
    }

    /// Registry of sessions.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Registry of players.
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Forget an ended session together with its players' index entries.
    ///
    /// Returns `false` when the session is unknown or still running. Player
    /// ids of an evicted session resolve to not found afterwards.
    pub async fn evict_session(&self, session_id: SessionId) -> bool {
        let Some(handle) = self.sessions.get(session_id) else {
            return false;
        };
        let players: Vec<PlayerId> = {
            let record = handle.read().await;
            if record.session.is_live() {
                return false;
            }
            record.players.keys().copied().collect()
        };

        self.sessions.remove(session_id);
        self.players.forget(players.iter().copied());
        info!(%session_id, players = players.len(), "session evicted");
        true
    }

    /// Await a catalog call under the configured timeout, mapping failures to [`ServiceError`].
    pub async fn call_catalog<T, Fut>(
        &self,
        operation: &'static str,
        call: Fut,
    ) -> Result<T, ServiceError>
    where
        Fut: Future<Output = CatalogResult<T>>,
    {
        let outcome = match self.config.catalog_timeout() {
            Some(limit) => match timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(operation, limit_ms = limit.as_millis(), "catalog call timed out");
                    return Err(ServiceError::Timeout);
                }
            },
            None => call.await,
        };

        outcome.map_err(|err| {
            warn!(operation, error = %err, "catalog call failed");
            ServiceError::Unavailable(err)
        })
    }

    /// Plan `event` on the session, run `work`, then apply the plan or abort it.
    ///
    /// The session lock is only held while planning and committing, so polling
    /// reads stay responsive while `work` talks to the catalog. Callers hold
    /// the game gate for the whole call. `clock` is read under the lock right
    /// before the commit, so a window opened by the transition starts when it
    /// becomes visible to players.
    pub async fn run_transition<C, F, Fut, T>(
        &self,
        handle: &SessionHandle,
        event: SessionEvent,
        clock: C,
        work: F,
    ) -> Result<(T, SessionPhase), ServiceError>
    where
        C: FnOnce() -> SystemTime,
        F: FnOnce(Plan) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let plan = {
            let mut record = handle.write().await;
            record.session.plan(event)?
        };
        let plan_id = plan.id;

        match work(plan).await {
            Ok(value) => {
                let mut record = handle.write().await;
                let next = record.session.apply(plan_id, clock())?;
                Ok((value, next))
            }
            Err(err) => {
                let mut record = handle.write().await;
                if let Err(abort_err) = record.session.abort(plan_id) {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                Err(err)
            }
        }
    }
}
