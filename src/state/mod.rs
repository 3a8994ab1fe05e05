//! Shared runtime state: storage handle, live tracking sessions, SSE hubs,
//! and the degraded-mode flag.

pub mod game;
mod sse;
pub mod state_machine;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{config::AppConfig, dao::game_store::GameStore, error::ServiceError};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::{
    game::TrackerSession,
    sse::SseState,
    state_machine::{GameEvent, GamePhase},
};

/// Cheaply clonable handle to the application state.
pub type SharedState = Arc<AppState>;
/// How long a side-effecting transition may run before its plan is aborted.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state storing sessions, hubs, and database handles.
pub struct AppState {
    config: AppConfig,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    sse: SseState,
    sessions: DashMap<Uuid, TrackerSession>,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            game_store: RwLock::new(None),
            sse: SseState::new(16, 16),
            sessions: DashMap::new(),
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Immutable runtime configuration (sport profiles).
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the game store or fail with a degraded-mode error.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the scorekeeper SSE stream.
    pub fn scorekeeper_sse(&self) -> &SseHub {
        self.sse.scorekeeper().hub()
    }

    /// Token guard that ensures a single scorekeeper SSE subscriber at a time.
    pub fn scorekeeper_token(&self) -> &Mutex<Option<String>> {
        self.sse.scorekeeper().token()
    }

    /// Registry of in-memory tracking sessions keyed by game id.
    pub fn sessions(&self) -> &DashMap<Uuid, TrackerSession> {
        &self.sessions
    }

    /// Run `f` against the session for `game_id`, if one is cached.
    ///
    /// The closure runs synchronously under the map guard; callers must not
    /// perform I/O inside it.
    pub fn with_session<T>(
        &self,
        game_id: Uuid,
        f: impl FnOnce(&mut TrackerSession) -> T,
    ) -> Option<T> {
        self.sessions.get_mut(&game_id).map(|mut entry| f(&mut entry))
    }

    fn plan_transition(&self, game_id: Uuid, event: GameEvent) -> Result<Plan, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&game_id)
            .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` is not loaded")))?;
        session.machine.plan(event).map_err(Into::into)
    }

    fn apply_planned_transition(
        &self,
        game_id: Uuid,
        plan_id: PlanId,
    ) -> Result<GamePhase, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&game_id)
            .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` is not loaded")))?;
        session.machine.apply(plan_id).map_err(Into::into)
    }

    fn abort_transition(&self, game_id: Uuid, plan_id: PlanId) -> Result<(), AbortError> {
        let Some(mut session) = self.sessions.get_mut(&game_id) else {
            return Err(AbortError::NoPending);
        };
        session.machine.abort(plan_id)
    }

    /// Execute a lifecycle transition for one game: plan it, run the
    /// side-effecting `work`, and only commit the phase change once the work
    /// succeeded. On failure or timeout the plan is aborted so the in-memory
    /// phase never runs ahead of the store.
    pub async fn run_transition<F, Fut, T>(
        &self,
        game_id: Uuid,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GamePhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(game_id, event)?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(game_id, plan_id) {
                        warn!(
                            event = ?event,
                            %game_id,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(game_id, plan_id)?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(game_id, plan_id) {
                    warn!(
                        event = ?event,
                        %game_id,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn session() -> TrackerSession {
        TrackerSession::new(
            "vs Eagles".into(),
            "Eagles".into(),
            "basketball".into(),
            SystemTime::now(),
            vec!["pts".into()],
            vec!["p1".into(), "p2".into()],
        )
    }

    #[tokio::test]
    async fn run_transition_commits_after_successful_work() {
        let state = AppState::new(AppConfig::default());
        let session = session();
        let id = session.id;
        state.sessions().insert(id, session);

        let (value, next) = state
            .run_transition(id, GameEvent::BeginTracking, || async { Ok(42) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(next, GamePhase::Live);
        assert_eq!(state.with_session(id, |s| s.phase()), Some(GamePhase::Live));
    }

    #[tokio::test]
    async fn run_transition_rolls_back_on_work_failure() {
        let state = AppState::new(AppConfig::default());
        let session = session();
        let id = session.id;
        state.sessions().insert(id, session);

        let err = state
            .run_transition(id, GameEvent::BeginTracking, || async {
                Err::<(), _>(ServiceError::InvalidInput("boom".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(
            state.with_session(id, |s| s.phase()),
            Some(GamePhase::Scheduled)
        );
        // The machine is free for a new plan afterwards.
        assert!(state.plan_transition(id, GameEvent::BeginTracking).is_ok());
    }

    #[tokio::test]
    async fn run_transition_rejects_unknown_games() {
        let state = AppState::new(AppConfig::default());
        let err = state
            .run_transition(Uuid::new_v4(), GameEvent::BeginTracking, || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
