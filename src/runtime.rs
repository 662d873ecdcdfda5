//! Runtime for executing story sessions
//!
//! Each session runs as its own task that owns the [`SessionState`] and is
//! the only writer to it. User actions and generation results reach it over
//! one channel, so they are applied strictly one at a time.

mod executor;


pub use executor::SessionRuntime;

use crate::generator::ContentGenerator;
use crate::state_machine::{Event, Phase, SessionState, TransitionError};
use crate::story::{AnalysisResult, ChoiceRecord, Scene, TOTAL_TURNS};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};

/// Read-only view of a session, as served to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub phase: Phase,
    pub turn: usize,
    pub total_turns: usize,
    pub history: Vec<ChoiceRecord>,
    pub current_scene: Option<Scene>,
    pub result: Option<AnalysisResult>,
    /// A generation request is in flight
    pub awaiting: bool,
    pub can_go_back: bool,
    pub failure: Option<String>,
    pub loading_caption: Option<&'static str>,
}

impl SessionSnapshot {
    pub fn of(id: &str, state: &SessionState) -> Self {
        Self {
            id: id.to_string(),
            phase: state.phase(),
            turn: state.turn(),
            total_turns: TOTAL_TURNS,
            history: state.history().to_vec(),
            current_scene: state.current_scene().cloned(),
            result: state.result().cloned(),
            awaiting: state.is_awaiting(),
            can_go_back: state.can_go_back(),
            failure: state.failure().map(str::to_string),
            loading_caption: state.loading_caption(),
        }
    }
}

/// Events pushed to stream subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChange { snapshot: SessionSnapshot },
    Error { message: String },
}

/// Runtime-level failures
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session {0} not found")]
    NotFound(String),
    #[error("Session is no longer running")]
    Closed,
    #[error("Session limit of {0} reached")]
    AtCapacity(usize),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
}

type Reply = oneshot::Sender<Result<SessionSnapshot, TransitionError>>;

/// An event on its way into a session, with a reply slot for user events
#[derive(Debug)]
pub struct Envelope {
    pub event: Event,
    pub reply: Option<Reply>,
}

impl Envelope {
    pub fn internal(event: Event) -> Self {
        Self { event, reply: None }
    }
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    created_at: DateTime<Utc>,
    event_tx: mpsc::Sender<Envelope>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Spawn a runtime for a fresh session and return its handle
    pub fn spawn(id: impl Into<String>, generator: Arc<dyn ContentGenerator>) -> Self {
        let id = id.into();
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) =
            watch::channel(SessionSnapshot::of(&id, &SessionState::new()));

        let runtime = SessionRuntime::new(
            id.clone(),
            generator,
            event_rx,
            event_tx.downgrade(),
            snapshot_tx,
            broadcast_tx.clone(),
        );
        tokio::spawn(runtime.run());

        Self {
            id,
            created_at: Utc::now(),
            event_tx,
            snapshot_rx,
            broadcast_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Begin (or begin again) a story
    pub async fn start(&self) -> Result<SessionSnapshot, RuntimeError> {
        self.send(Event::Start).await
    }

    pub async fn choose(&self, option_id: &str) -> Result<SessionSnapshot, RuntimeError> {
        self.send(Event::SelectOption {
            option_id: option_id.to_string(),
        })
        .await
    }

    /// Undo the last choice; a no-op when unavailable
    pub async fn back(&self) -> Result<SessionSnapshot, RuntimeError> {
        self.send(Event::Back).await
    }

    pub async fn restart(&self) -> Result<SessionSnapshot, RuntimeError> {
        self.send(Event::Restart).await
    }

    /// Current view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Wait until no generation request is in flight
    #[cfg(test)]
    pub async fn settled(&self) -> Result<SessionSnapshot, RuntimeError> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| !s.awaiting)
            .await
            .map_err(|_| RuntimeError::Closed)?;
        Ok(snapshot.clone())
    }

    async fn send(&self, event: Event) -> Result<SessionSnapshot, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.event_tx
            .send(Envelope {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| RuntimeError::Closed)?;
        Ok(reply_rx.await.map_err(|_| RuntimeError::Closed)??)
    }
}

/// Summary row for session listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub phase: Phase,
    pub turn: usize,
    pub created_at: DateTime<Utc>,
}

/// Live sessions allowed when no limit is configured
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Manager for all session runtimes.
///
/// Sessions are kept until deleted; `max_sessions` bounds how many runtimes
/// can be alive at once.
pub struct SessionManager {
    generator: Arc<dyn ContentGenerator>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(generator: Arc<dyn ContentGenerator>, max_sessions: usize) -> Self {
        Self {
            generator,
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Create a session in `INTRO`
    pub async fn create(&self) -> Result<SessionHandle, RuntimeError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            tracing::warn!(limit = self.max_sessions, "Refusing new session");
            return Err(RuntimeError::AtCapacity(self.max_sessions));
        }
        let id = uuid::Uuid::new_v4().to_string();
        let handle = SessionHandle::spawn(id.clone(), Arc::clone(&self.generator));
        sessions.insert(id, handle.clone());
        Ok(handle)
    }

    pub async fn get(&self, id: &str) -> Result<SessionHandle, RuntimeError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }

    /// Drop a session; its runtime stops once in-flight requests finish
    pub async fn remove(&self, id: &str) -> Result<(), RuntimeError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| tracing::info!(session_id = %id, "Session removed"))
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }

    pub async fn list(&self) -> Vec<SessionSummary> {
        let mut rows: Vec<SessionSummary> = self
            .sessions
            .read()
            .await
            .values()
            .map(|h| {
                let snapshot = h.snapshot();
                SessionSummary {
                    id: h.id().to_string(),
                    phase: snapshot.phase,
                    turn: snapshot.turn,
                    created_at: h.created_at(),
                }
            })
            .collect();
        rows.sort_by_key(|r| r.created_at);
        rows
    }
}
