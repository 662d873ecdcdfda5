//! HTTP API for the archives
//!
//! A thin surface over [`SessionManager`]: every action route forwards one
//! event to a session and answers with the resulting snapshot.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::generator::ContentGenerator;
use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(generator: Arc<dyn ContentGenerator>, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(generator, max_sessions)),
        }
    }
}
