//! HTTP API for the chat UI

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::{LlmClient, ToolExecutor};
use crate::session::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    pub sessions: Arc<SessionManager<L, T>>,
}

impl<L, T> AppState<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    pub fn new(sessions: SessionManager<L, T>) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }
}

impl<L, T> Clone for AppState<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
        }
    }
}
