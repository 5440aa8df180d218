//! Chat sessions
//!
//! Each session owns one `Conversation` behind its own mutex, so a session
//! never has two turns in flight while different sessions run side by side.
//! Sessions left idle longer than the idle TTL are dropped.

use crate::conversation::Conversation;
use crate::llm::{first_tool_request, ContentBlock, ToolSpec, Turn};
use crate::runtime::{ConversationLoop, LlmClient, ToolExecutor, TurnError};
use crate::system_prompt::accessory_prompt;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::Instrument;
use uuid::Uuid;

const SEARCH_TOOL: &str = "search_tool";

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),
    #[error("message text is empty")]
    EmptyMessage,
    #[error("no product search has run in this session yet")]
    NoSearchYet,
    #[error(transparent)]
    Turn(#[from] TurnError),
}

/// Who is speaking in a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of the rendered chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            text: text.into(),
        }
    }

    fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// What started a turn; decides the working indicator text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnKind {
    Chat,
    Accessories,
}

impl TurnKind {
    fn working_indicator(self) -> &'static str {
        match self {
            TurnKind::Chat => "[Searching for stylish options...]",
            TurnKind::Accessories => "[Searching for accessories...]",
        }
    }
}

#[derive(Debug)]
struct Session {
    conversation: Conversation,
    transcript: Vec<TranscriptEntry>,
    last_search_query: Option<String>,
    accessories_offered: bool,
    last_used: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            conversation: Conversation::default(),
            transcript: Vec::new(),
            last_search_query: None,
            accessories_offered: false,
            last_used: Instant::now(),
        }
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_used.elapsed() >= ttl
    }
}

/// Result of one turn as the chat UI needs it
#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    /// Content of the final assistant message
    pub reply: Vec<ContentBlock>,
    /// Transcript entries added by this turn
    pub entries: Vec<TranscriptEntry>,
    /// Products found by searches during this turn
    pub products: Vec<Value>,
    pub accessories_offered: bool,
}

/// Read-only copy of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub transcript: Vec<TranscriptEntry>,
    pub turns: Vec<Turn>,
    pub accessories_offered: bool,
    pub last_search_query: Option<String>,
}

/// Owner of all live sessions
pub struct SessionManager<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    runtime: ConversationLoop<L, T>,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
    idle_ttl: Duration,
}

impl<L, T> SessionManager<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    pub fn new(runtime: ConversationLoop<L, T>) -> Self {
        Self {
            runtime,
            sessions: RwLock::new(HashMap::new()),
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }

    /// Drop sessions that have not been used for `ttl`
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = ttl;
        self
    }

    pub fn tool_specs(&self) -> &[ToolSpec] {
        self.runtime.tool_specs()
    }

    /// Start a session with an empty conversation, evicting idle ones
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let ttl = self.idle_ttl;
        let mut sessions = self.sessions.write().await;

        // A session with a turn in flight is locked and never idle
        let before = sessions.len();
        sessions.retain(|_, session| !session.try_lock().is_ok_and(|s| s.is_idle(ttl)));
        let evicted = before - sessions.len();

        sessions.insert(id, Arc::new(Mutex::new(Session::new())));
        tracing::info!(session = %id, live = sessions.len(), evicted, "Session created");
        id
    }

    /// Discard a session and its conversation
    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| tracing::info!(session = %id, "Session removed"))
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let session = self.checkout(id).await?;
        Ok(SessionSnapshot {
            id,
            transcript: session.transcript.clone(),
            turns: session.conversation.turns().to_vec(),
            accessories_offered: session.accessories_offered,
            last_search_query: session.last_search_query.clone(),
        })
    }

    /// Run a turn for free-form user input
    pub async fn chat(&self, id: Uuid, text: &str) -> Result<TurnView, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let mut session = self.checkout(id).await?;
        self.run(id, &mut session, text.to_string(), TurnKind::Chat)
            .await
    }

    /// Follow up the last product search with an accessories request
    pub async fn ask_accessories(&self, id: Uuid) -> Result<TurnView, SessionError> {
        let mut session = self.checkout(id).await?;

        let query = match (&session.last_search_query, session.accessories_offered) {
            (Some(query), true) => query.clone(),
            _ => return Err(SessionError::NoSearchYet),
        };

        let mut view = self
            .run(id, &mut session, accessory_prompt(&query), TurnKind::Accessories)
            .await?;
        session.accessories_offered = false;
        view.accessories_offered = false;
        Ok(view)
    }

    /// Lock a live session and mark it used. An idle one is removed instead.
    async fn checkout(&self, id: Uuid) -> Result<OwnedMutexGuard<Session>, SessionError> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))?;

        let mut session = session.lock_owned().await;
        if session.is_idle(self.idle_ttl) {
            drop(session);
            self.sessions.write().await.remove(&id);
            tracing::info!(session = %id, "Idle session expired");
            return Err(SessionError::NotFound(id));
        }
        session.last_used = Instant::now();
        Ok(session)
    }

    async fn run(
        &self,
        id: Uuid,
        session: &mut Session,
        text: String,
        kind: TurnKind,
    ) -> Result<TurnView, SessionError> {
        let user_entry = TranscriptEntry::user(text.clone());
        session.transcript.push(user_entry.clone());

        let start = session.conversation.len();
        let span = tracing::info_span!("turn", session = %id);
        let result = self
            .runtime
            .run_turn(&mut session.conversation, text)
            .instrument(span)
            .await;

        // Searches that completed still count when a later round failed
        let products = record_searches(session, start);

        let outcome = result.map_err(|e| {
            tracing::warn!(session = %id, error = %e, "Turn failed");
            e
        })?;
        tracing::info!(
            session = %id,
            engine_calls = outcome.engine_calls,
            tool_rounds = outcome.tool_rounds,
            products = products.len(),
            "Turn finished"
        );

        let mut entries = vec![user_entry];
        entries.extend(render_reply(&outcome.reply, kind));
        session
            .transcript
            .extend(entries.iter().skip(1).cloned());

        Ok(TurnView {
            reply: outcome.reply,
            entries,
            products,
            accessories_offered: session.accessories_offered,
        })
    }
}

/// Text blocks become assistant lines; tool requests only show a working
/// indicator.
fn render_reply(content: &[ContentBlock], kind: TurnKind) -> Vec<TranscriptEntry> {
    content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => TranscriptEntry::assistant(text.clone()),
            ContentBlock::ToolRequest { .. } => {
                TranscriptEntry::assistant(kind.working_indicator())
            }
        })
        .collect()
}

/// Note product searches completed since turn index `start` and collect
/// their products. The last search decides the accessory offer.
fn record_searches(session: &mut Session, start: usize) -> Vec<Value> {
    let mut products = Vec::new();
    let mut last_query = None;

    for pair in session.conversation.turns()[start..].windows(2) {
        let [Turn::AssistantMessage { content }, Turn::ToolResult {
            tool_use_id,
            payload,
            ..
        }] = pair
        else {
            continue;
        };
        let Some(request) = first_tool_request(content) else {
            continue;
        };
        if request.name != SEARCH_TOOL || request.tool_use_id != *tool_use_id {
            continue;
        }
        let Some(query) = request
            .input
            .get("query")
            .and_then(Value::as_str)
            .filter(|q| !q.is_empty())
        else {
            continue;
        };

        last_query = Some(query.to_string());
        if let Some(found) = payload.get("results").and_then(Value::as_array) {
            products.extend(found.iter().cloned());
        }
    }

    if let Some(query) = last_query {
        session.last_search_query = Some(query);
        session.accessories_offered = true;
    }
    products
}
