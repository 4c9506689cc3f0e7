use std::collections::{HashMap, HashSet};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::api_connection::endpoints::history_to_messages;
use crate::api_connection::{ApiConnectionError, RemoteChatStore, RemoteSession};
use crate::error::ChatError;
use crate::local_cache::LocalCache;
use crate::models::{Message, MessageRole, Session, DEFAULT_SESSION_NAME};

/// Everything the chat view renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Most recent first.
    pub sessions: Vec<Session>,
    pub active_session_id: Option<String>,
    /// Working copy of the active session's messages.
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Runs a remote action; on failure logs it and returns `local_fallback()` instead.
///
/// Session management is best-effort against the backend, so nothing that
/// goes through here is ever reported to the user.
pub async fn with_remote_fallback<T, F, L>(operation: &str, action: F, local_fallback: L) -> T
where
    F: Future<Output = Result<T, ApiConnectionError>>,
    L: FnOnce() -> T,
{
    match action.await {
        Ok(value) => value,
        Err(e) => {
            warn!("{} failed, continuing with local state: {}", operation, e);
            local_fallback()
        }
    }
}

/// Rebuilds the session list from an authoritative remote listing.
///
/// Remote decides which sessions exist and what they are called. Cached
/// messages are carried over by id. Local sessions the backend cannot know
/// about yet (no completed exchange) stay at the head.
fn merge_remote_sessions(
    listed: Vec<RemoteSession>,
    local: Vec<Session>,
    excluded: Option<&str>,
) -> Vec<Session> {
    let remote_ids: HashSet<&str> = listed.iter().map(|s| s.id.as_str()).collect();

    let mut merged = Vec::with_capacity(listed.len());
    let mut by_id = HashMap::new();
    for session in local {
        if Some(session.id.as_str()) == excluded {
            continue;
        }
        let never_answered = !session
            .messages
            .iter()
            .any(|m| m.role == MessageRole::Assistant);
        if !remote_ids.contains(session.id.as_str()) && never_answered {
            merged.push(session);
        } else {
            by_id.insert(session.id.clone(), session);
        }
    }

    for remote in listed {
        if Some(remote.id.as_str()) == excluded {
            continue;
        }
        let created_at = remote.created_at();
        let name = if remote.name.trim().is_empty() {
            DEFAULT_SESSION_NAME.to_string()
        } else {
            remote.name
        };
        match by_id.remove(&remote.id) {
            Some(mut cached) => {
                cached.name = name;
                merged.push(cached);
            }
            None => merged.push(Session {
                id: remote.id,
                name,
                created_at,
                messages: Vec::new(),
            }),
        }
    }
    merged
}

pub struct SessionManager<R> {
    remote: R,
    cache: LocalCache,
    state: ChatState,
}

impl<R: RemoteChatStore> SessionManager<R> {
    pub fn new(remote: R, cache: LocalCache) -> Self {
        Self {
            remote,
            cache,
            state: ChatState::default(),
        }
    }

    /// Starts from whatever the local cache holds, without touching the backend.
    pub async fn restore(remote: R, cache: LocalCache) -> Self {
        let sessions = cache.load().await;
        debug!("Restored {} sessions from cache", sessions.len());
        Self {
            remote,
            cache,
            state: ChatState {
                sessions,
                ..ChatState::default()
            },
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut ChatState {
        &mut self.state
    }

    pub fn sessions(&self) -> &[Session] {
        &self.state.sessions
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.state.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id().and_then(|id| self.session(id))
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.state.sessions.iter().find(|s| s.id == session_id)
    }

    fn session_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.state.sessions.iter_mut().find(|s| s.id == session_id)
    }

    pub async fn create_session(&mut self) -> Session {
        let session = Session::new();
        self.state.sessions.insert(0, session.clone());
        self.state.active_session_id = Some(session.id.clone());
        self.state.messages.clear();
        self.persist().await;
        info!(session_id = %session.id, "Created session");
        session
    }

    /// Pulls the remote session list, falling back to the local list when the
    /// backend is unreachable.
    ///
    /// In-memory sessions are the local truth; the cache is only read when
    /// nothing is loaded yet, since a failed save can leave it behind.
    pub async fn sync_sessions(&mut self) -> &[Session] {
        let local = if self.state.sessions.is_empty() {
            self.cache.load().await
        } else {
            std::mem::take(&mut self.state.sessions)
        };

        let remote = &self.remote;
        let listed = with_remote_fallback(
            "list sessions",
            async { remote.list_sessions().await.map(Some) },
            || None,
        )
        .await;

        self.state.sessions = match listed {
            Some(listed) => merge_remote_sessions(listed, local, None),
            None => local,
        };

        if let Some(active) = self.state.active_session_id.clone() {
            if self.session(&active).is_none() {
                self.state.active_session_id = None;
                self.state.messages.clear();
            }
        }
        self.persist().await;
        &self.state.sessions
    }

    /// Activates a session and returns its messages.
    ///
    /// Non-empty remote history wins. An unreachable backend or an empty
    /// history leaves the cached messages for the session as they are.
    pub async fn load_session(&mut self, session_id: &str) -> &[Message] {
        if self.session(session_id).is_none() {
            let mut session = Session::new();
            session.id = session_id.to_string();
            self.state.sessions.insert(0, session);
        }
        self.state.active_session_id = Some(session_id.to_string());
        self.state.error = None;

        let remote = &self.remote;
        let history = with_remote_fallback(
            "fetch history",
            async { remote.fetch_history(session_id).await.map(Some) },
            || None,
        )
        .await;

        match history {
            Some(entries) if !entries.is_empty() => {
                let messages = history_to_messages(entries);
                if let Some(session) = self.session_mut(session_id) {
                    session.messages = messages.clone();
                }
                self.state.messages = messages;
                self.persist().await;
            }
            _ => {
                debug!(session_id, "Using cached messages");
                self.state.messages = self
                    .session(session_id)
                    .map(|s| s.messages.clone())
                    .unwrap_or_default();
            }
        }
        &self.state.messages
    }

    /// Activates the most recent session, if any, and returns its id.
    pub async fn resume_latest(&mut self) -> Option<String> {
        let head = self.state.sessions.first()?.id.clone();
        self.load_session(&head).await;
        Some(head)
    }

    pub async fn rename_session(&mut self, session_id: &str, new_name: &str) -> Result<(), ChatError> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidInput("session name cannot be empty".to_string()));
        }

        let remote = &self.remote;
        with_remote_fallback(
            "rename session",
            remote.update_session_title(session_id, name),
            || (),
        )
        .await;

        match self.session_mut(session_id) {
            Some(session) => session.name = name.to_string(),
            None => warn!(session_id, "Rename requested for unknown session"),
        }
        self.persist().await;
        Ok(())
    }

    pub async fn delete_session(&mut self, session_id: &str) {
        let remote = &self.remote;
        let refreshed = with_remote_fallback(
            "delete session",
            async {
                remote.delete_session(session_id).await?;
                remote.list_sessions().await.map(Some)
            },
            || None,
        )
        .await;

        let local = std::mem::take(&mut self.state.sessions);
        self.state.sessions = match refreshed {
            Some(listed) => merge_remote_sessions(listed, local, Some(session_id)),
            None => local.into_iter().filter(|s| s.id != session_id).collect(),
        };
        info!(session_id, "Deleted session");

        let active_gone = match self.state.active_session_id.as_deref() {
            Some(active) => active == session_id || self.session(active).is_none(),
            None => false,
        };
        if active_gone {
            match self.state.sessions.first().map(|s| s.id.clone()) {
                Some(next) => {
                    self.load_session(&next).await;
                }
                None => {
                    self.state.active_session_id = None;
                    self.state.messages.clear();
                }
            }
        }
        self.persist().await;
    }

    /// Appends to the working sequence and to the active session's stored copy.
    pub(crate) fn push_active_message(&mut self, message: Message) {
        if let Some(active) = self.state.active_session_id.clone() {
            if let Some(session) = self.session_mut(&active) {
                session.messages.push(message.clone());
            }
        }
        self.state.messages.push(message);
    }

    /// Puts `message` back at the end of a session if a history reload dropped it.
    pub(crate) fn reinstate_message(&mut self, session_id: &str, message: &Message) {
        if let Some(session) = self.session_mut(session_id) {
            if !session.messages.iter().any(|m| m.id == message.id) {
                session.messages.push(message.clone());
            }
        }
        if self.active_session_id() == Some(session_id)
            && !self.state.messages.iter().any(|m| m.id == message.id)
        {
            self.state.messages.push(message.clone());
        }
    }

    /// Stores a message on a session that is not the one being shown.
    pub(crate) fn push_background_message(&mut self, session_id: &str, message: Message) {
        match self.session_mut(session_id) {
            Some(session) => session.messages.push(message),
            None => debug!(session_id, "Dropping reply for a session that no longer exists"),
        }
    }

    pub(crate) async fn persist(&self) {
        if let Err(e) = self.cache.save(&self.state.sessions).await {
            warn!("Failed to update session cache: {}", e);
        }
    }
}
