use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api_connection::{ApiConnectionError, RemoteChatStore};
use crate::models::{Message, MessageContent, MessageRole, Recipe};
use crate::session_manager::{ChatState, SessionManager};

pub const GENERATION_FAILED_MESSAGE: &str = "Failed to get recipes. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// A generation is already in flight.
    Busy,
    /// There was no active session, so one was created. Re-submit to send.
    SessionCreated(String),
    Completed { recipe_count: usize },
    Failed(String),
    /// The reply belongs to a session that is no longer active; it was filed
    /// under that session without touching the current view.
    Superseded { session_id: String },
}

/// An in-flight generation request, tagged with the session it was sent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGeneration {
    pub session_id: String,
    pub ingredients: String,
    pub user_message_id: String,
    pub sent_at: DateTime<Utc>,
}

impl PendingGeneration {
    /// The optimistic user message this request was sent with.
    pub fn user_message(&self) -> Message {
        Message {
            id: self.user_message_id.clone(),
            role: MessageRole::User,
            content: MessageContent::Text(self.ingredients.clone()),
            timestamp: self.sent_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginSend {
    Pending(PendingGeneration),
    Skipped(SendOutcome),
}

pub struct MessageExchange<R> {
    manager: SessionManager<R>,
}

impl<R: RemoteChatStore> MessageExchange<R> {
    pub fn new(manager: SessionManager<R>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &SessionManager<R> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SessionManager<R> {
        &mut self.manager
    }

    pub fn state(&self) -> &ChatState {
        self.manager.state()
    }

    pub async fn send_message(&mut self, ingredients: &str) -> SendOutcome {
        let pending = match self.begin_send(ingredients).await {
            BeginSend::Pending(pending) => pending,
            BeginSend::Skipped(outcome) => return outcome,
        };
        let result = self
            .manager
            .remote()
            .send_ingredients(&pending.ingredients, &pending.session_id)
            .await;
        self.complete_send(pending, result).await
    }

    /// Validates input and optimistically records the user's message.
    ///
    /// The returned ticket must be passed to [`complete_send`](Self::complete_send)
    /// together with the generation result, or the loading flag stays set.
    pub async fn begin_send(&mut self, ingredients: &str) -> BeginSend {
        let ingredients = ingredients.trim();
        if ingredients.is_empty() {
            return BeginSend::Skipped(SendOutcome::Ignored);
        }
        if self.manager.state().is_loading {
            return BeginSend::Skipped(SendOutcome::Busy);
        }
        let session_id = match self.manager.active_session_id() {
            Some(id) => id.to_string(),
            None => {
                let session = self.manager.create_session().await;
                return BeginSend::Skipped(SendOutcome::SessionCreated(session.id));
            }
        };

        let user_message = Message::user(ingredients);
        let user_message_id = user_message.id.clone();
        let sent_at = user_message.timestamp;
        self.manager.push_active_message(user_message);
        let state = self.manager.state_mut();
        state.is_loading = true;
        state.error = None;

        BeginSend::Pending(PendingGeneration {
            session_id,
            ingredients: ingredients.to_string(),
            user_message_id,
            sent_at,
        })
    }

    /// Applies a generation result to the session the request came from.
    pub async fn complete_send(
        &mut self,
        pending: PendingGeneration,
        result: Result<Vec<Recipe>, ApiConnectionError>,
    ) -> SendOutcome {
        let still_active = self.manager.active_session_id() == Some(pending.session_id.as_str());
        // Switching away and back reloads remote history, which does not hold
        // this exchange yet.
        self.manager
            .reinstate_message(&pending.session_id, &pending.user_message());

        let outcome = match result {
            Ok(recipes) => {
                let recipe_count = recipes.len();
                let reply = Message::assistant(recipes);
                if still_active {
                    self.manager.push_active_message(reply);
                    info!(session_id = %pending.session_id, recipe_count, "Received recipes");
                    SendOutcome::Completed { recipe_count }
                } else {
                    self.manager.push_background_message(&pending.session_id, reply);
                    SendOutcome::Superseded {
                        session_id: pending.session_id,
                    }
                }
            }
            Err(e) => {
                warn!(session_id = %pending.session_id, "Recipe generation failed: {}", e);
                let message = e
                    .detail()
                    .unwrap_or_else(|| GENERATION_FAILED_MESSAGE.to_string());
                if still_active {
                    self.manager.state_mut().error = Some(message.clone());
                    SendOutcome::Failed(message)
                } else {
                    SendOutcome::Superseded {
                        session_id: pending.session_id,
                    }
                }
            }
        };

        self.manager.state_mut().is_loading = false;
        self.manager.persist().await;
        outcome
    }
}
