#![allow(dead_code)]

use async_trait::async_trait;
use recipe_chat::api_connection::{ApiConnectionError, HistoryEntry, RemoteChatStore, RemoteSession};
use recipe_chat::models::{Difficulty, NutritionInfo, Recipe};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct FakeState {
    sessions: Vec<RemoteSession>,
    histories: HashMap<String, Vec<HistoryEntry>>,
    recipes: Vec<Recipe>,
    send_error: Option<(StatusCode, String)>,
    offline: bool,
    calls: Vec<String>,
}

/// In-memory stand-in for the recipe backend.
#[derive(Default)]
pub struct FakeChatStore {
    state: Mutex<FakeState>,
}

impl FakeChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        let store = Self::default();
        store.set_offline(true);
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn with_session(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().sessions.push(RemoteSession {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Some("2025-06-01T10:00:00+00:00".to_string()),
        });
        self
    }

    pub fn with_history(self, session_id: &str, history: Vec<HistoryEntry>) -> Self {
        self.state
            .lock()
            .unwrap()
            .histories
            .insert(session_id.to_string(), history);
        self
    }

    pub fn reply_with(&self, recipes: Vec<Recipe>) {
        let mut state = self.state.lock().unwrap();
        state.recipes = recipes;
        state.send_error = None;
    }

    pub fn fail_send(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().send_error = Some((status, body.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn remote_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    fn record(&self, call: String) -> Result<(), ApiConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.offline {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn unavailable() -> ApiConnectionError {
    ApiConnectionError::ApiError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        error_body: "backend offline".to_string(),
    }
}

#[async_trait]
impl RemoteChatStore for FakeChatStore {
    async fn list_sessions(&self) -> Result<Vec<RemoteSession>, ApiConnectionError> {
        self.record("list".to_string())?;
        Ok(self.state.lock().unwrap().sessions.clone())
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, ApiConnectionError> {
        self.record(format!("history {}", session_id))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .histories
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_ingredients(
        &self,
        ingredients: &str,
        session_id: &str,
    ) -> Result<Vec<Recipe>, ApiConnectionError> {
        self.record(format!("send {} {}", session_id, ingredients))?;
        let state = self.state.lock().unwrap();
        match &state.send_error {
            Some((status, body)) => Err(ApiConnectionError::ApiError {
                status: *status,
                error_body: body.clone(),
            }),
            None => Ok(state.recipes.clone()),
        }
    }

    async fn update_session_title(&self, session_id: &str, title: &str) -> Result<(), ApiConnectionError> {
        self.record(format!("rename {} {}", session_id, title))?;
        let mut state = self.state.lock().unwrap();
        match state.sessions.iter_mut().find(|s| s.id == session_id) {
            Some(session) => {
                session.name = title.to_string();
                Ok(())
            }
            None => Err(ApiConnectionError::ApiError {
                status: StatusCode::NOT_FOUND,
                error_body: r#"{"detail": "Session not found"}"#.to_string(),
            }),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ApiConnectionError> {
        self.record(format!("delete {}", session_id))?;
        let mut state = self.state.lock().unwrap();
        state.sessions.retain(|s| s.id != session_id);
        state.histories.remove(session_id);
        Ok(())
    }
}

pub fn recipe(name: &str) -> Recipe {
    Recipe {
        name: name.to_string(),
        ingredients: vec!["2 eggs".to_string(), "1 cup flour".to_string(), "1 cup milk".to_string()],
        instructions: vec!["Whisk everything together".to_string(), "Cook on a hot griddle".to_string()],
        cooking_time: "20 minutes".to_string(),
        difficulty: Difficulty::Easy,
        nutrition: Some(NutritionInfo {
            calories: 350,
            protein: "12g".to_string(),
            carbs: "45g".to_string(),
        }),
    }
}

pub fn history_entry(id: &str, ingredients: &str, recipes: Vec<Recipe>, timestamp: &str) -> HistoryEntry {
    HistoryEntry {
        id: id.to_string(),
        ingredients: ingredients.to_string(),
        recipes,
        timestamp: timestamp.to_string(),
    }
}
