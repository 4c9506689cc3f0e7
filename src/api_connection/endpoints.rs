use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Message, MessageContent, MessageRole, Recipe};

pub const SESSIONS_PATH: &str = "/api/chat/sessions";
pub const SEND_PATH: &str = "/api/chat/send";
pub const HEALTH_PATH: &str = "/health";

pub fn history_path(session_id: &str) -> String {
    format!("/api/chat/history/{}", session_id)
}

pub fn session_path(session_id: &str) -> String {
    format!("/api/chat/session/{}", session_id)
}

pub fn session_title_path(session_id: &str) -> String {
    format!("/api/chat/session/{}/title", session_id)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    pub id: String,
    pub name: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<RemoteSession>,
}

/// One stored exchange: the ingredients a user sent and the recipes that came back.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub ingredients: String,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    pub timestamp: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Clone)]
pub struct SendRequest<'a> {
    pub ingredients: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SendResponse {
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct UpdateTitleRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(default)]
    pub error_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Accepts RFC 3339 with an offset, or the naive ISO-8601 form the in-memory
/// backend emits (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl RemoteSession {
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now)
    }
}

impl HistoryEntry {
    /// Expands the entry into the user turn and the assistant reply it produced.
    pub fn into_messages(self) -> [Message; 2] {
        let timestamp = parse_timestamp(&self.timestamp).unwrap_or_else(Utc::now);
        [
            Message {
                id: format!("{}-user", self.id),
                role: MessageRole::User,
                content: MessageContent::Text(self.ingredients),
                timestamp,
            },
            Message {
                id: format!("{}-assistant", self.id),
                role: MessageRole::Assistant,
                content: MessageContent::Recipes(self.recipes),
                timestamp,
            },
        ]
    }
}

/// Backend history comes newest first; messages are kept oldest first.
pub fn history_to_messages(mut history: Vec<HistoryEntry>) -> Vec<Message> {
    history.sort_by_key(|entry| parse_timestamp(&entry.timestamp));
    history
        .into_iter()
        .flat_map(HistoryEntry::into_messages)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, ingredients: &str, timestamp: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            ingredients: ingredients.to_string(),
            recipes: Vec::new(),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2025-06-01T10:00:00+00:00").is_some());
        assert!(parse_timestamp("2025-06-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_history_is_reordered_oldest_first() {
        let history = vec![
            entry("b", "rice, beans", "2025-06-01T11:00:00+00:00"),
            entry("a", "eggs", "2025-06-01T10:00:00+00:00"),
        ];
        let messages = history_to_messages(history);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].id, "a-user");
        assert_eq!(messages[1].id, "a-assistant");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[2].content, MessageContent::Text("rice, beans".to_string()));
    }

    #[test]
    fn test_paths() {
        assert_eq!(history_path("s1"), "/api/chat/history/s1");
        assert_eq!(session_title_path("s1"), "/api/chat/session/s1/title");
    }
}
