pub mod connection;
pub mod endpoints;

use async_trait::async_trait;

pub use connection::{ApiConnectionError, ChatApiClient};
pub use endpoints::{HistoryEntry, RemoteSession};

use crate::models::Recipe;

/// The backend that owns durable session state and recipe generation.
#[async_trait]
pub trait RemoteChatStore: Send + Sync {
    async fn list_sessions(&self) -> Result<Vec<RemoteSession>, ApiConnectionError>;

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, ApiConnectionError>;

    /// Generates recipes for `ingredients`; the backend also stores the exchange
    /// under `session_id`.
    async fn send_ingredients(
        &self,
        ingredients: &str,
        session_id: &str,
    ) -> Result<Vec<Recipe>, ApiConnectionError>;

    async fn update_session_title(&self, session_id: &str, title: &str) -> Result<(), ApiConnectionError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), ApiConnectionError>;
}
