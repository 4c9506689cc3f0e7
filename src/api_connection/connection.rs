use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    history_path, session_path, session_title_path, Acknowledgement, ErrorResponse,
    HealthStatus, HistoryEntry, HistoryResponse, RemoteSession, SendRequest, SendResponse,
    SessionsResponse, UpdateTitleRequest, HEALTH_PATH, SEND_PATH, SESSIONS_PATH,
};
use super::RemoteChatStore;
use crate::models::Recipe;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: StatusCode,
        error_body: String,
    },
    #[error("Invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl ApiConnectionError {
    /// The backend's `detail` string, when the failure came with one.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiConnectionError::ApiError { error_body, .. } => {
                serde_json::from_str::<ErrorResponse>(error_body)
                    .ok()
                    .map(|body| body.detail)
                    .filter(|detail| !detail.trim().is_empty())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatApiClient {
    client: Client,
    base_url: String,
}

impl ChatApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiConnectionError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|_| ApiConnectionError::InvalidBaseUrl(base_url.to_string()))?;

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiConnectionError> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiConnectionError> {
        let response = self.client.get(self.url(HEALTH_PATH)).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl RemoteChatStore for ChatApiClient {
    async fn list_sessions(&self) -> Result<Vec<RemoteSession>, ApiConnectionError> {
        debug!("GET {}", SESSIONS_PATH);
        let response = self.client.get(self.url(SESSIONS_PATH)).send().await?;
        let body: SessionsResponse = Self::read_json(response).await?;
        Ok(body.sessions)
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, ApiConnectionError> {
        let path = history_path(session_id);
        debug!("GET {}", path);
        let response = self.client.get(self.url(&path)).send().await?;
        let body: HistoryResponse = Self::read_json(response).await?;
        Ok(body.history)
    }

    async fn send_ingredients(
        &self,
        ingredients: &str,
        session_id: &str,
    ) -> Result<Vec<Recipe>, ApiConnectionError> {
        debug!(session_id, "POST {}", SEND_PATH);
        let response = self
            .client
            .post(self.url(SEND_PATH))
            .json(&SendRequest {
                ingredients,
                session_id,
            })
            .send()
            .await?;
        let body: SendResponse = Self::read_json(response).await?;
        Ok(body.recipes)
    }

    async fn update_session_title(&self, session_id: &str, title: &str) -> Result<(), ApiConnectionError> {
        let path = session_title_path(session_id);
        debug!("PUT {}", path);
        let response = self
            .client
            .put(self.url(&path))
            .json(&UpdateTitleRequest { title })
            .send()
            .await?;
        let _: Acknowledgement = Self::read_json(response).await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ApiConnectionError> {
        let path = session_path(session_id);
        debug!("DELETE {}", path);
        let response = self.client.delete(self.url(&path)).send().await?;
        let _: Acknowledgement = Self::read_json(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_is_extracted_from_error_body() {
        let err = ApiConnectionError::ApiError {
            status: StatusCode::BAD_REQUEST,
            error_body: r#"{"detail": "Ingredients cannot be empty"}"#.to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("Ingredients cannot be empty"));
    }

    #[test]
    fn test_detail_missing_for_plain_body() {
        let err = ApiConnectionError::ApiError {
            status: StatusCode::BAD_GATEWAY,
            error_body: "upstream down".to_string(),
        };
        assert!(err.detail().is_none());
    }

    #[test]
    fn test_base_url_is_validated_and_trimmed() {
        let client = ChatApiClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url(SESSIONS_PATH), "http://localhost:8000/api/chat/sessions");

        let err = ChatApiClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ApiConnectionError::InvalidBaseUrl(_)));
    }
}
