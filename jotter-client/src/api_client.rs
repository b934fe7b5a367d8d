//! HTTP client for the notes backend.
//!
//! Wraps the five REST operations the session controller consumes and
//! normalizes every outcome into `Result<T, ApiClientError>`: non-2xx
//! statuses become the typed `Status` failure rather than surfacing as
//! transport errors.

use crate::config::ClientConfig;
use jotter_core::{Note, NoteDraft, NoteId};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Non-2xx response. `message` carries the body's `detail` field when
    /// the backend sent one, else the transport status text.
    #[error("{message}")]
    Status { status: u16, message: String },
}

impl ApiClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Error body shape the backend uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all note summaries. The backend returns them oldest-first; the
    /// caller decides display order.
    pub async fn list_notes(&self) -> Result<Vec<Note>, ApiClientError> {
        let url = format!("{}/notes", self.base_url);
        tracing::debug!(%url, "listing notes");
        let response = self.client.get(url).send().await?;
        parse_response(response).await
    }

    pub async fn get_note(&self, id: NoteId) -> Result<Note, ApiClientError> {
        let url = format!("{}/notes/{}", self.base_url, id);
        tracing::debug!(%url, "fetching note");
        let response = self.client.get(url).send().await?;
        parse_response(response).await
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note, ApiClientError> {
        let url = format!("{}/notes", self.base_url);
        tracing::debug!(%url, "creating note");
        let response = self.client.post(url).json(draft).send().await?;
        parse_response(response).await
    }

    pub async fn update_note(
        &self,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<Note, ApiClientError> {
        let url = format!("{}/notes/{}", self.base_url, id);
        tracing::debug!(%url, "updating note");
        let response = self.client.put(url).json(draft).send().await?;
        parse_response(response).await
    }

    /// Delete a note. Success bodies are ignored.
    pub async fn delete_note(&self, id: NoteId) -> Result<(), ApiClientError> {
        let url = format!("{}/notes/{}", self.base_url, id);
        tracing::debug!(%url, "deleting note");
        let response = self.client.delete(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, response.text().await?))
        }
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiClientError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(serde_json::from_str(&body)?)
    } else {
        Err(status_error(status, body))
    }
}

fn status_error(status: reqwest::StatusCode, body: String) -> ApiClientError {
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => err.detail,
        Err(_) => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
    };
    ApiClientError::Status {
        status: status.as_u16(),
        message,
    }
}
