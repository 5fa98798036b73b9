//! Typed HTTP client for the local inference backend.
//!
//! The backend is an opaque service on a fixed loopback origin.  Every
//! method maps one route; error classification (unreachable vs rejected)
//! happens here so callers never inspect message text.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;

use crate::error::{NetError, Result};
use crate::wire::*;

/// Default origin of the local backend service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Client for the local backend HTTP API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

/// Error body shape the backend uses for rejections.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl BackendClient {
    /// Client against the default loopback origin.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an explicit origin.  Used by tests and by setups that
    /// run the backend on a non-default port.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------
    // Model status / catalog
    // ------------------------------------------------------------------

    pub async fn model_status(&self) -> Result<ModelStatus> {
        self.get_json("/api/model/status").await
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        self.get_json("/api/model/info").await
    }

    pub async fn available_models(&self) -> Result<Vec<AvailableModel>> {
        self.get_json("/api/model/available").await
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    pub async fn start_download(&self, model_id: &str) -> Result<String> {
        let resp: StartDownloadResponse = self
            .post_json(
                "/api/model/download",
                &StartDownloadRequest {
                    model_id: model_id.to_string(),
                },
            )
            .await?;
        Ok(resp.download_id)
    }

    pub async fn download_progress(&self, download_id: &str) -> Result<JobProgress> {
        self.get_json(&format!("/api/model/download/{download_id}/progress"))
            .await
    }

    // ------------------------------------------------------------------
    // Chat / inference
    // ------------------------------------------------------------------

    pub async fn chat(&self, message: &str, conversation_id: &str) -> Result<String> {
        let resp: ChatResponse = self
            .post_json(
                "/api/chat",
                &ChatRequest {
                    message: message.to_string(),
                    conversation_id: conversation_id.to_string(),
                },
            )
            .await?;
        Ok(resp.response)
    }

    pub async fn inference(&self, messages: Vec<WireMessage>) -> Result<String> {
        let resp: ChatResponse = self
            .post_json("/api/model/inference", &InferenceRequest { messages })
            .await?;
        Ok(resp.response)
    }

    // ------------------------------------------------------------------
    // Training
    // ------------------------------------------------------------------

    pub async fn start_training(&self, request: &StartTrainingRequest) -> Result<String> {
        let resp: StartTrainingResponse = self.post_json("/api/train", request).await?;
        Ok(resp.training_id)
    }

    pub async fn training_progress(&self, training_id: &str) -> Result<JobProgress> {
        self.get_json(&format!("/api/train/{training_id}/progress"))
            .await
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    pub async fn start_sync(&self, request: &StartSyncRequest) -> Result<String> {
        let resp: StartSyncResponse = self.post_json("/api/sync", request).await?;
        Ok(resp.sync_id)
    }

    pub async fn sync_progress(&self, sync_id: &str) -> Result<JobProgress> {
        self.get_json(&format!("/api/sync/{sync_id}/progress")).await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(NetError::from_transport)?;
        Self::decode(resp).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(NetError::from_transport)?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            // Prefer the backend's own error message when it sent one.
            let message = match resp.json::<ErrorBody>().await {
                Ok(ErrorBody { error: Some(msg) }) => msg,
                _ => format!("Backend responded {status}"),
            };
            tracing::warn!(status = status.as_u16(), %message, "backend rejected request");
            return Err(NetError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| NetError::Decode(e.to_string()))
    }
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = BackendClient::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn unreachable_backend_classifies_as_connectivity() {
        // Port 1 is essentially never bound; the connection is refused
        // immediately.
        let client = BackendClient::with_base_url("http://127.0.0.1:1");
        let err = client.model_status().await.unwrap_err();
        assert!(err.is_connectivity());
    }
}
