//! JSON request/response types for the backend API.
//!
//! Field names follow the backend's snake_case wire format; aliases cover
//! the handful of fields the backend has historically spelled differently.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Job progress
// ---------------------------------------------------------------------------

/// Status of a long-running backend job as reported by a progress poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted but not yet running.
    #[serde(alias = "starting")]
    Pending,
    /// Actively making progress.
    #[serde(alias = "in_progress")]
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One progress poll response, shared by download, training and sync jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub status: JobStatus,
    /// 0..=100.  Forwarded to progress sinks verbatim.
    #[serde(default)]
    pub progress: u8,
    /// Download jobs only: where the backend placed the model weights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    /// Present iff `status == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Model status / catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub is_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, alias = "lastUpdated")]
    pub last_updated: Option<String>,
}

/// One entry of the downloadable-model catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Approximate size in MB, as a string on the wire.
    pub size: String,
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StartDownloadRequest {
    pub model_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartDownloadResponse {
    pub download_id: String,
}

// ---------------------------------------------------------------------------
// Chat / inference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// One turn of conversation history for the direct-inference fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    pub messages: Vec<WireMessage>,
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// One `(user, assistant)` exchange harvested from local conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingExample {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingRunSettings {
    pub num_epochs: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub use_local_data: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartTrainingRequest {
    pub training_data: Vec<TrainingExample>,
    pub settings: TrainingRunSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartTrainingResponse {
    pub training_id: String,
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Differential-privacy noise parameters.  Opaque to this layer; the
/// backend owns their interpretation.
#[derive(Debug, Clone, Serialize)]
pub struct PrivacySettings {
    pub epsilon: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartSyncRequest {
    pub privacy_settings: PrivacySettings,
    pub sync_frequency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartSyncResponse {
    pub sync_id: String,
}
