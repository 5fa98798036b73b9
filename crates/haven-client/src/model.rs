//! Model status, info and catalog queries with offline-read fallbacks.
//!
//! The backend is authoritative when reachable; every successful response
//! refreshes the in-memory cache, and a connectivity failure serves the
//! cache (or the durable store) instead of erroring.  Application failures
//! still propagate: a reachable backend saying "no" is an answer.

use haven_net::{AvailableModel, ModelInfo, ModelStatus};

use crate::context::AppContext;
use crate::error::Result;

/// Built-in downloadable-model catalog, served when the backend cannot be
/// asked.  Mirrors what a fresh backend installation offers.
pub fn builtin_catalog() -> Vec<AvailableModel> {
    vec![
        AvailableModel {
            id: "gpt2-haven-small".into(),
            name: "Haven Small (GPT-2)".into(),
            description: "Lightweight model for supportive conversations".into(),
            size: "500".into(),
        },
        AvailableModel {
            id: "distilgpt2-haven".into(),
            name: "Haven DistilGPT-2".into(),
            description: "Balanced model for everyday support".into(),
            size: "300".into(),
        },
        AvailableModel {
            id: "bert-haven-tiny".into(),
            name: "Haven Tiny (BERT)".into(),
            description: "Very small model for basic support".into(),
            size: "100".into(),
        },
    ]
}

/// Current model status.  Offline, the answer is derived from the cache or
/// from whether the store has any downloaded model at all.
pub async fn model_status(ctx: &AppContext) -> Result<ModelStatus> {
    match ctx.backend().model_status().await {
        Ok(status) => {
            ctx.update_model_cache(|c| c.status = Some(status.clone()));
            Ok(status)
        }
        Err(e) if e.is_connectivity() => {
            if let Some(cached) = ctx.model_cache().status {
                return Ok(cached);
            }
            let is_loaded = ctx.db().any_model_present()?;
            Ok(ModelStatus {
                is_loaded,
                model_info: None,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Info about the currently loaded model, with the same fallback ladder.
pub async fn model_info(ctx: &AppContext) -> Result<Option<ModelInfo>> {
    match ctx.backend().model_info().await {
        Ok(info) => {
            ctx.update_model_cache(|c| c.info = Some(info.clone()));
            Ok(Some(info))
        }
        Err(e) if e.is_connectivity() => {
            if let Some(cached) = ctx.model_cache().info {
                return Ok(Some(cached));
            }
            // Last resort: the most recently downloaded model on disk.
            let models = ctx.db().list_models()?;
            Ok(models.first().map(|m| ModelInfo {
                name: m.name.clone(),
                size: Some(format!("{:.0}", m.size_mb)),
                path: Some(m.path.clone()),
                last_updated: Some(m.last_updated.to_rfc3339()),
            }))
        }
        Err(e) => Err(e.into()),
    }
}

/// Downloadable-model catalog; the built-in list when offline.
pub async fn available_models(ctx: &AppContext) -> Result<Vec<AvailableModel>> {
    match ctx.backend().available_models().await {
        Ok(models) => Ok(models),
        Err(e) if e.is_connectivity() => Ok(builtin_catalog()),
        Err(e) => Err(e.into()),
    }
}
