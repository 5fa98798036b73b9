//! Typed user settings layered over the store's key/value collection.
//!
//! Each struct serializes to one JSON setting value; unknown or missing
//! keys fall back to defaults so a fresh install needs no setup.

use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::Result;

pub const TRAINING_SETTINGS_KEY: &str = "training_settings";
pub const SYNC_SETTINGS_KEY: &str = "sync_settings";

/// Hyperparameters for a local training run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingSettings {
    /// Harvest training pairs from local conversations.
    pub use_local_data: bool,
    pub num_epochs: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            use_local_data: true,
            num_epochs: 1,
            batch_size: 4,
            learning_rate: 1e-4,
        }
    }
}

/// Parameters for privacy-preserving sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    pub privacy_epsilon: f64,
    pub privacy_delta: f64,
    /// `manual`, `daily` or `weekly`.
    pub sync_frequency: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            privacy_epsilon: 2.0,
            privacy_delta: 1e-5,
            sync_frequency: "manual".into(),
        }
    }
}

pub fn load_training_settings(ctx: &AppContext) -> Result<TrainingSettings> {
    load_or_default(ctx, TRAINING_SETTINGS_KEY)
}

pub fn save_training_settings(ctx: &AppContext, settings: &TrainingSettings) -> Result<()> {
    ctx.db()
        .put_setting(TRAINING_SETTINGS_KEY, &serde_json::to_value(settings).map_err(haven_store::StoreError::from)?)?;
    Ok(())
}

pub fn load_sync_settings(ctx: &AppContext) -> Result<SyncSettings> {
    load_or_default(ctx, SYNC_SETTINGS_KEY)
}

pub fn save_sync_settings(ctx: &AppContext, settings: &SyncSettings) -> Result<()> {
    ctx.db()
        .put_setting(SYNC_SETTINGS_KEY, &serde_json::to_value(settings).map_err(haven_store::StoreError::from)?)?;
    Ok(())
}

fn load_or_default<T>(ctx: &AppContext, key: &str) -> Result<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    match ctx.db().get_setting(key)? {
        Some(setting) => Ok(serde_json::from_value(setting.value)
            .map_err(haven_store::StoreError::from)?),
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_net::BackendClient;
    use haven_store::Database;

    fn ctx() -> AppContext {
        AppContext::new(
            Database::open_in_memory().unwrap(),
            BackendClient::with_base_url("http://127.0.0.1:1"),
        )
    }

    #[test]
    fn defaults_when_unset() {
        let ctx = ctx();
        assert_eq!(load_training_settings(&ctx).unwrap(), TrainingSettings::default());
        assert_eq!(load_sync_settings(&ctx).unwrap(), SyncSettings::default());
    }

    #[test]
    fn save_then_load_round_trip() {
        let ctx = ctx();

        let settings = TrainingSettings {
            use_local_data: false,
            num_epochs: 3,
            batch_size: 8,
            learning_rate: 5e-5,
        };
        save_training_settings(&ctx, &settings).unwrap();
        assert_eq!(load_training_settings(&ctx).unwrap(), settings);

        let sync = SyncSettings {
            privacy_epsilon: 1.0,
            privacy_delta: 1e-6,
            sync_frequency: "daily".into(),
        };
        save_sync_settings(&ctx, &sync).unwrap();
        assert_eq!(load_sync_settings(&ctx).unwrap(), sync);
    }

    #[test]
    fn partial_stored_value_fills_with_defaults() {
        let ctx = ctx();
        ctx.db()
            .put_setting(TRAINING_SETTINGS_KEY, &serde_json::json!({"num_epochs": 7}))
            .unwrap();

        let loaded = load_training_settings(&ctx).unwrap();
        assert_eq!(loaded.num_epochs, 7);
        assert!(loaded.use_local_data);
    }
}
