//! Privacy-preserving sync with the aggregation server.
//!
//! The only operation gated on the connectivity monitor: a sync attempted
//! while known-offline is refused up front rather than left to time out.
//! The differential-privacy parameters are opaque here; the backend owns
//! their meaning.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::json;
use tracing::info;

use haven_jobs::{run_job, CancelToken, JobKind, JobOutcome, JobSpec, ProgressSink};
use haven_net::{BackendClient, JobProgress, NetError, PrivacySettings, StartSyncRequest};

use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::settings::SyncSettings;

/// Settings key holding the RFC 3339 timestamp of the last completed sync.
pub const LAST_SYNC_TIME_KEY: &str = "last_sync_time";

/// Sync job configuration.
pub struct SyncJob {
    pub request: StartSyncRequest,
}

impl JobSpec for SyncJob {
    fn kind(&self) -> JobKind {
        JobKind::Sync
    }

    fn submit<'a>(
        &'a self,
        client: &'a BackendClient,
    ) -> BoxFuture<'a, std::result::Result<String, NetError>> {
        Box::pin(client.start_sync(&self.request))
    }

    fn poll<'a>(
        &'a self,
        client: &'a BackendClient,
        job_id: &'a str,
    ) -> BoxFuture<'a, std::result::Result<JobProgress, NetError>> {
        Box::pin(client.sync_progress(job_id))
    }
}

/// Run one sync job.  Refused while the monitor reports offline; records
/// the last-sync timestamp on completion.
pub async fn start_sync(
    ctx: &AppContext,
    settings: &SyncSettings,
    sink: &ProgressSink,
    cancel: &CancelToken,
    deadline: Option<Duration>,
) -> Result<JobOutcome> {
    if let Some(connectivity) = ctx.connectivity() {
        if !connectivity.is_online() {
            return Err(ClientError::Offline);
        }
    }

    let _slot = ctx.jobs().begin(JobKind::Sync)?;

    let spec = SyncJob {
        request: StartSyncRequest {
            privacy_settings: PrivacySettings {
                epsilon: settings.privacy_epsilon,
                delta: settings.privacy_delta,
            },
            sync_frequency: settings.sync_frequency.clone(),
        },
    };
    let outcome = run_job(ctx.backend(), &spec, sink, cancel, deadline).await?;

    ctx.db()
        .put_setting(LAST_SYNC_TIME_KEY, &json!(Utc::now().to_rfc3339()))?;

    info!(simulated = outcome.simulated, "sync finished");
    Ok(outcome)
}

/// When the last sync completed, if ever.
pub fn last_sync_time(ctx: &AppContext) -> Result<Option<DateTime<Utc>>> {
    let Some(setting) = ctx.db().get_setting(LAST_SYNC_TIME_KEY)? else {
        return Ok(None);
    };
    let Some(raw) = setting.value.as_str().map(String::from) else {
        return Ok(None);
    };
    Ok(Some(
        DateTime::parse_from_rfc3339(&raw)
            .map_err(haven_store::StoreError::from)?
            .with_timezone(&Utc),
    ))
}
