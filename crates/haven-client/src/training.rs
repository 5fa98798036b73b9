//! Local training: harvest (user, assistant) pairs from stored
//! conversations and drive a training job on the backend.

use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::json;
use tracing::info;

use haven_jobs::{run_job, CancelToken, JobKind, JobOutcome, JobSpec, ProgressSink};
use haven_net::{
    BackendClient, JobProgress, NetError, StartTrainingRequest, TrainingExample,
    TrainingRunSettings,
};
use haven_store::{Conversation, Role};

use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::settings::TrainingSettings;

/// Settings key holding the RFC 3339 timestamp of the last completed
/// training run.
pub const LAST_TRAIN_TIME_KEY: &str = "last_train_time";

/// Harvest training pairs from conversations.
///
/// A sliding window over each conversation's messages: every adjacent
/// `(user, assistant)` pair becomes one `{input, output}` example.  Pairs
/// never span conversation boundaries; other adjacencies (user/user,
/// assistant/anything) contribute nothing.
pub fn extract_training_pairs(conversations: &[Conversation]) -> Vec<TrainingExample> {
    let mut examples = Vec::new();

    for conversation in conversations {
        let messages = &conversation.messages;
        for window in messages.windows(2) {
            if window[0].role == Role::User && window[1].role == Role::Assistant {
                examples.push(TrainingExample {
                    input: window[0].content.clone(),
                    output: window[1].content.clone(),
                });
            }
        }
    }

    examples
}

/// Training job configuration.
pub struct TrainJob {
    pub request: StartTrainingRequest,
}

impl JobSpec for TrainJob {
    fn kind(&self) -> JobKind {
        JobKind::Train
    }

    fn submit<'a>(
        &'a self,
        client: &'a BackendClient,
    ) -> BoxFuture<'a, std::result::Result<String, NetError>> {
        Box::pin(client.start_training(&self.request))
    }

    fn poll<'a>(
        &'a self,
        client: &'a BackendClient,
        job_id: &'a str,
    ) -> BoxFuture<'a, std::result::Result<JobProgress, NetError>> {
        Box::pin(client.training_progress(job_id))
    }
}

/// Run one training job.
///
/// Local preconditions come first, before any network traffic: a model
/// must be present, and when training on local data there must be at least
/// one harvested pair.  On completion the last-train timestamp is
/// recorded.
pub async fn start_training(
    ctx: &AppContext,
    settings: &TrainingSettings,
    sink: &ProgressSink,
    cancel: &CancelToken,
    deadline: Option<Duration>,
) -> Result<JobOutcome> {
    if !ctx.db().any_model_present()? {
        return Err(ClientError::ModelNotLoaded);
    }

    let training_data = if settings.use_local_data {
        let conversations = ctx.db().list_conversations()?;
        let pairs = extract_training_pairs(&conversations);
        if pairs.is_empty() {
            return Err(ClientError::InsufficientData);
        }
        pairs
    } else {
        Vec::new()
    };

    let _slot = ctx.jobs().begin(JobKind::Train)?;

    info!(examples = training_data.len(), "starting training job");

    let spec = TrainJob {
        request: StartTrainingRequest {
            training_data,
            settings: TrainingRunSettings {
                num_epochs: settings.num_epochs,
                batch_size: settings.batch_size,
                learning_rate: settings.learning_rate,
                use_local_data: settings.use_local_data,
            },
        },
    };
    let outcome = run_job(ctx.backend(), &spec, sink, cancel, deadline).await?;

    ctx.db()
        .put_setting(LAST_TRAIN_TIME_KEY, &json!(Utc::now().to_rfc3339()))?;

    info!(simulated = outcome.simulated, "training finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use haven_net::BackendClient;
    use haven_store::{Database, Message, ModelMetadata};
    use tokio::sync::mpsc;

    fn conversation_with(messages: Vec<(Role, &str)>) -> Conversation {
        let mut conversation = Conversation::new("t");
        for (role, content) in messages {
            conversation.messages.push(Message::new(role, content));
        }
        conversation
    }

    #[test]
    fn pairs_are_adjacent_user_then_assistant() {
        let conversation = conversation_with(vec![
            (Role::User, "a"),
            (Role::Assistant, "b"),
            (Role::User, "c"),
            (Role::Assistant, "d"),
        ]);

        let pairs = extract_training_pairs(&[conversation]);
        assert_eq!(
            pairs,
            vec![
                TrainingExample {
                    input: "a".into(),
                    output: "b".into()
                },
                TrainingExample {
                    input: "c".into(),
                    output: "d".into()
                },
            ]
        );
    }

    #[test]
    fn consecutive_user_messages_yield_nothing() {
        let conversation = conversation_with(vec![(Role::User, "a"), (Role::User, "c")]);
        assert!(extract_training_pairs(&[conversation]).is_empty());
    }

    #[test]
    fn pairs_do_not_span_conversations() {
        let first = conversation_with(vec![(Role::User, "q")]);
        let second = conversation_with(vec![(Role::Assistant, "a")]);
        assert!(extract_training_pairs(&[first, second]).is_empty());
    }

    #[test]
    fn interleaved_history_only_pairs_matching_adjacencies() {
        let conversation = conversation_with(vec![
            (Role::Assistant, "welcome"),
            (Role::User, "q1"),
            (Role::Assistant, "a1"),
            (Role::Assistant, "a2"),
            (Role::User, "trailing"),
        ]);

        let pairs = extract_training_pairs(&[conversation]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].input, "q1");
        assert_eq!(pairs[0].output, "a1");
    }

    fn offline_ctx_with_model() -> AppContext {
        let db = Database::open_in_memory().unwrap();
        db.upsert_model(&ModelMetadata {
            id: "m".into(),
            name: "M".into(),
            size_mb: 1.0,
            path: "/p".into(),
            last_updated: Utc::now(),
        })
        .unwrap();
        AppContext::new(db, BackendClient::with_base_url("http://127.0.0.1:1"))
    }

    #[tokio::test]
    async fn no_pairs_fails_fast_without_network() {
        let ctx = offline_ctx_with_model();
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = start_training(
            &ctx,
            &TrainingSettings::default(),
            &tx,
            &CancelToken::new(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::InsufficientData));
    }

    #[tokio::test]
    async fn no_model_fails_before_harvesting() {
        let ctx = AppContext::new(
            Database::open_in_memory().unwrap(),
            BackendClient::with_base_url("http://127.0.0.1:1"),
        );
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = start_training(
            &ctx,
            &TrainingSettings::default(),
            &tx,
            &CancelToken::new(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::ModelNotLoaded));
    }

    #[tokio::test(start_paused = true)]
    async fn offline_training_simulates_and_records_timestamp() {
        let ctx = offline_ctx_with_model();
        let conversation = conversation_with(vec![(Role::User, "q"), (Role::Assistant, "a")]);
        ctx.db().save_conversation(&conversation).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = start_training(
            &ctx,
            &TrainingSettings::default(),
            &tx,
            &CancelToken::new(),
            None,
        )
        .await
        .unwrap();

        assert!(outcome.simulated);
        assert_eq!(outcome.progress, 100);
        assert!(ctx.db().get_setting(LAST_TRAIN_TIME_KEY).unwrap().is_some());

        let mut last = 0u8;
        while let Ok(p) = rx.try_recv() {
            assert!(p >= last);
            last = p;
        }
        assert_eq!(last, 100);
    }
}
