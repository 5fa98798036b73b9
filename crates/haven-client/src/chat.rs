//! Chat dispatcher.
//!
//! A chat turn is a single-shot inference call, not a polled job.  The
//! primary path is the backend's `/api/chat` route; when that is
//! unreachable the dispatcher retries as a direct inference call with the
//! full conversation history, and when even that fails it answers with a
//! fixed apologetic reply so the UI never dead-ends.  Both the user message
//! and whatever reply was produced are persisted.

use tracing::warn;
use uuid::Uuid;

use haven_net::WireMessage;
use haven_store::{Message, Role};

use crate::context::AppContext;
use crate::error::{ClientError, Result};

/// Reply used when neither the chat route nor direct inference is
/// reachable.
pub const OFFLINE_REPLY: &str = "I'm sorry, I'm having trouble processing your request right now. \
     The model seems to be unavailable. Please ensure the application is \
     running correctly or try restarting it.";

/// Send one user message in a conversation and return the assistant reply.
///
/// Fails fast with [`ClientError::ModelNotLoaded`] when no model has ever
/// been downloaded, and with `NotFound` (via the store) when the
/// conversation id is unknown.  Application-level rejections from the
/// backend propagate verbatim; only connectivity failures trigger the
/// fallback chain.
pub async fn send_message(
    ctx: &AppContext,
    conversation_id: Uuid,
    text: &str,
) -> Result<Message> {
    if !ctx.db().any_model_present()? {
        return Err(ClientError::ModelNotLoaded);
    }

    // Persist the user's message first; it must survive even if every
    // inference path fails.
    let user_message = Message::new(Role::User, text);
    ctx.db().append_message(conversation_id, &user_message)?;

    let reply_text = match ctx
        .backend()
        .chat(text, &conversation_id.to_string())
        .await
    {
        Ok(reply) => reply,
        Err(e) if e.is_connectivity() => {
            warn!(error = %e, "chat route unreachable, trying direct inference");
            fallback_inference(ctx, conversation_id).await?
        }
        Err(e) => return Err(e.into()),
    };

    let assistant_message = Message::new(Role::Assistant, reply_text);
    ctx.db()
        .append_message(conversation_id, &assistant_message)?;

    Ok(assistant_message)
}

/// Direct inference with the whole history (the just-persisted user message
/// included).  A connectivity failure here degrades to [`OFFLINE_REPLY`].
async fn fallback_inference(ctx: &AppContext, conversation_id: Uuid) -> Result<String> {
    let history: Vec<WireMessage> = {
        let conversation = ctx.db().get_conversation(conversation_id)?;
        conversation
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    };

    match ctx.backend().inference(history).await {
        Ok(reply) => Ok(reply),
        Err(e) if e.is_connectivity() => {
            warn!(error = %e, "inference route unreachable, using offline reply");
            Ok(OFFLINE_REPLY.to_string())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use haven_net::BackendClient;
    use haven_store::{Conversation, Database, ModelMetadata};

    fn ctx_with_model() -> AppContext {
        let db = Database::open_in_memory().unwrap();
        db.upsert_model(&ModelMetadata {
            id: "gpt2-haven-small".into(),
            name: "Haven Small".into(),
            size_mb: 500.0,
            path: "/tmp/model".into(),
            last_updated: Utc::now(),
        })
        .unwrap();
        // Nothing listens on port 1: every request is a connectivity
        // failure, which exercises the full fallback chain.
        AppContext::new(db, BackendClient::with_base_url("http://127.0.0.1:1"))
    }

    #[tokio::test]
    async fn no_model_fails_fast() {
        let ctx = AppContext::new(
            Database::open_in_memory().unwrap(),
            BackendClient::with_base_url("http://127.0.0.1:1"),
        );
        let err = send_message(&ctx, Uuid::new_v4(), "hi").await.unwrap_err();
        assert!(matches!(err, ClientError::ModelNotLoaded));
    }

    #[tokio::test]
    async fn unreachable_backend_yields_offline_reply_and_persists_both_sides() {
        let ctx = ctx_with_model();
        let conversation = Conversation::new("t");
        ctx.db().save_conversation(&conversation).unwrap();

        let reply = send_message(&ctx, conversation.id, "hello").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, OFFLINE_REPLY);

        let stored = ctx.db().get_conversation(conversation.id).unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[0].role, Role::User);
        assert_eq!(stored.messages[0].content, "hello");
        assert_eq!(stored.messages[1].content, OFFLINE_REPLY);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let ctx = ctx_with_model();
        let err = send_message(&ctx, Uuid::new_v4(), "hi").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Store(haven_store::StoreError::NotFound)
        ));
    }
}
