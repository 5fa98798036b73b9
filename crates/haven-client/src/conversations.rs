//! Conversation management commands: a thin layer over the store.

use tracing::info;
use uuid::Uuid;

use haven_store::{Conversation, StoreError};

use crate::context::AppContext;
use crate::error::Result;

/// Title given to a conversation the user has not named yet.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Create and persist a new, empty conversation.
pub fn create_conversation(ctx: &AppContext) -> Result<Conversation> {
    let conversation = Conversation::new(DEFAULT_TITLE);
    let saved = ctx.db().save_conversation(&conversation)?;
    info!(id = %saved.id, "conversation created");
    Ok(saved)
}

/// All conversations, most recent first.
pub fn list_conversations(ctx: &AppContext) -> Result<Vec<Conversation>> {
    Ok(ctx.db().list_conversations()?)
}

/// One conversation with its full message history.
pub fn get_conversation(ctx: &AppContext, id: Uuid) -> Result<Conversation> {
    Ok(ctx.db().get_conversation(id)?)
}

/// Rename a conversation, keeping its messages and `created_at` intact.
pub fn rename_conversation(ctx: &AppContext, id: Uuid, title: &str) -> Result<Conversation> {
    let db = ctx.db();
    let mut conversation = db.get_conversation(id)?;
    conversation.title = title.to_string();
    Ok(db.save_conversation(&conversation)?)
}

/// Delete a conversation.  Succeeds silently when the id does not exist.
pub fn delete_conversation(ctx: &AppContext, id: Uuid) -> Result<bool> {
    let deleted = ctx.db().delete_conversation(id)?;
    if deleted {
        info!(%id, "conversation deleted");
    }
    Ok(deleted)
}

/// Convenience used by tests and the shell: does the id exist at all?
pub fn conversation_exists(ctx: &AppContext, id: Uuid) -> Result<bool> {
    match ctx.db().get_conversation(id) {
        Ok(_) => Ok(true),
        Err(StoreError::NotFound) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
