//! CRUD operations for [`Conversation`] records and their messages.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Conversation, Message, Role};

impl Database {
    // ------------------------------------------------------------------
    // Create / update
    // ------------------------------------------------------------------

    /// Upsert a conversation together with its full message list.
    ///
    /// The first write fixes `created_at`; subsequent writes keep the value
    /// already in the database, whatever the caller passed in.  `updated_at`
    /// is always set to the current time.  The row and its messages are
    /// written in one transaction, so the collection is never observed
    /// half-updated.
    ///
    /// Returns the record as persisted, with both timestamps resolved.
    pub fn save_conversation(&self, conversation: &Conversation) -> Result<Conversation> {
        let tx = self.conn().unchecked_transaction()?;

        let existing_created_at: Option<String> = tx
            .query_row(
                "SELECT created_at FROM conversations WHERE id = ?1",
                params![conversation.id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let created_at: DateTime<Utc> = match existing_created_at {
            Some(ref s) => DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc),
            None => conversation.created_at,
        };
        let updated_at = Utc::now();

        tx.execute(
            "INSERT INTO conversations (id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET title = ?2, updated_at = ?4",
            params![
                conversation.id.to_string(),
                conversation.title,
                created_at.to_rfc3339(),
                updated_at.to_rfc3339(),
            ],
        )?;

        // Replace the message list wholesale, preserving insertion order via
        // the seq column.
        tx.execute(
            "DELETE FROM messages WHERE conversation_id = ?1",
            params![conversation.id.to_string()],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO messages (conversation_id, id, seq, role, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (seq, msg) in conversation.messages.iter().enumerate() {
                stmt.execute(params![
                    conversation.id.to_string(),
                    msg.id.to_string(),
                    seq as i64,
                    msg.role.as_str(),
                    msg.content,
                    msg.timestamp.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;

        Ok(Conversation {
            id: conversation.id,
            title: conversation.title.clone(),
            created_at,
            updated_at,
            messages: conversation.messages.clone(),
        })
    }

    /// Append a single message to an existing conversation and bump its
    /// `updated_at`.  Messages are append-only; there is no edit path.
    pub fn append_message(&self, conversation_id: Uuid, message: &Message) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;

        let updated = tx.execute(
            "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
            params![conversation_id.to_string(), Utc::now().to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO messages (conversation_id, id, seq, role, content, timestamp)
             VALUES (?1, ?2,
                     (SELECT COALESCE(MAX(seq) + 1, 0) FROM messages WHERE conversation_id = ?1),
                     ?3, ?4, ?5)",
            params![
                conversation_id.to_string(),
                message.id.to_string(),
                message.role.as_str(),
                message.content,
                message.timestamp.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single conversation with its messages.
    pub fn get_conversation(&self, id: Uuid) -> Result<Conversation> {
        let (title, created_at, updated_at) = self
            .conn()
            .query_row(
                "SELECT title, created_at, updated_at FROM conversations WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        Ok(Conversation {
            id,
            title,
            created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at)?.with_timezone(&Utc),
            messages: self.messages_for(id)?,
        })
    }

    /// List all conversations, most recent first.
    ///
    /// Ordering is `created_at DESC` with ties broken by id ascending, so
    /// the sequence is deterministic for any input.
    pub fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, title, created_at, updated_at
             FROM conversations
             ORDER BY created_at DESC, id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut conversations = Vec::new();
        for row in rows {
            let (id_str, title, created_str, updated_str) = row?;
            let id = Uuid::parse_str(&id_str)?;
            conversations.push(Conversation {
                id,
                title,
                created_at: DateTime::parse_from_rfc3339(&created_str)?.with_timezone(&Utc),
                updated_at: DateTime::parse_from_rfc3339(&updated_str)?.with_timezone(&Utc),
                messages: self.messages_for(id)?,
            });
        }
        Ok(conversations)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a conversation and its messages.  Idempotent: deleting an id
    /// that does not exist succeeds and returns `false`.
    pub fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM conversations WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn messages_for(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, role, content, timestamp
             FROM messages
             WHERE conversation_id = ?1
             ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![conversation_id.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

/// Map a `rusqlite::Row` to a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(1)?;
    let content: String = row.get(2)?;
    let ts_str: String = row.get(3)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let role = Role::from_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown role: {role_str}").into(),
        )
    })?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Message {
        id,
        role,
        content,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn save_and_get_round_trip() {
        let db = open();

        let mut convo = Conversation::new("First chat");
        convo.messages.push(Message::new(Role::User, "hello"));
        convo.messages.push(Message::new(Role::Assistant, "hi there"));

        db.save_conversation(&convo).unwrap();

        let loaded = db.get_conversation(convo.id).unwrap();
        assert_eq!(loaded.title, "First chat");
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[0].content, "hello");
        assert_eq!(loaded.messages[1].role, Role::Assistant);
    }

    #[test]
    fn created_at_is_fixed_on_first_write() {
        let db = open();

        let convo = Conversation::new("pinned");
        let first = db.save_conversation(&convo).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));

        // A second save with a different created_at must not move it.
        let mut tampered = first.clone();
        tampered.created_at = Utc::now();
        tampered.title = "renamed".into();
        let second = db.save_conversation(&tampered).unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.title, "renamed");
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn repeated_saves_last_write_wins() {
        let db = open();

        let mut convo = Conversation::new("v1");
        db.save_conversation(&convo).unwrap();
        convo.title = "v2".into();
        db.save_conversation(&convo).unwrap();
        convo.title = "v3".into();
        db.save_conversation(&convo).unwrap();

        let loaded = db.get_conversation(convo.id).unwrap();
        assert_eq!(loaded.title, "v3");
    }

    #[test]
    fn list_orders_by_created_at_desc_with_id_tiebreak() {
        let db = open();

        let ts = Utc::now();
        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            let mut convo = Conversation::new(title);
            convo.created_at = ts; // force a tie
            db.save_conversation(&convo).unwrap();
            ids.push(convo.id);
        }

        let mut older = Conversation::new("old");
        older.created_at = ts - chrono::Duration::seconds(60);
        db.save_conversation(&older).unwrap();

        let listed = db.list_conversations().unwrap();
        assert_eq!(listed.len(), 4);

        // Oldest last.
        assert_eq!(listed[3].id, older.id);

        // Equal created_at: ids ascending, deterministically.
        let mut tied: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
        tied.sort();
        let got: Vec<String> = listed[..3].iter().map(|c| c.id.to_string()).collect();
        assert_eq!(got, tied);
    }

    #[test]
    fn append_message_preserves_order() {
        let db = open();

        let convo = Conversation::new("appendy");
        db.save_conversation(&convo).unwrap();

        for i in 0..5 {
            db.append_message(convo.id, &Message::new(Role::User, format!("m{i}")))
                .unwrap();
        }

        let loaded = db.get_conversation(convo.id).unwrap();
        let contents: Vec<&str> = loaded.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m0", "m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn append_to_missing_conversation_is_not_found() {
        let db = open();
        let err = db
            .append_message(Uuid::new_v4(), &Message::new(Role::User, "x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn delete_is_idempotent() {
        let db = open();

        let convo = Conversation::new("doomed");
        db.save_conversation(&convo).unwrap();

        assert!(db.delete_conversation(convo.id).unwrap());
        assert!(!db.delete_conversation(convo.id).unwrap());
        // Deleting an id that never existed also succeeds.
        assert!(!db.delete_conversation(Uuid::new_v4()).unwrap());
    }
}
