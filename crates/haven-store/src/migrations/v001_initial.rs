//! v001 -- Initial schema creation.
//!
//! Creates the three core collections (`conversations`, `settings`,
//! `models`) plus the `messages` child table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Conversations
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS conversations (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    title      TEXT NOT NULL,
    created_at TEXT NOT NULL,               -- ISO-8601 / RFC-3339
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conversations_created_at
    ON conversations(created_at DESC, id ASC);

-- ----------------------------------------------------------------
-- Messages (append-only, ordered by seq within a conversation)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    conversation_id TEXT NOT NULL,          -- FK -> conversations(id)
    id              TEXT NOT NULL,          -- UUID v4, unique per conversation
    seq             INTEGER NOT NULL,       -- insertion order
    role            TEXT NOT NULL,          -- 'user' | 'assistant'
    content         TEXT NOT NULL,
    timestamp       TEXT NOT NULL,          -- ISO-8601

    PRIMARY KEY (conversation_id, id),
    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation_seq
    ON messages(conversation_id, seq ASC);

-- ----------------------------------------------------------------
-- Settings (flat key/value, JSON values, last-write-wins)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS settings (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,               -- JSON blob
    updated_at TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Models (downloaded-model metadata)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS models (
    id           TEXT PRIMARY KEY NOT NULL,
    name         TEXT NOT NULL,
    size_mb      REAL NOT NULL,
    path         TEXT NOT NULL,
    last_updated TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
