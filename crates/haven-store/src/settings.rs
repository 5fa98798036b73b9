//! CRUD operations for flat key/value [`Setting`] records.
//!
//! Values are opaque JSON blobs; callers layer their own typed structs on
//! top.  Writes to the same key are last-write-wins.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Setting;

impl Database {
    /// Upsert a setting.  Always refreshes `updated_at`.
    pub fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.conn().execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Fetch a setting, or `None` if the key has never been written.
    /// Absence is not an error.
    pub fn get_setting(&self, key: &str) -> Result<Option<Setting>> {
        let row = self
            .conn()
            .query_row(
                "SELECT value, updated_at FROM settings WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::Sqlite(other)),
            })?;

        match row {
            Some((value_str, updated_str)) => Ok(Some(Setting {
                key: key.to_string(),
                value: serde_json::from_str(&value_str)?,
                updated_at: DateTime::parse_from_rfc3339(&updated_str)?.with_timezone(&Utc),
            })),
            None => Ok(None),
        }
    }

    /// Delete a setting.  Idempotent.
    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}
