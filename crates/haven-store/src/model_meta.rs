//! CRUD operations for [`ModelMetadata`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::ModelMetadata;

impl Database {
    /// Upsert model metadata.  `last_updated` is stamped at write time.
    pub fn upsert_model(&self, model: &ModelMetadata) -> Result<ModelMetadata> {
        let last_updated = Utc::now();
        self.conn().execute(
            "INSERT INTO models (id, name, size_mb, path, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 name = ?2, size_mb = ?3, path = ?4, last_updated = ?5",
            params![
                model.id,
                model.name,
                model.size_mb,
                model.path,
                last_updated.to_rfc3339(),
            ],
        )?;
        Ok(ModelMetadata {
            last_updated,
            ..model.clone()
        })
    }

    /// Fetch metadata for one model.
    pub fn get_model(&self, id: &str) -> Result<ModelMetadata> {
        self.conn()
            .query_row(
                "SELECT id, name, size_mb, path, last_updated FROM models WHERE id = ?1",
                params![id],
                row_to_model,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all known models, most recently updated first.
    pub fn list_models(&self) -> Result<Vec<ModelMetadata>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, size_mb, path, last_updated
             FROM models
             ORDER BY last_updated DESC, id ASC",
        )?;

        let rows = stmt.query_map([], row_to_model)?;

        let mut models = Vec::new();
        for row in rows {
            models.push(row?);
        }
        Ok(models)
    }

    /// Whether any model has been downloaded at all.  Used by the chat and
    /// training paths as their local "can we infer?" precondition.
    pub fn any_model_present(&self) -> Result<bool> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM models", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Delete one model's metadata.  Idempotent.
    pub fn delete_model(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM models WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_model(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelMetadata> {
    let last_updated_str: String = row.get(4)?;
    let last_updated: DateTime<Utc> = DateTime::parse_from_rfc3339(&last_updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ModelMetadata {
        id: row.get(0)?,
        name: row.get(1)?,
        size_mb: row.get(2)?,
        path: row.get(3)?,
        last_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> ModelMetadata {
        ModelMetadata {
            id: id.to_string(),
            name: "Haven Small (GPT-2)".into(),
            size_mb: 500.0,
            path: "/tmp/models/haven-small".into(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn upsert_and_get() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_model(&sample("gpt2-haven-small")).unwrap();
        let loaded = db.get_model("gpt2-haven-small").unwrap();
        assert_eq!(loaded.name, "Haven Small (GPT-2)");
        assert_eq!(loaded.size_mb, 500.0);
    }

    #[test]
    fn get_missing_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_model("missing").unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn any_model_present_flips_after_download() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.any_model_present().unwrap());
        db.upsert_model(&sample("m")).unwrap();
        assert!(db.any_model_present().unwrap());
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_model(&sample("m")).unwrap();
        let mut updated = sample("m");
        updated.path = "/somewhere/else".into();
        db.upsert_model(&updated).unwrap();

        let loaded = db.get_model("m").unwrap();
        assert_eq!(loaded.path, "/somewhere/else");
        assert_eq!(db.list_models().unwrap().len(), 1);
    }
}
