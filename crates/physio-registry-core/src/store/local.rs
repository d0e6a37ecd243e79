//! SQLite-backed fallback store.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{
    check_writable, sort_patients, validate_id, PatientStore, SavedRecord, StoreError, StoreResult, SCHEMA,
};
use crate::models::Patient;

/// Single-file local store: one JSON document per row, keyed by patient ID.
pub struct LocalStore {
    conn: Connection,
    location: String,
}

impl LocalStore {
    /// Open store at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            location: path.display().to_string(),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Create in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            location: ":memory:".to_string(),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn record_location(&self, id: &str) -> String {
        format!("{}#{}", self.location, id)
    }

    fn parse(&self, id: &str, document: &str) -> StoreResult<Patient> {
        serde_json::from_str(document).map_err(|source| StoreError::Parse {
            location: self.record_location(id),
            source,
        })
    }
}

impl PatientStore for LocalStore {
    fn save(&self, patient: &Patient) -> StoreResult<SavedRecord> {
        check_writable(patient)?;
        let document = serde_json::to_string_pretty(patient)?;

        self.conn.execute(
            r#"
            INSERT INTO patients (id, document) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET document = excluded.document
            "#,
            params![patient.id, document],
        )?;

        info!(id = %patient.id, "saved patient record to local store");
        Ok(SavedRecord {
            location: self.record_location(&patient.id),
        })
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        validate_id(id)?;
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        info!(id, "deleted patient record from local store");
        Ok(())
    }

    fn list_all(&self) -> StoreResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare("SELECT id, document FROM patients")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut patients = Vec::new();
        for row in rows {
            let (id, document) = row?;
            debug!(id = %id, "reading patient record from local store");
            patients.push(self.parse(&id, &document)?);
        }

        sort_patients(&mut patients);
        Ok(patients)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Patient>> {
        validate_id(id)?;
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM patients WHERE id = ?",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        document.map(|doc| self.parse(id, &doc)).transpose()
    }
}
