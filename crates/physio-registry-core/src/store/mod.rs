//! Record stores for patient documents.
//!
//! Two implementations share the [`PatientStore`] interface:
//!
//! - [`JsonDirStore`]: one pretty-printed JSON file per patient, the primary store
//! - [`LocalStore`]: single-file SQLite key/value fallback
//!
//! A store is picked once at startup (see [`crate::config`]) and never mixed at runtime.
//! Neither store caches; every read reflects what is currently persisted.

mod json_dir;
mod local;
mod schema;

pub use json_dir::*;
pub use local::*;
pub use schema::*;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Patient, ValidationError};

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Corrupt patient record {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid patient ID: {0:?}")]
    InvalidId(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Refusing to save patient {id}: {source}")]
    Unserializable {
        id: String,
        #[source]
        source: ValidationError,
    },
}

impl StoreError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Where a saved record ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecord {
    /// File path (or `<db>#<id>` for the SQLite store)
    pub location: String,
}

/// Persistence interface keyed by patient ID.
pub trait PatientStore {
    /// Create or fully replace the record for `patient.id`.
    fn save(&self, patient: &Patient) -> StoreResult<SavedRecord>;

    /// Remove the record for `id`. Fails with [`StoreError::NotFound`] if absent.
    fn delete(&self, id: &str) -> StoreResult<()>;

    /// Read every record. A single unparseable record fails the whole listing.
    fn list_all(&self) -> StoreResult<Vec<Patient>>;

    /// Read one record by ID.
    fn get(&self, id: &str) -> StoreResult<Option<Patient>>;
}

/// Reject IDs that are empty or could escape the storage directory.
pub fn validate_id(id: &str) -> StoreResult<()> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains('/')
        || id.contains('\\')
        || id.contains('\0')
    {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Guard run by every `save` before any I/O: a record that would not read
/// back (non-finite amounts serialize as `null`) is never written.
pub(crate) fn check_writable(patient: &Patient) -> StoreResult<()> {
    validate_id(&patient.id)?;
    patient
        .check_amounts()
        .map_err(|source| StoreError::Unserializable {
            id: patient.id.clone(),
            source,
        })
}

/// Listing order: by name, then ID for stability.
pub(crate) fn sort_patients(patients: &mut [Patient]) {
    patients.sort_by(|a, b| {
        a.full_name
            .cmp(&b.full_name)
            .then_with(|| a.id.cmp(&b.id))
    });
}
