//! One-JSON-file-per-patient store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{
    check_writable, sort_patients, validate_id, PatientStore, SavedRecord, StoreError, StoreResult,
};
use crate::models::Patient;

const RECORD_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

/// A record file that failed to parse during a lenient scan.
#[derive(Debug, Clone, PartialEq)]
pub struct CorruptRecord {
    pub path: PathBuf,
    pub error: String,
}

/// Result of [`JsonDirStore::scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub patients: Vec<Patient>,
    pub corrupt: Vec<CorruptRecord>,
}

/// Directory of `<id>.json` files.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `id`.
    pub fn record_path(&self, id: &str) -> StoreResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.{RECORD_EXTENSION}")))
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))
    }

    fn read_record(path: &Path) -> StoreResult<Patient> {
        // Undecodable bytes are a corrupt record, not an I/O failure.
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            location: path.display().to_string(),
            source,
        })
    }

    /// All `*.json` regular files in the directory. A missing directory has none.
    fn record_files(&self) -> StoreResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            let is_file = entry
                .file_type()
                .map_err(|e| StoreError::io(&path, e))?
                .is_file();
            let is_record = path
                .extension()
                .is_some_and(|ext| ext == RECORD_EXTENSION);
            if is_file && is_record {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Lenient listing: parse what can be parsed and report the rest.
    ///
    /// I/O failures still abort; only unparseable documents are collected.
    pub fn scan(&self) -> StoreResult<ScanReport> {
        let mut report = ScanReport::default();

        for path in self.record_files()? {
            match Self::read_record(&path) {
                Ok(patient) => report.patients.push(patient),
                Err(StoreError::Parse { source, .. }) => {
                    warn!(path = %path.display(), error = %source, "skipping corrupt patient record");
                    report.corrupt.push(CorruptRecord {
                        path,
                        error: source.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        sort_patients(&mut report.patients);
        Ok(report)
    }
}

impl PatientStore for JsonDirStore {
    fn save(&self, patient: &Patient) -> StoreResult<SavedRecord> {
        check_writable(patient)?;
        let path = self.record_path(&patient.id)?;
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(patient)?;

        // Write beside the target, then rename over it.
        let mut temp = path.clone().into_os_string();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        fs::write(&temp, json).map_err(|e| StoreError::io(&temp, e))?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::io(&path, e));
        }

        info!(id = %patient.id, path = %path.display(), "saved patient record");
        Ok(SavedRecord {
            location: path.display().to_string(),
        })
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(id, "deleted patient record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    fn list_all(&self) -> StoreResult<Vec<Patient>> {
        let files = self.record_files()?;
        let mut patients = Vec::with_capacity(files.len());

        for path in files {
            debug!(path = %path.display(), "reading patient record");
            patients.push(Self::read_record(&path)?);
        }

        sort_patients(&mut patients);
        Ok(patients)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Patient>> {
        let path = self.record_path(id)?;
        match Self::read_record(&path) {
            Ok(patient) => Ok(Some(patient)),
            Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
