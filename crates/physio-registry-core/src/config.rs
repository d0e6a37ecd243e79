//! Runtime configuration.
//!
//! Resolved once at process startup and passed into the adapter, so request
//! handling never reads process-wide environment variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::store::{JsonDirStore, LocalStore, PatientStore, StoreResult};

/// Overrides the storage directory.
pub const DATA_DIR_ENV: &str = "PHYSIO_REGISTRY_DIR";
/// Selects the storage backend (`files` or `local`).
pub const BACKEND_ENV: &str = "PHYSIO_REGISTRY_BACKEND";

const APP_DIR_NAME: &str = "physio-registry";
const REGISTRY_DIR_NAME: &str = "registry";
const LOCAL_DB_FILE: &str = "registry.db";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Could not determine the platform data directory")]
    NoDataDir,

    #[error("Unknown storage backend: {0:?} (expected \"files\" or \"local\")")]
    UnknownBackend(String),
}

/// Which [`PatientStore`] implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// One JSON file per patient
    #[default]
    Files,
    /// Single SQLite file
    Local,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "files" | "file" | "json" => Ok(Backend::Files),
            "local" | "sqlite" => Ok(Backend::Local),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Files => write!(f, "files"),
            Backend::Local => write!(f, "local"),
        }
    }
}

/// Registry configuration resolved at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct RegistryConfig {
    data_dir: PathBuf,
    backend: Backend,
}

impl RegistryConfig {
    /// Create a new `RegistryConfig`.
    pub fn new(data_dir: impl Into<PathBuf>, backend: Backend) -> Self {
        Self {
            data_dir: data_dir.into(),
            backend,
        }
    }

    /// Resolve from `PHYSIO_REGISTRY_DIR` / `PHYSIO_REGISTRY_BACKEND`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(
            std::env::var(DATA_DIR_ENV).ok(),
            std::env::var(BACKEND_ENV).ok(),
        )
    }

    /// Resolve from optional raw values; blank values fall back to defaults.
    pub fn resolve(data_dir: Option<String>, backend: Option<String>) -> Result<Self, ConfigError> {
        let data_dir = match data_dir.filter(|d| !d.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let backend = match backend.filter(|b| !b.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => Backend::default(),
        };
        Ok(Self::new(data_dir, backend))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// SQLite file used by [`Backend::Local`].
    pub fn local_db_path(&self) -> PathBuf {
        self.data_dir.join(LOCAL_DB_FILE)
    }

    /// Open the configured store.
    pub fn open_store(&self) -> StoreResult<Box<dyn PatientStore + Send>> {
        Ok(match self.backend {
            Backend::Files => Box::new(JsonDirStore::new(&self.data_dir)),
            Backend::Local => Box::new(LocalStore::open(self.local_db_path())?),
        })
    }
}

/// `<platform data dir>/physio-registry/registry`.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(base.join(APP_DIR_NAME).join(REGISTRY_DIR_NAME))
}
