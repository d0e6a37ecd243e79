//! PhysioRegistry Core Library
//!
//! Patient records, payments and income statistics for a single-practice
//! physiotherapy desktop app.
//!
//! # Architecture
//!
//! ```text
//!        Desktop shell / CLI (presentation)
//!                     │
//!        ┌────────────▼────────────┐
//!        │     RegistryClient      │  uniform {success, data?, error?}
//!        └────────────┬────────────┘
//!                     │
//!          PatientStore (one, chosen at startup)
//!            │                         │
//!     JsonDirStore                LocalStore
//!   <dir>/<id>.json        SQLite key/value fallback
//!
//!   get_patients ──► stats::aggregate ──► totals + daily/monthly series
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Payment)
//! - [`store`]: Record stores behind the [`PatientStore`] trait
//! - [`stats`]: Income aggregation and bucket labels
//! - [`config`]: Startup configuration and backend selection

pub mod config;
pub mod models;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use config::{Backend, ConfigError, RegistryConfig};
pub use models::{filter_patients, Patient, Payment, ValidationError};
pub use stats::{aggregate, Granularity, IncomeStats, Language, SeriesPoint};
pub use store::{JsonDirStore, LocalStore, PatientStore, StoreError, StoreResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing::warn;

// =========================================================================
// FFI Error Type
// =========================================================================

/// Startup failures. Store operations never surface this; they return a
/// uniform result record instead.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RegistryError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        RegistryError::Store(e.to_string())
    }
}

impl From<ConfigError> for RegistryError {
    fn from(e: ConfigError) -> Self {
        RegistryError::Config(e.to_string())
    }
}

// =========================================================================
// Uniform Response
// =========================================================================

/// Result of one adapter call. Failures carry the error message only.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Back to a `Result` for Rust callers.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| "Unknown error".to_string())),
        }
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a JSON-file registry in `dir`. The directory is created on first save.
#[uniffi::export]
pub fn open_registry(dir: String) -> Arc<RegistryClient> {
    Arc::new(RegistryClient::new(Box::new(JsonDirStore::new(dir))))
}

/// Open the SQLite fallback registry at `db_path`.
#[uniffi::export]
pub fn open_local_registry(db_path: String) -> Result<Arc<RegistryClient>, RegistryError> {
    let store = LocalStore::open(&db_path)?;
    Ok(Arc::new(RegistryClient::new(Box::new(store))))
}

/// Open whichever registry the environment configures.
#[uniffi::export]
pub fn open_registry_from_env() -> Result<Arc<RegistryClient>, RegistryError> {
    let config = RegistryConfig::from_env()?;
    Ok(Arc::new(RegistryClient::from_config(&config)?))
}

/// Compute income statistics for a patient set.
#[uniffi::export]
pub fn compute_statistics(
    patients: Vec<FfiPatient>,
    granularity: FfiGranularity,
    language: FfiLanguage,
) -> FfiIncomeStats {
    let patients: Vec<Patient> = patients.into_iter().map(Into::into).collect();
    aggregate(&patients, granularity.into(), language.into()).into()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Boundary adapter over a single store.
///
/// Marshals calls only: no validation, no timestamping. Every failure comes
/// back as `success: false` with the store's error message.
#[derive(uniffi::Object)]
pub struct RegistryClient {
    store: Mutex<Box<dyn PatientStore + Send>>,
}

impl RegistryClient {
    /// Wrap an already-opened store.
    pub fn new(store: Box<dyn PatientStore + Send>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Open the store selected by `config`.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        tracing::info!(
            backend = %config.backend(),
            data_dir = %config.data_dir().display(),
            "opening patient registry"
        );
        Ok(Self::new(config.open_store()?))
    }

    fn call<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&dyn PatientStore) -> StoreResult<T>,
    ) -> Response<T> {
        let store = match self.store.lock() {
            Ok(store) => store,
            Err(e) => {
                warn!(operation, "store lock poisoned");
                return Response::failed(format!("Lock poisoned: {}", e));
            }
        };

        match f(&**store) {
            Ok(data) => Response::ok(data),
            Err(e) => {
                warn!(operation, error = %e, "registry operation failed");
                Response::failed(e.to_string())
            }
        }
    }

    /// Create or replace a patient record. Data is the saved location.
    pub fn save(&self, patient: &Patient) -> Response<String> {
        self.call("save", |store| store.save(patient).map(|saved| saved.location))
    }

    /// Every stored patient.
    pub fn patients(&self) -> Response<Vec<Patient>> {
        self.call("list", |store| store.list_all())
    }

    /// Delete a patient record.
    pub fn delete(&self, id: &str) -> Response<()> {
        self.call("delete", |store| store.delete(id))
    }
}

#[uniffi::export]
impl RegistryClient {
    /// Save (create or replace) a patient.
    pub fn save_patient(&self, patient: FfiPatient) -> FfiSaveResult {
        let response = self.save(&patient.into());
        FfiSaveResult {
            success: response.success,
            file_path: response.data,
            error: response.error,
        }
    }

    /// Load all patients.
    pub fn get_patients(&self) -> FfiPatientsResult {
        let response = self.patients();
        FfiPatientsResult {
            success: response.success,
            patients: response
                .data
                .map(|patients| patients.into_iter().map(Into::into).collect()),
            error: response.error,
        }
    }

    /// Delete a patient by ID.
    pub fn delete_patient(&self, id: String) -> FfiDeleteResult {
        let response = self.delete(&id);
        FfiDeleteResult {
            success: response.success,
            error: response.error,
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe payment.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiPayment {
    pub id: String,
    pub amount: f64,
    pub date: String,
    pub description: Option<String>,
}

impl From<Payment> for FfiPayment {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount,
            date: payment.date,
            description: payment.description,
        }
    }
}

impl From<FfiPayment> for Payment {
    fn from(payment: FfiPayment) -> Self {
        Payment {
            id: payment.id,
            amount: payment.amount,
            date: payment.date,
            description: payment.description,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub full_name: String,
    pub birth_date: String,
    pub contact_number: String,
    pub address: String,
    pub diagnosis: String,
    pub story: String,
    pub payments: Vec<FfiPayment>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            full_name: patient.full_name,
            birth_date: patient.birth_date,
            contact_number: patient.contact_number,
            address: patient.address,
            diagnosis: patient.diagnosis,
            story: patient.story,
            payments: patient.payments.into_iter().map(Into::into).collect(),
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        }
    }
}

impl From<FfiPatient> for Patient {
    fn from(patient: FfiPatient) -> Self {
        Patient {
            id: patient.id,
            full_name: patient.full_name,
            birth_date: patient.birth_date,
            contact_number: patient.contact_number,
            address: patient.address,
            diagnosis: patient.diagnosis,
            story: patient.story,
            payments: patient.payments.into_iter().map(Into::into).collect(),
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        }
    }
}

/// Result of `save_patient`.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiSaveResult {
    pub success: bool,
    pub file_path: Option<String>,
    pub error: Option<String>,
}

/// Result of `get_patients`.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiPatientsResult {
    pub success: bool,
    pub patients: Option<Vec<FfiPatient>>,
    pub error: Option<String>,
}

/// Result of `delete_patient`.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiDeleteResult {
    pub success: bool,
    pub error: Option<String>,
}

/// FFI-safe bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiGranularity {
    Daily,
    Monthly,
}

impl From<FfiGranularity> for Granularity {
    fn from(granularity: FfiGranularity) -> Self {
        match granularity {
            FfiGranularity::Daily => Granularity::Daily,
            FfiGranularity::Monthly => Granularity::Monthly,
        }
    }
}

/// FFI-safe display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiLanguage {
    En,
    Tr,
}

impl From<FfiLanguage> for Language {
    fn from(language: FfiLanguage) -> Self {
        match language {
            FfiLanguage::En => Language::En,
            FfiLanguage::Tr => Language::Tr,
        }
    }
}

/// FFI-safe series point.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiSeriesPoint {
    pub bucket_key: String,
    pub bucket_label: String,
    pub total: f64,
}

impl From<SeriesPoint> for FfiSeriesPoint {
    fn from(point: SeriesPoint) -> Self {
        Self {
            bucket_key: point.bucket_key,
            bucket_label: point.bucket_label,
            total: point.total,
        }
    }
}

/// FFI-safe income statistics.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiIncomeStats {
    pub total_patients: u64,
    pub total_income: f64,
    pub average_income: f64,
    pub series: Vec<FfiSeriesPoint>,
    pub unbucketed_payments: u64,
}

impl From<IncomeStats> for FfiIncomeStats {
    fn from(stats: IncomeStats) -> Self {
        Self {
            total_patients: stats.total_patients as u64,
            total_income: stats.total_income,
            average_income: stats.average_income,
            series: stats.series.into_iter().map(Into::into).collect(),
            unbucketed_payments: stats.unbucketed_payments as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_client() -> (TempDir, Arc<RegistryClient>) {
        let tmp = TempDir::new().unwrap();
        let client = open_registry(tmp.path().join("registry").display().to_string());
        (tmp, client)
    }

    fn make_ffi_patient(id: &str) -> FfiPatient {
        let mut patient: FfiPatient = Patient::new("John Doe", "1990-01-01", "Knee").into();
        patient.id = id.to_string();
        patient
    }

    #[test]
    fn test_save_get_delete() {
        let (_tmp, client) = setup_client();
        let patient = make_ffi_patient("p1");

        let saved = client.save_patient(patient.clone());
        assert!(saved.success);
        assert!(saved.file_path.unwrap().ends_with("p1.json"));
        assert!(saved.error.is_none());

        let listed = client.get_patients();
        assert!(listed.success);
        assert_eq!(listed.patients.unwrap(), vec![patient]);

        let deleted = client.delete_patient("p1".into());
        assert!(deleted.success);
        assert!(client.get_patients().patients.unwrap().is_empty());
    }

    #[test]
    fn test_save_reports_io_failure() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let client = open_registry(blocker.join("registry").display().to_string());

        let result = client.save_patient(make_ffi_patient("p1"));
        assert!(!result.success);
        assert!(result.file_path.is_none());
        let error = result.error.unwrap();
        assert!(error.starts_with("I/O error at"), "{error}");
        assert!(error.contains("blocker"), "{error}");
    }

    #[test]
    fn test_non_finite_amount_does_not_break_listing() {
        let (_tmp, client) = setup_client();
        assert!(client.save_patient(make_ffi_patient("p1")).success);

        let mut bad = make_ffi_patient("p2");
        bad.payments.push(FfiPayment {
            id: "pay-inf".into(),
            amount: "inf".parse().unwrap(),
            date: "2024-01-05".into(),
            description: None,
        });
        let saved = client.save_patient(bad);
        assert!(!saved.success);
        assert!(saved.error.unwrap().contains("pay-inf"));

        let listed = client.get_patients();
        assert!(listed.success);
        assert_eq!(listed.patients.unwrap().len(), 1);
    }

    #[test]
    fn test_delete_missing_reports_failure() {
        let (_tmp, client) = setup_client();
        let result = client.delete_patient("ghost".into());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Patient not found: ghost"));
    }

    #[test]
    fn test_invalid_id_reports_failure() {
        let (_tmp, client) = setup_client();
        let result = client.save_patient(make_ffi_patient("../evil"));
        assert!(!result.success);
        assert!(result.file_path.is_none());
        assert!(result.error.unwrap().contains("Invalid patient ID"));
    }

    #[test]
    fn test_get_patients_corrupt_file_reports_failure() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), "not json").unwrap();
        let client = open_registry(tmp.path().display().to_string());

        let result = client.get_patients();
        assert!(!result.success);
        assert!(result.patients.is_none());
        assert!(result.error.unwrap().contains("bad.json"));
    }

    #[test]
    fn test_ffi_round_trip_preserves_fields() {
        let mut patient = Patient::new("Jane Doe", "1985-05-05", "Neck");
        patient.story = "<p>Started <b>therapy</b></p>".into();
        patient.add_payment(Payment::new(60.0, "2024-04-01T10:00", Some("Session".into())));

        let back: Patient = FfiPatient::from(patient.clone()).into();
        assert_eq!(back, patient);
    }

    #[test]
    fn test_compute_statistics() {
        let mut patient = Patient::new("Jane Doe", "1985-05-05", "Neck");
        patient.add_payment(Payment::new(10.0, "2024-01-05", None));
        patient.add_payment(Payment::new(5.0, "2024-02-01", None));

        let stats = compute_statistics(
            vec![patient.into()],
            FfiGranularity::Monthly,
            FfiLanguage::Tr,
        );
        assert_eq!(stats.total_patients, 1);
        assert_eq!(stats.total_income, 15.0);
        assert_eq!(stats.series.len(), 2);
        assert_eq!(stats.series[1].bucket_label, "Şubat 2024");
    }

    #[test]
    fn test_response_into_result() {
        assert_eq!(Response::ok(3).into_result(), Ok(3));
        assert_eq!(
            Response::<i32>::failed("boom").into_result(),
            Err("boom".to_string())
        );
    }

    #[test]
    fn test_local_registry() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("registry.db").display().to_string();
        let client = open_local_registry(db_path.clone()).unwrap();

        let saved = client.save_patient(make_ffi_patient("p1"));
        assert_eq!(saved.file_path, Some(format!("{db_path}#p1")));
        assert_eq!(client.get_patients().patients.unwrap().len(), 1);
    }
}
