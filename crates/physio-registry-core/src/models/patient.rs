//! Patient models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Payment;

/// Field-level validation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Payment {0} has a non-finite amount")]
    NonFiniteAmount(String),
}

/// A patient profile with clinical notes and payment history.
///
/// Field names serialize in camelCase; the on-disk JSON is the same shape the
/// desktop shell reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Opaque unique ID, immutable after creation
    pub id: String,
    pub full_name: String,
    /// Calendar date as entered
    pub birth_date: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub address: String,
    /// Diagnosis / chief complaint
    pub diagnosis: String,
    /// Clinical story (HTML)
    #[serde(default)]
    pub story: String,
    /// Payment history in entry order
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Creation timestamp, never mutated
    pub created_at: String,
    /// Last save timestamp (absent in some older files)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(
        full_name: impl Into<String>,
        birth_date: impl Into<String>,
        diagnosis: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name: full_name.into(),
            birth_date: birth_date.into(),
            contact_number: String::new(),
            address: String::new(),
            diagnosis: diagnosis.into(),
            story: String::new(),
            payments: Vec::new(),
            created_at: now.clone(),
            updated_at: Some(now),
        }
    }

    /// Touch the updated_at timestamp. Call before every mutating save.
    pub fn touch(&mut self) {
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::MissingField("fullName"));
        }
        if self.diagnosis.trim().is_empty() {
            return Err(ValidationError::MissingField("diagnosis"));
        }
        self.check_amounts()
    }

    /// Amounts must be finite; JSON has no encoding for NaN or infinity.
    pub fn check_amounts(&self) -> Result<(), ValidationError> {
        match self.payments.iter().find(|p| !p.amount.is_finite()) {
            Some(payment) => Err(ValidationError::NonFiniteAmount(payment.id.clone())),
            None => Ok(()),
        }
    }

    /// Append a payment to the history.
    pub fn add_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }

    /// Remove a payment by ID, returning it if present.
    pub fn remove_payment(&mut self, payment_id: &str) -> Option<Payment> {
        let index = self.payments.iter().position(|p| p.id == payment_id)?;
        Some(self.payments.remove(index))
    }

    /// Sum of all payment amounts.
    pub fn total_paid(&self) -> f64 {
        self.payments.iter().fold(0.0, |sum, p| sum + p.amount)
    }

    /// Linear search match: case-insensitive on name, verbatim on contact number.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.full_name
            .to_lowercase()
            .contains(&query.to_lowercase())
            || self.contact_number.contains(query)
    }
}

/// Filter patients with [`Patient::matches`], preserving input order.
pub fn filter_patients<'a>(patients: &'a [Patient], query: &str) -> Vec<&'a Patient> {
    patients.iter().filter(|p| p.matches(query)).collect()
}
