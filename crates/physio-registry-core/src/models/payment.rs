//! Payment models.

use serde::{Deserialize, Serialize};

/// A single payment received from a patient.
///
/// Payments are owned by exactly one [`Patient`](super::Patient) and are only
/// ever persisted as part of that patient's record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    /// Client-generated UUID
    pub id: String,
    /// Amount received (expected non-negative, not enforced)
    pub amount: f64,
    /// When the payment was made, as entered (RFC 3339, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD`)
    pub date: String,
    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Payment {
    /// Create a payment with a fresh ID.
    pub fn new(amount: f64, date: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            amount,
            date: date.into(),
            description: description.filter(|d| !d.trim().is_empty()),
        }
    }
}
