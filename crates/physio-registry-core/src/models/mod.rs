//! Domain models for the patient registry.

mod patient;
mod payment;

pub use patient::*;
pub use payment::*;
