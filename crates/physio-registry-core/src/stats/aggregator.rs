//! Statistics aggregation: totals, average and a bucketed income series.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bucket_label, Language};
use crate::models::{Patient, Payment};

/// Naive datetime layouts accepted for payment dates (read as UTC).
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Time bucket size for the income series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
}

impl Granularity {
    /// First day of the bucket containing `date`.
    fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// `YYYY-MM-DD` or `YYYY-MM`.
    fn bucket_key(self, start: NaiveDate) -> String {
        match self {
            Granularity::Daily => start.format("%Y-%m-%d").to_string(),
            Granularity::Monthly => start.format("%Y-%m").to_string(),
        }
    }
}

/// One point of the income series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// `YYYY-MM-DD` (daily) or `YYYY-MM` (monthly), UTC
    pub bucket_key: String,
    /// Localized display label
    pub bucket_label: String,
    /// Sum of payment amounts in the bucket
    pub total: f64,
}

/// Aggregate income statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStats {
    pub total_patients: usize,
    /// Sum over every payment, including ones excluded from the series
    pub total_income: f64,
    /// `total_income / total_patients`, or 0 with no patients
    pub average_income: f64,
    /// Chronological (ascending bucket key)
    pub series: Vec<SeriesPoint>,
    /// Payments whose date could not be bucketed.
    ///
    /// Their amounts are in `total_income` but not in `series`, so the two
    /// do not reconcile when this is non-zero.
    pub unbucketed_payments: usize,
}

impl IncomeStats {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the series to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str("bucket_key,bucket_label,total\n");

        for point in &self.series {
            csv.push_str(&format!(
                "{},{},{}\n",
                escape_csv(&point.bucket_key),
                escape_csv(&point.bucket_label),
                point.total,
            ));
        }

        csv
    }

    /// Sum of the series totals.
    pub fn series_total(&self) -> f64 {
        self.series.iter().fold(0.0, |sum, p| sum + p.total)
    }
}

/// Parse a payment date to its UTC calendar date.
pub fn parse_payment_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ndt| ndt.date())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

/// Compute statistics for a full patient set.
pub fn aggregate(patients: &[Patient], granularity: Granularity, language: Language) -> IncomeStats {
    let payments: Vec<&Payment> = patients.iter().flat_map(|p| &p.payments).collect();

    let total_patients = patients.len();
    let total_income = payments.iter().fold(0.0, |sum, p| sum + p.amount);
    let average_income = if total_patients > 0 {
        total_income / total_patients as f64
    } else {
        0.0
    };

    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut unbucketed_payments = 0;

    for payment in &payments {
        match parse_payment_date(&payment.date) {
            Some(date) => {
                *buckets.entry(granularity.bucket_start(date)).or_insert(0.0) += payment.amount;
            }
            None => unbucketed_payments += 1,
        }
    }

    let series = buckets
        .into_iter()
        .map(|(start, total)| SeriesPoint {
            bucket_key: granularity.bucket_key(start),
            bucket_label: bucket_label(start, granularity, language),
            total,
        })
        .collect();

    IncomeStats {
        total_patients,
        total_income,
        average_income,
        series,
        unbucketed_payments,
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient_with(amounts_and_dates: &[(f64, &str)]) -> Patient {
        let mut patient = Patient::new("Test Patient", "1980-01-01", "Sciatica");
        for (amount, date) in amounts_and_dates {
            patient.add_payment(Payment::new(*amount, *date, None));
        }
        patient
    }

    #[test]
    fn test_empty_input() {
        let stats = aggregate(&[], Granularity::Daily, Language::En);
        assert_eq!(stats.total_patients, 0);
        assert_eq!(stats.total_income, 0.0);
        assert_eq!(stats.average_income, 0.0);
        assert!(stats.series.is_empty());
        assert_eq!(stats.unbucketed_payments, 0);
    }

    #[test]
    fn test_patients_without_payments() {
        let patients = vec![patient_with(&[]), patient_with(&[])];
        let stats = aggregate(&patients, Granularity::Monthly, Language::En);
        assert_eq!(stats.total_patients, 2);
        assert_eq!(stats.total_income, 0.0);
        assert_eq!(stats.average_income, 0.0);
        assert!(stats.series.is_empty());
    }

    #[test]
    fn test_three_patient_scenario() {
        let patients = vec![
            patient_with(&[(10.0, "2024-01-05")]),
            patient_with(&[(20.0, "2024-01-20")]),
            patient_with(&[(5.0, "2024-02-01")]),
        ];

        let daily = aggregate(&patients, Granularity::Daily, Language::En);
        assert_eq!(daily.series.len(), 3);
        assert_eq!(daily.total_income, 35.0);
        assert_eq!(daily.average_income, 35.0 / 3.0);
        let keys: Vec<_> = daily.series.iter().map(|p| p.bucket_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-05", "2024-01-20", "2024-02-01"]);

        let monthly = aggregate(&patients, Granularity::Monthly, Language::En);
        assert_eq!(monthly.series.len(), 2);
        assert_eq!(monthly.series[0].bucket_key, "2024-01");
        assert_eq!(monthly.series[0].total, 30.0);
        assert_eq!(monthly.series[0].bucket_label, "January 2024");
        assert_eq!(monthly.series[1].bucket_key, "2024-02");
        assert_eq!(monthly.series[1].total, 5.0);
    }

    #[test]
    fn test_series_sorted_across_years() {
        let patients = vec![patient_with(&[
            (1.0, "2025-01-01"),
            (2.0, "2023-12-31"),
            (3.0, "2024-06-15"),
        ])];
        let stats = aggregate(&patients, Granularity::Monthly, Language::En);
        let keys: Vec<_> = stats.series.iter().map(|p| p.bucket_key.as_str()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-06", "2025-01"]);
    }

    #[test]
    fn test_bucketing_uses_utc() {
        // 23:30 at +03:00 is 20:30 UTC on the same day; 01:00 at +03:00 is the previous UTC day.
        let patients = vec![patient_with(&[
            (10.0, "2024-03-10T23:30:00+03:00"),
            (20.0, "2024-03-10T01:00:00+03:00"),
        ])];
        let stats = aggregate(&patients, Granularity::Daily, Language::En);
        let keys: Vec<_> = stats.series.iter().map(|p| p.bucket_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-03-09", "2024-03-10"]);
    }

    #[test]
    fn test_malformed_date_counted_in_total_only() {
        let patients = vec![patient_with(&[(10.0, "2024-01-05"), (7.0, "next tuesday")])];
        let stats = aggregate(&patients, Granularity::Daily, Language::En);

        assert_eq!(stats.total_income, 17.0);
        assert_eq!(stats.series.len(), 1);
        assert_eq!(stats.series_total(), 10.0);
        assert_eq!(stats.unbucketed_payments, 1);
    }

    #[test]
    fn test_localized_labels() {
        let patients = vec![patient_with(&[(10.0, "2024-01-05")])];
        let stats = aggregate(&patients, Granularity::Daily, Language::Tr);
        assert_eq!(stats.series[0].bucket_label, "5 Oca");
    }

    #[test]
    fn test_parse_payment_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_payment_date("2024-01-05"), Some(expected));
        assert_eq!(parse_payment_date("2024-01-05T14:30"), Some(expected));
        assert_eq!(parse_payment_date("2024-01-05T14:30:15"), Some(expected));
        assert_eq!(parse_payment_date("2024-01-05T14:30:15.250Z"), Some(expected));
        assert_eq!(parse_payment_date(" 2024-01-05 "), Some(expected));
        assert_eq!(parse_payment_date("05/01/2024"), None);
        assert_eq!(parse_payment_date(""), None);
    }

    #[test]
    fn test_csv_export() {
        let patients = vec![patient_with(&[(10.0, "2024-01-05"), (2.5, "2024-01-06")])];
        let stats = aggregate(&patients, Granularity::Daily, Language::En);
        let csv = stats.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3); // Header + 2 buckets
        assert_eq!(lines[0], "bucket_key,bucket_label,total");
        assert_eq!(lines[1], "2024-01-05,Jan 5,10");
        assert_eq!(lines[2], "2024-01-06,Jan 6,2.5");
    }

    #[test]
    fn test_json_export() {
        let stats = aggregate(&[patient_with(&[(10.0, "2024-01-05")])], Granularity::Monthly, Language::En);
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"totalIncome\": 10.0"));
        assert!(json.contains("\"bucketKey\": \"2024-01\""));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
