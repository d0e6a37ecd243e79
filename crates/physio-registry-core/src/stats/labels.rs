//! Locale-aware display labels for time buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use super::Granularity;

/// Display language chosen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Tr,
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTHS_EN_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTHS_TR: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

const MONTHS_TR_SHORT: [&str; 12] = [
    "Oca", "Şub", "Mar", "Nis", "May", "Haz", "Tem", "Ağu", "Eyl", "Eki", "Kas", "Ara",
];

impl Language {
    /// BCP 47 tag.
    pub fn tag(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Tr => "tr-TR",
        }
    }

    fn month_name(self, month0: usize) -> &'static str {
        match self {
            Language::En => MONTHS_EN[month0],
            Language::Tr => MONTHS_TR[month0],
        }
    }

    fn month_short(self, month0: usize) -> &'static str {
        match self {
            Language::En => MONTHS_EN_SHORT[month0],
            Language::Tr => MONTHS_TR_SHORT[month0],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Tr => write!(f, "tr"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Language::En),
            "tr" | "tr-tr" => Ok(Language::Tr),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Format the label for a bucket starting at `date`.
///
/// Daily: `"Jan 3"` / `"3 Oca"`. Monthly: `"January 2025"` / `"Ocak 2025"`.
pub fn bucket_label(date: NaiveDate, granularity: Granularity, language: Language) -> String {
    let month0 = date.month0() as usize;
    match (granularity, language) {
        (Granularity::Daily, Language::En) => {
            format!("{} {}", language.month_short(month0), date.day())
        }
        (Granularity::Daily, Language::Tr) => {
            format!("{} {}", date.day(), language.month_short(month0))
        }
        (Granularity::Monthly, _) => format!("{} {}", language.month_name(month0), date.year()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_labels() {
        assert_eq!(
            bucket_label(date(2025, 1, 3), Granularity::Daily, Language::En),
            "Jan 3"
        );
        assert_eq!(
            bucket_label(date(2025, 1, 3), Granularity::Daily, Language::Tr),
            "3 Oca"
        );
    }

    #[test]
    fn test_monthly_labels() {
        assert_eq!(
            bucket_label(date(2025, 1, 1), Granularity::Monthly, Language::En),
            "January 2025"
        );
        assert_eq!(
            bucket_label(date(2024, 8, 1), Granularity::Monthly, Language::Tr),
            "Ağustos 2024"
        );
    }

    #[test]
    fn test_parse_language() {
        assert_eq!("tr".parse::<Language>().unwrap(), Language::Tr);
        assert_eq!("EN-US".parse::<Language>().unwrap(), Language::En);
        assert!("de".parse::<Language>().is_err());
    }
}
