//! Message catalogue for the command-line front end.
//!
//! Lookups fall back to English, then to the key itself. Parameters replace
//! `{name}`-style placeholders.

use physio_registry_core::Language;

const EN: &[(&str, &str)] = &[
    ("patientList", "Patient List"),
    ("noPatientsFound", "No patients found."),
    ("dob", "DOB"),
    ("contact", "Contact"),
    ("address", "Address"),
    ("diagnosis", "Diagnosis / Chief Complaint"),
    ("patientStory", "Patient Story"),
    ("noAddress", "No address provided"),
    ("saveSuccess", "Patient saved successfully!"),
    ("saveError", "Failed to save: {error}"),
    ("deleteError", "Error deleting patient"),
    ("deleteSuccess", "Patient deleted successfully"),
    ("loadError", "Failed to load patients: {error}"),
    ("patientNotFound", "No patient with ID {id}"),
    ("paymentHistory", "Payment History"),
    ("totalPaid", "Total Paid"),
    ("noPayments", "No payments recorded"),
    ("paymentAdded", "Payment {id} added"),
    ("paymentRemoved", "Payment {id} removed"),
    ("paymentNotFound", "No payment with ID {id}"),
    ("createdAt", "Created At"),
    ("updatedAt", "Last Updated"),
    ("statistics", "Statistics"),
    ("totalPatients", "Total Patients"),
    ("totalIncome", "Total Income"),
    ("averageIncome", "Average Income per Patient"),
    ("incomeOverTime", "Income Over Time"),
    ("unbucketedPayments", "{count} payment(s) with unreadable dates are not in the series"),
    ("recordsOk", "All {count} record(s) readable"),
    ("corruptRecord", "Corrupt record {path}: {error}"),
];

const TR: &[(&str, &str)] = &[
    ("patientList", "Hasta Listesi"),
    ("noPatientsFound", "Hasta bulunamadı."),
    ("dob", "Doğum Tarihi"),
    ("contact", "İletişim"),
    ("address", "Adres"),
    ("diagnosis", "Tanı / Şikayet"),
    ("patientStory", "Hasta Öyküsü"),
    ("noAddress", "Adres girilmedi"),
    ("saveSuccess", "Hasta başarıyla kaydedildi!"),
    ("saveError", "Kaydetme hatası: {error}"),
    ("deleteError", "Hasta silinirken hata oluştu"),
    ("deleteSuccess", "Hasta başarıyla silindi"),
    ("loadError", "Hastalar yüklenemedi: {error}"),
    ("patientNotFound", "{id} kimlikli hasta yok"),
    ("paymentHistory", "Ödeme Geçmişi"),
    ("totalPaid", "Toplam Ödenen"),
    ("noPayments", "Kayıtlı ödeme yok"),
    ("paymentAdded", "{id} ödemesi eklendi"),
    ("paymentRemoved", "{id} ödemesi silindi"),
    ("paymentNotFound", "{id} kimlikli ödeme yok"),
    ("createdAt", "Oluşturulma Tarihi"),
    ("updatedAt", "Son Güncelleme"),
    ("statistics", "İstatistikler"),
    ("totalPatients", "Toplam Hasta"),
    ("totalIncome", "Toplam Gelir"),
    ("averageIncome", "Hasta Başına Ortalama Gelir"),
    ("incomeOverTime", "Zaman İçinde Gelir"),
];

fn table(language: Language) -> &'static [(&'static str, &'static str)] {
    match language {
        Language::En => EN,
        Language::Tr => TR,
    }
}

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    table(language)
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Translate `key`, substituting each `{param}` once.
pub fn t(language: Language, key: &str, params: &[(&str, &str)]) -> String {
    let mut text = lookup(language, key)
        .or_else(|| lookup(Language::En, key))
        .unwrap_or(key)
        .to_string();

    for (name, value) in params {
        text = text.replacen(&format!("{{{name}}}"), value, 1);
    }
    text
}

/// Money in the language's display currency: `$1,234.50` / `₺1.234,50`.
pub fn format_currency(amount: f64, language: Language) -> String {
    let (symbol, group, decimal) = match language {
        Language::En => ("$", ',', '.'),
        Language::Tr => ("₺", '.', ','),
    };

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(group);
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{grouped}{decimal}{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        assert_eq!(t(Language::En, "totalIncome", &[]), "Total Income");
        assert_eq!(t(Language::Tr, "totalIncome", &[]), "Toplam Gelir");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            t(Language::Tr, "saveError", &[("error", "disk full")]),
            "Kaydetme hatası: disk full"
        );
    }

    #[test]
    fn test_fallbacks() {
        // Missing in Turkish table: falls back to English
        assert_eq!(
            t(Language::Tr, "recordsOk", &[("count", "3")]),
            "All 3 record(s) readable"
        );
        // Missing everywhere: the key itself
        assert_eq!(t(Language::En, "noSuchKey", &[]), "noSuchKey");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(35.0, Language::En), "$35.00");
        assert_eq!(format_currency(1234.5, Language::En), "$1,234.50");
        assert_eq!(format_currency(1234567.891, Language::Tr), "₺1.234.567,89");
        assert_eq!(format_currency(-12.0, Language::En), "-$12.00");
        assert_eq!(format_currency(0.0, Language::Tr), "₺0,00");
    }
}
