//! Subcommands and their handlers.

use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use physio_registry_core::{
    aggregate, filter_patients, Backend, Granularity, JsonDirStore, Language, Patient, Payment,
    RegistryClient, RegistryConfig,
};

use crate::i18n::{format_currency, t};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List patients
    List {
        /// Case-insensitive name or contact number filter
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one patient profile
    Show {
        /// Patient ID
        id: String,
    },
    /// Register a new patient
    Add {
        #[arg(long)]
        full_name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birth_date: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long, default_value = "")]
        contact: String,
        #[arg(long, default_value = "")]
        address: String,
        /// Clinical story (HTML allowed)
        #[arg(long, default_value = "")]
        story: String,
    },
    /// Edit an existing patient
    Update {
        /// Patient ID
        id: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        birth_date: Option<String>,
        #[arg(long)]
        diagnosis: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        story: Option<String>,
    },
    /// Delete a patient
    Delete {
        /// Patient ID
        id: String,
    },
    /// Record a payment
    AddPayment {
        /// Patient ID
        id: String,
        amount: f64,
        /// Payment date (defaults to now, UTC)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a payment from a patient
    RemovePayment {
        /// Patient ID
        id: String,
        payment_id: String,
    },
    /// Income statistics
    Stats {
        /// Bucket by month instead of day
        #[arg(long)]
        monthly: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Report unreadable record files
    Check,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Presentation layer: owns the injected client and the display language.
pub struct App {
    client: RegistryClient,
    config: RegistryConfig,
    lang: Language,
}

impl App {
    pub fn new(client: RegistryClient, config: RegistryConfig, lang: Language) -> Self {
        Self {
            client,
            config,
            lang,
        }
    }

    pub fn run(&self, command: Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::List { search } => self.list(search.as_deref().unwrap_or(""), out),
            Command::Show { id } => self.show(&id, out),
            Command::Add {
                full_name,
                birth_date,
                diagnosis,
                contact,
                address,
                story,
            } => {
                let mut patient = Patient::new(full_name, birth_date, diagnosis);
                patient.contact_number = contact;
                patient.address = address;
                patient.story = story;
                self.save(&patient, out)?;
                writeln!(out, "{}", patient.id)?;
                Ok(())
            }
            Command::Update {
                id,
                full_name,
                birth_date,
                diagnosis,
                contact,
                address,
                story,
            } => {
                let mut patient = self.find(&id)?;
                if let Some(v) = full_name {
                    patient.full_name = v;
                }
                if let Some(v) = birth_date {
                    patient.birth_date = v;
                }
                if let Some(v) = diagnosis {
                    patient.diagnosis = v;
                }
                if let Some(v) = contact {
                    patient.contact_number = v;
                }
                if let Some(v) = address {
                    patient.address = v;
                }
                if let Some(v) = story {
                    patient.story = v;
                }
                patient.touch();
                self.save(&patient, out)
            }
            Command::Delete { id } => {
                self.client.delete(&id).into_result().map_err(|error| {
                    anyhow!("{}: {}", t(self.lang, "deleteError", &[]), error)
                })?;
                writeln!(out, "{}", t(self.lang, "deleteSuccess", &[]))?;
                Ok(())
            }
            Command::AddPayment {
                id,
                amount,
                date,
                description,
            } => {
                let mut patient = self.find(&id)?;
                let date = date.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
                let payment = Payment::new(amount, date, description);
                let payment_id = payment.id.clone();
                patient.add_payment(payment);
                patient.touch();
                self.save(&patient, out)?;
                writeln!(out, "{}", t(self.lang, "paymentAdded", &[("id", payment_id.as_str())]))?;
                Ok(())
            }
            Command::RemovePayment { id, payment_id } => {
                let mut patient = self.find(&id)?;
                if patient.remove_payment(&payment_id).is_none() {
                    bail!(t(self.lang, "paymentNotFound", &[("id", payment_id.as_str())]));
                }
                patient.touch();
                self.save(&patient, out)?;
                writeln!(out, "{}", t(self.lang, "paymentRemoved", &[("id", payment_id.as_str())]))?;
                Ok(())
            }
            Command::Stats { monthly, format } => {
                let granularity = if monthly {
                    Granularity::Monthly
                } else {
                    Granularity::Daily
                };
                self.stats(granularity, format, out)
            }
            Command::Check => self.check(out),
        }
    }

    fn load(&self) -> Result<Vec<Patient>> {
        self.client
            .patients()
            .into_result()
            .map_err(|error| anyhow!(t(self.lang, "loadError", &[("error", error.as_str())])))
    }

    fn find(&self, id: &str) -> Result<Patient> {
        self.load()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!(t(self.lang, "patientNotFound", &[("id", id)])))
    }

    fn save(&self, patient: &Patient, out: &mut impl Write) -> Result<()> {
        patient
            .validate()
            .map_err(|e| anyhow!(t(self.lang, "saveError", &[("error", e.to_string().as_str())])))?;

        let location = self
            .client
            .save(patient)
            .into_result()
            .map_err(|error| anyhow!(t(self.lang, "saveError", &[("error", error.as_str())])))?;

        tracing::debug!(%location, "patient saved");
        writeln!(out, "{}", t(self.lang, "saveSuccess", &[]))?;
        Ok(())
    }

    fn list(&self, query: &str, out: &mut impl Write) -> Result<()> {
        let patients = self.load()?;
        let matches = filter_patients(&patients, query);

        writeln!(out, "{}", t(self.lang, "patientList", &[]))?;
        if matches.is_empty() {
            writeln!(out, "{}", t(self.lang, "noPatientsFound", &[]))?;
            return Ok(());
        }
        for patient in matches {
            writeln!(
                out,
                "{}  {}  {}: {}  {}: {}",
                patient.id,
                patient.full_name,
                t(self.lang, "dob", &[]),
                patient.birth_date,
                t(self.lang, "contact", &[]),
                patient.contact_number,
            )?;
        }
        Ok(())
    }

    fn show(&self, id: &str, out: &mut impl Write) -> Result<()> {
        let patient = self.find(id)?;
        let lang = self.lang;

        writeln!(out, "{} ({})", patient.full_name, patient.id)?;
        writeln!(out, "{}: {}", t(lang, "dob", &[]), patient.birth_date)?;
        writeln!(out, "{}: {}", t(lang, "contact", &[]), patient.contact_number)?;
        let address = if patient.address.is_empty() {
            t(lang, "noAddress", &[])
        } else {
            patient.address.clone()
        };
        writeln!(out, "{}: {}", t(lang, "address", &[]), address)?;
        writeln!(out, "{}: {}", t(lang, "diagnosis", &[]), patient.diagnosis)?;
        if !patient.story.is_empty() {
            writeln!(out, "{}:\n{}", t(lang, "patientStory", &[]), patient.story)?;
        }
        writeln!(out, "{}: {}", t(lang, "createdAt", &[]), patient.created_at)?;
        if let Some(updated) = &patient.updated_at {
            writeln!(out, "{}: {}", t(lang, "updatedAt", &[]), updated)?;
        }

        writeln!(out, "\n{}", t(lang, "paymentHistory", &[]))?;
        if patient.payments.is_empty() {
            writeln!(out, "{}", t(lang, "noPayments", &[]))?;
        }
        for payment in &patient.payments {
            writeln!(
                out,
                "  {}  {}  {}  {}",
                payment.id,
                payment.date,
                format_currency(payment.amount, lang),
                payment.description.as_deref().unwrap_or(""),
            )?;
        }
        writeln!(
            out,
            "{}: {}",
            t(lang, "totalPaid", &[]),
            format_currency(patient.total_paid(), lang)
        )?;
        Ok(())
    }

    fn stats(
        &self,
        granularity: Granularity,
        format: OutputFormat,
        out: &mut impl Write,
    ) -> Result<()> {
        let patients = self.load()?;
        let stats = aggregate(&patients, granularity, self.lang);
        let lang = self.lang;

        match format {
            OutputFormat::Json => writeln!(out, "{}", stats.to_json()?)?,
            OutputFormat::Csv => write!(out, "{}", stats.to_csv())?,
            OutputFormat::Text => {
                writeln!(out, "{}", t(lang, "statistics", &[]))?;
                writeln!(out, "{}: {}", t(lang, "totalPatients", &[]), stats.total_patients)?;
                writeln!(
                    out,
                    "{}: {}",
                    t(lang, "totalIncome", &[]),
                    format_currency(stats.total_income, lang)
                )?;
                writeln!(
                    out,
                    "{}: {}",
                    t(lang, "averageIncome", &[]),
                    format_currency(stats.average_income, lang)
                )?;
                writeln!(out, "\n{}", t(lang, "incomeOverTime", &[]))?;
                if stats.series.is_empty() {
                    writeln!(out, "{}", t(lang, "noPayments", &[]))?;
                }
                for point in &stats.series {
                    writeln!(
                        out,
                        "  {:<16} {}",
                        point.bucket_label,
                        format_currency(point.total, lang)
                    )?;
                }
                if stats.unbucketed_payments > 0 {
                    let count = stats.unbucketed_payments.to_string();
                    writeln!(out, "{}", t(lang, "unbucketedPayments", &[("count", count.as_str())]))?;
                }
            }
        }
        Ok(())
    }

    /// Lenient scan of the file store; the SQLite store can only be listed.
    fn check(&self, out: &mut impl Write) -> Result<()> {
        match self.config.backend() {
            Backend::Files => {
                let report = JsonDirStore::new(self.config.data_dir())
                    .scan()
                    .context("scanning registry directory")?;
                for corrupt in &report.corrupt {
                    let path = corrupt.path.display().to_string();
                    writeln!(
                        out,
                        "{}",
                        t(self.lang, "corruptRecord", &[("path", path.as_str()), ("error", corrupt.error.as_str())])
                    )?;
                }
                if !report.corrupt.is_empty() {
                    bail!("{} corrupt record(s)", report.corrupt.len());
                }
                let count = report.patients.len().to_string();
                writeln!(out, "{}", t(self.lang, "recordsOk", &[("count", count.as_str())]))?;
            }
            Backend::Local => {
                let count = self.load()?.len().to_string();
                writeln!(out, "{}", t(self.lang, "recordsOk", &[("count", count.as_str())]))?;
            }
        }
        Ok(())
    }
}
