use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate};
use slug::slugify;
use tracing::{info, warn};

use crate::config::MailSettings;
use crate::error::{AppError, RenderError, ValidationError};
use crate::ledger::{Ledger, compute_total};
use crate::model::{LineItem, QuotationRecord};
use crate::notify::{Mailer, OutgoingMail};
use crate::quotation::{self, is_valid_email};
use crate::render::PdfRenderer;
use crate::store::QuotationStore;
use crate::templates::Templates;

/// Raw text of every input field on the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotationForm {
    pub customer_name: String,
    pub building_site: String,
    pub validity_date: String,
    pub email: String,
    pub floor_name: String,
    pub area_sqft: String,
    pub cost_per_sqft: String,
    pub extra_work_name: String,
    pub quantity: String,
    pub cost_per_unit: String,
    pub fetch_email: String,
}

impl QuotationForm {
    pub fn clear_floor_inputs(&mut self) {
        self.floor_name.clear();
        self.area_sqft.clear();
        self.cost_per_sqft.clear();
    }

    pub fn clear_extra_work_inputs(&mut self) {
        self.extra_work_name.clear();
        self.quantity.clear();
        self.cost_per_unit.clear();
    }
}

/// A rendered quotation waiting for a destination.
#[derive(Debug)]
pub struct PdfExport {
    pub bytes: Vec<u8>,
    pub suggested_name: String,
}

#[derive(Debug)]
pub struct FetchResult {
    pub records: Vec<QuotationRecord>,
    pub summary: String,
}

/// Application state behind the form: inputs, the ledger, and the gateways
/// every action talks to.
pub struct Controller {
    pub form: QuotationForm,
    ledger: Ledger,
    store: Box<dyn QuotationStore>,
    mailer: Box<dyn Mailer>,
    renderer: PdfRenderer,
    templates: Templates,
    mail: MailSettings,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_required<T: std::str::FromStr>(raw: &str) -> Result<T, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new("Enter valid numerical values."));
    }
    raw.parse::<T>()
        .map_err(|_| ValidationError::new("Please enter valid numerical values."))
}

impl Controller {
    pub fn new(
        store: Box<dyn QuotationStore>,
        mailer: Box<dyn Mailer>,
        renderer: PdfRenderer,
        templates: Templates,
        mail: MailSettings,
    ) -> Self {
        Self {
            form: QuotationForm::default(),
            ledger: Ledger::new(),
            store,
            mailer,
            renderer,
            templates,
            mail,
            today: local_today,
        }
    }

    /// Pins the issue date printed on documents.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_text(&self) -> String {
        self.ledger.render()
    }

    /// Live total shown under the ledger.
    pub fn running_total(&self) -> f64 {
        compute_total(&self.ledger.render())
    }

    pub fn add_floor(&mut self) -> Result<String, AppError> {
        if self.form.floor_name.trim().is_empty() {
            return Err(ValidationError::new("Floor name cannot be empty.").into());
        }
        let area: f64 = parse_required(&self.form.area_sqft)?;
        let cost: f64 = parse_required(&self.form.cost_per_sqft)?;

        let line = self.ledger.append_floor(&self.form.floor_name, area, cost)?;
        self.form.clear_floor_inputs();
        Ok(line)
    }

    pub fn add_extra_work(&mut self) -> Result<String, AppError> {
        if self.form.extra_work_name.trim().is_empty() {
            return Err(ValidationError::new("Extra works name cannot be empty.").into());
        }
        let quantity: i64 = parse_required(&self.form.quantity)?;
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| ValidationError::new("Quantity must be a positive whole number."))?;
        let cost: f64 = parse_required(&self.form.cost_per_unit)?;

        let line = self
            .ledger
            .append_extra_work(&self.form.extra_work_name, quantity, cost)?;
        self.form.clear_extra_work_inputs();
        Ok(line)
    }

    pub fn remove_entry(&mut self, index: usize) -> Option<LineItem> {
        let removed = self.ledger.remove(index);
        if let Some(item) = &removed {
            info!(name = %item.name(), "Removed ledger entry");
        }
        removed
    }

    pub fn save(&mut self) -> Result<String, AppError> {
        let quotation = quotation::assemble(
            &self.form.email,
            &self.form.customer_name,
            &self.form.building_site,
            &self.form.validity_date,
            self.ledger.floors(),
            self.ledger.extra_works(),
        )?;
        let id = self.store.save(&quotation)?;
        info!(id = %id, total = quotation.total_project_cost, "Quotation saved");
        Ok(id)
    }

    pub fn fetch(&self) -> Result<FetchResult, AppError> {
        let email = self.form.fetch_email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ValidationError::new("Please enter an email address.").into());
        }
        info!(email = %email, "Searching for quotations");

        let records = self.store.find_by_email(&email)?;
        if records.is_empty() {
            warn!(email = %email, "No quotations found");
        }
        let summary = self.templates.render_summaries(&records)?;
        Ok(FetchResult { records, summary })
    }

    fn checked_quotation(&self, empty_msg: &str) -> Result<crate::model::Quotation, AppError> {
        quotation::validate(
            &self.form.customer_name,
            &self.form.building_site,
            &self.form.validity_date,
        )?;
        if self.ledger.is_empty() {
            return Err(ValidationError::new(empty_msg).into());
        }
        Ok(quotation::draft(
            &self.form.email,
            &self.form.customer_name,
            &self.form.building_site,
            &self.form.validity_date,
            &self.ledger,
        ))
    }

    pub fn render_pdf(&self) -> Result<PdfExport, AppError> {
        let quotation = self.checked_quotation("No data to export!")?;
        let today = (self.today)();
        let bytes = self.renderer.render(&quotation, today)?;
        let suggested_name = format!(
            "quotation-{}-{}.pdf",
            slugify(&quotation.customer_name),
            today.format(quotation::DATE_FORMAT)
        );
        Ok(PdfExport {
            bytes,
            suggested_name,
        })
    }

    /// Writes the exported document and resets the form.
    pub fn export_pdf(&mut self, path: &Path, export: &PdfExport) -> Result<(), AppError> {
        fs::write(path, &export.bytes).map_err(RenderError::from)?;
        info!(path = %path.display(), "Quotation exported");
        self.clear();
        Ok(())
    }

    /// Renders the quotation and mails it to the form's email address.
    /// The form is left untouched whether or not sending succeeds.
    pub fn send_email(&self) -> Result<String, AppError> {
        let quotation = self.checked_quotation("No data to send!")?;
        if quotation.email.is_empty() {
            return Err(ValidationError::new("Please enter an email address.").into());
        }
        if !is_valid_email(&quotation.email) {
            return Err(ValidationError::new("Please enter a valid email address.").into());
        }

        let bytes = self.renderer.render(&quotation, (self.today)())?;
        let body = self.templates.render_email_body(
            &quotation.customer_name,
            &quotation.building_site,
            &quotation.validity_date,
            quotation.total_project_cost,
            self.renderer.sender(),
        )?;

        let mail = OutgoingMail {
            to: quotation.email.clone(),
            subject: self.mail.subject.clone(),
            body,
            attachment_name: self.mail.attachment_name.clone(),
            attachment: bytes,
        };
        self.mailer.send(&mail)?;
        info!(to = %quotation.email, "Quotation emailed");
        Ok(quotation.email)
    }

    pub fn clear(&mut self) {
        self.form = QuotationForm::default();
        self.ledger.clear();
    }
}
