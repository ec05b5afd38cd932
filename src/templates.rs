use std::fs;
use std::path::Path;

use tera::{Context, Tera};
use tracing::{info, warn};

use crate::error::TemplateError;
use crate::ledger::{format_measure, format_money};
use crate::model::{QuotationRecord, SenderConfig, SummaryContext, SummaryLine};

pub const SUMMARY_TEMPLATE: &str = "summary.tera";
pub const EMAIL_BODY_TEMPLATE: &str = "email_body.tera";

// Embed templates at compile time so a fresh install always has them
const DEFAULT_SUMMARY: &str = include_str!("../templates/summary.tera");
const DEFAULT_EMAIL_BODY: &str = include_str!("../templates/email_body.tera");

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn embedded() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (SUMMARY_TEMPLATE, DEFAULT_SUMMARY),
            (EMAIL_BODY_TEMPLATE, DEFAULT_EMAIL_BODY),
        ])?;
        Ok(Self { tera })
    }

    /// Loads the embedded templates, then lets files in `<root>/templates`
    /// replace them. Missing defaults are written out so they can be edited.
    pub fn load(root: &Path) -> Result<Self, TemplateError> {
        let mut templates = Self::embedded()?;
        let template_dir = root.join("templates");

        if let Err(e) = fs::create_dir_all(&template_dir) {
            warn!(error = %e, "Cannot create template directory, using embedded templates");
            return Ok(templates);
        }

        for (name, default) in [
            (SUMMARY_TEMPLATE, DEFAULT_SUMMARY),
            (EMAIL_BODY_TEMPLATE, DEFAULT_EMAIL_BODY),
        ] {
            let path = template_dir.join(name);
            if !path.exists() {
                info!(path = %path.display(), "Initializing default template");
                if let Err(e) = fs::write(&path, default) {
                    warn!(error = %e, "Failed to write default template");
                }
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => templates.tera.add_raw_template(name, &content)?,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to read template"),
            }
        }

        Ok(templates)
    }

    pub fn render_summary(&self, record: &QuotationRecord) -> Result<String, TemplateError> {
        let q = &record.quotation;
        let ctx = SummaryContext {
            id: record.id.clone(),
            customer_name: q.customer_name.clone(),
            building_site: q.building_site.clone(),
            validity_date: q.validity_date.clone(),
            floors: q
                .floors
                .iter()
                .map(|f| SummaryLine {
                    name: f.name.clone(),
                    measure: format_measure(f.area_sqft),
                    unit_cost: format_measure(f.cost_per_sqft),
                    total: format_money(f.total_cost),
                })
                .collect(),
            extra_works: q
                .extra_works
                .iter()
                .map(|w| SummaryLine {
                    name: w.name.clone(),
                    measure: w.quantity.to_string(),
                    unit_cost: format_measure(w.cost_per_unit),
                    total: format_money(w.total_cost),
                })
                .collect(),
            total: format_money(q.total_project_cost),
        };
        let context = Context::from_serialize(&ctx)?;
        Ok(self.tera.render(SUMMARY_TEMPLATE, &context)?)
    }

    pub fn render_summaries(&self, records: &[QuotationRecord]) -> Result<String, TemplateError> {
        let mut out = String::new();
        for record in records {
            out.push_str(&self.render_summary(record)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn render_email_body(
        &self,
        customer_name: &str,
        building_site: &str,
        validity_date: &str,
        total: f64,
        sender: &SenderConfig,
    ) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("customer_name", customer_name);
        context.insert("building_site", building_site);
        context.insert("validity_date", validity_date);
        context.insert("total", &format_money(total));
        context.insert("company", &sender.name);
        context.insert("company_email", &sender.email);
        context.insert("company_phone", &sender.phone);
        Ok(self.tera.render(EMAIL_BODY_TEMPLATE, &context)?)
    }
}
