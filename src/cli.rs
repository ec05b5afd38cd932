use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate};
use comfy_table::{Attribute, Cell, Color, Table};
use inquire::{Confirm, DateSelect, InquireError, Password, Select, Text};
use tracing::info;

use construction_estimator::config::{self, AppSettings};
use construction_estimator::controller::Controller;
use construction_estimator::error::{AppError, PersistenceError};
use construction_estimator::ledger::{self, Ledger, format_measure, format_money};
use construction_estimator::model::{LineItem, QuotationRecord};
use construction_estimator::quotation::{self, DATE_FORMAT};
use construction_estimator::store::QuotationStore;

const ADD_FLOOR_OPT: &str = "🏢 Add Floor";
const ADD_EXTRA_OPT: &str = "🛠️  Add Extra Work";
const DONE_OPT: &str = "✅ Done";

const SAVE_OPT: &str = "💾 Save Quotation";
const EXPORT_OPT: &str = "📄 Export to PDF";
const EMAIL_OPT: &str = "📧 Send Email";
const QUIT_OPT: &str = "🚪 Quit";

/// Prints an action failure the way the window would show it.
fn report(err: &AppError) {
    println!("❌ {}: {}", err.title(), err);
}

// ==========================================
// New quotation wizard
// ==========================================

pub fn new_quotation(controller: &mut Controller) -> Result<(), InquireError> {
    println!("\n--- New Quotation ---");

    loop {
        controller.form.customer_name = Text::new("Customer Name:").prompt()?;
        controller.form.building_site = Text::new("Building Site:").prompt()?;
        let validity = DateSelect::new("Validity Date:")
            .with_default(Local::now().date_naive())
            .prompt()?;
        controller.form.validity_date = validity.format(DATE_FORMAT).to_string();

        match quotation::validate(
            &controller.form.customer_name,
            &controller.form.building_site,
            &controller.form.validity_date,
        ) {
            Ok(()) => break,
            Err(e) => println!("❌ {}", e),
        }
    }

    let email = Text::new("Customer Email (Optional):").prompt()?;
    controller.form.email = email.trim().to_lowercase();

    enter_line_items(controller)?;

    if controller.ledger().is_empty() {
        println!("❌ No items entered. Aborting.");
        return Ok(());
    }

    println!("\n{}", controller.ledger_text());
    println!("💰 Total Project Cost: ₹{}", format_money(controller.running_total()));

    loop {
        let options = vec![SAVE_OPT, EXPORT_OPT, EMAIL_OPT, QUIT_OPT];
        let choice = Select::new("What next?", options).prompt()?;

        match choice {
            SAVE_OPT => match controller.save() {
                Ok(id) => println!("✅ Quotation saved with ID: {}", id),
                Err(e) => report(&e),
            },
            EXPORT_OPT => match controller.render_pdf() {
                Ok(export) => {
                    let path = Text::new("Save PDF as:")
                        .with_default(&export.suggested_name)
                        .prompt()?;
                    match controller.export_pdf(Path::new(&path), &export) {
                        Ok(()) => {
                            println!("✅ The quotation has been exported to {}.", path);
                            // Exporting clears the form, so there is nothing left to do.
                            return Ok(());
                        }
                        Err(e) => report(&e),
                    }
                }
                Err(e) => report(&e),
            },
            EMAIL_OPT => {
                if controller.form.email.is_empty() {
                    controller.form.email = Text::new("Customer Email:").prompt()?;
                }
                match controller.send_email() {
                    Ok(to) => println!("✅ The quotation has been sent to {}.", to),
                    Err(e) => report(&e),
                }
            }
            _ => return Ok(()),
        }
    }
}

fn enter_line_items(controller: &mut Controller) -> Result<(), InquireError> {
    println!("\n--- Enter Line Items ---");

    loop {
        let options = vec![ADD_FLOOR_OPT, ADD_EXTRA_OPT, DONE_OPT];
        let choice = Select::new("Add an entry:", options).prompt()?;

        let result = match choice {
            ADD_FLOOR_OPT => {
                controller.form.floor_name = Text::new("Floor Name:").prompt()?;
                controller.form.area_sqft = Text::new("Area (sqft):").prompt()?;
                controller.form.cost_per_sqft = Text::new("Cost per sqft (INR):").prompt()?;
                controller.add_floor()
            }
            ADD_EXTRA_OPT => {
                controller.form.extra_work_name = Text::new("Extra Works:").prompt()?;
                controller.form.quantity = Text::new("Quantity:").prompt()?;
                controller.form.cost_per_unit = Text::new("Cost per Quantity (INR):").prompt()?;
                controller.add_extra_work()
            }
            _ => return Ok(()),
        };

        match result {
            Ok(line) => {
                println!("✅ {}", line);
                println!(
                    "   Running total: ₹{}",
                    format_money(controller.running_total())
                );
            }
            Err(e) => report(&e),
        }
    }
}

// ==========================================
// Fetch
// ==========================================

pub fn fetch(store: &dyn QuotationStore, email: &str, json: bool) -> Result<(), AppError> {
    let records = store.find_by_email(email)?;

    if json {
        println!("{}", records_json(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("❌ No quotations found for {}.", email);
        return Ok(());
    }

    println!("{}", quotation_table(&records));
    Ok(())
}

fn quotation_table(records: &[QuotationRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Customer"),
        Cell::new("Building Site"),
        Cell::new("Valid Until"),
        Cell::new("Floors"),
        Cell::new("Extra Works"),
        Cell::new("Total (INR)"),
    ]);

    let today = Local::now().date_naive();
    for record in records {
        let q = &record.quotation;
        let expired = NaiveDate::parse_from_str(&q.validity_date, DATE_FORMAT)
            .map(|d| d < today)
            .unwrap_or(false);
        let validity = if expired {
            Cell::new(&q.validity_date).fg(Color::Rgb { r: 185, g: 28, b: 28 })
        } else {
            Cell::new(&q.validity_date)
        };

        table.add_row(vec![
            Cell::new(&record.id),
            Cell::new(&q.customer_name),
            Cell::new(&q.building_site),
            validity,
            Cell::new(q.floors.len()),
            Cell::new(q.extra_works.len()),
            Cell::new(format!("₹{}", format_money(q.total_project_cost))).add_attribute(Attribute::Bold),
        ]);
    }
    table
}

// ==========================================
// Legacy ledger inspection
// ==========================================

pub fn inspect_ledger(path: &Path) -> std::io::Result<()> {
    let text = fs::read_to_string(path)?;
    let ledger = Ledger::from_text(&text);

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Kind"),
        Cell::new("Name"),
        Cell::new("Measure"),
        Cell::new("Unit Cost"),
        Cell::new("Total"),
    ]);
    for item in ledger.entries() {
        let (kind, measure, unit) = match item {
            LineItem::Floor(f) => ("Floor", format!("{} sqft", format_measure(f.area_sqft)), f.cost_per_sqft),
            LineItem::ExtraWork(w) => ("Extra Work", format!("Qty {}", w.quantity), w.cost_per_unit),
        };
        table.add_row(vec![
            Cell::new(kind),
            Cell::new(item.name()),
            Cell::new(measure),
            Cell::new(format!("₹{}", format_measure(unit))),
            Cell::new(format!("₹{}", format_money(item.total_cost()))),
        ]);
    }

    println!("--- Ledger: {} ---", path.display());
    println!("{table}");

    let structured = ledger.total();
    let loose = ledger::compute_total(&text);
    println!("Recovered entries: {}", ledger.len());
    println!("Entry total:       ₹{}", format_money(structured));
    println!("Running total:     ₹{}", format_money(loose));
    if format_money(structured) != format_money(loose) {
        println!("⚠️  Totals differ: some lines carry an amount but are not valid entries.");
    }
    Ok(())
}

// ==========================================
// Configuration wizard
// ==========================================

pub fn setup_config_wizard() -> Result<Option<AppSettings>, AppError> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = config::load_settings().unwrap_or_default();

    let settings = match collect_settings(current) {
        Ok(settings) => settings,
        Err(e) => {
            info!(reason = %e, "Configuration wizard cancelled");
            return Ok(None);
        }
    };

    let path = config::save_settings(&settings)?;
    println!("✅ Settings saved to {}", path.display());
    Ok(Some(settings))
}

/// Only a cancelled prompt is returned as an error; any other prompt
/// failure keeps the current value.
fn collect_settings(current: AppSettings) -> Result<AppSettings, InquireError> {
    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Root Data Directory")
        .pick_folder();

    let data_root = match picked_path {
        Some(path) => path.to_string_lossy().to_string(),
        None => {
            println!("❌ No folder selected. Falling back to manual input.");
            prompt_or("Enter Root Data Directory:", &current.data_root)?
        }
    };

    let mut settings = AppSettings {
        data_root,
        ..current
    };

    settings.mongo.uri = prompt_or("MongoDB URI:", &settings.mongo.uri)?;
    settings.mongo.database = prompt_or("Database:", &settings.mongo.database)?;
    settings.smtp.host = prompt_or("SMTP Host:", &settings.smtp.host)?;
    settings.smtp.port = prompt_or("SMTP Port:", &settings.smtp.port.to_string())?
        .parse()
        .unwrap_or(settings.smtp.port);
    settings.smtp.from_email = prompt_or("Sender Email:", &settings.smtp.from_email)?;
    settings.smtp.from_name = prompt_or("Sender Name:", &settings.smtp.from_name)?;
    settings.smtp.username = prompt_or("SMTP Username:", &settings.smtp.username)?;

    let store_password = keep_cancel(
        Confirm::new(&format!(
            "Store SMTP password in the settings file? (otherwise set {})",
            config::SMTP_PASSWORD_ENV
        ))
        .with_default(false)
        .prompt(),
    )?
    .unwrap_or(false);
    if store_password {
        if let Some(password) = keep_cancel(Password::new("SMTP Password:").without_confirmation().prompt())? {
            settings.smtp.password = password;
        }
    }

    Ok(settings)
}

fn is_cancelled(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Passes cancellation through and turns any other prompt failure into `None`.
fn keep_cancel<T>(result: Result<T, InquireError>) -> Result<Option<T>, InquireError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_cancelled(&e) => Err(e),
        Err(_) => Ok(None),
    }
}

fn prompt_or(message: &str, default: &str) -> Result<String, InquireError> {
    let answer = keep_cancel(Text::new(message).with_default(default).prompt())?;
    Ok(answer.unwrap_or_else(|| default.to_string()))
}

fn records_json(records: &[QuotationRecord]) -> Result<String, AppError> {
    serde_json::to_string_pretty(records)
        .map_err(|e| PersistenceError::Serialization(e.to_string()).into())
}
