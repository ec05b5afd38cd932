use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::NaiveDate;

use construction_estimator::config::{self, MailSettings};
use construction_estimator::controller::Controller;
use construction_estimator::error::{AppError, NotificationError, PersistenceError};
use construction_estimator::notify::{Mailer, OutgoingMail};
use construction_estimator::ledger::format_money;
use construction_estimator::render::PdfRenderer;
use construction_estimator::store::{InMemoryQuotationStore, QuotationStore, UnavailableQuotationStore};
use construction_estimator::templates::Templates;

/// Keeps every message instead of sending it.
#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Rc<RefCell<Vec<OutgoingMail>>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        self.sent.borrow_mut().push(mail.clone());
        Ok(())
    }
}

struct FailingMailer;

impl Mailer for FailingMailer {
    fn send(&self, _mail: &OutgoingMail) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("connection refused".to_string()))
    }
}

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").with_test_writer().try_init();
}

fn controller_with(store: Rc<InMemoryQuotationStore>, mailer: Box<dyn Mailer>) -> Controller {
    controller_over(Box::new(store), mailer)
}

fn controller_over(store: Box<dyn QuotationStore>, mailer: Box<dyn Mailer>) -> Controller {
    init_tracing();
    let sender = config::default_sender().expect("embedded sender parses");
    let templates = Templates::embedded().expect("embedded templates parse");
    Controller::new(
        store,
        mailer,
        PdfRenderer::new(sender),
        templates,
        MailSettings::default(),
    )
    .with_clock(fixed_today)
}

fn fill_customer(controller: &mut Controller) {
    controller.form.customer_name = "John Doe".to_string();
    controller.form.building_site = "Plot 12, Anna Nagar".to_string();
    controller.form.validity_date = "2026-12-31".to_string();
    controller.form.email = "John@Example.com".to_string();
}

fn add_sample_entries(controller: &mut Controller) {
    controller.form.floor_name = "Ground Floor".to_string();
    controller.form.area_sqft = "1000".to_string();
    controller.form.cost_per_sqft = "150".to_string();
    controller.add_floor().unwrap();

    controller.form.extra_work_name = "Painting".to_string();
    controller.form.quantity = "10".to_string();
    controller.form.cost_per_unit = "500".to_string();
    controller.add_extra_work().unwrap();
}

fn temp_pdf_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("estimator-{}-{}.pdf", name, std::process::id()))
}

#[cfg(test)]
mod entry_tests {
    use super::*;

    #[test]
    fn test_add_floor_updates_ledger_and_clears_inputs() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        controller.form.floor_name = "Ground Floor".to_string();
        controller.form.area_sqft = " 1000 ".to_string();
        controller.form.cost_per_sqft = "150".to_string();

        let line = controller.add_floor().unwrap();

        assert_eq!(line, "Floor Name: Ground Floor, 1000.0 sqft X ₹150.0 = ₹150000.00");
        assert!(controller.ledger_text().starts_with(&line));
        assert_eq!(controller.running_total(), 150000.0);
        assert!(controller.form.floor_name.is_empty());
        assert!(controller.form.area_sqft.is_empty());
        assert!(controller.form.cost_per_sqft.is_empty());
    }

    #[test]
    fn test_running_total_tracks_both_kinds() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        add_sample_entries(&mut controller);

        assert_eq!(controller.ledger().len(), 2);
        assert_eq!(controller.running_total(), 155000.0);
    }

    #[test]
    fn test_numeric_input_errors() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        controller.form.floor_name = "Ground Floor".to_string();

        let err = controller.add_floor().unwrap_err();
        assert_eq!(err.to_string(), "Enter valid numerical values.");

        controller.form.area_sqft = "ten".to_string();
        controller.form.cost_per_sqft = "150".to_string();
        let err = controller.add_floor().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Please enter valid numerical values.");

        // Failed input stays in the form for correction.
        assert_eq!(controller.form.area_sqft, "ten");
        assert!(controller.ledger().is_empty());
    }

    #[test]
    fn test_quantity_must_be_positive_whole_number() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        controller.form.extra_work_name = "Painting".to_string();
        controller.form.cost_per_unit = "500".to_string();

        controller.form.quantity = "2.5".to_string();
        assert_eq!(
            controller.add_extra_work().unwrap_err().to_string(),
            "Please enter valid numerical values."
        );

        for bad in ["0", "-3"] {
            controller.form.quantity = bad.to_string();
            assert_eq!(
                controller.add_extra_work().unwrap_err().to_string(),
                "Quantity must be a positive whole number."
            );
        }
        assert!(controller.ledger().is_empty());
    }

    #[test]
    fn test_remove_entry() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        add_sample_entries(&mut controller);

        let removed = controller.remove_entry(0).unwrap();
        assert_eq!(removed.name(), "Ground Floor");
        assert_eq!(controller.running_total(), 5000.0);
        assert!(controller.remove_entry(3).is_none());
    }
}

#[cfg(test)]
mod persistence_tests {
    use super::*;

    #[test]
    fn test_save_then_fetch_by_email() {
        let store = Rc::new(InMemoryQuotationStore::new());
        let mut controller = controller_with(store.clone(), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);
        add_sample_entries(&mut controller);

        let id = controller.save().unwrap();
        assert!(!id.is_empty());
        assert_eq!(store.len(), 1);

        let saved = store.find_by_email("john@example.com").unwrap();
        assert_eq!(saved[0].quotation.total_project_cost, 155000.0);

        // Saving leaves the form as it was.
        assert_eq!(controller.ledger().len(), 2);

        controller.form.fetch_email = " JOHN@example.com ".to_string();
        let result = controller.fetch().unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].id, id);
        assert!(result.summary.contains("Customer Name: John Doe"));
        assert!(result.summary.contains("Ground Floor"));
        assert!(result.summary.contains("155000.00"));
    }

    #[test]
    fn test_save_requires_email() {
        let store = Rc::new(InMemoryQuotationStore::new());
        let mut controller = controller_with(store.clone(), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);
        controller.form.email.clear();
        add_sample_entries(&mut controller);

        let err = controller.save().unwrap_err();
        assert_eq!(err.to_string(), "All fields are required!");
        assert!(store.is_empty());
    }

    #[test]
    fn test_fetch_unknown_email_is_empty() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        controller.form.fetch_email = "nobody@example.com".to_string();

        let result = controller.fetch().unwrap();
        assert!(result.records.is_empty());
        assert!(result.summary.is_empty());
    }

    #[test]
    fn test_unreachable_database_fails_save_and_fetch() {
        let store = UnavailableQuotationStore::new("DNS resolution: no record found");
        let mut controller = controller_over(Box::new(store), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);
        add_sample_entries(&mut controller);

        let err = controller.save().unwrap_err();
        assert!(matches!(
            err,
            AppError::Persistence(PersistenceError::Connection(_))
        ));
        assert_eq!(err.title(), "Database Error");
        assert!(err.to_string().contains("DNS resolution: no record found"));
        assert_eq!(controller.ledger().len(), 2);

        controller.form.fetch_email = "john@example.com".to_string();
        let err = controller.fetch().unwrap_err();
        assert_eq!(err.title(), "Database Error");
    }

    #[test]
    fn test_fetch_requires_email() {
        let controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        let err = controller.fetch().unwrap_err();
        assert_eq!(err.to_string(), "Please enter an email address.");
    }
}

#[cfg(test)]
mod document_tests {
    use super::*;

    #[test]
    fn test_export_without_entries() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);

        let err = controller.render_pdf().err().unwrap();
        assert_eq!(err.to_string(), "No data to export!");
    }

    #[test]
    fn test_export_validates_customer_block() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);
        add_sample_entries(&mut controller);
        controller.form.customer_name = "John123".to_string();

        let err = controller.render_pdf().err().unwrap();
        assert_eq!(err.to_string(), "Customer name should only contain alphabets.");
    }

    #[test]
    fn test_export_writes_file_and_clears_form() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);
        add_sample_entries(&mut controller);

        let export = controller.render_pdf().unwrap();
        assert_eq!(export.suggested_name, "quotation-john-doe-2026-01-15.pdf");
        assert!(export.bytes.starts_with(b"%PDF"));

        let path = temp_pdf_path("export");
        controller.export_pdf(&path, &export).unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(written, export.bytes);
        assert!(controller.ledger().is_empty());
        assert!(controller.form.customer_name.is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_send_email_attaches_pdf() {
        let mailer = RecordingMailer::default();
        let mut controller = controller_with(Rc::default(), Box::new(mailer.clone()));
        fill_customer(&mut controller);
        add_sample_entries(&mut controller);

        let to = controller.send_email().unwrap();
        assert_eq!(to, "john@example.com");

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "john@example.com");
        assert_eq!(sent[0].subject, "Construction Quotation");
        assert_eq!(sent[0].attachment_name, "quotation.pdf");
        assert!(sent[0].attachment.starts_with(b"%PDF"));
        assert!(sent[0].body.contains("Dear John Doe"));
        assert!(sent[0].body.contains("155000.00"));
    }

    #[test]
    fn test_send_email_validation() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);

        let err = controller.send_email().unwrap_err();
        assert_eq!(err.to_string(), "No data to send!");

        add_sample_entries(&mut controller);
        controller.form.email.clear();
        let err = controller.send_email().unwrap_err();
        assert_eq!(err.to_string(), "Please enter an email address.");

        controller.form.email = "john@".to_string();
        let err = controller.send_email().unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address.");
    }

    #[test]
    fn test_failed_send_keeps_form() {
        let mut controller = controller_with(Rc::default(), Box::new(FailingMailer));
        fill_customer(&mut controller);
        add_sample_entries(&mut controller);

        let err = controller.send_email().unwrap_err();
        assert!(matches!(err, AppError::Notification(_)));
        assert_eq!(err.title(), "Email Error");

        assert_eq!(controller.ledger().len(), 2);
        assert_eq!(controller.form.customer_name, "John Doe");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut controller = controller_with(Rc::default(), Box::new(RecordingMailer::default()));
        fill_customer(&mut controller);
        add_sample_entries(&mut controller);

        controller.clear();
        assert!(controller.ledger().is_empty());
        assert_eq!(format_money(controller.running_total()), "0.00");
        assert!(controller.form.email.is_empty());
    }
}

#[test]
fn test_store_trait_object_shares_records() {
    let store = Rc::new(InMemoryQuotationStore::new());
    let shared: Box<dyn QuotationStore> = Box::new(store.clone());
    assert!(shared.find_by_email("john@example.com").unwrap().is_empty());
    assert!(store.is_empty());
}
