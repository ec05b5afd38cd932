use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::ValidationError;
use crate::ledger::Ledger;
use crate::model::{ExtraWorkEntry, FloorEntry, Quotation};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("email pattern is valid")
});

static CUSTOMER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]*$").expect("name pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Checks the customer block before a quotation is exported or mailed.
pub fn validate(
    customer_name: &str,
    building_site: &str,
    validity_date: &str,
) -> Result<(), ValidationError> {
    let customer_name = customer_name.trim();
    if customer_name.is_empty() {
        return Err(ValidationError::new("Customer name cannot be empty."));
    }
    if !CUSTOMER_NAME_RE.is_match(customer_name) {
        return Err(ValidationError::new(
            "Customer name should only contain alphabets.",
        ));
    }

    if building_site.trim().is_empty() {
        return Err(ValidationError::new("Building site cannot be empty."));
    }

    parse_validity_date(validity_date)?;
    Ok(())
}

pub fn parse_validity_date(validity_date: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(validity_date.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::new("Validity date must be in YYYY-MM-DD format.")
    })
}

/// Builds the persistable record. Every text field is required and the
/// email must look like `local@domain.tld`.
pub fn assemble(
    email: &str,
    customer_name: &str,
    building_site: &str,
    validity_date: &str,
    floors: Vec<FloorEntry>,
    extra_works: Vec<ExtraWorkEntry>,
) -> Result<Quotation, ValidationError> {
    let email = email.trim().to_lowercase();
    let customer_name = customer_name.trim();
    let building_site = building_site.trim();
    let validity_date = validity_date.trim();

    if email.is_empty()
        || customer_name.is_empty()
        || building_site.is_empty()
        || validity_date.is_empty()
    {
        return Err(ValidationError::new("All fields are required!"));
    }
    if !is_valid_email(&email) {
        return Err(ValidationError::new("Please enter a valid email address."));
    }

    Ok(build(
        email,
        customer_name,
        building_site,
        validity_date,
        floors,
        extra_works,
    ))
}

/// Builds a quotation for rendering. The caller has already run [`validate`];
/// the email may be empty here.
pub fn draft(
    email: &str,
    customer_name: &str,
    building_site: &str,
    validity_date: &str,
    ledger: &Ledger,
) -> Quotation {
    build(
        email.trim().to_lowercase(),
        customer_name.trim(),
        building_site.trim(),
        validity_date.trim(),
        ledger.floors(),
        ledger.extra_works(),
    )
}

fn build(
    email: String,
    customer_name: &str,
    building_site: &str,
    validity_date: &str,
    floors: Vec<FloorEntry>,
    extra_works: Vec<ExtraWorkEntry>,
) -> Quotation {
    // Start from +0.0 so an empty quotation never totals -0.0.
    let total_project_cost = floors
        .iter()
        .map(|f| f.total_cost)
        .chain(extra_works.iter().map(|w| w.total_cost))
        .fold(0.0, |acc, v| acc + v);

    Quotation {
        email,
        customer_name: customer_name.to_string(),
        building_site: building_site.to_string(),
        validity_date: validity_date.to_string(),
        floors,
        extra_works,
        total_project_cost,
    }
}
