use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FloorEntry {
    pub name: String,
    pub area_sqft: f64,
    pub cost_per_sqft: f64,
    pub total_cost: f64,
}

impl FloorEntry {
    pub fn new(name: impl Into<String>, area_sqft: f64, cost_per_sqft: f64) -> Self {
        Self {
            name: name.into(),
            area_sqft,
            cost_per_sqft,
            total_cost: area_sqft * cost_per_sqft,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtraWorkEntry {
    pub name: String,
    pub quantity: u32,
    pub cost_per_unit: f64,
    pub total_cost: f64,
}

impl ExtraWorkEntry {
    pub fn new(name: impl Into<String>, quantity: u32, cost_per_unit: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            cost_per_unit,
            total_cost: f64::from(quantity) * cost_per_unit,
        }
    }
}

/// One row of the ledger, in the order it was entered.
#[derive(Debug, Clone, PartialEq)]
pub enum LineItem {
    Floor(FloorEntry),
    ExtraWork(ExtraWorkEntry),
}

impl LineItem {
    pub fn name(&self) -> &str {
        match self {
            LineItem::Floor(f) => &f.name,
            LineItem::ExtraWork(w) => &w.name,
        }
    }

    pub fn total_cost(&self) -> f64 {
        match self {
            LineItem::Floor(f) => f.total_cost,
            LineItem::ExtraWork(w) => w.total_cost,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Quotation {
    pub email: String,
    pub customer_name: String,
    pub building_site: String,
    pub validity_date: String, // YYYY-MM-DD
    #[serde(default)]
    pub floors: Vec<FloorEntry>,
    #[serde(default)]
    pub extra_works: Vec<ExtraWorkEntry>,
    pub total_project_cost: f64,
}

/// A stored quotation together with its database identifier.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QuotationRecord {
    pub id: String,
    #[serde(flatten)]
    pub quotation: Quotation,
}

/// Company identity printed on every quotation header.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SenderConfig {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Serialize)]
pub struct SummaryLine {
    pub name: String,
    pub measure: String,
    pub unit_cost: String,
    pub total: String,
}

/// Pre-formatted view of a stored quotation, fed to the summary template.
#[derive(Serialize)]
pub struct SummaryContext {
    pub id: String,
    pub customer_name: String,
    pub building_site: String,
    pub validity_date: String,
    pub floors: Vec<SummaryLine>,
    pub extra_works: Vec<SummaryLine>,
    pub total: String,
}
