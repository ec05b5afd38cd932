//! The line-item ledger.
//!
//! Entries are kept as a structured, ordered list. The text form shown to the
//! user is derived from that list and stays byte-compatible with ledgers
//! written by earlier versions, so old text can still be scanned back with
//! [`parse_all`] and totalled with [`compute_total`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{ParseError, ValidationError};
use crate::model::{ExtraWorkEntry, FloorEntry, LineItem};

pub const FLOOR_MARKER: &str = "Floor Name:";
pub const EXTRA_WORK_MARKER: &str = "Extra Works:";
pub const CURRENCY: char = '₹';
pub const SEPARATOR_WIDTH: usize = 40;

static FLOOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Floor Name: (.*?), (.*?) sqft X ₹(.*?) = ₹(.*?)$").expect("floor pattern is valid")
});

static EXTRA_WORK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Extra Works: (.*?), Qty: (.*?) @ ₹(.*?) = ₹(.*?)$")
        .expect("extra work pattern is valid")
});

/// Stored totals are rounded to cents.
const TOTAL_TOLERANCE: f64 = 0.005;

pub fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Formats a float the way the ledger has always written measures and unit
/// costs: shortest round-trip form, always with a fractional part.
pub fn format_measure(value: f64) -> String {
    format!("{:?}", value)
}

pub fn format_money(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn format_floor_line(entry: &FloorEntry) -> String {
    format!(
        "{} {}, {} sqft X {}{} = {}{}",
        FLOOR_MARKER,
        entry.name,
        format_measure(entry.area_sqft),
        CURRENCY,
        format_measure(entry.cost_per_sqft),
        CURRENCY,
        format_money(entry.total_cost)
    )
}

pub fn format_extra_work_line(entry: &ExtraWorkEntry) -> String {
    format!(
        "{} {}, Qty: {} @ {}{} = {}{}",
        EXTRA_WORK_MARKER,
        entry.name,
        entry.quantity,
        CURRENCY,
        format_measure(entry.cost_per_unit),
        CURRENCY,
        format_money(entry.total_cost)
    )
}

pub fn format_line(item: &LineItem) -> String {
    match item {
        LineItem::Floor(f) => format_floor_line(f),
        LineItem::ExtraWork(w) => format_extra_work_line(w),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    items: Vec<LineItem>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from previously rendered text. Unreadable lines are
    /// dropped (see [`parse_all`]).
    pub fn from_text(text: &str) -> Self {
        Self {
            items: parse_all(text),
        }
    }

    pub fn append_floor(
        &mut self,
        name: &str,
        area_sqft: f64,
        cost_per_sqft: f64,
    ) -> Result<String, ValidationError> {
        let name = clean_name(name, "Floor name cannot be empty.")?;
        ensure_positive(area_sqft)?;
        ensure_positive(cost_per_sqft)?;

        let entry = FloorEntry::new(name, area_sqft, cost_per_sqft);
        ensure_total(entry.total_cost)?;
        warn_if_unreadable(&entry.name);
        let line = format_floor_line(&entry);
        debug!(line = %line, "Appending floor entry");
        self.items.push(LineItem::Floor(entry));
        Ok(line)
    }

    pub fn append_extra_work(
        &mut self,
        name: &str,
        quantity: u32,
        cost_per_unit: f64,
    ) -> Result<String, ValidationError> {
        let name = clean_name(name, "Extra works name cannot be empty.")?;
        if quantity == 0 {
            return Err(ValidationError::new("Quantity must be a positive whole number."));
        }
        ensure_positive(cost_per_unit)?;

        let entry = ExtraWorkEntry::new(name, quantity, cost_per_unit);
        ensure_total(entry.total_cost)?;
        warn_if_unreadable(&entry.name);
        let line = format_extra_work_line(&entry);
        debug!(line = %line, "Appending extra work entry");
        self.items.push(LineItem::ExtraWork(entry));
        Ok(line)
    }

    pub fn remove(&mut self, index: usize) -> Option<LineItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn entries(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn floors(&self) -> Vec<FloorEntry> {
        self.items
            .iter()
            .filter_map(|item| match item {
                LineItem::Floor(f) => Some(f.clone()),
                LineItem::ExtraWork(_) => None,
            })
            .collect()
    }

    pub fn extra_works(&self) -> Vec<ExtraWorkEntry> {
        self.items
            .iter()
            .filter_map(|item| match item {
                LineItem::ExtraWork(w) => Some(w.clone()),
                LineItem::Floor(_) => None,
            })
            .collect()
    }

    /// Sum of the structured entry totals.
    pub fn total(&self) -> f64 {
        self.items.iter().map(LineItem::total_cost).fold(0.0, |acc, v| acc + v)
    }

    /// The on-screen text: every entry line followed by a separator line.
    pub fn render(&self) -> String {
        let sep = separator();
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&format_line(item));
            out.push('\n');
            out.push_str(&sep);
            out.push('\n');
        }
        out
    }
}

fn clean_name(name: &str, empty_msg: &str) -> Result<String, ValidationError> {
    // A newline would split the entry across two ledger lines.
    let name = name.trim().replace(['\r', '\n'], " ");
    if name.is_empty() {
        return Err(ValidationError::new(empty_msg));
    }
    Ok(name)
}

fn ensure_positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("Please enter valid numerical values."))
    }
}

fn ensure_total(total: f64) -> Result<(), ValidationError> {
    if total.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("The total cost of this entry is too large."))
    }
}

/// The line patterns split at the first `, `, so such a name cannot be
/// scanned back from text. The structured entry is unaffected.
fn warn_if_unreadable(name: &str) {
    if name.contains(", ") {
        warn!(name = %name, "Entry name contains ', ' and will not parse back from ledger text");
    }
}

/// Scans ledger text line by line and recovers every well-formed entry in
/// the order encountered. Malformed lines are logged and skipped.
pub fn parse_all(text: &str) -> Vec<LineItem> {
    let mut items = Vec::new();

    for line in text.lines() {
        if line.contains(FLOOR_MARKER) {
            match parse_floor_line(line) {
                Ok(entry) => items.push(LineItem::Floor(entry)),
                Err(e) => warn!(error = %e, "Skipping floor line"),
            }
        }
        if line.contains(EXTRA_WORK_MARKER) {
            match parse_extra_work_line(line) {
                Ok(entry) => items.push(LineItem::ExtraWork(entry)),
                Err(e) => warn!(error = %e, "Skipping extra works line"),
            }
        }
    }

    items
}

pub fn parse_floor_line(line: &str) -> Result<FloorEntry, ParseError> {
    let caps = FLOOR_RE.captures(line).ok_or_else(|| ParseError::Pattern {
        kind: "floor",
        line: line.to_string(),
    })?;

    let name = caps[1].trim().to_string();
    let area_sqft = parse_number(&caps[2], line)?;
    let cost_per_sqft = parse_number(&caps[3], line)?;
    let stored = parse_money(&caps[4], line)?;

    check_total(stored, area_sqft * cost_per_sqft, line)?;

    Ok(FloorEntry {
        name,
        area_sqft,
        cost_per_sqft,
        total_cost: stored,
    })
}

pub fn parse_extra_work_line(line: &str) -> Result<ExtraWorkEntry, ParseError> {
    let caps = EXTRA_WORK_RE.captures(line).ok_or_else(|| ParseError::Pattern {
        kind: "extra works",
        line: line.to_string(),
    })?;

    let name = caps[1].trim().to_string();
    let raw_qty = caps[2].trim();
    let quantity = raw_qty.parse::<u32>().map_err(|_| ParseError::Number {
        value: raw_qty.to_string(),
        line: line.to_string(),
    })?;
    let cost_per_unit = parse_number(&caps[3].replace(CURRENCY, ""), line)?;
    let stored = parse_money(&caps[4], line)?;

    check_total(stored, f64::from(quantity) * cost_per_unit, line)?;

    Ok(ExtraWorkEntry {
        name,
        quantity,
        cost_per_unit,
        total_cost: stored,
    })
}

fn parse_number(raw: &str, line: &str) -> Result<f64, ParseError> {
    let raw = raw.trim();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::Number {
            value: raw.to_string(),
            line: line.to_string(),
        })
}

fn parse_money(raw: &str, line: &str) -> Result<f64, ParseError> {
    parse_number(&strip_money(raw), line)
}

fn strip_money(raw: &str) -> String {
    raw.replace([CURRENCY, ','], "").trim().to_string()
}

fn check_total(stored: f64, computed: f64, line: &str) -> Result<(), ParseError> {
    if (stored - computed).abs() <= TOTAL_TOLERANCE + computed.abs() * f64::EPSILON * 4.0 {
        Ok(())
    } else {
        Err(ParseError::TotalMismatch {
            stored,
            computed,
            line: line.to_string(),
        })
    }
}

/// Loose running total: sums whatever follows the last `=` on every line
/// that has one. Lines that don't yield a number are ignored.
pub fn compute_total(text: &str) -> f64 {
    text.lines()
        .filter_map(|line| line.rsplit_once('='))
        .filter_map(|(_, tail)| strip_money(tail).parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .fold(0.0, |acc, v| acc + v)
}
