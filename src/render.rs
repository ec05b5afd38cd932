//! PDF rendering of a quotation.
//!
//! Uses the standard Helvetica fonts with WinAnsi encoding, so every string
//! goes through [`safe_text`] first.

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::error::RenderError;
use crate::ledger::{format_measure, format_money};
use crate::model::{Quotation, SenderConfig};
use crate::quotation::DATE_FORMAT;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const ROW_HEIGHT: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const COLUMNS: [f32; 4] = [170.0, 115.0, 115.0, 115.0];
// Rough Helvetica advance width as a fraction of the font size
const AVG_CHAR_WIDTH: f32 = 0.5;

pub const NOTES: [&str; 5] = [
    "If the Construction materials rate increases more than 5%, client should bear the extra costs.",
    "If any work to be done which is not mentioned in the quotation, client should bear the cost for that.",
    "Client should bear the Cost for EB main board works & all the government formalities.",
    "EB bill is to be paid by the client during the period of construction.",
    "Construction water is to be provided by the client if bore water is not available.",
];

/// Reduces text to what the PDF fonts can show: NFKD-normalized, rupee sign
/// spelled out, everything outside Latin-1 dropped.
pub fn safe_text(text: &str) -> String {
    text.replace('₹', "Rs.")
        .nfkd()
        .filter(|c| {
            let code = *c as u32;
            (0x20..0x7F).contains(&code) || (0xA0..=0xFF).contains(&code)
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
}

fn num(v: f32) -> Object {
    v.into()
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_CHAR_WIDTH
}

fn fit(text: &str, width: f32, size: f32) -> String {
    let max_chars = ((width - 6.0) / (size * AVG_CHAR_WIDTH)).floor().max(1.0) as usize;
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = (width / (size * AVG_CHAR_WIDTH)).floor().max(1.0) as usize;
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Accumulates drawing operations top-down and starts a new page when the
/// cursor reaches the bottom margin.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn new_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(ops);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Returns true when a page break happened.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn draw_text(&mut self, x: f32, baseline: f32, font: Font, size: f32, text: &str) {
        let bytes: Vec<u8> = safe_text(text).chars().map(|c| c as u32 as u8).collect();
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec![font.resource().into(), num(size)]));
        self.ops.push(Operation::new("Td", vec![num(x), num(baseline)]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(bytes, StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn line(&mut self, font: Font, size: f32, text: &str, align: Align) {
        let height = size + 8.0;
        self.ensure_space(height);
        let safe = safe_text(text);
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => ((PAGE_WIDTH - text_width(&safe, size)) / 2.0).max(MARGIN),
        };
        self.y -= height;
        self.draw_text(x, self.y + 6.0, font, size, &safe);
    }

    fn label_value(&mut self, label: &str, value: &str) {
        self.ensure_space(ROW_HEIGHT);
        self.y -= ROW_HEIGHT;
        let baseline = self.y + 6.0;
        self.draw_text(MARGIN, baseline, Font::Regular, 10.0, label);
        let value = fit(&safe_text(value), CONTENT_WIDTH - 170.0, 10.0);
        self.draw_text(MARGIN + 170.0, baseline, Font::Regular, 10.0, &value);
    }

    fn row(&mut self, cells: &[String], align: Align) {
        self.y -= ROW_HEIGHT;
        let mut x = MARGIN;
        self.ops.push(Operation::new("w", vec![num(0.5)]));
        for (cell, width) in cells.iter().zip(COLUMNS) {
            self.ops.push(Operation::new(
                "re",
                vec![num(x), num(self.y), num(width), num(ROW_HEIGHT)],
            ));
            self.ops.push(Operation::new("S", vec![]));

            let text = fit(&safe_text(cell), width, 10.0);
            let tx = match align {
                Align::Left => x + 3.0,
                Align::Center => x + ((width - text_width(&text, 10.0)) / 2.0).max(3.0),
            };
            self.draw_text(tx, self.y + 6.0, Font::Regular, 10.0, &text);
            x += width;
        }
    }

    fn table(&mut self, title: &str, header: [&str; 4], rows: Vec<[String; 4]>) {
        self.line(Font::Bold, 12.0, title, Align::Left);
        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        self.ensure_space(ROW_HEIGHT * 2.0);
        self.row(&header, Align::Center);
        for cells in rows {
            if self.ensure_space(ROW_HEIGHT) {
                self.row(&header, Align::Center);
            }
            self.row(&cells, Align::Left);
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

pub struct PdfRenderer {
    sender: SenderConfig,
}

impl PdfRenderer {
    pub fn new(sender: SenderConfig) -> Self {
        Self { sender }
    }

    pub fn sender(&self) -> &SenderConfig {
        &self.sender
    }

    pub fn render(&self, quotation: &Quotation, issued_on: NaiveDate) -> Result<Vec<u8>, RenderError> {
        let pages = self.layout(quotation, issued_on);
        debug!(pages = pages.len(), "Quotation laid out");

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![num(0.0), num(0.0), num(PAGE_WIDTH), num(PAGE_HEIGHT)],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        info!(bytes = bytes.len(), customer = %quotation.customer_name, "Quotation PDF rendered");
        Ok(bytes)
    }

    fn layout(&self, q: &Quotation, issued_on: NaiveDate) -> Vec<Vec<Operation>> {
        let mut w = PageWriter::new();

        // Header
        w.line(Font::Bold, 16.0, &self.sender.name, Align::Center);
        w.line(
            Font::Regular,
            12.0,
            &format!("Date: {}", issued_on.format(DATE_FORMAT)),
            Align::Center,
        );
        w.line(Font::Regular, 12.0, &format!("Email: {}", self.sender.email), Align::Center);
        w.line(Font::Regular, 12.0, &format!("Phone: {}", self.sender.phone), Align::Center);
        w.gap(20.0);

        // Customer block
        w.line(Font::Bold, 12.0, "Customer Information", Align::Left);
        w.label_value("Customer Name:", &q.customer_name);
        w.label_value("Building Site:", &q.building_site);
        w.label_value("Validity Date:", &q.validity_date);
        w.gap(20.0);

        let floor_rows = q
            .floors
            .iter()
            .map(|f| {
                [
                    f.name.clone(),
                    format_measure(f.area_sqft),
                    format_measure(f.cost_per_sqft),
                    format!("₹{}", format_money(f.total_cost)),
                ]
            })
            .collect();
        w.table(
            "Floor Details",
            ["Floor Name", "Area (sqft)", "Cost/Unit (INR)", "Total Cost (INR)"],
            floor_rows,
        );
        w.gap(10.0);

        let extra_rows = q
            .extra_works
            .iter()
            .map(|e| {
                [
                    e.name.clone(),
                    e.quantity.to_string(),
                    format_measure(e.cost_per_unit),
                    format!("₹{}", format_money(e.total_cost)),
                ]
            })
            .collect();
        w.table(
            "Extra Works Details",
            ["Extra Work", "Quantity", "Cost/Unit (INR)", "Total Cost (INR)"],
            extra_rows,
        );
        w.gap(10.0);

        w.line(
            Font::Bold,
            12.0,
            &format!("Total Project Cost: ₹{}", format_money(q.total_project_cost)),
            Align::Center,
        );
        w.gap(20.0);

        w.line(Font::Regular, 10.0, "Note:", Align::Left);
        for (i, note) in NOTES.iter().enumerate() {
            for line in wrap(&format!("{}. {}", i + 1, note), CONTENT_WIDTH, 10.0) {
                w.line(Font::Regular, 10.0, &line, Align::Left);
            }
        }

        w.finish()
    }
}
