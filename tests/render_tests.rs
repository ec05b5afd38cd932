use chrono::NaiveDate;
use lopdf::Document;

use construction_estimator::config::default_sender;
use construction_estimator::model::{ExtraWorkEntry, FloorEntry, Quotation};
use construction_estimator::render::PdfRenderer;

fn renderer() -> PdfRenderer {
    PdfRenderer::new(default_sender().expect("embedded sender parses"))
}

fn issued_on() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn quotation(floor_count: usize) -> Quotation {
    let floors: Vec<FloorEntry> = (0..floor_count)
        .map(|i| FloorEntry::new(format!("Floor {}", i + 1), 1000.0, 150.0))
        .collect();
    let extra_works = vec![ExtraWorkEntry::new("Painting", 10, 500.0)];
    let total_project_cost =
        floors.iter().map(|f| f.total_cost).sum::<f64>() + extra_works.iter().map(|w| w.total_cost).sum::<f64>();

    Quotation {
        email: "john@example.com".to_string(),
        customer_name: "John Doe".to_string(),
        building_site: "Plot 12, Anna Nagar".to_string(),
        validity_date: "2026-12-31".to_string(),
        floors,
        extra_works,
        total_project_cost,
    }
}

fn page_text(doc: &Document) -> String {
    let mut text = String::new();
    for page_id in doc.get_pages().values() {
        let content = doc.get_page_content(*page_id).unwrap();
        text.push_str(&String::from_utf8_lossy(&content));
    }
    text
}

#[test]
fn test_render_produces_loadable_pdf() {
    let bytes = renderer().render(&quotation(1), issued_on()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn test_render_contains_quotation_details() {
    let bytes = renderer().render(&quotation(1), issued_on()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let text = page_text(&doc);

    assert!(text.contains("Your Construction Company"));
    assert!(text.contains("Date: 2026-01-15"));
    assert!(text.contains("John Doe"));
    assert!(text.contains("Floor 1"));
    assert!(text.contains("Painting"));
    assert!(text.contains("Rs.150000.00"));
    assert!(text.contains("Total Project Cost: Rs.155000.00"));
}

#[test]
fn test_long_quotations_span_pages() {
    let bytes = renderer().render(&quotation(60), issued_on()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert!(doc.get_pages().len() > 1);
    let text = page_text(&doc);
    assert!(text.contains("Floor 60"));
    assert!(text.contains("Construction water is to be provided"));
}

#[test]
fn test_render_without_extra_works() {
    let mut q = quotation(2);
    q.extra_works.clear();
    q.total_project_cost = 300000.0;

    let bytes = renderer().render(&q, issued_on()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    assert!(page_text(&doc).contains("Total Project Cost: Rs.300000.00"));
}
