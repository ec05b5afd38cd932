use eframe::egui;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use tracing::error;

use construction_estimator::controller::Controller;
use construction_estimator::error::AppError;
use construction_estimator::ledger::{format_line, format_money, separator};

const FIELD_WIDTH: f32 = 220.0;

pub fn run(controller: Controller) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Construction Quotation Generator")
            .with_inner_size([1280.0, 800.0])
            .with_maximized(true),
        ..Default::default()
    };

    eframe::run_native(
        "Construction Quotation Generator",
        options,
        Box::new(move |_cc| Ok(Box::new(EstimatorApp::new(controller)))),
    )
}

struct EstimatorApp {
    controller: Controller,
    fetched: Option<String>,
}

fn show_info(title: &str, message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn show_warning(title: &str, message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn show_error(err: &AppError) {
    error!(error = %err, "Action failed");
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(err.title())
        .set_description(err.to_string())
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn field(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.label(label);
    ui.add(egui::TextEdit::singleline(value).desired_width(FIELD_WIDTH));
    ui.end_row();
}

impl EstimatorApp {
    fn new(controller: Controller) -> Self {
        Self {
            controller,
            fetched: None,
        }
    }

    fn inputs(&mut self, ui: &mut egui::Ui) {
        let form = &mut self.controller.form;

        egui::Grid::new("customer").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
            field(ui, "Customer Name:", &mut form.customer_name);
            field(ui, "Building Site:", &mut form.building_site);
            field(ui, "Validity Date (YYYY-MM-DD):", &mut form.validity_date);
            field(ui, "Email:", &mut form.email);
        });

        ui.separator();
        ui.heading("Floor Information");
        egui::Grid::new("floor").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
            field(ui, "Floor Name:", &mut form.floor_name);
            field(ui, "Area (sqft):", &mut form.area_sqft);
            field(ui, "Cost per sqft (INR):", &mut form.cost_per_sqft);
        });
        if ui.button("Add Floor Info").clicked() {
            if let Err(e) = self.controller.add_floor() {
                show_error(&e);
            }
        }

        let form = &mut self.controller.form;
        ui.separator();
        ui.heading("Extra Works");
        egui::Grid::new("extra").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
            field(ui, "Extra Works:", &mut form.extra_work_name);
            field(ui, "Quantity:", &mut form.quantity);
            field(ui, "Cost per Quantity (INR):", &mut form.cost_per_unit);
        });
        if ui.button("Add Extra Work Info").clicked() {
            if let Err(e) = self.controller.add_extra_work() {
                show_error(&e);
            }
        }

        let form = &mut self.controller.form;
        ui.separator();
        ui.heading("Fetch Previous Quotation");
        egui::Grid::new("fetch").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
            field(ui, "Email:", &mut form.fetch_email);
        });
        if ui.button("View Previous Quotation").clicked() {
            self.fetch();
        }
    }

    fn fetch(&mut self) {
        match self.controller.fetch() {
            Ok(result) if result.records.is_empty() => {
                self.fetched = None;
                show_warning("Not Found", "No quotations found for this email.");
            }
            Ok(result) => self.fetched = Some(result.summary),
            Err(e) => show_error(&e),
        }
    }

    fn ledger_view(&mut self, ui: &mut egui::Ui) {
        let sep = separator();
        let mut remove = None;

        for (index, item) in self.controller.ledger().entries().iter().enumerate() {
            ui.horizontal(|ui| {
                if ui.small_button("✖").on_hover_text("Remove entry").clicked() {
                    remove = Some(index);
                }
                ui.monospace(format_line(item));
            });
            ui.monospace(sep.as_str());
        }

        if let Some(index) = remove {
            self.controller.remove_entry(index);
        }

        if self.fetched.is_some() {
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                ui.heading("Previous Quotations");
                if ui.small_button("Close").clicked() {
                    self.fetched = None;
                }
            });
            if let Some(summary) = &self.fetched {
                ui.monospace(summary.as_str());
            }
        }
    }

    fn actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Export to PDF").clicked() {
                self.export();
            }
            if ui.button("Send Email").clicked() {
                match self.controller.send_email() {
                    Ok(to) => show_info("Email Sent", &format!("The quotation has been sent to {}.", to)),
                    Err(e) => show_error(&e),
                }
            }
            if ui.button("Save Quotation").clicked() {
                match self.controller.save() {
                    Ok(_) => show_info("Success", "Quotation saved successfully!"),
                    Err(e) => show_error(&e),
                }
            }
            if ui.button("Clear").clicked() {
                self.controller.clear();
                self.fetched = None;
            }
        });
    }

    fn export(&mut self) {
        let export = match self.controller.render_pdf() {
            Ok(export) => export,
            Err(e) => {
                show_error(&e);
                return;
            }
        };

        let picked = FileDialog::new()
            .set_title("Export Quotation")
            .add_filter("PDF files", &["pdf"])
            .set_file_name(export.suggested_name.as_str())
            .save_file();

        if let Some(path) = picked {
            match self.controller.export_pdf(&path, &export) {
                Ok(()) => show_info(
                    "Export Success",
                    &format!("The quotation has been exported to {}.", path.display()),
                ),
                Err(e) => show_error(&e),
            }
        }
    }
}

impl eframe::App for EstimatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("inputs")
            .resizable(false)
            .min_width(420.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.inputs(ui));
            });

        egui::TopBottomPanel::bottom("actions").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.heading(format!(
                "Total Project Cost: ₹{}",
                format_money(self.controller.running_total())
            ));
            self.actions(ui);
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| self.ledger_view(ui));
        });
    }
}
