use eframe::egui;
use pdf_crop::{ConversionOptions, MarginScaling, Quality, input};
use std::path::PathBuf;

use crate::ui_components::{MarginEdit, MarginFields, enum_selector, path_row};

/// Everything typed into the main form, kept as text until it is used
pub struct FormState {
    pub pdf_path: String,
    pub output_dir: String,
    pub margins: MarginFields,
    pub quality: Quality,
    pub margin_scaling: MarginScaling,
    pub preview_page: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            pdf_path: String::new(),
            output_dir: String::new(),
            margins: MarginFields::default(),
            quality: Quality::default(),
            margin_scaling: MarginScaling::default(),
            preview_page: "1".to_string(),
        }
    }
}

impl FormState {
    pub fn pdf_path(&self) -> PathBuf {
        PathBuf::from(self.pdf_path.trim())
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        let trimmed = self.output_dir.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Fill the output directory from the PDF location unless one is set
    pub fn suggest_output_dir(&mut self) {
        if self.output_dir.trim().is_empty() {
            if let Some(dir) = input::default_output_dir(&self.pdf_path()) {
                self.output_dir = dir.display().to_string();
            }
        }
    }

    pub fn options(&self) -> ConversionOptions {
        ConversionOptions {
            margins: self.margins.parse(),
            quality: self.quality,
            margin_scaling: self.margin_scaling,
            output_dir: self.output_dir(),
            preview_page: self.preview_page.trim().parse().unwrap_or(1).max(1),
        }
    }

    pub fn apply_options(&mut self, options: &ConversionOptions) {
        self.margins = MarginFields::from_margins(options.margins);
        self.quality = options.quality;
        self.margin_scaling = options.margin_scaling;
        if let Some(dir) = &options.output_dir {
            self.output_dir = dir.display().to_string();
        }
        self.preview_page = options.preview_page.to_string();
    }
}

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    OpenPdf(PathBuf),
    Margins(MarginEdit),
    Preview,
    Convert,
    Stop,
    SaveConfig(PathBuf),
    LoadConfig(PathBuf),
}

pub fn show_main_panel(
    ui: &mut egui::Ui,
    form: &mut FormState,
    converting: bool,
) -> Vec<FormAction> {
    let mut actions = Vec::new();

    ui.heading("PDF to Cropped PNG");
    ui.separator();

    ui.add_enabled_ui(!converting, |ui| {
        show_files_section(ui, form, &mut actions);
    });
    ui.add_space(10.0);
    ui.separator();

    egui::CollapsingHeader::new("✂ Crop Margins")
        .default_open(true)
        .show(ui, |ui| {
            match form.margins.show(ui, !converting) {
                MarginEdit::None => {}
                edit => actions.push(FormAction::Margins(edit)),
            }
            ui.label(
                egui::RichText::new("Drag the red rectangle in the preview to set margins visually")
                    .small()
                    .weak(),
            );
        });
    ui.add_space(10.0);

    egui::CollapsingHeader::new("🖼 Output Quality")
        .default_open(true)
        .show(ui, |ui| {
            ui.add_enabled_ui(!converting, |ui| {
                show_quality_section(ui, form);
            });
        });
    ui.add_space(10.0);
    ui.separator();

    show_actions(ui, form, converting, &mut actions);

    actions
}

fn show_files_section(ui: &mut egui::Ui, form: &mut FormState, actions: &mut Vec<FormAction>) {
    let pdf_changed = path_row(ui, "PDF file:", &mut form.pdf_path, || {
        rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .pick_file()
    });
    if pdf_changed && !form.pdf_path.trim().is_empty() {
        actions.push(FormAction::OpenPdf(form.pdf_path()));
    }

    path_row(ui, "Output folder:", &mut form.output_dir, || {
        rfd::FileDialog::new().pick_folder()
    });
}

fn show_quality_section(ui: &mut egui::Ui, form: &mut FormState) {
    let options: Vec<(Quality, &str)> = Quality::ALL.iter().map(|q| (*q, q.label())).collect();
    enum_selector(ui, "quality", "Resolution:", &mut form.quality, &options);

    let mut normalize = form.margin_scaling == MarginScaling::NormalizeToDpi;
    if ui
        .checkbox(&mut normalize, "Scale margins to the output resolution")
        .changed()
    {
        form.margin_scaling = if normalize {
            MarginScaling::NormalizeToDpi
        } else {
            MarginScaling::Raw
        };
    }

    if form.margin_scaling == MarginScaling::Raw && form.quality != Quality::Standard {
        ui.label(
            egui::RichText::new(
                "Margins are measured on the 150 DPI preview and applied as pixels, \
                 so at this resolution they cut a different area than shown.",
            )
            .small()
            .color(ui.visuals().warn_fg_color),
        );
    }
}

fn show_actions(
    ui: &mut egui::Ui,
    form: &mut FormState,
    converting: bool,
    actions: &mut Vec<FormAction>,
) {
    ui.horizontal(|ui| {
        ui.label("Preview page:");
        ui.add(egui::TextEdit::singleline(&mut form.preview_page).desired_width(40.0));
        if ui.button("🔍 Preview").clicked() {
            actions.push(FormAction::Preview);
        }
    });

    ui.add_space(5.0);

    ui.horizontal(|ui| {
        if ui
            .add_enabled(!converting, egui::Button::new("▶ Convert"))
            .clicked()
        {
            actions.push(FormAction::Convert);
        }
        if ui
            .add_enabled(converting, egui::Button::new("⏹ Stop"))
            .clicked()
        {
            actions.push(FormAction::Stop);
        }
    });

    ui.add_space(5.0);

    ui.horizontal(|ui| {
        if ui.button("💾 Save Configuration").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("JSON", &["json"])
                .set_file_name("crop_config.json")
                .save_file()
            {
                actions.push(FormAction::SaveConfig(path));
            }
        }

        if ui.button("📂 Load Configuration").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
            {
                actions.push(FormAction::LoadConfig(path));
            }
        }
    });
}
