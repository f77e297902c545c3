use eframe::egui;
use pdf_crop::constants::MARGIN_STEP;
use pdf_crop::{CropMargins, Side, input};

/// What a margin row asked for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginEdit {
    None,
    /// The text changed; re-parse every field
    Typed,
    /// A stepper button was pressed
    Step(Side, i64),
}

/// Text entry for one margin with -/+ stepper buttons
pub struct MarginField<'a> {
    side: Side,
    text: &'a mut String,
    enabled: bool,
}

impl<'a> MarginField<'a> {
    pub fn new(side: Side, text: &'a mut String) -> Self {
        Self {
            side,
            text,
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> MarginEdit {
        let mut edit = MarginEdit::None;
        ui.horizontal(|ui| {
            ui.add_enabled_ui(self.enabled, |ui| {
                ui.add_sized([60.0, 18.0], egui::Label::new(format!("{}:", self.side.label())));
                if ui.small_button("-").clicked() {
                    edit = MarginEdit::Step(self.side, -MARGIN_STEP);
                }
                let response = ui.add(
                    egui::TextEdit::singleline(self.text)
                        .desired_width(60.0)
                        .horizontal_align(egui::Align::RIGHT),
                );
                if response.changed() {
                    edit = MarginEdit::Typed;
                }
                if ui.small_button("+").clicked() {
                    edit = MarginEdit::Step(self.side, MARGIN_STEP);
                }
                ui.label("px");
            });
        });
        edit
    }
}

/// Text form of each margin, in `Side::ALL` order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginFields([String; 4]);

impl Default for MarginFields {
    fn default() -> Self {
        Self::from_margins(CropMargins::default())
    }
}

impl MarginFields {
    pub fn from_margins(margins: CropMargins) -> Self {
        Self(Side::ALL.map(|side| margins.get(side).to_string()))
    }

    /// Anything that is not a non-negative integer counts as 0
    pub fn parse(&self) -> CropMargins {
        let [left, top, right, bottom] = &self.0;
        input::parse_margins(left, top, right, bottom)
    }

    pub fn field_mut(&mut self, side: Side) -> &mut String {
        let index = Side::ALL
            .iter()
            .position(|s| *s == side)
            .unwrap_or_default();
        &mut self.0[index]
    }

    /// Draw all four rows
    pub fn show(&mut self, ui: &mut egui::Ui, enabled: bool) -> MarginEdit {
        let mut edit = MarginEdit::None;
        for side in Side::ALL {
            let row = MarginField::new(side, self.field_mut(side))
                .enabled(enabled)
                .show(ui);
            if row != MarginEdit::None {
                edit = row;
            }
        }
        edit
    }
}

/// Enum selector using ComboBox
pub fn enum_selector<T>(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    value: &mut T,
    options: &[(T, &str)],
) -> bool
where
    T: PartialEq + Clone,
{
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);

        let current_text = options
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, text)| *text)
            .unwrap_or("Unknown");

        egui::ComboBox::from_id_salt(id)
            .selected_text(current_text)
            .show_ui(ui, |ui| {
                for (option_value, option_text) in options {
                    if ui
                        .selectable_value(value, option_value.clone(), *option_text)
                        .changed()
                    {
                        changed = true;
                    }
                }
            });
    });
    changed
}

/// Labelled path entry with a "Browse..." button; returns true when the
/// text was edited or a path was picked
pub fn path_row(
    ui: &mut egui::Ui,
    label: &str,
    text: &mut String,
    pick: impl FnOnce() -> Option<std::path::PathBuf>,
) -> bool {
    ui.horizontal(|ui| {
        ui.add_sized([90.0, 18.0], egui::Label::new(label));
        let mut changed = ui
            .add(egui::TextEdit::singleline(text).desired_width(320.0))
            .lost_focus();
        if ui.button("Browse...").clicked() {
            if let Some(path) = pick() {
                *text = path.display().to_string();
                changed = true;
            }
        }
        changed
    })
    .inner
}
