use eframe::egui;

use crate::logger::AppLogger;

pub fn show_log_panel(ctx: &egui::Context, logger: &AppLogger, open: &mut bool) {
    if !*open {
        return;
    }

    egui::TopBottomPanel::bottom("log_panel")
        .resizable(true)
        .default_height(140.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Log");
                if ui.small_button("Clear").clicked() {
                    logger.clear();
                }
                if ui.small_button("Hide").clicked() {
                    *open = false;
                }
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for entry in logger.get_entries() {
                        let color = match entry.level {
                            log::Level::Error => ui.visuals().error_fg_color,
                            log::Level::Warn => ui.visuals().warn_fg_color,
                            _ => ui.visuals().text_color(),
                        };
                        ui.label(egui::RichText::new(entry.line()).monospace().color(color))
                            .on_hover_text(&entry.target);
                    }
                });
        });
}
