use eframe::egui;
use pdf_async_runtime::{DocumentId, PdfCommand, PdfUpdate};
use pdf_crop::constants::MIN_CROP_SIZE;
use pdf_crop::{ConversionReport, CropSession, PreviewImage, input};
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::desktop;
use crate::logger::AppLogger;
use crate::ui_components::{MarginEdit, MarginFields};
use crate::views::{
    FormAction, FormState, PageNav, PreviewWindow, show_crop_preview, show_log_panel,
    show_main_panel,
};

#[derive(Clone)]
struct ProgressState {
    operation: String,
    current: usize,
    total: usize,
}

struct LoadedDocument {
    doc_id: DocumentId,
    path: PathBuf,
    page_count: usize,
}

/// What to do once the document being loaded is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterLoad {
    Nothing,
    Preview,
    Convert,
}

pub struct PdfCropApp {
    form: FormState,
    session: CropSession,
    preview: PreviewWindow,
    /// 0-based page shown (or requested) in the preview window
    preview_page: usize,
    document: Option<LoadedDocument>,
    after_load: AfterLoad,
    converting: bool,
    /// Folder written by the last conversion that produced pages
    last_output: Option<PathBuf>,
    status: String,
    show_log: bool,
    logger: AppLogger,

    // Async infrastructure
    command_tx: mpsc::UnboundedSender<PdfCommand>,
    update_rx: mpsc::UnboundedReceiver<PdfUpdate>,

    // Progress tracking
    progress: Option<ProgressState>,

    _tokio_handle: tokio::runtime::Handle,
}

impl PdfCropApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        tokio_handle: tokio::runtime::Handle,
        logger: AppLogger,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        // Spawn worker task
        tokio_handle.spawn(crate::worker::worker_task(command_rx, update_tx));

        Self {
            form: FormState::default(),
            session: CropSession::default(),
            preview: PreviewWindow::default(),
            preview_page: 0,
            document: None,
            after_load: AfterLoad::Nothing,
            converting: false,
            last_output: None,
            status: String::new(),
            show_log: false,
            logger,
            command_tx,
            update_rx,
            progress: None,
            _tokio_handle: tokio_handle,
        }
    }

    fn send(&self, command: PdfCommand) {
        if self.command_tx.send(command).is_err() {
            log::error!("Worker task has stopped");
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });

        // Only the first file counts
        if let Some(dropped) = dropped.into_iter().next() {
            match input::resolve_dropped_path(&dropped) {
                Ok(path) => {
                    self.form.pdf_path = path.display().to_string();
                    self.form.suggest_output_dir();
                    self.open_pdf(path, AfterLoad::Nothing);
                }
                Err(e) => self.status = format!("Error: {e}"),
            }
        }
    }

    /// Load `path` unless it is already the open document, then run `after`
    fn open_pdf(&mut self, path: PathBuf, after: AfterLoad) {
        if let Err(e) = input::validate_pdf_path(&path) {
            self.status = format!("Error: {e}");
            return;
        }

        if self.document.as_ref().is_some_and(|doc| doc.path == path) {
            self.run_after_load(after);
            return;
        }

        if let Some(doc) = self.document.take() {
            self.send(PdfCommand::CloseDocument { doc_id: doc.doc_id });
        }
        self.session.close_preview();
        self.preview.close();
        self.after_load = after;
        self.status = "Loading PDF...".to_string();
        self.send(PdfCommand::LoadDocument { path });
    }

    fn with_document(&mut self, after: AfterLoad) {
        if self.form.pdf_path.trim().is_empty() {
            self.status = "Please select a PDF file".to_string();
            return;
        }
        self.open_pdf(self.form.pdf_path(), after);
    }

    fn run_after_load(&mut self, after: AfterLoad) {
        match after {
            AfterLoad::Nothing => {}
            AfterLoad::Preview => self.request_preview(),
            AfterLoad::Convert => self.start_conversion(),
        }
    }

    fn request_preview(&mut self) {
        let Some(doc) = &self.document else {
            return;
        };
        match input::parse_page_number(&self.form.preview_page, doc.page_count) {
            Ok(page_index) => self.show_page(page_index),
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn show_page(&mut self, page_index: usize) {
        let Some(doc) = &self.document else {
            return;
        };
        let doc_id = doc.doc_id;
        self.preview_page = page_index;
        self.form.preview_page = (page_index + 1).to_string();
        self.preview.open = true;
        self.status = format!("Rendering page {}...", page_index + 1);
        self.send(PdfCommand::RenderPreview { doc_id, page_index });
    }

    fn start_conversion(&mut self) {
        let Some(doc) = &self.document else {
            return;
        };
        let doc_id = doc.doc_id;

        self.form.suggest_output_dir();
        let Some(output_base) = self.form.output_dir() else {
            self.status = "Please choose an output folder".to_string();
            return;
        };

        if let Err(e) = self.session.check_margins() {
            self.status = format!("Error: {e}");
            return;
        }
        let mut options = self.form.options();
        options.margins = self.session.margins();
        log::info!(
            "Starting conversion at {} DPI with margins {:?}",
            options.quality.dpi(),
            options.margins
        );
        self.send(PdfCommand::StartConversion {
            doc_id,
            options,
            output_base,
        });
    }

    fn apply_margin_edit(&mut self, edit: MarginEdit) {
        match edit {
            MarginEdit::None => {}
            MarginEdit::Typed => {
                let typed = self.form.margins.parse();
                self.session.set_margins(typed);
                let accepted = self.session.margins();
                if accepted != typed {
                    self.status = format!(
                        "Margins corrected to {}, {}, {}, {} to keep at least {} px selected",
                        accepted.left, accepted.top, accepted.right, accepted.bottom, MIN_CROP_SIZE
                    );
                    self.form.margins = MarginFields::from_margins(accepted);
                }
            }
            MarginEdit::Step(side, delta) => {
                self.session.adjust_margin(side, delta);
                self.form.margins = MarginFields::from_margins(self.session.margins());
            }
        }
    }

    fn handle_action(&mut self, action: FormAction) {
        match action {
            FormAction::OpenPdf(path) => {
                self.form.suggest_output_dir();
                self.open_pdf(path, AfterLoad::Nothing);
            }
            FormAction::Margins(edit) => self.apply_margin_edit(edit),
            FormAction::Preview => self.with_document(AfterLoad::Preview),
            FormAction::Convert => self.with_document(AfterLoad::Convert),
            FormAction::Stop => {
                self.status = "Stopping...".to_string();
                self.send(PdfCommand::StopConversion);
            }
            FormAction::SaveConfig(path) => {
                let mut options = self.form.options();
                options.margins = self.session.margins();
                self.send(PdfCommand::SaveConfig { path, options });
            }
            FormAction::LoadConfig(path) => self.send(PdfCommand::LoadConfig { path }),
        }
    }

    fn show_preview_image(&mut self, ctx: &egui::Context, image: PreviewImage) {
        let screen = ctx
            .input(|i| i.viewport().monitor_size)
            .unwrap_or(egui::vec2(1280.0, 800.0));
        self.status = format!("Previewing page {}", image.page_index + 1);
        self.session.set_preview(image, screen.x, screen.y);
        self.form.margins = MarginFields::from_margins(self.session.margins());
        self.preview.invalidate();
        self.preview.open = true;
    }

    fn finish_conversion(&mut self, report: &ConversionReport) {
        self.converting = false;
        self.progress = None;
        self.status = if report.cancelled {
            format!(
                "Conversion stopped after {} of {} pages",
                report.completed, report.total
            )
        } else if report.failed > 0 {
            format!(
                "Converted {} of {} pages into {} ({} failed, see log)",
                report.succeeded(),
                report.total,
                report.output_dir.display(),
                report.failed
            )
        } else {
            format!(
                "Converted {} pages into {}",
                report.total,
                report.output_dir.display()
            )
        };

        if report.succeeded() > 0 {
            self.last_output = Some(report.output_dir.clone());
            if !report.cancelled {
                desktop::offer_to_open(&report.output_dir, report.succeeded());
            }
        }
    }

    fn process_update(&mut self, ctx: &egui::Context, update: PdfUpdate) {
        match update {
            PdfUpdate::DocumentLoaded {
                doc_id,
                path,
                page_count,
            } => {
                self.status = format!("Loaded PDF with {} pages", page_count);
                self.document = Some(LoadedDocument {
                    doc_id,
                    path,
                    page_count,
                });
                let after = std::mem::replace(&mut self.after_load, AfterLoad::Nothing);
                self.run_after_load(after);
            }
            PdfUpdate::PreviewRendered { doc_id, image } => {
                let current = self.document.as_ref().map(|doc| doc.doc_id);
                // Late renders for a closed document or a page navigated away from
                if current == Some(doc_id) && image.page_index == self.preview_page {
                    self.show_preview_image(ctx, image);
                }
            }
            PdfUpdate::Progress {
                operation,
                current,
                total,
            } => {
                self.progress = Some(ProgressState {
                    operation,
                    current,
                    total,
                });
                ctx.request_repaint();
            }
            PdfUpdate::ConversionStarted { total, output_dir } => {
                self.converting = true;
                self.progress = Some(ProgressState {
                    operation: "Converting pages".to_string(),
                    current: 0,
                    total,
                });
                self.status = format!("Converting {} pages into {}", total, output_dir.display());
            }
            PdfUpdate::ConversionFinished { report } => self.finish_conversion(&report),
            PdfUpdate::ConversionFailed { message } => {
                self.converting = false;
                self.progress = None;
                self.status = format!("Error: {message}");
            }
            PdfUpdate::ConfigLoaded { options } => {
                self.form.apply_options(&options);
                self.session.set_margins(options.margins);
                self.form.margins = MarginFields::from_margins(self.session.margins());
                self.status = "Configuration loaded".to_string();
            }
            PdfUpdate::ConfigSaved { path } => {
                self.status = format!("Configuration saved to {}", path.display());
            }
            PdfUpdate::Error { message } => {
                self.status = format!("Error: {message}");
                self.after_load = AfterLoad::Nothing;
            }
            PdfUpdate::DocumentClosed { doc_id } => {
                log::debug!("Closed {}", doc_id);
            }
        }
    }
}

impl eframe::App for PdfCropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        // Process all pending updates from worker
        while let Ok(update) = self.update_rx.try_recv() {
            self.process_update(ctx, update);
        }

        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.toggle_value(&mut self.show_log, "📜 Log");
            });
        });

        show_log_panel(ctx, &self.logger, &mut self.show_log);

        let mut actions = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                actions = show_main_panel(ui, &mut self.form, self.converting);

                // Show progress bar
                if let Some(ref progress) = self.progress {
                    ui.separator();
                    ui.label(&progress.operation);
                    ui.add(
                        egui::ProgressBar::new(
                            progress.current as f32 / progress.total.max(1) as f32,
                        )
                        .text(format!("{} / {}", progress.current, progress.total)),
                    );
                }

                ui.separator();
                if let Some(dir) = self.last_output.as_ref().filter(|_| !self.converting) {
                    if ui.button("📂 Open output folder").clicked() {
                        desktop::open_folder(dir);
                    }
                }
                if !self.status.is_empty() {
                    ui.label(&self.status);
                } else if let Some(message) = self.logger.latest_message() {
                    ui.label(egui::RichText::new(message).weak());
                }
            });
        });

        for action in actions {
            self.handle_action(action);
        }

        let nav = PageNav {
            current: self.preview_page,
            total: self.document.as_ref().map_or(0, |doc| doc.page_count),
        };
        let response = show_crop_preview(ctx, &mut self.preview, &mut self.session, nav);
        if response.margins_changed {
            self.form.margins = MarginFields::from_margins(self.session.margins());
        }
        if let Some(page_index) = response.navigate {
            self.show_page(page_index);
        }

        if self.converting {
            // Keep polling the worker while pages complete in the background
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
