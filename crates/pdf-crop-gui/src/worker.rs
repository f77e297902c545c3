use pdf_async_runtime::{PdfCommand, PdfUpdate};
use pdf_crop::PageRenderer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::documents::DocumentStore;
use crate::handlers;
use crate::handlers::convert::ActiveConversion;

/// Everything the worker keeps between commands
pub struct WorkerState {
    store: DocumentStore,
    renderer: Option<Arc<dyn PageRenderer>>,
    /// `pdfcrop` binary that renders conversion pages out of process
    worker_program: Option<PathBuf>,
    conversion: Option<ActiveConversion>,
}

impl WorkerState {
    pub fn new(renderer: Option<Arc<dyn PageRenderer>>) -> Self {
        Self {
            store: DocumentStore::new(),
            renderer,
            worker_program: None,
            conversion: None,
        }
    }

    pub fn with_worker_program(mut self, program: Option<PathBuf>) -> Self {
        self.worker_program = program;
        self
    }
}

/// The `pdfcrop` CLI installed beside `exe`, if there is one
pub fn locate_worker_program(exe: &Path) -> Option<PathBuf> {
    let program = exe.with_file_name(format!("pdfcrop{}", std::env::consts::EXE_SUFFIX));
    program.is_file().then_some(program)
}

#[cfg(feature = "pdfium")]
fn default_renderer() -> Option<Arc<dyn PageRenderer>> {
    // Fail early with a readable message instead of on the first render
    match pdf_crop::render::init_pdfium() {
        Ok(_) => Some(Arc::new(pdf_crop::render::PdfiumRenderer)),
        Err(e) => {
            log::error!("Failed to initialize PDFium: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "pdfium"))]
fn default_renderer() -> Option<Arc<dyn PageRenderer>> {
    None
}

/// Async worker task that processes PDF commands and sends updates
pub async fn worker_task(
    command_rx: mpsc::UnboundedReceiver<PdfCommand>,
    update_tx: mpsc::UnboundedSender<PdfUpdate>,
) {
    let renderer = tokio::task::spawn_blocking(default_renderer)
        .await
        .ok()
        .flatten();
    if renderer.is_none() {
        let _ = update_tx.send(PdfUpdate::Error {
            message: "PDF rendering unavailable; previews and conversion are disabled"
                .to_string(),
        });
    }
    let worker_program = std::env::current_exe()
        .ok()
        .and_then(|exe| locate_worker_program(&exe));
    match &worker_program {
        Some(program) => log::info!("Conversion pages render through {}", program.display()),
        None => log::info!("No pdfcrop beside this program; conversion renders in-process"),
    }
    let state = WorkerState::new(renderer).with_worker_program(worker_program);
    run_worker(state, command_rx, update_tx).await;
}

pub async fn run_worker(
    mut state: WorkerState,
    mut command_rx: mpsc::UnboundedReceiver<PdfCommand>,
    update_tx: mpsc::UnboundedSender<PdfUpdate>,
) {
    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut state, &mut command_rx, &update_tx).await;
    }

    // UI is gone; don't leave pages rendering behind it
    if let Some(conversion) = &state.conversion {
        conversion.stop();
    }
}

async fn process_command(
    cmd: PdfCommand,
    state: &mut WorkerState,
    command_rx: &mut mpsc::UnboundedReceiver<PdfCommand>,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    match cmd {
        PdfCommand::LoadDocument { path } => {
            handlers::document::handle_load(path, &mut state.store, update_tx).await;
        }
        PdfCommand::RenderPreview {
            mut doc_id,
            mut page_index,
        } => {
            // Deduplicate render commands - keep the most recent one
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let PdfCommand::RenderPreview {
                    doc_id: new_doc_id,
                    page_index: new_page_index,
                } = next_cmd
                {
                    log::debug!("Discarding queued preview render, using newer request");
                    doc_id = new_doc_id;
                    page_index = new_page_index;
                } else {
                    // Non-render command found, process it before rendering
                    Box::pin(process_command(next_cmd, state, command_rx, update_tx)).await;
                }
            }

            handlers::preview::handle_render_preview(
                doc_id,
                page_index,
                &mut state.store,
                state.renderer.as_ref(),
                update_tx,
            )
            .await;
        }
        PdfCommand::StartConversion {
            doc_id,
            options,
            output_base,
        } => {
            handlers::convert::handle_start(
                doc_id,
                options,
                output_base,
                &state.store,
                handlers::convert::conversion_runner(
                    state.renderer.as_ref(),
                    state.worker_program.as_deref(),
                ),
                &mut state.conversion,
                update_tx,
            );
        }
        PdfCommand::StopConversion => {
            handlers::convert::handle_stop(&state.conversion);
        }
        PdfCommand::SaveConfig { path, options } => {
            handlers::config::handle_save(path, options, update_tx).await;
        }
        PdfCommand::LoadConfig { path } => {
            handlers::config::handle_load(path, update_tx).await;
        }
        PdfCommand::CloseDocument { doc_id } => {
            handlers::document::handle_close(doc_id, &mut state.store, update_tx).await;
        }
    }
}
