use pdf_async_runtime::{ConversionOptions, DocumentId, PdfUpdate};
use pdf_crop::constants::default_worker_count;
use pdf_crop::{
    CancelToken, ConversionJob, InProcessRunner, PageRenderer, PageRunner, SubprocessRunner,
    WorkerPool, run_conversion,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::documents::DocumentStore;

/// The one conversion allowed to run at a time
pub struct ActiveConversion {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl ActiveConversion {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Pick how conversion pages get rendered, and by how many workers.
///
/// PDFium serialises every binding inside one process, so real parallelism
/// needs a process per page; in-process rendering runs one page at a time.
pub fn conversion_runner(
    renderer: Option<&Arc<dyn PageRenderer>>,
    worker_program: Option<&Path>,
) -> Option<(Arc<dyn PageRunner>, usize)> {
    match (worker_program, renderer) {
        (Some(program), _) => Some((
            Arc::new(SubprocessRunner::new(program)) as Arc<dyn PageRunner>,
            default_worker_count(),
        )),
        (None, Some(renderer)) => {
            log::warn!("pdfcrop not found next to this program; rendering one page at a time");
            let runner = InProcessRunner::new(renderer.clone());
            Some((Arc::new(runner) as Arc<dyn PageRunner>, 1))
        }
        (None, None) => None,
    }
}

pub fn handle_start(
    doc_id: DocumentId,
    options: ConversionOptions,
    output_base: PathBuf,
    store: &DocumentStore,
    runner: Option<(Arc<dyn PageRunner>, usize)>,
    active: &mut Option<ActiveConversion>,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    let send_error = |message: String| {
        let _ = update_tx.send(PdfUpdate::Error { message });
    };

    if active.as_ref().is_some_and(ActiveConversion::is_running) {
        send_error("A conversion is already running".to_string());
        return;
    }
    if let Err(e) = options.validate() {
        send_error(e.to_string());
        return;
    }
    let Some(document) = store.get_document(&doc_id) else {
        send_error(format!("Document not found: {}", doc_id));
        return;
    };
    let Some((runner, workers)) = runner else {
        send_error("Conversion not available (built without PDFium)".to_string());
        return;
    };

    let job = ConversionJob::new(
        document.path.clone(),
        document.page_count,
        &options,
        &output_base,
    );
    let _ = update_tx.send(PdfUpdate::ConversionStarted {
        total: job.total_pages,
        output_dir: job.output_dir.clone(),
    });

    let cancel = CancelToken::new();
    let handle = tokio::spawn(run_job(
        job,
        runner,
        workers,
        cancel.clone(),
        update_tx.clone(),
    ));
    *active = Some(ActiveConversion { cancel, handle });
}

async fn run_job(
    job: ConversionJob,
    runner: Arc<dyn PageRunner>,
    workers: usize,
    cancel: CancelToken,
    update_tx: mpsc::UnboundedSender<PdfUpdate>,
) {
    let pool = WorkerPool::new(workers);

    let result = run_conversion(&job, runner, &pool, &cancel, |progress| {
        let _ = update_tx.send(PdfUpdate::Progress {
            operation: "Converting pages".to_string(),
            current: progress.completed,
            total: progress.total,
        });
    })
    .await;

    match result {
        Ok(report) => {
            let _ = update_tx.send(PdfUpdate::ConversionFinished { report });
        }
        Err(e) => {
            let _ = update_tx.send(PdfUpdate::ConversionFailed {
                message: format!("Conversion failed: {}", e),
            });
        }
    }
}

pub fn handle_stop(active: &Option<ActiveConversion>) {
    match active {
        Some(conversion) if conversion.is_running() => {
            log::info!("Stopping conversion...");
            conversion.stop();
        }
        _ => log::debug!("Stop requested with no conversion running"),
    }
}
