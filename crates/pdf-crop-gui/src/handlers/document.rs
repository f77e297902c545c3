use pdf_async_runtime::{DocumentId, PdfUpdate};
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::documents::DocumentStore;

pub async fn handle_load(
    path: PathBuf,
    store: &mut DocumentStore,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    match pdf_crop::probe_page_count(&path).await {
        Ok(page_count) => {
            let doc_id = store.next_id();
            store.add_document(doc_id, path.clone(), page_count);
            log::info!("Opened {} ({} pages)", path.display(), page_count);
            let _ = update_tx.send(PdfUpdate::DocumentLoaded {
                doc_id,
                path,
                page_count,
            });
        }
        Err(e) => {
            let _ = update_tx.send(PdfUpdate::Error {
                message: format!("Failed to open PDF: {}", e),
            });
        }
    }
}

pub async fn handle_close(
    doc_id: DocumentId,
    store: &mut DocumentStore,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    store.remove_document(doc_id);
    let _ = update_tx.send(PdfUpdate::DocumentClosed { doc_id });
}
