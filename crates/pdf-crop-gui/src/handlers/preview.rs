use pdf_async_runtime::{DocumentId, PdfUpdate};
use pdf_crop::constants::{PREVIEW_DPI, zoom_for_dpi};
use pdf_crop::{CropError, PageRenderer, PreviewImage};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::documents::DocumentStore;

/// Render `page_index` at preview resolution, serving repeat requests from the cache
pub async fn handle_render_preview(
    doc_id: DocumentId,
    page_index: usize,
    store: &mut DocumentStore,
    renderer: Option<&Arc<dyn PageRenderer>>,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    let cache_key = (doc_id, page_index);

    if let Some(cached) = store.get_from_cache(&cache_key) {
        let _ = update_tx.send(PdfUpdate::PreviewRendered {
            doc_id,
            image: cached.clone(),
        });
        return;
    }

    let Some(document) = store.get_document(&doc_id) else {
        let _ = update_tx.send(PdfUpdate::Error {
            message: format!("Document not found: {}", doc_id),
        });
        return;
    };

    if page_index >= document.page_count {
        let error = CropError::PageIndexOutOfRange {
            page: page_index + 1,
            count: document.page_count,
        };
        let _ = update_tx.send(PdfUpdate::Error {
            message: error.to_string(),
        });
        return;
    }

    let Some(renderer) = renderer.cloned() else {
        let _ = update_tx.send(PdfUpdate::Error {
            message: "Preview not available (built without PDFium)".to_string(),
        });
        return;
    };

    let path = document.path.clone();
    match tokio::task::spawn_blocking(move || {
        renderer.render_page(&path, page_index, zoom_for_dpi(PREVIEW_DPI))
    })
    .await
    {
        Ok(Ok(bitmap)) => {
            let image = PreviewImage::new(page_index, bitmap);
            log::debug!(
                "Rendered preview of page {} ({}x{})",
                page_index + 1,
                image.size().width,
                image.size().height
            );
            store.add_to_cache(cache_key, image.clone());
            let _ = update_tx.send(PdfUpdate::PreviewRendered { doc_id, image });
        }
        Ok(Err(e)) => {
            let _ = update_tx.send(PdfUpdate::Error {
                message: format!("Failed to render page {}: {}", page_index + 1, e),
            });
        }
        Err(e) => {
            let _ = update_tx.send(PdfUpdate::Error {
                message: format!("Task join error: {}", e),
            });
        }
    }
}
