//! Lightweight document inspection that does not need pdfium

use crate::input::validate_pdf_path;
use crate::types::*;
use lopdf::Document;
use std::path::Path;

/// Validate `path` and count its pages
pub async fn probe_page_count(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref().to_owned();
    validate_pdf_path(&path)?;
    let bytes = tokio::fs::read(&path).await?;
    let doc = tokio::task::spawn_blocking(move || Document::load_mem(&bytes)).await??;
    let count = doc.get_pages().len();
    if count == 0 {
        return Err(CropError::InvalidInput(format!(
            "{} has no pages",
            path.display()
        )));
    }
    Ok(count)
}
