use pdf_async_runtime::{ConversionOptions, PdfUpdate};
use std::path::PathBuf;
use tokio::sync::mpsc;

pub async fn handle_save(
    path: PathBuf,
    options: ConversionOptions,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    match options.save(&path).await {
        Ok(()) => {
            log::info!("Configuration saved to {}", path.display());
            let _ = update_tx.send(PdfUpdate::ConfigSaved { path });
        }
        Err(e) => {
            let _ = update_tx.send(PdfUpdate::Error {
                message: format!("Failed to save configuration: {}", e),
            });
        }
    }
}

pub async fn handle_load(path: PathBuf, update_tx: &mpsc::UnboundedSender<PdfUpdate>) {
    match ConversionOptions::load(&path).await {
        Ok(options) => {
            log::info!("Configuration loaded from {}", path.display());
            let _ = update_tx.send(PdfUpdate::ConfigLoaded { options });
        }
        Err(e) => {
            let _ = update_tx.send(PdfUpdate::Error {
                message: format!("Failed to load configuration: {}", e),
            });
        }
    }
}
