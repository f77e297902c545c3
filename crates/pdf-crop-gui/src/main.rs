#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;

mod app;
mod desktop;
mod documents;
mod handlers;
mod logger;
mod ui_components;
mod views;
mod worker;

const MAX_LOG_ENTRIES: usize = 500;

fn main() -> anyhow::Result<()> {
    let logger = logger::AppLogger::new(MAX_LOG_ENTRIES, log::LevelFilter::Info);
    logger.clone().init()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("pdf-crop-worker")
        .build()?;
    let tokio_handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 720.0])
            .with_title("PDF Crop")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Crop",
        options,
        Box::new(move |cc| Ok(Box::new(app::PdfCropApp::new(cc, tokio_handle, logger)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start the UI: {e}"))?;

    // Don't wait on in-flight renders once the window is gone
    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    Ok(())
}
