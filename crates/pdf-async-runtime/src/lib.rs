use std::path::PathBuf;

// Re-export types from library crates
pub use pdf_crop::{ConversionOptions, ConversionReport, PreviewImage};

/// Commands sent from UI to worker
#[derive(Debug)]
pub enum PdfCommand {
    /// Probe a PDF and report its page count
    LoadDocument {
        path: PathBuf,
    },
    /// Render one page at preview resolution
    RenderPreview {
        doc_id: DocumentId,
        page_index: usize,
    },
    StartConversion {
        doc_id: DocumentId,
        options: ConversionOptions,
        /// Directory chosen by the user; pages go into `<output_base>/<stem>/`
        output_base: PathBuf,
    },
    /// Ask the running conversion to stop after the page in flight
    StopConversion,
    SaveConfig {
        path: PathBuf,
        options: ConversionOptions,
    },
    LoadConfig {
        path: PathBuf,
    },
    CloseDocument {
        doc_id: DocumentId,
    },
}

/// Updates sent from worker to UI
#[derive(Debug, Clone)]
pub enum PdfUpdate {
    DocumentLoaded {
        doc_id: DocumentId,
        path: PathBuf,
        page_count: usize,
    },
    PreviewRendered {
        doc_id: DocumentId,
        image: PreviewImage,
    },
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    ConversionStarted {
        total: usize,
        output_dir: PathBuf,
    },
    ConversionFinished {
        report: ConversionReport,
    },
    /// The run could not start or aborted as a whole (not a single page failing)
    ConversionFailed {
        message: String,
    },
    ConfigLoaded {
        options: ConversionOptions,
    },
    ConfigSaved {
        path: PathBuf,
    },
    Error {
        message: String,
    },
    DocumentClosed {
        doc_id: DocumentId,
    },
}

/// Handle to a loaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u64);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}
