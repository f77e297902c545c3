pub mod cancel;
pub mod constants;
pub mod convert;
mod document;
mod drag;
mod geometry;
pub mod input;
mod options;
pub mod pool;
mod preview;
pub mod render;
mod session;
mod types;

pub use cancel::CancelToken;
pub use convert::{
    ConversionJob, ConversionProgress, ConversionReport, InProcessRunner, PageRunner, PageTask,
    SubprocessRunner, run_conversion,
};
pub use document::probe_page_count;
pub use drag::{DragSession, DragState, apply_drag};
pub use geometry::{DisplayRect, cropped_size, from_display_rect, to_display_rect};
pub use hit_test::{CursorHint, Handle, hit_test, hit_test_with_tolerance};
pub use options::*;
pub use pool::{PoolError, TaskHandle, WorkerPool};
pub use preview::{DisplayScale, PreviewImage, PreviewLayout, RenderSurface};
pub use render::{PageRenderer, RawBitmap};
pub use session::CropSession;
pub use types::*;
