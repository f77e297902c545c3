pub mod crop_preview;
pub mod log_panel;
pub mod main_panel;

pub use crop_preview::{PageNav, PreviewWindow, show_crop_preview};
pub use log_panel::show_log_panel;
pub use main_panel::{FormAction, FormState, show_main_panel};
