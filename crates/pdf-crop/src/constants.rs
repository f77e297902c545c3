//! Shared constants for cropping and conversion
//!
//! This module centralizes the fixed numbers the crop editor and the
//! converter agree on.

// =============================================================================
// Resolution
// =============================================================================

/// PDF user-space units per inch; zoom factor = dpi / POINTS_PER_INCH
pub const POINTS_PER_INCH: f32 = 72.0;

/// Resolution every interactive preview is rendered at
pub const PREVIEW_DPI: u32 = 150;

/// Zoom factor for a given output resolution
#[inline]
pub fn zoom_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / POINTS_PER_INCH
}

// =============================================================================
// Crop Editor
// =============================================================================

/// Smallest width/height (source pixels) a drag may shrink the crop window to
pub const MIN_CROP_SIZE: u32 = 10;

/// Distance (display pixels) within which a pointer grabs an edge or corner
pub const HIT_TOLERANCE: f32 = 20.0;

/// Fraction of the screen the preview image may occupy
pub const SCREEN_FILL_RATIO: f32 = 0.9;

/// Step applied by the +/- buttons next to each margin field
pub const MARGIN_STEP: i64 = 10;

// =============================================================================
// Conversion
// =============================================================================

/// Upper bound on concurrently rendering pages
pub const MAX_WORKERS: usize = 8;

/// Fallback when the platform cannot report its parallelism
pub const DEFAULT_WORKERS: usize = 4;

/// Worker count for the conversion pool
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_WORKERS)
        .clamp(1, MAX_WORKERS)
}

/// File name of a converted page (1-indexed)
pub fn page_file_name(page_index: usize) -> String {
    format!("page{}.png", page_index + 1)
}
