//! Page rasterisation and the full-resolution crop

use crate::types::*;
use image::{ImageFormat, RgbaImage};
use std::path::Path;

#[cfg(feature = "pdfium")]
pub use self::pdfium::{PdfiumRenderer, init_pdfium};

/// Decoded RGBA page raster
#[derive(Clone, PartialEq)]
pub struct RawBitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 4 bytes per pixel
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for RawBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl RawBitmap {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(CropError::Render(format!(
                "Bitmap of {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Opaque white page
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![255; width as usize * height as usize * 4],
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    pub fn into_image(self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba)
            .ok_or_else(|| CropError::Render("Bitmap buffer does not match its size".to_string()))
    }
}

/// PDF rasteriser. Every call opens its own handle to the document, so
/// separate workers never share state.
pub trait PageRenderer: Send + Sync {
    fn page_count(&self, path: &Path) -> Result<usize>;

    /// Render page `page_index` (0-based) at `zoom` (1.0 = 72 DPI)
    fn render_page(&self, path: &Path, page_index: usize, zoom: f32) -> Result<RawBitmap>;
}

impl<R: PageRenderer + ?Sized> PageRenderer for std::sync::Arc<R> {
    fn page_count(&self, path: &Path) -> Result<usize> {
        (**self).page_count(path)
    }

    fn render_page(&self, path: &Path, page_index: usize, zoom: f32) -> Result<RawBitmap> {
        (**self).render_page(path, page_index, zoom)
    }
}

/// Pixel box `(x, y, width, height)` kept from a `size` render.
///
/// Margins are pixel counts in the render's own space. Oversized margins
/// still leave at least a 1x1 region.
pub fn crop_bounds(margins: CropMargins, size: ImageSize) -> (u32, u32, u32, u32) {
    let width = size.width.max(1);
    let height = size.height.max(1);
    let left = margins.left.min(width - 1);
    let top = margins.top.min(height - 1);
    let right = (left + 1).max(width.saturating_sub(margins.right));
    let bottom = (top + 1).max(height.saturating_sub(margins.bottom));
    (left, top, right - left, bottom - top)
}

/// Cut the margins off a full-resolution render
pub fn crop_bitmap(bitmap: RawBitmap, margins: CropMargins) -> Result<RgbaImage> {
    let (x, y, w, h) = crop_bounds(margins, bitmap.size());
    let image = bitmap.into_image()?;
    Ok(image::imageops::crop_imm(&image, x, y, w, h).to_image())
}

/// Write an image as PNG, creating nothing but the file itself
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::*;
    use pdfium_render::prelude::*;

    /// Initialize Pdfium, trying the vendored library first, then falling back to system
    pub fn init_pdfium() -> std::result::Result<Pdfium, PdfiumError> {
        // Try to load from vendor directory (relative to workspace root)
        let vendor_path = std::env::current_dir().ok().and_then(|mut p| {
            p.push("vendor/pdfium/lib");
            if p.exists() { Some(p) } else { None }
        });

        if let Some(vendor_path) = vendor_path {
            if let Ok(binding) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
            {
                return Ok(Pdfium::new(binding));
            }
        }

        // Fallback to system library or default search paths
        Pdfium::bind_to_system_library().map(Pdfium::new)
    }

    fn render_error(e: PdfiumError) -> CropError {
        CropError::Render(e.to_string())
    }

    /// Rasteriser backed by pdfium; binds the library per call
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PdfiumRenderer;

    impl PageRenderer for PdfiumRenderer {
        fn page_count(&self, path: &Path) -> Result<usize> {
            let pdfium = init_pdfium().map_err(render_error)?;
            let document = pdfium
                .load_pdf_from_file(path, None)
                .map_err(render_error)?;
            Ok(document.pages().len() as usize)
        }

        fn render_page(&self, path: &Path, page_index: usize, zoom: f32) -> Result<RawBitmap> {
            let pdfium = init_pdfium().map_err(render_error)?;
            let document = pdfium
                .load_pdf_from_file(path, None)
                .map_err(render_error)?;
            let count = document.pages().len() as usize;
            if page_index >= count {
                return Err(CropError::PageIndexOutOfRange {
                    page: page_index + 1,
                    count,
                });
            }
            let page = document
                .pages()
                .get(page_index as u16)
                .map_err(render_error)?;

            let config = PdfRenderConfig::new().scale_page_by_factor(zoom);
            let bitmap = page.render_with_config(&config).map_err(render_error)?;
            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            RawBitmap::new(width, height, bitmap.as_rgba_bytes().to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_bounds_applies_margins() {
        let bounds = crop_bounds(CropMargins::new(10, 20, 30, 40), ImageSize::new(200, 300));
        assert_eq!(bounds, (10, 20, 160, 240));
    }

    #[test]
    fn test_crop_bounds_never_empty() {
        let bounds = crop_bounds(CropMargins::new(500, 500, 500, 500), ImageSize::new(200, 300));
        assert_eq!(bounds, (199, 299, 1, 1));
        let bounds = crop_bounds(CropMargins::new(150, 0, 100, 0), ImageSize::new(200, 300));
        assert_eq!(bounds, (150, 0, 1, 300));
    }

    #[test]
    fn test_bitmap_size_checked() {
        assert!(RawBitmap::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            RawBitmap::new(2, 2, vec![0; 15]),
            Err(CropError::Render(_))
        ));
    }

    #[test]
    fn test_crop_bitmap_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page1.png");
        let cropped = crop_bitmap(RawBitmap::blank(40, 30), CropMargins::new(5, 5, 10, 0)).unwrap();
        assert_eq!(cropped.dimensions(), (25, 25));
        save_png(&cropped, &path).unwrap();
        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (25, 25));
    }
}
