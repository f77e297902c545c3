use crate::constants::SCREEN_FILL_RATIO;
use crate::geometry::{DisplayRect, cropped_size, to_display_rect};
use crate::render::RawBitmap;
use crate::types::*;

/// One page rendered at the preview resolution
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    /// Zero-based page index
    pub page_index: usize,
    pub bitmap: RawBitmap,
}

impl PreviewImage {
    pub fn new(page_index: usize, bitmap: RawBitmap) -> Self {
        Self { page_index, bitmap }
    }

    pub fn size(&self) -> ImageSize {
        self.bitmap.size()
    }
}

/// Ratio of display pixels to image pixels, never above 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale(f32);

impl Default for DisplayScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl DisplayScale {
    /// Largest scale that fits the image into 90% of the screen without upscaling
    pub fn fit(image: ImageSize, screen_width: f32, screen_height: f32) -> Self {
        if image.width == 0 || image.height == 0 {
            return Self::default();
        }
        let fit_w = SCREEN_FILL_RATIO * screen_width / image.width as f32;
        let fit_h = SCREEN_FILL_RATIO * screen_height / image.height as f32;
        let scale = fit_w.min(fit_h).min(1.0);
        if scale.is_finite() && scale > 0.0 {
            Self(scale)
        } else {
            Self::default()
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Display size of an image drawn at this scale
    pub fn display_size(self, image: ImageSize) -> (f32, f32) {
        (image.width as f32 * self.0, image.height as f32 * self.0)
    }
}

/// Everything needed to draw the crop overlay for the current margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewLayout {
    pub scale: DisplayScale,
    pub image_size: ImageSize,
    /// Scaled image dimensions
    pub display_width: f32,
    pub display_height: f32,
    pub crop: DisplayRect,
    /// Excluded bands in the order top, bottom, left, right
    pub shades: [DisplayRect; 4],
    /// Selected region in source pixels
    pub selected: (u32, u32),
}

impl PreviewLayout {
    pub fn compute(margins: CropMargins, image: ImageSize, scale: DisplayScale) -> Self {
        let (display_width, display_height) = scale.display_size(image);
        let crop = to_display_rect(margins, image, scale.value());
        let DisplayRect {
            left: l,
            top: t,
            right: r,
            bottom: b,
        } = crop;

        let shades = [
            DisplayRect::new(0.0, 0.0, display_width, t),
            DisplayRect::new(0.0, b, display_width, display_height),
            DisplayRect::new(0.0, t, l, b),
            DisplayRect::new(r, t, display_width, b),
        ];

        Self {
            scale,
            image_size: image,
            display_width,
            display_height,
            crop,
            shades,
            selected: cropped_size(margins, image),
        }
    }

    pub fn size_label(&self) -> String {
        format!("{} x {} px", self.selected.0, self.selected.1)
    }
}

/// Drawing target for the preview. The crop editor only produces
/// coordinates; whatever implements this does the painting.
pub trait RenderSurface {
    fn set_image(&mut self, image: &PreviewImage);
    fn set_rectangles(&mut self, main: DisplayRect, shades: [DisplayRect; 4]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_never_upscales() {
        let scale = DisplayScale::fit(ImageSize::new(400, 300), 3840.0, 2160.0);
        assert_eq!(scale.value(), 1.0);
    }

    #[test]
    fn test_scale_fits_ninety_percent_of_screen() {
        // Letter page at 150 DPI on a 1080p screen: height is the binding axis
        let scale = DisplayScale::fit(ImageSize::new(1275, 1650), 1920.0, 1080.0);
        let expected = 0.9 * 1080.0 / 1650.0;
        assert!((scale.value() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_sized_image_uses_unit_scale() {
        assert_eq!(DisplayScale::fit(ImageSize::new(0, 10), 800.0, 600.0).value(), 1.0);
    }

    #[test]
    fn test_shades_cover_excluded_bands() {
        let layout = PreviewLayout::compute(
            CropMargins::new(100, 200, 300, 400),
            ImageSize::new(1000, 1400),
            DisplayScale(0.5),
        );
        assert_eq!(layout.crop, DisplayRect::new(50.0, 100.0, 350.0, 500.0));
        let [top, bottom, left, right] = layout.shades;
        assert_eq!(top, DisplayRect::new(0.0, 0.0, 500.0, 100.0));
        assert_eq!(bottom, DisplayRect::new(0.0, 500.0, 500.0, 700.0));
        assert_eq!(left, DisplayRect::new(0.0, 100.0, 50.0, 500.0));
        assert_eq!(right, DisplayRect::new(350.0, 100.0, 500.0, 500.0));
        assert_eq!(layout.selected, (600, 800));
        assert_eq!(layout.size_label(), "600 x 800 px");
    }
}
