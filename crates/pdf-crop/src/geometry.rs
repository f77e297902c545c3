use crate::types::*;

/// Crop window in display coordinates (pixels on screen, origin at the
/// image's top-left corner)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Strictly inside on both axes
    pub fn contains(&self, p: Point) -> bool {
        self.left < p.x && p.x < self.right && self.top < p.y && p.y < self.bottom
    }
}

/// Map source-pixel margins onto the scaled preview
pub fn to_display_rect(margins: CropMargins, image: ImageSize, scale: f32) -> DisplayRect {
    DisplayRect {
        left: margins.left as f32 * scale,
        top: margins.top as f32 * scale,
        right: (image.width as f32 - margins.right as f32) * scale,
        bottom: (image.height as f32 - margins.bottom as f32) * scale,
    }
}

/// Inverse of [`to_display_rect`], rounding to the nearest source pixel
pub fn from_display_rect(rect: DisplayRect, image: ImageSize, scale: f32) -> CropMargins {
    if scale <= 0.0 {
        return CropMargins::default();
    }
    let to_px = |v: f32| (v / scale).round().max(0.0) as u32;
    CropMargins {
        left: to_px(rect.left),
        top: to_px(rect.top),
        right: image.width.saturating_sub(to_px(rect.right)),
        bottom: image.height.saturating_sub(to_px(rect.bottom)),
    }
}

/// Size of the region left after cropping, never negative
pub fn cropped_size(margins: CropMargins, image: ImageSize) -> (u32, u32) {
    (
        image
            .width
            .saturating_sub(margins.left)
            .saturating_sub(margins.right),
        image
            .height
            .saturating_sub(margins.top)
            .saturating_sub(margins.bottom),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_margins_at_half_scale() {
        let rect = to_display_rect(CropMargins::default(), ImageSize::new(1000, 1400), 0.5);
        assert_eq!(rect, DisplayRect::new(0.0, 0.0, 500.0, 700.0));
    }

    #[test]
    fn test_display_rect_with_margins() {
        let margins = CropMargins::new(100, 50, 200, 150);
        let rect = to_display_rect(margins, ImageSize::new(1000, 1400), 0.5);
        assert_eq!(rect.left, 50.0);
        assert_eq!(rect.top, 25.0);
        assert_eq!(rect.right, 400.0);
        assert_eq!(rect.bottom, 625.0);
        assert_eq!(rect.width(), 350.0);
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        let image = ImageSize::new(1275, 1650);
        for scale in [0.37_f32, 0.5, 0.613, 0.9, 1.0] {
            for margins in [
                CropMargins::new(0, 0, 0, 0),
                CropMargins::new(13, 77, 101, 9),
                CropMargins::new(600, 800, 600, 800),
            ] {
                let back = from_display_rect(to_display_rect(margins, image, scale), image, scale);
                for side in Side::ALL {
                    let diff = back.get(side) as i64 - margins.get(side) as i64;
                    assert!(diff.abs() <= 1, "{side:?} drifted by {diff} at scale {scale}");
                }
            }
        }
    }

    #[test]
    fn test_cropped_size_saturates() {
        let image = ImageSize::new(100, 80);
        assert_eq!(cropped_size(CropMargins::new(10, 5, 20, 5), image), (70, 70));
        assert_eq!(cropped_size(CropMargins::new(60, 50, 60, 50), image), (0, 0));
    }
}
