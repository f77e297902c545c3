use crate::constants::MIN_CROP_SIZE;
use crate::drag::DragState;
use crate::geometry::to_display_rect;
use crate::hit_test::{Handle, hit_test};
use crate::input::adjust_margin;
use crate::preview::{DisplayScale, PreviewImage, PreviewLayout, RenderSurface};
use crate::types::*;

struct LoadedPreview {
    image: PreviewImage,
    scale: DisplayScale,
}

/// State of one interactive crop session: the margins, the page currently
/// previewed and any drag in progress.
///
/// Every mutator returns `true` when the overlay needs to be redrawn; the
/// caller decides when to call [`CropSession::present`].
#[derive(Default)]
pub struct CropSession {
    margins: CropMargins,
    preview: Option<LoadedPreview>,
    drag: DragState,
}

impl CropSession {
    pub fn new(margins: CropMargins) -> Self {
        Self {
            margins,
            ..Default::default()
        }
    }

    pub fn margins(&self) -> CropMargins {
        self.margins
    }

    pub fn preview(&self) -> Option<&PreviewImage> {
        self.preview.as_ref().map(|p| &p.image)
    }

    pub fn scale(&self) -> Option<DisplayScale> {
        self.preview.as_ref().map(|p| p.scale)
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Replace the previewed page. Margins carry over, pulled in if the new
    /// page is too small for them; a drag in progress is dropped.
    pub fn set_preview(&mut self, image: PreviewImage, screen_width: f32, screen_height: f32) {
        let scale = DisplayScale::fit(image.size(), screen_width, screen_height);
        self.preview = Some(LoadedPreview { image, scale });
        self.drag = DragState::Idle;
        let fitted = self.fit_margins(self.margins);
        if fitted != self.margins {
            log::info!("Margins {:?} corrected to {:?} for this page", self.margins, fitted);
            self.margins = fitted;
        }
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
        self.drag = DragState::Idle;
    }

    /// Numeric entry, config loads and drags all land here.
    ///
    /// With a page loaded, every side the caller changed is clamped against its
    /// opposite so at least [`MIN_CROP_SIZE`] pixels stay selected; the result
    /// may therefore differ from `margins`. Without a page there is nothing to
    /// measure against and the values are kept as given.
    pub fn set_margins(&mut self, margins: CropMargins) -> bool {
        let fitted = self.fit_margins(margins);
        let changed = self.margins != fitted;
        self.margins = fitted;
        changed
    }

    fn fit_margins(&self, margins: CropMargins) -> CropMargins {
        let Some(preview) = self.preview.as_ref() else {
            return margins;
        };
        let size = preview.image.size();
        let mut next = margins;
        // Edited sides give way first, then anything still too wide
        for side in Side::ALL {
            if next.get(side) != self.margins.get(side) {
                next.clamp_side(side, size, MIN_CROP_SIZE);
            }
        }
        for side in Side::ALL {
            next.clamp_side(side, size, MIN_CROP_SIZE);
        }
        next
    }

    /// Fails when a loaded page is too small for the current margins
    pub fn check_margins(&self) -> Result<()> {
        match self.preview.as_ref() {
            Some(preview) if !self.margins.fits(preview.image.size(), MIN_CROP_SIZE) => {
                let size = preview.image.size();
                Err(CropError::InvalidInput(format!(
                    "margins {:?} leave less than {} px of a {}x{} page",
                    self.margins, MIN_CROP_SIZE, size.width, size.height
                )))
            }
            _ => Ok(()),
        }
    }

    /// Stepper buttons next to the margin fields
    pub fn adjust_margin(&mut self, side: Side, delta: i64) -> bool {
        let mut next = self.margins;
        next.set(side, adjust_margin(self.margins.get(side), delta));
        self.set_margins(next)
    }

    pub fn layout(&self) -> Option<PreviewLayout> {
        self.preview
            .as_ref()
            .map(|p| PreviewLayout::compute(self.margins, p.image.size(), p.scale))
    }

    /// Handle under the pointer, for cursor hints. While dragging this is
    /// the grabbed handle regardless of where the pointer went.
    pub fn hover(&self, pos: Point) -> Option<Handle> {
        if let Some(handle) = self.drag.active_handle() {
            return Some(handle);
        }
        let preview = self.preview.as_ref()?;
        let rect = to_display_rect(self.margins, preview.image.size(), preview.scale.value());
        hit_test(pos, &rect)
    }

    pub fn pointer_down(&mut self, pos: Point) -> Option<Handle> {
        let preview = self.preview.as_ref()?;
        let rect = to_display_rect(self.margins, preview.image.size(), preview.scale.value());
        let handle = self.drag.pointer_down(pos, &rect, self.margins);
        if let Some(handle) = handle {
            log::debug!("Grabbed {:?} at ({:.1}, {:.1})", handle, pos.x, pos.y);
        }
        handle
    }

    pub fn pointer_move(&mut self, pos: Point) -> bool {
        let Some(preview) = self.preview.as_ref() else {
            return false;
        };
        match self
            .drag
            .pointer_move(pos, preview.image.size(), preview.scale.value())
        {
            Some(next) => self.set_margins(next),
            None => false,
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(handle) = self.drag.pointer_up() {
            log::debug!("Released {:?}, margins now {:?}", handle, self.margins);
        }
    }

    /// Push the image and overlay rectangles to a drawing surface
    pub fn present(&self, surface: &mut impl RenderSurface) {
        if let (Some(preview), Some(layout)) = (self.preview.as_ref(), self.layout()) {
            surface.set_image(&preview.image);
            surface.set_rectangles(layout.crop, layout.shades);
        }
    }
}
