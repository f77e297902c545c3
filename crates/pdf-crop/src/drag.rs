use crate::constants::MIN_CROP_SIZE;
use crate::geometry::{DisplayRect, cropped_size};
use crate::hit_test::{Handle, hit_test};
use crate::types::*;

/// Snapshot taken when a drag begins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub handle: Handle,
    pub start: Point,
    pub start_margins: CropMargins,
}

/// Pointer-drag lifecycle of the crop editor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn active_handle(&self) -> Option<Handle> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(session) => Some(session.handle),
        }
    }

    /// Start a drag if `pos` lands on a handle of `rect`
    pub fn pointer_down(
        &mut self,
        pos: Point,
        rect: &DisplayRect,
        margins: CropMargins,
    ) -> Option<Handle> {
        let handle = hit_test(pos, rect)?;
        *self = DragState::Dragging(DragSession {
            handle,
            start: pos,
            start_margins: margins,
        });
        Some(handle)
    }

    /// Margins implied by the pointer being at `pos`; `None` when idle
    pub fn pointer_move(&self, pos: Point, image: ImageSize, scale: f32) -> Option<CropMargins> {
        let DragState::Dragging(session) = self else {
            return None;
        };
        if scale <= 0.0 {
            return Some(session.start_margins);
        }
        let dx = (pos.x - session.start.x) as f64 / scale as f64;
        let dy = (pos.y - session.start.y) as f64 / scale as f64;
        Some(apply_drag(
            session.handle,
            session.start_margins,
            (dx, dy),
            image,
        ))
    }

    /// End the drag, returning the handle that was held
    pub fn pointer_up(&mut self) -> Option<Handle> {
        let handle = self.active_handle();
        *self = DragState::Idle;
        handle
    }
}

/// Offset a margin by a fractional pixel delta, truncating toward zero
fn shifted(value: u32, delta: f64) -> i64 {
    (value as f64 + delta) as i64
}

/// Clamp into `[0, upper]`, where a negative upper bound collapses to 0
fn clamp_margin(value: i64, upper: i64) -> u32 {
    value.clamp(0, upper.max(0)) as u32
}

/// Apply an image-pixel delta `(dx, dy)` to the margins captured at drag start.
///
/// `Move` translates the window and keeps its size exactly. Every other handle
/// rewrites only its own margins, each clamped so that at least
/// [`MIN_CROP_SIZE`] pixels remain against the opposite margin.
pub fn apply_drag(
    handle: Handle,
    start: CropMargins,
    (dx, dy): (f64, f64),
    image: ImageSize,
) -> CropMargins {
    let width = image.width as i64;
    let height = image.height as i64;
    let min = MIN_CROP_SIZE as i64;

    if handle == Handle::Move {
        let (crop_w, crop_h) = cropped_size(start, image);
        let left = clamp_margin(shifted(start.left, dx), width - crop_w as i64);
        let top = clamp_margin(shifted(start.top, dy), height - crop_h as i64);
        return CropMargins {
            left,
            top,
            right: image.width - left - crop_w,
            bottom: image.height - top - crop_h,
        };
    }

    let mut next = start;
    for side in handle.sides() {
        match side {
            Side::Left => {
                next.left = clamp_margin(
                    shifted(start.left, dx),
                    width - start.right as i64 - min,
                );
            }
            Side::Right => {
                next.right = clamp_margin(
                    shifted(start.right, -dx),
                    width - start.left as i64 - min,
                );
            }
            Side::Top => {
                next.top = clamp_margin(
                    shifted(start.top, dy),
                    height - start.bottom as i64 - min,
                );
            }
            Side::Bottom => {
                next.bottom = clamp_margin(
                    shifted(start.bottom, -dy),
                    height - start.top as i64 - min,
                );
            }
        }
    }
    next
}
