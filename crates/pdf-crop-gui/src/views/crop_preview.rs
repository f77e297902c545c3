use eframe::egui;
use pdf_crop::{CropSession, CursorHint, DisplayRect, Point, PreviewImage, RenderSurface};

const SHADE: egui::Color32 = egui::Color32::from_rgba_premultiplied(0, 0, 0, 110);
const OUTLINE: egui::Color32 = egui::Color32::from_rgb(230, 30, 30);

/// The preview window's own state; margins live in the [`CropSession`]
#[derive(Default)]
pub struct PreviewWindow {
    pub open: bool,
    texture: Option<egui::TextureHandle>,
    stale: bool,
}

impl PreviewWindow {
    /// A new page arrived; upload it on the next frame
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.texture = None;
    }
}

/// Page position shown in the navigation row
#[derive(Debug, Clone, Copy)]
pub struct PageNav {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
pub struct PreviewResponse {
    pub margins_changed: bool,
    /// 0-based page the user navigated to
    pub navigate: Option<usize>,
}

/// Paints into the canvas allocated for the preview
struct CanvasSurface<'a> {
    ctx: &'a egui::Context,
    painter: &'a egui::Painter,
    image_rect: egui::Rect,
    window: &'a mut PreviewWindow,
}

impl CanvasSurface<'_> {
    fn to_screen(&self, rect: DisplayRect) -> egui::Rect {
        let origin = self.image_rect.min;
        egui::Rect::from_min_max(
            origin + egui::vec2(rect.left, rect.top),
            origin + egui::vec2(rect.right, rect.bottom),
        )
    }
}

impl RenderSurface for CanvasSurface<'_> {
    fn set_image(&mut self, image: &PreviewImage) {
        if self.window.texture.is_none() || self.window.stale {
            let size = [image.bitmap.width as usize, image.bitmap.height as usize];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.bitmap.rgba);
            match &mut self.window.texture {
                Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
                None => {
                    self.window.texture = Some(self.ctx.load_texture(
                        "crop_preview",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
            }
            self.window.stale = false;
        }

        if let Some(texture) = &self.window.texture {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            self.painter
                .image(texture.id(), self.image_rect, uv, egui::Color32::WHITE);
        }
    }

    fn set_rectangles(&mut self, main: DisplayRect, shades: [DisplayRect; 4]) {
        for shade in shades {
            if shade.width() > 0.0 && shade.height() > 0.0 {
                self.painter.rect_filled(self.to_screen(shade), 0.0, SHADE);
            }
        }

        let crop = self.to_screen(main);
        let outline = [
            crop.left_top(),
            crop.right_top(),
            crop.right_bottom(),
            crop.left_bottom(),
            crop.left_top(),
        ];
        self.painter.extend(egui::Shape::dashed_line(
            &outline,
            egui::Stroke::new(2.0, OUTLINE),
            6.0,
            4.0,
        ));
    }
}

fn cursor_icon(hint: CursorHint) -> egui::CursorIcon {
    match hint {
        CursorHint::ResizeNwSe => egui::CursorIcon::ResizeNwSe,
        CursorHint::ResizeNeSw => egui::CursorIcon::ResizeNeSw,
        CursorHint::ResizeHorizontal => egui::CursorIcon::ResizeHorizontal,
        CursorHint::ResizeVertical => egui::CursorIcon::ResizeVertical,
        CursorHint::Move => egui::CursorIcon::Move,
    }
}

pub fn show_crop_preview(
    ctx: &egui::Context,
    window: &mut PreviewWindow,
    session: &mut CropSession,
    nav: PageNav,
) -> PreviewResponse {
    let mut response = PreviewResponse::default();
    if !window.open {
        return response;
    }

    let mut open = true;
    egui::Window::new("Crop Preview")
        .open(&mut open)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            show_navigation(ui, nav, &mut response);
            ui.separator();

            let Some(layout) = session.layout() else {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Rendering preview...");
                });
                return;
            };

            let size = egui::vec2(layout.display_width, layout.display_height);
            let (canvas, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
            let origin = canvas.rect.min;
            let to_point = |pos: egui::Pos2| Point::new(pos.x - origin.x, pos.y - origin.y);

            if canvas.drag_started() {
                // Press origin, not the position after egui's drag threshold
                let pressed = ctx
                    .input(|i| i.pointer.press_origin())
                    .or(canvas.interact_pointer_pos());
                if let Some(pos) = pressed {
                    session.pointer_down(to_point(pos));
                }
            }
            if canvas.dragged() {
                if let Some(pos) = canvas.interact_pointer_pos() {
                    response.margins_changed |= session.pointer_move(to_point(pos));
                }
            }
            if canvas.drag_stopped() {
                session.pointer_up();
            }

            let pointer = canvas.interact_pointer_pos().or(canvas.hover_pos());
            if let Some(handle) = pointer.and_then(|pos| session.hover(to_point(pos))) {
                ctx.set_cursor_icon(cursor_icon(handle.cursor()));
            }

            let mut surface = CanvasSurface {
                ctx,
                painter: &painter,
                image_rect: canvas.rect,
                window: &mut *window,
            };
            session.present(&mut surface);

            if let Some(layout) = session.layout() {
                ui.label(format!("Selected: {}", layout.size_label()));
            }
        });

    if !open {
        session.close_preview();
        window.close();
    }
    response
}

fn show_navigation(ui: &mut egui::Ui, nav: PageNav, response: &mut PreviewResponse) {
    ui.horizontal(|ui| {
        let can_go_back = nav.current > 0;
        let can_go_forward = nav.current + 1 < nav.total;

        if ui
            .add_enabled(can_go_back, egui::Button::new("◀ Previous"))
            .clicked()
        {
            response.navigate = Some(nav.current - 1);
        }

        ui.label(format!("Page {} of {}", nav.current + 1, nav.total));

        if ui
            .add_enabled(can_go_forward, egui::Button::new("Next ▶"))
            .clicked()
        {
            response.navigate = Some(nav.current + 1);
        }
    });
}
