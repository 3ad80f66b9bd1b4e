use caretsync_core::{Rect, Vec2};

/// Opaque identifier of an input field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u64);

/// Where a field sits on screen.
///
/// Text-local space has its origin at the top-left of the laid-out text; the
/// text is drawn at `viewport.origin - scroll`, so scrolling the content moves
/// text-local points relative to the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldGeometry {
    /// Outer bounds of the input field.
    pub field: Rect,
    /// Visible text area inside the field.
    pub viewport: Rect,
    /// Content scroll offset inside the viewport.
    pub scroll: Vec2,
    /// Bounds of the canvas the field is rendered on.
    pub canvas: Rect,
    /// Screen pixels per canvas unit.
    pub canvas_scale: f32,
}

impl Default for FieldGeometry {
    fn default() -> Self {
        let field = Rect::new(0.0, 0.0, 320.0, 48.0);
        Self {
            field,
            viewport: field,
            scroll: Vec2::ZERO,
            canvas: Rect::new(0.0, 0.0, 1080.0, 1920.0),
            canvas_scale: 1.0,
        }
    }
}

impl FieldGeometry {
    pub fn to_text_local(&self, screen: Vec2) -> Vec2 {
        self.viewport.to_local(screen) + self.scroll
    }

    pub fn to_screen(&self, local: Vec2) -> Vec2 {
        self.viewport.to_parent(local - self.scroll)
    }

    pub fn rect_to_screen(&self, local: Rect) -> Rect {
        Rect::from_origin_size(self.to_screen(local.origin()), local.size())
    }
}
