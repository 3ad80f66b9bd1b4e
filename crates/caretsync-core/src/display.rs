//! Physical display metrics and the touch-target size derived from them.

/// Average thumb width, in inches.
pub const PHYSICAL_THUMB_SIZE_IN: f32 = 1.0;

/// Share of the thumb size used for handles and the action bar height.
pub const THUMB_SIZE_RATIO: f32 = 0.5;

/// Touch-target fallback, in multiples of the font size, when DPI is unknown.
pub const FONT_SIZE_FALLBACK_RATIO: f32 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMetrics {
    pub width_px: f32,
    pub height_px: f32,
    /// Dots per inch reported by the platform; `<= 0` means unknown.
    pub dpi: f32,
}

impl DisplayMetrics {
    pub fn new(width_px: f32, height_px: f32, dpi: f32) -> Self {
        Self {
            width_px,
            height_px,
            dpi,
        }
    }

    /// Screen diagonal in inches, or `None` when the DPI is unknown.
    pub fn physical_diagonal_in(&self) -> Option<f32> {
        if self.dpi <= 0.0 {
            return None;
        }
        let w = self.width_px / self.dpi;
        let h = self.height_px / self.dpi;
        Some((w * w + h * h).sqrt())
    }

    /// Thumb size in screen pixels, or `None` when the DPI is unknown.
    pub fn thumb_size_px(&self) -> Option<f32> {
        let diagonal_in = self.physical_diagonal_in().filter(|d| *d > 0.0)?;
        let normalized = PHYSICAL_THUMB_SIZE_IN / diagonal_in;
        let diagonal_px = (self.width_px * self.width_px + self.height_px * self.height_px).sqrt();
        Some(((diagonal_px * normalized) / 2.0).round())
    }
}

/// Side length of a touch target in canvas units.
///
/// Uses the physical thumb size when `display` has a usable DPI and falls back
/// to a multiple of `font_size` otherwise. `canvas_scale` converts screen
/// pixels into canvas units.
pub fn touch_target_size(display: Option<&DisplayMetrics>, font_size: f32, canvas_scale: f32) -> f32 {
    match display.and_then(DisplayMetrics::thumb_size_px) {
        Some(thumb) if thumb > 0.0 => {
            let scale = if canvas_scale > 0.0 { canvas_scale } else { 1.0 };
            (thumb * THUMB_SIZE_RATIO) / scale
        }
        _ => font_size * FONT_SIZE_FALLBACK_RATIO,
    }
}
