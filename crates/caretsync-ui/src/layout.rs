//! Text layout queries used to place handles and the action bar.
//!
//! Positions are in text-local space (origin at the top-left of the laid-out
//! text, y growing downward). Indices are character offsets.

use caretsync_core::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CharacterInfo {
    /// Top-left corner of the glyph box.
    pub position: Vec2,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineInfo {
    pub top_y: f32,
    pub height: f32,
}

/// Glyph geometry supplied by whatever renders the text.
pub trait TextLayoutProvider {
    /// Recomputes the layout for `text`.
    fn relayout(&mut self, text: &str);

    fn character_count(&self) -> usize;

    /// Insertion index nearest to `local`, or `None` if the layout cannot
    /// resolve one (empty text).
    fn character_index_at(&self, local: Vec2) -> Option<usize>;

    /// Geometry of the glyph at `index`. Implementations clamp `index` into
    /// range.
    fn character_info(&self, index: usize) -> CharacterInfo;

    fn line_info(&self, line: usize) -> LineInfo;

    fn line_of(&self, index: usize) -> usize;
}

/// Resolves a text-local point to a character index.
///
/// Falls back to `0` for empty text and to `fallback` when a non-empty layout
/// still can't answer.
pub fn resolve_index(layout: &dyn TextLayoutProvider, local: Vec2, fallback: usize) -> usize {
    let count = layout.character_count();
    match layout.character_index_at(local) {
        Some(index) => index.min(count),
        None if count == 0 => 0,
        None => fallback.min(count),
    }
}

/// Point where a handle for `index` attaches: the bottom of the line at the
/// leading edge of the character, or its trailing edge past the end of text.
pub fn handle_anchor(layout: &dyn TextLayoutProvider, index: usize) -> Vec2 {
    let count = layout.character_count();
    if count == 0 {
        let line = layout.line_info(0);
        return Vec2::new(0.0, line.top_y + line.height);
    }

    let glyph = index.min(count - 1);
    let info = layout.character_info(glyph);
    let mut x = info.position.x;
    if index >= count {
        x += info.width;
    }
    let line = layout.line_info(layout.line_of(glyph));
    Vec2::new(x, line.top_y + line.height)
}

/// Top-left corner of the glyph at `index`, or the origin for empty text.
pub fn glyph_origin(layout: &dyn TextLayoutProvider, index: usize) -> Vec2 {
    let count = layout.character_count();
    if count == 0 {
        return Vec2::ZERO;
    }
    let glyph = index.min(count - 1);
    let info = layout.character_info(glyph);
    if index >= count {
        Vec2::new(info.position.x + info.width, info.position.y)
    } else {
        info.position
    }
}

/// Fixed-advance layout that breaks lines on `'\n'` only.
///
/// Good enough for simulators and tests; real renderers provide their own
/// [`TextLayoutProvider`].
#[derive(Clone, Debug)]
pub struct MonospaceLayout {
    advance: f32,
    line_height: f32,
    /// Character offset where each line starts.
    line_starts: Vec<usize>,
    count: usize,
}

impl MonospaceLayout {
    pub fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            line_height,
            line_starts: vec![0],
            count: 0,
        }
    }

    pub fn with_text(advance: f32, line_height: f32, text: &str) -> Self {
        let mut layout = Self::new(advance, line_height);
        layout.relayout(text);
        layout
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Number of columns on `line`, not counting its terminating newline.
    fn line_len(&self, line: usize) -> usize {
        let start = self.line_starts[line];
        match self.line_starts.get(line + 1) {
            Some(next) => next - 1 - start,
            None => self.count - start,
        }
    }

    fn is_newline(&self, index: usize) -> bool {
        self.line_starts[1..].iter().any(|s| s - 1 == index)
    }
}

impl TextLayoutProvider for MonospaceLayout {
    fn relayout(&mut self, text: &str) {
        self.line_starts.clear();
        self.line_starts.push(0);
        let mut count = 0;
        for ch in text.chars() {
            count += 1;
            if ch == '\n' {
                self.line_starts.push(count);
            }
        }
        self.count = count;
    }

    fn character_count(&self) -> usize {
        self.count
    }

    fn character_index_at(&self, local: Vec2) -> Option<usize> {
        if self.count == 0 || self.line_height <= 0.0 || self.advance <= 0.0 {
            return None;
        }
        let last_line = self.line_count() - 1;
        let line = ((local.y / self.line_height).floor().max(0.0) as usize).min(last_line);
        let column = (local.x / self.advance).round().max(0.0) as usize;
        Some(self.line_starts[line] + column.min(self.line_len(line)))
    }

    fn character_info(&self, index: usize) -> CharacterInfo {
        let index = index.min(self.count.saturating_sub(1));
        let line = self.line_of(index);
        let column = index - self.line_starts[line];
        CharacterInfo {
            position: Vec2::new(column as f32 * self.advance, line as f32 * self.line_height),
            width: if self.is_newline(index) { 0.0 } else { self.advance },
        }
    }

    fn line_info(&self, line: usize) -> LineInfo {
        let line = line.min(self.line_count() - 1);
        LineInfo {
            top_y: line as f32 * self.line_height,
            height: self.line_height,
        }
    }

    fn line_of(&self, index: usize) -> usize {
        self.line_starts.partition_point(|start| *start <= index).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lookup_rounds_to_nearest_boundary() {
        let layout = MonospaceLayout::with_text(10.0, 20.0, "hello");
        assert_eq!(layout.character_index_at(Vec2::new(0.0, 5.0)), Some(0));
        assert_eq!(layout.character_index_at(Vec2::new(14.0, 5.0)), Some(1));
        assert_eq!(layout.character_index_at(Vec2::new(16.0, 5.0)), Some(2));
        assert_eq!(layout.character_index_at(Vec2::new(500.0, 5.0)), Some(5));
        assert_eq!(layout.character_index_at(Vec2::new(-30.0, -30.0)), Some(0));
    }

    #[test]
    fn multiline_lookup_stops_before_newline() {
        let layout = MonospaceLayout::with_text(10.0, 20.0, "ab\ncdef");
        assert_eq!(layout.line_count(), 2);
        assert_eq!(layout.line_of(2), 0);
        assert_eq!(layout.line_of(3), 1);
        assert_eq!(layout.character_index_at(Vec2::new(90.0, 5.0)), Some(2));
        assert_eq!(layout.character_index_at(Vec2::new(10.0, 25.0)), Some(4));
        assert_eq!(layout.character_info(2).width, 0.0);
    }

    #[test]
    fn empty_text_resolves_to_zero() {
        let layout = MonospaceLayout::with_text(10.0, 20.0, "");
        assert_eq!(layout.character_index_at(Vec2::new(40.0, 5.0)), None);
        assert_eq!(resolve_index(&layout, Vec2::new(40.0, 5.0), 7), 0);
        assert_eq!(handle_anchor(&layout, 3), Vec2::new(0.0, 20.0));
        assert_eq!(glyph_origin(&layout, 3), Vec2::ZERO);
    }

    #[test]
    fn anchor_sits_at_line_bottom() {
        let layout = MonospaceLayout::with_text(10.0, 20.0, "ab\ncd");
        assert_eq!(handle_anchor(&layout, 0), Vec2::new(0.0, 20.0));
        assert_eq!(handle_anchor(&layout, 4), Vec2::new(10.0, 40.0));
        // Past the last glyph the anchor moves to its trailing edge.
        assert_eq!(handle_anchor(&layout, 5), Vec2::new(20.0, 40.0));
        assert_eq!(glyph_origin(&layout, 3), Vec2::new(0.0, 20.0));
    }
}
