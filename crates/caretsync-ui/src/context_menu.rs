//! Floating cut/copy/paste/select-all bar.

use bitflags::bitflags;
use caretsync_core::{Rect, Size, Vec2};

use crate::field::FieldGeometry;
use crate::selection::{Selection, SelectionChange};

/// Slots reserved on the bar, one per action.
pub const MAX_ACTIONS: usize = 4;

/// Share of the smaller canvas side the full bar spans.
pub const CANVAS_WIDTH_RATIO: f32 = 0.9;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EditActions: u8 {
        const CUT = 1 << 0;
        const COPY = 1 << 1;
        const PASTE = 1 << 2;
        const SELECT_ALL = 1 << 3;
    }
}

impl EditActions {
    /// Display order on the bar.
    pub const ORDER: [EditActions; MAX_ACTIONS] = [
        EditActions::CUT,
        EditActions::COPY,
        EditActions::PASTE,
        EditActions::SELECT_ALL,
    ];
}

/// Field settings that decide which actions make sense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldCapabilities {
    pub read_only: bool,
    /// Password-style field; its content never reaches the clipboard.
    pub secure: bool,
    /// Actions the field allows at all.
    pub allowed: EditActions,
}

impl Default for FieldCapabilities {
    fn default() -> Self {
        Self {
            read_only: false,
            secure: false,
            allowed: EditActions::all(),
        }
    }
}

impl FieldCapabilities {
    /// Actions offered for `selection` over text of `text_len` characters.
    pub fn selection_actions(&self, selection: Selection, text_len: usize) -> EditActions {
        let mut actions = EditActions::empty();
        if selection.has_selection() && !self.secure {
            actions |= EditActions::COPY;
            if !self.read_only {
                actions |= EditActions::CUT;
            }
        }
        if !self.read_only {
            actions |= EditActions::PASTE;
        }
        if text_len > 0 && !(selection.start == 0 && selection.end >= text_len) {
            actions |= EditActions::SELECT_ALL;
        }
        actions & self.allowed
    }

    /// Actions offered when the caret handle is tapped.
    pub fn caret_actions(&self, text_len: usize) -> EditActions {
        let mut actions = EditActions::empty();
        if !self.read_only {
            actions |= EditActions::PASTE;
        }
        if text_len > 0 {
            actions |= EditActions::SELECT_ALL;
        }
        actions & self.allowed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuState {
    Hidden,
    Visible(EditActions),
}

#[derive(Clone, Debug)]
pub struct ContextMenu {
    state: MenuState,
    full_size: Size,
    rect: Rect,
}

impl Default for ContextMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextMenu {
    pub fn new() -> Self {
        Self {
            state: MenuState::Hidden,
            full_size: Size::default(),
            rect: Rect::default(),
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, MenuState::Visible(_))
    }

    pub fn actions(&self) -> EditActions {
        match self.state {
            MenuState::Visible(actions) => actions,
            MenuState::Hidden => EditActions::empty(),
        }
    }

    /// Screen bounds of the bar. Meaningless while hidden.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn full_size(&self) -> Size {
        self.full_size
    }

    fn slot_width(&self) -> f32 {
        self.full_size.width / MAX_ACTIONS as f32
    }

    /// Sizes the bar for the canvas: its full width spans most of the smaller
    /// canvas side, its height is one touch target times `height_ratio`.
    pub fn update_size(&mut self, geometry: &FieldGeometry, touch_target: f32, height_ratio: f32) {
        let scale = if geometry.canvas_scale > 0.0 { geometry.canvas_scale } else { 1.0 };
        let side = geometry.canvas.w.min(geometry.canvas.h);
        self.full_size = Size::new(side * CANVAS_WIDTH_RATIO / scale, touch_target * height_ratio);
        self.rect.h = self.full_size.height;
        self.rect.w = self.slot_width() * self.actions().iter().count() as f32;
    }

    /// Shows `actions`; an empty set hides the bar. Returns whether anything
    /// changed.
    pub fn show(&mut self, actions: EditActions) -> bool {
        if actions.is_empty() {
            return self.hide();
        }
        if self.state == MenuState::Visible(actions) {
            return false;
        }
        self.state = MenuState::Visible(actions);
        self.rect.w = self.slot_width() * actions.iter().count() as f32;
        self.rect.h = self.full_size.height;
        true
    }

    pub fn hide(&mut self) -> bool {
        let was_visible = self.is_visible();
        self.state = MenuState::Hidden;
        was_visible
    }

    /// Hides a visible bar, or shows the caret actions.
    pub fn toggle(&mut self, caret_actions: EditActions) -> bool {
        if self.is_visible() {
            self.hide()
        } else {
            self.show(caret_actions)
        }
    }

    /// Reacts to a selection change: a new non-empty range shows the selection
    /// actions, a collapsed one hides the bar. Caret-only moves leave it alone.
    pub fn on_selection_changed(
        &mut self,
        change: &SelectionChange,
        capabilities: &FieldCapabilities,
        text_len: usize,
    ) -> bool {
        if !change.range_changed() {
            return false;
        }
        if change.current.has_selection() {
            self.show(capabilities.selection_actions(change.current, text_len))
        } else {
            self.hide()
        }
    }

    /// Positions the bar above `anchor`, a text-local point at the top of the
    /// leading glyph.
    ///
    /// The bar is left-aligned with the field and never rises above the
    /// viewport top; if it would leave the canvas at the top it drops below
    /// the field instead.
    pub fn place(&mut self, anchor: Vec2, geometry: &FieldGeometry) {
        let anchor_y = geometry.to_screen(anchor).y.max(geometry.viewport.y);
        let mut y = anchor_y - self.rect.h;
        if y < geometry.canvas.y {
            y = geometry.field.bottom();
        }
        let max_x = (geometry.canvas.right() - self.rect.w).max(geometry.canvas.x);
        self.rect.x = geometry.field.x.clamp(geometry.canvas.x, max_x);
        self.rect.y = y;
    }

    /// Visible actions with their slot bounds, left to right.
    pub fn slots(&self) -> impl Iterator<Item = (EditActions, Rect)> + '_ {
        let slot = self.slot_width();
        let actions = self.actions();
        EditActions::ORDER
            .into_iter()
            .filter(move |a| actions.contains(*a))
            .enumerate()
            .map(move |(i, action)| {
                let rect = Rect::new(self.rect.x + i as f32 * slot, self.rect.y, slot, self.rect.h);
                (action, rect)
            })
    }

    pub fn action_at(&self, screen: Vec2) -> Option<EditActions> {
        if !self.is_visible() || !self.rect.contains(screen) {
            return None;
        }
        self.slots().find(|(_, r)| r.contains(screen)).map(|(a, _)| a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::ChangeOrigin;

    fn geometry() -> FieldGeometry {
        FieldGeometry {
            field: Rect::new(40.0, 300.0, 600.0, 60.0),
            viewport: Rect::new(50.0, 310.0, 580.0, 40.0),
            canvas: Rect::new(0.0, 0.0, 1000.0, 2000.0),
            canvas_scale: 2.0,
            ..FieldGeometry::default()
        }
    }

    fn selected(start: usize, end: usize) -> Selection {
        Selection { caret: end, start, end }
    }

    #[test]
    fn read_only_offers_copy_and_select_all_only() {
        let caps = FieldCapabilities {
            read_only: true,
            ..FieldCapabilities::default()
        };
        let actions = caps.selection_actions(selected(1, 3), 10);
        assert_eq!(actions, EditActions::COPY | EditActions::SELECT_ALL);
        assert_eq!(caps.caret_actions(10), EditActions::SELECT_ALL);
    }

    #[test]
    fn secure_field_never_copies() {
        let caps = FieldCapabilities {
            secure: true,
            ..FieldCapabilities::default()
        };
        let actions = caps.selection_actions(selected(0, 4), 10);
        assert!(!actions.contains(EditActions::COPY));
        assert!(!actions.contains(EditActions::CUT));
        assert!(actions.contains(EditActions::PASTE));
    }

    #[test]
    fn full_selection_hides_select_all() {
        let caps = FieldCapabilities::default();
        let actions = caps.selection_actions(selected(0, 10), 10);
        assert_eq!(actions, EditActions::CUT | EditActions::COPY | EditActions::PASTE);
    }

    #[test]
    fn caret_actions_need_text_for_select_all() {
        let caps = FieldCapabilities::default();
        assert_eq!(caps.caret_actions(0), EditActions::PASTE);
        assert_eq!(caps.caret_actions(3), EditActions::PASTE | EditActions::SELECT_ALL);
    }

    #[test]
    fn disallowed_actions_are_filtered() {
        let caps = FieldCapabilities {
            allowed: EditActions::COPY,
            ..FieldCapabilities::default()
        };
        assert_eq!(caps.selection_actions(selected(0, 2), 10), EditActions::COPY);
    }

    #[test]
    fn bar_width_follows_action_count() {
        let mut menu = ContextMenu::new();
        menu.update_size(&geometry(), 50.0, 1.0);
        // min(1000, 2000) * 0.9 / 2.0
        assert!((menu.full_size().width - 450.0).abs() < 1e-3);
        menu.show(EditActions::COPY | EditActions::PASTE);
        assert!((menu.rect().w - 225.0).abs() < 1e-3);
        assert_eq!(menu.rect().h, 50.0);
        assert!(!menu.show(EditActions::COPY | EditActions::PASTE));
    }

    #[test]
    fn empty_action_set_hides() {
        let mut menu = ContextMenu::new();
        menu.show(EditActions::PASTE);
        menu.show(EditActions::empty());
        assert_eq!(menu.state(), MenuState::Hidden);
    }

    #[test]
    fn toggle_flips_visibility() {
        let mut menu = ContextMenu::new();
        assert!(menu.toggle(EditActions::PASTE));
        assert!(menu.is_visible());
        assert!(menu.toggle(EditActions::PASTE));
        assert!(!menu.is_visible());
    }

    #[test]
    fn collapsing_selection_hides_bar() {
        let caps = FieldCapabilities::default();
        let mut menu = ContextMenu::new();
        let grow = SelectionChange {
            previous: Selection::collapsed(2),
            current: selected(2, 6),
            origin: ChangeOrigin::Drag,
        };
        menu.on_selection_changed(&grow, &caps, 10);
        assert!(menu.actions().contains(EditActions::CUT));

        let caret_only = SelectionChange {
            previous: selected(2, 6),
            current: Selection { caret: 3, start: 2, end: 6 },
            origin: ChangeOrigin::Api,
        };
        assert!(!menu.on_selection_changed(&caret_only, &caps, 10));
        assert!(menu.is_visible());

        let collapse = SelectionChange {
            previous: selected(2, 6),
            current: Selection::collapsed(6),
            origin: ChangeOrigin::Keyboard,
        };
        menu.on_selection_changed(&collapse, &caps, 10);
        assert!(!menu.is_visible());
    }

    #[test]
    fn bar_sits_above_anchor() {
        let geom = geometry();
        let mut menu = ContextMenu::new();
        menu.update_size(&geom, 50.0, 1.0);
        menu.show(EditActions::PASTE);
        menu.place(Vec2::new(30.0, 0.0), &geom);
        assert_eq!(menu.rect().x, 40.0);
        assert_eq!(menu.rect().y, 260.0);
    }

    #[test]
    fn anchor_above_viewport_is_clamped() {
        let mut geom = geometry();
        geom.scroll = Vec2::new(0.0, 100.0);
        let mut menu = ContextMenu::new();
        menu.update_size(&geom, 50.0, 1.0);
        menu.show(EditActions::PASTE);
        menu.place(Vec2::ZERO, &geom);
        assert_eq!(menu.rect().y, 260.0);
    }

    #[test]
    fn bar_flips_below_field_near_canvas_top() {
        let mut geom = geometry();
        geom.field = Rect::new(40.0, 10.0, 600.0, 60.0);
        geom.viewport = Rect::new(50.0, 20.0, 580.0, 40.0);
        let mut menu = ContextMenu::new();
        menu.update_size(&geom, 50.0, 1.0);
        menu.show(EditActions::PASTE);
        menu.place(Vec2::ZERO, &geom);
        assert_eq!(menu.rect().y, 70.0);
    }

    #[test]
    fn slots_hit_test_in_display_order() {
        let geom = geometry();
        let mut menu = ContextMenu::new();
        menu.update_size(&geom, 50.0, 1.0);
        menu.show(EditActions::SELECT_ALL | EditActions::COPY);
        menu.place(Vec2::ZERO, &geom);
        let r = menu.rect();
        assert_eq!(menu.action_at(Vec2::new(r.x + 10.0, r.y + 10.0)), Some(EditActions::COPY));
        assert_eq!(
            menu.action_at(Vec2::new(r.x + 120.0 + 10.0, r.y + 10.0)),
            Some(EditActions::SELECT_ALL)
        );
        assert_eq!(menu.action_at(Vec2::new(r.right() + 5.0, r.y + 10.0)), None);
    }
}
