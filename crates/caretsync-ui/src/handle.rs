//! A single draggable selection handle.

use caretsync_core::animation::{AnimationSpec, Transition};
use caretsync_core::{Rect, Size, Vec2};
use web_time::Duration;

pub const MIN_SIZE_RATIO: f32 = 0.6;
pub const MAX_SIZE_RATIO: f32 = 1.0;
pub const TRANSITION_TIME: Duration = Duration::from_millis(330);

/// Physical handle. Identity never changes, unlike [`HandleRole`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleId {
    Start,
    End,
    Caret,
}

impl HandleId {
    pub const ALL: [HandleId; 3] = [HandleId::Start, HandleId::End, HandleId::Caret];

    /// Role the handle has when no drag has swapped it.
    pub fn home_role(self) -> HandleRole {
        match self {
            HandleId::Start => HandleRole::Start,
            HandleId::End => HandleRole::End,
            HandleId::Caret => HandleRole::Caret,
        }
    }
}

/// Which selection boundary a handle currently drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleRole {
    Start,
    End,
    Caret,
}

/// Visual and drag state of one handle.
///
/// Positions are text-local anchors: the handle hangs below its anchor,
/// centered on it. While pressed the handle grows from [`MIN_SIZE_RATIO`] to
/// [`MAX_SIZE_RATIO`]; on release it shrinks back and slides to its target.
#[derive(Clone, Debug)]
pub struct DragHandle {
    id: HandleId,
    role: HandleRole,
    size: Size,
    position: Vec2,
    target: Vec2,
    settle_from: Vec2,
    grab_offset: Vec2,
    held: bool,
    visible: bool,
    out_of_bounds: bool,
    transition: Transition,
}

impl DragHandle {
    pub fn new(id: HandleId) -> Self {
        Self {
            id,
            role: id.home_role(),
            size: Size::default(),
            position: Vec2::ZERO,
            target: Vec2::ZERO,
            settle_from: Vec2::ZERO,
            grab_offset: Vec2::ZERO,
            held: false,
            visible: false,
            out_of_bounds: false,
            transition: Transition::new(AnimationSpec::linear(TRANSITION_TIME)),
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn role(&self) -> HandleRole {
        self.role
    }

    pub fn set_role(&mut self, role: HandleRole) {
        self.role = role;
    }

    pub fn reset_role(&mut self) {
        self.role = self.id.home_role();
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target_position(&self) -> Vec2 {
        self.target
    }

    /// Offset from the pointer to the anchor, fixed at press time.
    pub fn grab_offset(&self) -> Vec2 {
        self.grab_offset
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_settling(&self) -> bool {
        !self.held && self.transition.is_running()
    }

    pub fn out_of_bounds(&self) -> bool {
        self.out_of_bounds
    }

    pub fn set_out_of_bounds(&mut self, out: bool) {
        self.out_of_bounds = out;
    }

    /// Current scale applied to [`size`](Self::size).
    pub fn size_ratio(&self) -> f32 {
        let p = self.transition.progress();
        let span = MAX_SIZE_RATIO - MIN_SIZE_RATIO;
        if self.held {
            MIN_SIZE_RATIO + p * span
        } else {
            MIN_SIZE_RATIO + (1.0 - p) * span
        }
    }

    /// Text-local bounds at the current size ratio.
    pub fn rect(&self) -> Rect {
        let size = self.size * self.size_ratio();
        Rect::new(
            self.position.x - size.width / 2.0,
            self.position.y,
            size.width,
            size.height,
        )
    }

    pub fn press(&mut self, grab_offset: Vec2) {
        self.held = true;
        self.grab_offset = grab_offset;
        self.out_of_bounds = false;
        self.transition.restart();
    }

    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        self.settle_from = self.position;
        self.transition.restart();
    }

    /// Moves the anchor and the target together.
    pub fn update_position(&mut self, position: Vec2) {
        self.position = position;
        self.target = position;
    }

    /// Where the handle slides to once released.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    /// Steps the size and settle animations. Returns `true` on the frame a
    /// released handle reaches its target.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.transition.is_running() {
            return false;
        }
        let progress = self.transition.advance(dt);
        if self.held {
            return false;
        }
        self.position = self.settle_from.lerp(self.target, progress);
        !self.transition.is_running()
    }

    pub fn show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        self.held = false;
        self.transition.finish();
    }

    /// Hides the handle and abandons any drag in progress.
    pub fn hide(&mut self) {
        if !self.visible && !self.held {
            return;
        }
        self.visible = false;
        self.held = false;
        self.out_of_bounds = false;
        self.transition.finish();
        self.position = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn idle_handle_is_small() {
        let handle = DragHandle::new(HandleId::Start);
        assert_eq!(handle.size_ratio(), MIN_SIZE_RATIO);
        assert_eq!(handle.role(), HandleRole::Start);
    }

    #[test]
    fn press_grows_and_release_shrinks() {
        let mut handle = DragHandle::new(HandleId::End);
        handle.set_size(Size::square(40.0));
        handle.show();
        handle.press(Vec2::ZERO);
        assert!((handle.size_ratio() - MIN_SIZE_RATIO).abs() < 1e-4);

        handle.advance(ms(165));
        assert!((handle.size_ratio() - 0.8).abs() < 0.01);
        handle.advance(ms(500));
        assert!((handle.size_ratio() - MAX_SIZE_RATIO).abs() < 1e-4);
        assert!((handle.rect().w - 40.0).abs() < 1e-4);

        handle.release();
        assert!((handle.size_ratio() - MAX_SIZE_RATIO).abs() < 1e-4);
        handle.advance(ms(330));
        assert!((handle.size_ratio() - MIN_SIZE_RATIO).abs() < 1e-4);
    }

    #[test]
    fn released_handle_settles_on_target() {
        let mut handle = DragHandle::new(HandleId::Caret);
        handle.show();
        handle.press(Vec2::ZERO);
        handle.update_position(Vec2::new(100.0, 20.0));
        handle.set_target(Vec2::new(80.0, 20.0));
        handle.release();
        assert!(handle.is_settling());

        assert!(!handle.advance(ms(165)));
        assert!((handle.position().x - 90.0).abs() < 0.1);
        assert!(handle.advance(ms(200)));
        assert_eq!(handle.position(), Vec2::new(80.0, 20.0));
        assert!(!handle.advance(ms(16)));
    }

    #[test]
    fn hide_abandons_drag() {
        let mut handle = DragHandle::new(HandleId::Start);
        handle.show();
        handle.press(Vec2::new(0.0, -10.0));
        handle.hide();
        assert!(!handle.is_held());
        assert!(!handle.is_visible());
        assert!(!handle.is_settling());
    }

    #[test]
    fn rect_hangs_below_anchor() {
        let mut handle = DragHandle::new(HandleId::Caret);
        handle.set_size(Size::square(20.0));
        handle.update_position(Vec2::new(50.0, 30.0));
        let rect = handle.rect();
        assert!((rect.x - 44.0).abs() < 1e-4);
        assert_eq!(rect.y, 30.0);
        assert!((rect.w - 12.0).abs() < 1e-4);
    }
}
