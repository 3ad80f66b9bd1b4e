use web_time::Instant;

use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// A pointer sample in screen space, stamped by the platform layer.
#[derive(Clone, Copy, Debug)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub event: PointerEventKind,
    pub position: Vec2,
    pub time: Instant,
}

impl PointerEvent {
    pub fn touch(event: PointerEventKind, position: Vec2, time: Instant) -> Self {
        Self {
            id: PointerId(0),
            kind: PointerKind::Touch,
            event,
            position,
            time,
        }
    }
}
