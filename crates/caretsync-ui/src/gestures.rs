use caretsync_core::Vec2;
use caretsync_core::input::{PointerEvent, PointerEventKind};
use web_time::{Duration, Instant};

pub const TAP_TIMEOUT: Duration = Duration::from_millis(200);
pub const DOUBLE_TAP_TIMEOUT: Duration = Duration::from_millis(300);
pub const LONG_PRESS_TIMEOUT: Duration = Duration::from_millis(500);
/// Movement past this distance turns a press into a drag.
pub const TOUCH_SLOP: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Tap(Vec2),
    DoubleTap(Vec2),
    LongPress(Vec2),
}

/// Recognizes taps, double taps and long presses on the text body.
///
/// Timing comes from the event timestamps, so recognition is deterministic
/// under replay.
#[derive(Clone, Debug, Default)]
pub struct GestureDetector {
    last_tap: Option<Instant>,
    press_start: Option<(Instant, Vec2)>,
    moved: bool,
}

impl GestureDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Option<Gesture> {
        match event.event {
            PointerEventKind::Down => {
                if let Some(last) = self.last_tap.take()
                    && event.time.saturating_duration_since(last) < DOUBLE_TAP_TIMEOUT
                {
                    self.press_start = None;
                    return Some(Gesture::DoubleTap(event.position));
                }
                self.press_start = Some((event.time, event.position));
                self.moved = false;
                None
            }
            PointerEventKind::Move => {
                let (start_time, start_pos) = self.press_start?;
                if distance(start_pos, event.position) > TOUCH_SLOP {
                    self.moved = true;
                }
                self.long_press(start_time, start_pos, event.time)
            }
            PointerEventKind::Up => {
                let (start_time, start_pos) = self.press_start.take()?;
                let elapsed = event.time.saturating_duration_since(start_time);
                if !self.moved && elapsed < TAP_TIMEOUT && distance(start_pos, event.position) < TOUCH_SLOP {
                    self.last_tap = Some(event.time);
                    return Some(Gesture::Tap(event.position));
                }
                None
            }
            PointerEventKind::Cancel => {
                self.press_start = None;
                None
            }
        }
    }

    /// Fires a long press for a pointer that has been held still without
    /// sending further events.
    pub fn poll(&mut self, now: Instant) -> Option<Gesture> {
        let (start_time, start_pos) = self.press_start?;
        self.long_press(start_time, start_pos, now)
    }

    fn long_press(&mut self, start_time: Instant, pos: Vec2, now: Instant) -> Option<Gesture> {
        if self.moved || now.saturating_duration_since(start_time) <= LONG_PRESS_TIMEOUT {
            return None;
        }
        // Fire once.
        self.press_start = None;
        Some(Gesture::LongPress(pos))
    }
}

fn distance(a: Vec2, b: Vec2) -> f32 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: PointerEventKind, x: f32, at: Instant) -> PointerEvent {
        PointerEvent::touch(kind, Vec2::new(x, 5.0), at)
    }

    #[test]
    fn quick_press_is_a_tap() {
        let t0 = Instant::now();
        let mut g = GestureDetector::new();
        assert_eq!(g.handle_pointer(&ev(PointerEventKind::Down, 10.0, t0)), None);
        let up = g.handle_pointer(&ev(PointerEventKind::Up, 12.0, t0 + Duration::from_millis(80)));
        assert_eq!(up, Some(Gesture::Tap(Vec2::new(12.0, 5.0))));
    }

    #[test]
    fn second_tap_in_window_is_a_double_tap() {
        let t0 = Instant::now();
        let mut g = GestureDetector::new();
        g.handle_pointer(&ev(PointerEventKind::Down, 10.0, t0));
        g.handle_pointer(&ev(PointerEventKind::Up, 10.0, t0 + Duration::from_millis(50)));
        let second = g.handle_pointer(&ev(PointerEventKind::Down, 11.0, t0 + Duration::from_millis(200)));
        assert_eq!(second, Some(Gesture::DoubleTap(Vec2::new(11.0, 5.0))));
        // The trailing up of a double tap is not another tap.
        assert_eq!(
            g.handle_pointer(&ev(PointerEventKind::Up, 11.0, t0 + Duration::from_millis(250))),
            None
        );
    }

    #[test]
    fn held_pointer_long_presses_once() {
        let t0 = Instant::now();
        let mut g = GestureDetector::new();
        g.handle_pointer(&ev(PointerEventKind::Down, 10.0, t0));
        assert_eq!(g.poll(t0 + Duration::from_millis(300)), None);
        assert_eq!(
            g.poll(t0 + Duration::from_millis(600)),
            Some(Gesture::LongPress(Vec2::new(10.0, 5.0)))
        );
        assert_eq!(g.poll(t0 + Duration::from_millis(700)), None);
        assert_eq!(g.handle_pointer(&ev(PointerEventKind::Up, 10.0, t0 + Duration::from_millis(800))), None);
    }

    #[test]
    fn movement_cancels_tap_and_long_press() {
        let t0 = Instant::now();
        let mut g = GestureDetector::new();
        g.handle_pointer(&ev(PointerEventKind::Down, 10.0, t0));
        g.handle_pointer(&ev(PointerEventKind::Move, 40.0, t0 + Duration::from_millis(20)));
        assert_eq!(g.poll(t0 + Duration::from_millis(900)), None);
        assert_eq!(g.handle_pointer(&ev(PointerEventKind::Up, 40.0, t0 + Duration::from_millis(950))), None);
    }
}
