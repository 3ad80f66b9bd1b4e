#[cfg(test)]
mod tests {
    use crate::Rect;
    use crate::Vec2;
    use crate::animation::*;
    use crate::display::*;
    use crate::error::EditError;
    use crate::observer::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use web_time::Duration;

    #[test]
    fn test_rect_contains() {
        let rect = Rect {
            x: 10.0,
            y: 10.0,
            w: 100.0,
            h: 50.0,
        };

        assert!(rect.contains(Vec2 { x: 50.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 5.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 50.0, y: 70.0 }));
    }

    #[test]
    fn test_rect_intersects_and_scaling() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 20.0);
        assert!(viewport.intersects(&Rect::new(90.0, 5.0, 20.0, 20.0)));
        assert!(!viewport.intersects(&Rect::new(101.0, 0.0, 10.0, 10.0)));

        let grown = viewport.scaled_about_center(1.1);
        assert!((grown.x - -5.0).abs() < 1e-4);
        assert!((grown.w - 110.0).abs() < 1e-4);
        assert!(grown.intersects(&Rect::new(101.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_transition_is_frame_stepped() {
        let mut t = Transition::new(AnimationSpec::linear(Duration::from_millis(1000)));
        assert!(!t.is_running());
        assert_eq!(t.progress(), 1.0);

        t.restart();
        assert!(t.is_running());
        assert!((t.advance(Duration::from_millis(250)) - 0.25).abs() < 0.001);
        assert!((t.advance(Duration::from_millis(250)) - 0.5).abs() < 0.001);
        assert_eq!(t.advance(Duration::from_millis(5000)), 1.0);
        assert!(!t.is_running());
    }

    #[test]
    fn test_thumb_size_from_dpi() {
        let display = DisplayMetrics::new(1080.0, 1920.0, 480.0);
        assert_eq!(display.thumb_size_px(), Some(240.0));
        assert_eq!(touch_target_size(Some(&display), 16.0, 2.0), 60.0);
    }

    #[test]
    fn test_touch_target_falls_back_to_font_size() {
        let unknown = DisplayMetrics::new(1080.0, 1920.0, 0.0);
        assert_eq!(unknown.thumb_size_px(), None);
        assert_eq!(touch_target_size(Some(&unknown), 20.0, 1.0), 30.0);
        assert_eq!(touch_target_size(None, 20.0, 1.0), 30.0);
    }

    #[test]
    fn test_observers_run_in_order() {
        let list: ObserverList<u32> = ObserverList::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for label in ["a", "b", "c"] {
            let seen = seen.clone();
            list.subscribe(label, move |v| {
                seen.borrow_mut().push(format!("{label}{v}"));
                Ok(())
            });
        }
        list.notify(&1).unwrap();
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn test_nested_notify_is_rejected() {
        let list: Rc<ObserverList<u32>> = Rc::new(ObserverList::new());
        let nested_result = Rc::new(RefCell::new(None));
        {
            let weak = Rc::downgrade(&list);
            let nested_result = nested_result.clone();
            list.subscribe("echo", move |v| {
                if let Some(list) = weak.upgrade() {
                    *nested_result.borrow_mut() = Some(list.notify(&(v + 1)));
                }
                Ok(())
            });
        }

        let outer = list.notify(&1);
        assert_eq!(outer, Err(EditError::Reentrancy { observer: "echo" }));
        assert_eq!(
            *nested_result.borrow(),
            Some(Err(EditError::Reentrancy { observer: "echo" }))
        );
        // The list is usable again once the pass is over.
        assert!(!list.is_notifying());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_unsubscribe_during_notify() {
        let list: Rc<ObserverList<u32>> = Rc::new(ObserverList::new());
        let calls = Rc::new(RefCell::new(0));
        let second_id = Rc::new(RefCell::new(None));
        {
            let weak = Rc::downgrade(&list);
            let second_id = second_id.clone();
            list.subscribe("remover", move |_| {
                if let (Some(list), Some(id)) = (weak.upgrade(), *second_id.borrow()) {
                    list.unsubscribe(id);
                }
                Ok(())
            });
        }
        {
            let calls = calls.clone();
            let id = list.subscribe("counted", move |_| {
                *calls.borrow_mut() += 1;
                Ok(())
            });
            *second_id.borrow_mut() = Some(id);
        }

        list.notify(&0).unwrap();
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_latch_merges_pending_values() {
        let latch: Latch<(u32, u32)> = Latch::new();
        latch.merge((1, 2), |old, new| (old.0, new.1));
        latch.merge((5, 9), |old, new| (old.0, new.1));
        assert_eq!(latch.take(), Some((1, 9)));
        assert!(!latch.is_set());
    }
}
