//! Pointer routing and action bar commands.

use caretsync_core::Vec2;
use caretsync_core::input::{PointerEvent, PointerEventKind};
use caretsync_ui::text::{char_len, replace_chars, slice_chars};
use caretsync_ui::{ChangeOrigin, EditActions, Gesture, HandleRelease, glyph_origin, resolve_index};
use web_time::Instant;

use super::{BridgeError, NativeSyncBridge, PointerTarget};

impl NativeSyncBridge {
    /// Routes a pointer sample to the action bar, a handle or the text body.
    pub fn pointer_event(&mut self, event: &PointerEvent) -> Result<(), BridgeError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Some(geometry) = self.fields.get(&session.field).map(|e| e.geometry) else {
            return Ok(());
        };

        match event.event {
            PointerEventKind::Down => {
                if let Some(action) = self.menu.action_at(event.position) {
                    session.pointer = Some(PointerTarget::Menu(action));
                    return Ok(());
                }
                if let Some(id) = self.handles.hit_test(event.position, &geometry) {
                    let selection = session.model.get();
                    self.handles
                        .press(id, event.position, selection, self.layout.as_ref(), &geometry);
                    session.pointer = Some(PointerTarget::Handle(id));
                    return Ok(());
                }
                session.pointer = Some(PointerTarget::Text);
                let gesture = self.gestures.handle_pointer(event);
                self.on_gesture(gesture)
            }
            PointerEventKind::Move => match session.pointer {
                Some(PointerTarget::Handle(id)) => {
                    let model = session.model.clone();
                    let result = self
                        .handles
                        .drag(id, event.position, &model, self.layout.as_ref(), &geometry);
                    self.reconcile();
                    self.flush_outbound();
                    Ok(result?)
                }
                Some(PointerTarget::Text) => {
                    let gesture = self.gestures.handle_pointer(event);
                    self.on_gesture(gesture)
                }
                _ => Ok(()),
            },
            PointerEventKind::Up => match session.pointer.take() {
                Some(PointerTarget::Handle(id)) => {
                    let release = self.handles.release(id, session.model.get());
                    self.reconcile();
                    if release == HandleRelease::Tap {
                        self.toggle_caret_menu()
                    } else {
                        Ok(())
                    }
                }
                Some(PointerTarget::Menu(action)) => {
                    if self.menu.action_at(event.position) == Some(action) {
                        self.perform_action(action)
                    } else {
                        Ok(())
                    }
                }
                Some(PointerTarget::Text) => {
                    let gesture = self.gestures.handle_pointer(event);
                    self.on_gesture(gesture)
                }
                None => Ok(()),
            },
            PointerEventKind::Cancel => {
                if let Some(PointerTarget::Handle(id)) = session.pointer.take() {
                    self.handles.release(id, session.model.get());
                }
                self.gestures.handle_pointer(event);
                self.reconcile();
                Ok(())
            }
        }
    }

    /// Fires a long press for a pointer held still on the text.
    pub fn poll_gestures(&mut self, now: Instant) -> Result<(), BridgeError> {
        let gesture = self.gestures.poll(now);
        self.on_gesture(gesture)
    }

    fn on_gesture(&mut self, gesture: Option<Gesture>) -> Result<(), BridgeError> {
        let Some(gesture) = gesture else {
            return Ok(());
        };
        log::debug!("{gesture:?}");
        match gesture {
            Gesture::Tap(position) => {
                let index = self.index_at(position)?;
                if let Some(session) = self.session.as_mut() {
                    session.typed_since_tap = false;
                    session.keyboard_dismissed = false;
                }
                self.handles.set_caret_suppressed(false);
                self.menu.hide();
                let result = self.with_model(|model, _| model.collapse_to(index, ChangeOrigin::Api));
                self.refresh_handles();
                result
            }
            Gesture::DoubleTap(position) => {
                let index = self.index_at(position)?;
                self.with_model(|model, text| model.select_word_at(index, text))
            }
            Gesture::LongPress(position) => {
                let index = self.index_at(position)?;
                let empty = self.selection_model().is_some_and(|m| m.text_len() == 0);
                if empty {
                    self.menu.hide();
                    self.toggle_caret_menu()
                } else {
                    self.with_model(|model, text| model.select_word_at(index, text))
                }
            }
        }
    }

    fn index_at(&self, screen: Vec2) -> Result<usize, BridgeError> {
        let session = self.session.as_ref().ok_or(BridgeError::NoActiveSession)?;
        let entry = self
            .fields
            .get(&session.field)
            .ok_or(BridgeError::UnknownField(session.field))?;
        let local = entry.geometry.to_text_local(screen);
        Ok(resolve_index(self.layout.as_ref(), local, session.model.caret()))
    }

    /// Shows the paste/select-all bar at the caret, or hides the bar.
    pub fn toggle_caret_menu(&mut self) -> Result<(), BridgeError> {
        let session = self.session.as_ref().ok_or(BridgeError::NoActiveSession)?;
        let entry = self
            .fields
            .get(&session.field)
            .ok_or(BridgeError::UnknownField(session.field))?;
        if !entry.config.menu_enabled {
            return Ok(());
        }
        let actions = entry.config.capabilities().caret_actions(char_len(&entry.text));
        self.menu.toggle(actions);
        if self.menu.is_visible() {
            let anchor = glyph_origin(self.layout.as_ref(), session.model.get().leading_edge());
            self.menu.place(anchor, &entry.geometry);
        }
        Ok(())
    }

    /// Runs an action bar command on the focused field.
    ///
    /// Commands the field doesn't offer in its current state are ignored.
    pub fn perform_action(&mut self, action: EditActions) -> Result<(), BridgeError> {
        let session = self.session.as_ref().ok_or(BridgeError::NoActiveSession)?;
        let entry = self
            .fields
            .get(&session.field)
            .ok_or(BridgeError::UnknownField(session.field))?;
        let selection = session.model.get();
        let text_len = char_len(&entry.text);
        let capabilities = entry.config.capabilities();
        let offered = if selection.has_selection() {
            capabilities.selection_actions(selection, text_len)
        } else {
            capabilities.caret_actions(text_len)
        };
        if action.bits().count_ones() != 1 || !offered.contains(action) {
            log::warn!("{action:?} is not available here (offered {offered:?})");
            return Ok(());
        }

        let range = selection.start..selection.end;
        let selected = slice_chars(&entry.text, range.clone()).to_owned();

        if action == EditActions::COPY {
            self.clipboard.set(&selected);
            self.menu.hide();
            return Ok(());
        }
        if action == EditActions::SELECT_ALL {
            return self.with_model(|model, _| model.select_all());
        }

        let insert = if action == EditActions::CUT {
            self.clipboard.set(&selected);
            String::new()
        } else {
            let Some(pasted) = self.clipboard.get() else {
                self.menu.hide();
                return Ok(());
            };
            let kept = text_len - selected.chars().count();
            fit_paste(&pasted, entry.config.is_multiline(), entry.config.character_limit, kept)
        };
        let range = if selection.has_selection() {
            range
        } else {
            selection.caret..selection.caret
        };
        let mut text = entry.text.clone();
        let caret = replace_chars(&mut text, range, &insert);
        self.menu.hide();
        self.commit_local_text(text, Some(caret))
    }
}

/// Trims pasted text to what the field accepts.
fn fit_paste(pasted: &str, multiline: bool, limit: usize, kept: usize) -> String {
    let chars = pasted.chars().filter(|ch| multiline || *ch != '\n');
    if limit == 0 {
        return chars.collect();
    }
    chars.take(limit.saturating_sub(kept)).collect()
}
