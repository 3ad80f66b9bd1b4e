//! Keeps a focused field, its selection widgets and the platform keyboard in
//! agreement.
//!
//! Each frame [`NativeSyncBridge::tick`]:
//!
//! 1. drains keyboard events and applies them to the field,
//! 2. raises the keyboard if the focused field needs one,
//! 3. pushes any local selection change back to the keyboard,
//! 4. steps handle animations.
//!
//! Keyboard-originated changes are applied with [`SyncGuards`] raised so they
//! are not echoed back to the keyboard that reported them.

mod input;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use caretsync_core::{EditError, EditResult, Latch, touch_target_size};
use caretsync_ui::text::char_len;
use caretsync_ui::{
    ChangeOrigin, ContextMenu, EditActions, FieldGeometry, FieldId, GestureDetector, HandleCoordinator, HandleId,
    Selection, SelectionChange, SelectionModel, TextLayoutProvider, glyph_origin,
};
use thiserror::Error;
use web_time::Duration;

use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::config::{BridgeOptions, FieldConfig};
use crate::keyboard::{KeyboardEvent, KeyboardState, NativeKeyboard};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("field {0:?} is not registered")]
    UnknownField(FieldId),
    #[error("no field is being edited")]
    NoActiveSession,
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndEditReason {
    KeyboardDone,
    KeyboardCancel,
    KeyboardNext,
    Programmatic,
}

/// Application callbacks. All methods default to no-ops.
pub trait FieldListener {
    fn on_text_changed(&mut self, _field: FieldId, _text: &str) {}

    /// Bounds as mirrored to the keyboard: the caret on both ends when nothing
    /// is selected.
    fn on_selection_changed(&mut self, _field: FieldId, _start: usize, _end: usize) {}

    fn on_edit_ended(&mut self, _field: FieldId, _reason: EndEditReason) {}
}

pub type SharedListener = Rc<RefCell<dyn FieldListener>>;

/// Flags raised while keyboard-originated changes are being applied.
#[derive(Debug, Default)]
pub struct SyncGuards {
    outbound_selection: Cell<bool>,
    inbound_text: Cell<bool>,
}

impl SyncGuards {
    /// Selection changes must not be pushed to the keyboard.
    pub fn suppress_outbound_selection_sync(&self) -> bool {
        self.outbound_selection.get()
    }

    /// Text changes must not be pushed to the keyboard.
    pub fn suppress_inbound_text_apply(&self) -> bool {
        self.inbound_text.get()
    }

    fn scoped<R>(&self, text: bool, f: impl FnOnce() -> R) -> R {
        self.outbound_selection.set(true);
        self.inbound_text.set(text);
        let result = f();
        self.outbound_selection.set(false);
        self.inbound_text.set(false);
        result
    }
}

#[derive(Debug, Default)]
struct OutboundSync {
    pending: Cell<bool>,
    forced: Cell<bool>,
    last_sent: Cell<Option<(usize, usize)>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PointerTarget {
    Handle(HandleId),
    Menu(EditActions),
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyboardPolicy {
    Hide,
    /// Leave the keyboard up for the next field; it reloads its settings.
    Handoff,
}

struct FieldEntry {
    config: FieldConfig,
    text: String,
    geometry: FieldGeometry,
}

struct EditSession {
    field: FieldId,
    model: SelectionModel,
    handles_seen: Latch<SelectionChange>,
    menu_seen: Latch<SelectionChange>,
    outbound: Rc<OutboundSync>,
    /// Set once keyboard input changes the text length; cleared by a tap.
    typed_since_tap: bool,
    /// The user put the keyboard away; don't raise it again until a tap.
    keyboard_dismissed: bool,
    pointer: Option<PointerTarget>,
}

pub struct NativeSyncBridge {
    keyboard: Rc<dyn NativeKeyboard>,
    clipboard: Rc<dyn Clipboard>,
    layout: Box<dyn TextLayoutProvider>,
    listener: Option<SharedListener>,
    options: BridgeOptions,
    fields: HashMap<FieldId, FieldEntry>,
    handles: HandleCoordinator,
    menu: ContextMenu,
    gestures: GestureDetector,
    guards: Rc<SyncGuards>,
    session: Option<EditSession>,
}

impl NativeSyncBridge {
    pub fn new(
        keyboard: Rc<dyn NativeKeyboard>,
        layout: Box<dyn TextLayoutProvider>,
        options: BridgeOptions,
    ) -> Self {
        Self {
            keyboard,
            clipboard: Rc::new(MemoryClipboard::new()),
            layout,
            listener: None,
            options,
            fields: HashMap::new(),
            handles: HandleCoordinator::new(),
            menu: ContextMenu::new(),
            gestures: GestureDetector::new(),
            guards: Rc::new(SyncGuards::default()),
            session: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Rc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Takes effect from the next edit session.
    pub fn set_listener(&mut self, listener: SharedListener) {
        self.listener = Some(listener);
    }

    pub fn register_field(&mut self, id: FieldId, config: FieldConfig, text: impl Into<String>) {
        let entry = FieldEntry {
            config,
            text: text.into(),
            geometry: FieldGeometry::default(),
        };
        if self.fields.insert(id, entry).is_some() {
            log::debug!("field {id:?} re-registered");
        }
    }

    pub fn unregister_field(&mut self, id: FieldId) -> Result<(), BridgeError> {
        let ended = if self.focused() == Some(id) {
            self.end_session(EndEditReason::Programmatic, KeyboardPolicy::Hide)
        } else {
            Ok(())
        };
        self.fields.remove(&id);
        ended
    }

    pub fn set_geometry(&mut self, id: FieldId, geometry: FieldGeometry) -> Result<(), BridgeError> {
        let entry = self.fields.get_mut(&id).ok_or(BridgeError::UnknownField(id))?;
        entry.geometry = geometry;
        if self.focused() == Some(id) {
            self.resize_overlays();
            self.refresh_handles();
            self.place_menu();
        }
        Ok(())
    }

    pub fn text(&self, id: FieldId) -> Option<&str> {
        self.fields.get(&id).map(|e| e.text.as_str())
    }

    pub fn config(&self, id: FieldId) -> Option<&FieldConfig> {
        self.fields.get(&id).map(|e| &e.config)
    }

    pub fn focused(&self) -> Option<FieldId> {
        self.session.as_ref().map(|s| s.field)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.session.as_ref().map(|s| s.model.get())
    }

    /// Shared handle to the focused field's selection.
    pub fn selection_model(&self) -> Option<SelectionModel> {
        self.session.as_ref().map(|s| s.model.clone())
    }

    pub fn handles(&self) -> &HandleCoordinator {
        &self.handles
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn guards(&self) -> &SyncGuards {
        &self.guards
    }

    /// Focuses `id`, ending any session on another field first.
    pub fn begin_edit(&mut self, id: FieldId) -> Result<(), BridgeError> {
        let editable = !self
            .fields
            .get(&id)
            .ok_or(BridgeError::UnknownField(id))?
            .config
            .read_only;
        if let Some(current) = self.focused() {
            if current == id {
                return Ok(());
            }
            let policy = if editable { KeyboardPolicy::Handoff } else { KeyboardPolicy::Hide };
            self.end_session(EndEditReason::Programmatic, policy)?;
        }

        let entry = self.fields.get(&id).ok_or(BridgeError::UnknownField(id))?;
        self.layout.relayout(&entry.text);
        let text_len = char_len(&entry.text);
        let model = SelectionModel::new(text_len);
        model.collapse_to(text_len, ChangeOrigin::Api)?;

        let handles_seen = Latch::new();
        let menu_seen = Latch::new();
        let outbound = Rc::new(OutboundSync::default());
        {
            let latch = handles_seen.clone();
            model.subscribe("handles", move |change| {
                latch.merge(*change, SelectionChange::coalesce);
                Ok(())
            });
        }
        {
            let latch = menu_seen.clone();
            model.subscribe("context-menu", move |change| {
                latch.merge(*change, SelectionChange::coalesce);
                Ok(())
            });
        }
        {
            let guards = self.guards.clone();
            let outbound = outbound.clone();
            model.subscribe("keyboard-sync", move |_| {
                if !guards.suppress_outbound_selection_sync() {
                    outbound.pending.set(true);
                }
                Ok(())
            });
        }
        if let Some(listener) = self.listener.clone() {
            model.subscribe("application", move |change| {
                let (start, end) = change.current.sync_bounds();
                match listener.try_borrow_mut() {
                    Ok(mut l) => l.on_selection_changed(id, start, end),
                    Err(_) => log::warn!("field listener busy; selection callback dropped"),
                }
                Ok(())
            });
        }

        self.handles.bind(id);
        self.handles.set_enabled(entry.config.handles_enabled);
        self.menu.hide();
        self.gestures.reset();
        if editable && self.keyboard.state() != KeyboardState::Hidden {
            // Force a reload so the keyboard picks up this field's settings.
            self.keyboard.set_state(KeyboardState::Hidden);
        }

        self.session = Some(EditSession {
            field: id,
            model,
            handles_seen,
            menu_seen,
            outbound,
            typed_since_tap: false,
            keyboard_dismissed: false,
            pointer: None,
        });
        self.resize_overlays();
        self.refresh_handles();
        log::debug!("editing {id:?}");
        Ok(())
    }

    /// Ends the current session and puts the keyboard away.
    pub fn end_edit(&mut self) -> Result<(), BridgeError> {
        self.end_session(EndEditReason::Programmatic, KeyboardPolicy::Hide)
    }

    /// One frame of work; see the module docs for the order.
    pub fn tick(&mut self, dt: Duration) -> Result<(), BridgeError> {
        let drained = self.drain_events();
        self.load_keyboard_if_needed();
        self.reconcile();
        self.flush_outbound();
        self.advance_handles(dt);
        drained
    }

    pub fn set_caret(&mut self, position: usize) -> Result<(), BridgeError> {
        self.with_model(|model, _| model.set_caret(position))
    }

    pub fn set_selection(&mut self, start: usize, end: usize) -> Result<(), BridgeError> {
        self.with_model(|model, _| model.set_selection(start, end))
    }

    pub fn select_all(&mut self) -> Result<(), BridgeError> {
        self.with_model(|model, _| model.select_all())
    }

    pub fn select_word_at(&mut self, position: usize) -> Result<(), BridgeError> {
        self.with_model(|model, text| model.select_word_at(position, text))
    }

    pub fn clear_selection(&mut self) -> Result<(), BridgeError> {
        self.with_model(|model, _| model.clear())
    }

    /// Replaces the text of `id` from the application side.
    pub fn set_text(&mut self, id: FieldId, text: impl Into<String>) -> Result<(), BridgeError> {
        let text = text.into();
        if self.focused() == Some(id) {
            return self.commit_local_text(text, None);
        }
        let entry = self.fields.get_mut(&id).ok_or(BridgeError::UnknownField(id))?;
        if entry.text != text {
            entry.text = text;
            notify(&self.listener, |l| l.on_text_changed(id, &entry.text));
        }
        Ok(())
    }

    fn with_model(&mut self, f: impl FnOnce(&SelectionModel, &str) -> EditResult<()>) -> Result<(), BridgeError> {
        let session = self.session.as_ref().ok_or(BridgeError::NoActiveSession)?;
        let text = self.fields.get(&session.field).map_or("", |e| e.text.as_str());
        let result = f(&session.model, text);
        self.reconcile();
        self.flush_outbound();
        Ok(result?)
    }

    /// Applies a local edit to the focused field and mirrors it to the
    /// keyboard.
    fn commit_local_text(&mut self, text: String, caret: Option<usize>) -> Result<(), BridgeError> {
        let session = self.session.as_ref().ok_or(BridgeError::NoActiveSession)?;
        let field = session.field;
        let entry = self.fields.get_mut(&field).ok_or(BridgeError::UnknownField(field))?;
        if entry.text == text && caret.is_none() {
            return Ok(());
        }
        entry.text = text;
        self.layout.relayout(&entry.text);
        if !self.guards.suppress_inbound_text_apply()
            && !entry.config.read_only
            && self.keyboard.state() != KeyboardState::Hidden
        {
            self.keyboard.change_text(&entry.text);
        }
        notify(&self.listener, |l| l.on_text_changed(field, &entry.text));

        let model = session.model.clone();
        let mut result = model.set_text_len(char_len(&entry.text), ChangeOrigin::Api);
        if let (Ok(()), Some(caret)) = (&result, caret) {
            result = model.collapse_to(caret, ChangeOrigin::Api);
        }
        self.reconcile();
        self.refresh_handles();
        self.flush_outbound();
        Ok(result?)
    }

    fn load_keyboard_if_needed(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(entry) = self.fields.get(&session.field) else {
            return;
        };
        if entry.config.read_only || session.keyboard_dismissed || self.keyboard.state() != KeyboardState::Hidden {
            return;
        }
        log::debug!("raising keyboard for {:?}", session.field);
        let request = entry.config.show_request(&entry.text);
        self.keyboard.set_state(KeyboardState::PendingShow);
        self.keyboard.show(&request);
    }

    fn drain_events(&mut self) -> Result<(), BridgeError> {
        while let Some(raw) = self.keyboard.pop_event() {
            if self.session.is_none() {
                log::debug!("no field focused; dropping {:?}", raw.kind);
                continue;
            }
            let event = match KeyboardEvent::try_from(raw) {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("dropping keyboard event: {e}");
                    continue;
                }
            };
            log::trace!("keyboard event {event:?}");
            if event.is_terminal() {
                self.keyboard.clear_event_queue();
                return self.finish_from_keyboard(event);
            }
            match event {
                KeyboardEvent::Show => self.on_keyboard_shown()?,
                KeyboardEvent::Hide => self.on_keyboard_hidden(),
                KeyboardEvent::TextChanged(text) => {
                    let guards = self.guards.clone();
                    guards.scoped(true, || self.apply_inbound_text(text))?;
                }
                KeyboardEvent::SelectionChanged { start, end } => {
                    let guards = self.guards.clone();
                    guards.scoped(false, || self.apply_inbound_selection(start, end))?;
                }
                // Terminal events returned above.
                KeyboardEvent::Submit | KeyboardEvent::Done | KeyboardEvent::Next | KeyboardEvent::Cancel => {}
            }
            self.reconcile();
        }
        Ok(())
    }

    fn on_keyboard_shown(&mut self) -> EditResult<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        // Re-assert the caret so the freshly shown keyboard gets our selection.
        session.model.set_caret(session.model.caret())?;
        session.outbound.forced.set(true);
        Ok(())
    }

    fn on_keyboard_hidden(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if self.keyboard.state() == KeyboardState::Hidden {
            log::debug!("keyboard dismissed while editing {:?}", session.field);
            session.keyboard_dismissed = true;
        }
    }

    fn apply_inbound_text(&mut self, text: String) -> Result<(), BridgeError> {
        let session = self.session.as_mut().ok_or(BridgeError::NoActiveSession)?;
        let field = session.field;
        let entry = self.fields.get_mut(&field).ok_or(BridgeError::UnknownField(field))?;
        if entry.text == text {
            return Ok(());
        }
        let before = char_len(&entry.text);
        entry.text = text;
        let after = char_len(&entry.text);
        self.layout.relayout(&entry.text);
        notify(&self.listener, |l| l.on_text_changed(field, &entry.text));

        if before != after && !session.typed_since_tap {
            session.typed_since_tap = true;
            self.menu.hide();
            self.handles.set_caret_suppressed(true);
        }
        let model = session.model.clone();
        let result = model.set_text_len(after, ChangeOrigin::Keyboard);
        self.refresh_handles();
        Ok(result?)
    }

    fn apply_inbound_selection(&mut self, start: usize, end: usize) -> Result<(), BridgeError> {
        let session = self.session.as_ref().ok_or(BridgeError::NoActiveSession)?;
        session.outbound.last_sent.set(Some((start.min(end), start.max(end))));
        // The keyboard's cursor sits at the end it reported, even when the
        // bounds themselves are unchanged.
        Ok(session.model.set_bounds(start, end, end, ChangeOrigin::Keyboard)?)
    }

    fn finish_from_keyboard(&mut self, event: KeyboardEvent) -> Result<(), BridgeError> {
        let Some(field) = self.focused() else {
            return Ok(());
        };
        match event {
            KeyboardEvent::Cancel => self.end_session(EndEditReason::KeyboardCancel, KeyboardPolicy::Hide),
            KeyboardEvent::Next => {
                let next = self.fields.get(&field).and_then(|e| e.config.next_field);
                match next.and_then(|id| self.fields.get(&id).map(|e| (id, !e.config.read_only))) {
                    Some((next, editable)) => {
                        let policy = if editable { KeyboardPolicy::Handoff } else { KeyboardPolicy::Hide };
                        let ended = self.end_session(EndEditReason::KeyboardNext, policy);
                        self.begin_edit(next)?;
                        ended
                    }
                    None => {
                        if let Some(missing) = next {
                            log::warn!("next field {missing:?} is not registered; finishing instead");
                        }
                        self.end_session(EndEditReason::KeyboardDone, KeyboardPolicy::Hide)
                    }
                }
            }
            _ => self.end_session(EndEditReason::KeyboardDone, KeyboardPolicy::Hide),
        }
    }

    fn end_session(&mut self, reason: EndEditReason, policy: KeyboardPolicy) -> Result<(), BridgeError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let reset = session.model.reset();
        self.handles.unbind();
        self.menu.hide();
        self.gestures.reset();

        let read_only = self.fields.get(&session.field).is_some_and(|e| e.config.read_only);
        match policy {
            KeyboardPolicy::Handoff => self.keyboard.set_state(KeyboardState::Hidden),
            KeyboardPolicy::Hide if read_only => {}
            KeyboardPolicy::Hide => {
                self.keyboard.set_state(KeyboardState::PendingHide);
                self.keyboard.hide();
            }
        }
        notify(&self.listener, |l| l.on_edit_ended(session.field, reason));
        log::debug!("stopped editing {:?}: {reason:?}", session.field);
        Ok(reset?)
    }

    /// Hands pending selection changes to the handles and the action bar.
    fn reconcile(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(entry) = self.fields.get(&session.field) else {
            return;
        };
        let selection = session.model.get();
        if session.handles_seen.take().is_some() {
            self.handles.refresh(selection, self.layout.as_ref(), &entry.geometry);
        }
        if let Some(change) = session.menu_seen.take()
            && entry.config.menu_enabled
        {
            let capabilities = entry.config.capabilities();
            self.menu
                .on_selection_changed(&change, &capabilities, session.model.text_len());
            if self.menu.is_visible() && change.range_changed() {
                let anchor = glyph_origin(self.layout.as_ref(), selection.leading_edge());
                self.menu.place(anchor, &entry.geometry);
            }
        }
    }

    /// Pushes the selection to the keyboard if a local change is pending.
    fn flush_outbound(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let outbound = &session.outbound;
        let forced = outbound.forced.replace(false);
        if !outbound.pending.replace(false) && !forced {
            return;
        }
        let read_only = self.fields.get(&session.field).is_none_or(|e| e.config.read_only);
        if read_only || self.keyboard.state() != KeyboardState::Visible {
            return;
        }
        let (start, end) = session.model.get().sync_bounds();
        if !forced && outbound.last_sent.get() == Some((start, end)) {
            return;
        }
        self.keyboard.change_selection(start, end);
        outbound.last_sent.set(Some((start, end)));
    }

    fn advance_handles(&mut self, dt: Duration) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(entry) = self.fields.get(&session.field) else {
            return;
        };
        self.handles
            .advance(dt, session.model.get(), self.layout.as_ref(), &entry.geometry);
    }

    fn refresh_handles(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(entry) = self.fields.get(&session.field) else {
            return;
        };
        self.handles
            .refresh(session.model.get(), self.layout.as_ref(), &entry.geometry);
    }

    fn place_menu(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(entry) = self.fields.get(&session.field) else {
            return;
        };
        if self.menu.is_visible() {
            let anchor = glyph_origin(self.layout.as_ref(), session.model.get().leading_edge());
            self.menu.place(anchor, &entry.geometry);
        }
    }

    /// Sizes handles and the action bar for the focused field.
    fn resize_overlays(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(entry) = self.fields.get(&session.field) else {
            return;
        };
        let target = touch_target_size(
            self.options.display.as_ref(),
            entry.config.font_size,
            entry.geometry.canvas_scale,
        );
        self.handles.resize(target * self.options.handle_scale);
        self.menu
            .update_size(&entry.geometry, target, self.options.menu_height_ratio);
    }
}

fn notify(listener: &Option<SharedListener>, f: impl FnOnce(&mut dyn FieldListener)) {
    let Some(listener) = listener else {
        return;
    };
    match listener.try_borrow_mut() {
        Ok(mut l) => f(&mut *l),
        Err(_) => log::warn!("field listener busy; callback dropped"),
    }
}
