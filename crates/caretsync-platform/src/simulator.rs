//! In-process stand-in for an on-screen keyboard.
//!
//! Behaves like a platform keyboard as far as the bridge can tell: it takes a
//! while to appear and disappear, owns its own copy of the text and selection,
//! and reports every change back through its event queue. It also records
//! each outbound call it receives.

use std::cell::{Cell, RefCell};

use caretsync_core::animation::{AnimationSpec, Transition};
use caretsync_ui::text::{byte_to_char, char_len, char_to_byte, replace_chars};
use unicode_segmentation::UnicodeSegmentation;
use web_time::Duration;

use crate::config::CharacterValidator;
use crate::keyboard::{
    ContentValidation, EventQueue, EventSender, KeyboardState, LineMode, NativeKeyboard, RawEventKind,
    RawKeyboardEvent, ShowRequest,
};

pub const TRANSITION_TIME: Duration = Duration::from_millis(500);

/// Outbound call received from the bridge.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyboardCall {
    SetState(KeyboardState),
    Show(ShowRequest),
    Hide,
    ChangeText(String),
    ChangeSelection(usize, usize),
    ClearEventQueue,
}

pub struct SimulatorKeyboard {
    state: Cell<KeyboardState>,
    request: RefCell<ShowRequest>,
    validator: RefCell<Option<CharacterValidator>>,
    text: RefCell<String>,
    selection: Cell<(usize, usize)>,
    transition: RefCell<Transition>,
    queue: EventQueue,
    calls: RefCell<Vec<KeyboardCall>>,
}

impl Default for SimulatorKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatorKeyboard {
    pub fn new() -> Self {
        Self {
            state: Cell::new(KeyboardState::Hidden),
            request: RefCell::new(ShowRequest::default()),
            validator: RefCell::new(None),
            text: RefCell::new(String::new()),
            selection: Cell::new((0, 0)),
            transition: RefCell::new(Transition::new(AnimationSpec::linear(TRANSITION_TIME))),
            queue: EventQueue::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn sender(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection.get()
    }

    pub fn request(&self) -> ShowRequest {
        self.request.borrow().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.state.get() == KeyboardState::Visible
    }

    pub fn calls(&self) -> Vec<KeyboardCall> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<KeyboardCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Selection pushes received so far, oldest first.
    pub fn selection_pushes(&self) -> Vec<(usize, usize)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                KeyboardCall::ChangeSelection(s, e) => Some((*s, *e)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: KeyboardCall) {
        self.calls.borrow_mut().push(call);
    }

    /// Pushes an arbitrary event, as a misbehaving keyboard might.
    pub fn emit(&self, event: RawKeyboardEvent) {
        self.queue.push(event);
    }

    /// Steps the show/hide animation; reports `Show`/`Hide` when it ends.
    pub fn advance(&self, dt: Duration) {
        let state = self.state.get();
        if !matches!(state, KeyboardState::PendingShow | KeyboardState::PendingHide) {
            return;
        }
        {
            let mut transition = self.transition.borrow_mut();
            transition.advance(dt);
            if transition.is_running() {
                return;
            }
        }
        if state == KeyboardState::PendingShow {
            self.state.set(KeyboardState::Visible);
            self.queue.push(RawKeyboardEvent::bare(RawEventKind::Show));
        } else {
            self.state.set(KeyboardState::Hidden);
            self.queue.push(RawKeyboardEvent::bare(RawEventKind::Hide));
        }
    }

    /// Types `input` over the current selection.
    pub fn type_text(&self, input: &str) {
        if !self.is_visible() {
            log::debug!("keyboard not visible; dropping input {input:?}");
            return;
        }
        let mut accepted: String = input.chars().filter_map(|ch| self.filter(ch)).collect();
        let (start, end) = self.selection.get();
        let limit = self.request.borrow().character_limit;
        if limit > 0 {
            let kept = char_len(&self.text.borrow()) - (end - start);
            accepted = accepted.chars().take(limit.saturating_sub(kept)).collect();
        }
        if accepted.is_empty() && start == end {
            return;
        }
        self.replace(start, end, &accepted);
    }

    /// Deletes the selection, or the grapheme before the caret.
    pub fn backspace(&self) {
        if !self.is_visible() {
            return;
        }
        let (start, end) = self.selection.get();
        if start != end {
            self.replace(start, end, "");
            return;
        }
        if start == 0 {
            return;
        }
        let prev = {
            let text = self.text.borrow();
            let byte = char_to_byte(&text, start);
            let boundary = text
                .grapheme_indices(true)
                .map(|(i, _)| i)
                .take_while(|i| *i < byte)
                .last()
                .unwrap_or(0);
            byte_to_char(&text, boundary)
        };
        self.replace(prev, start, "");
    }

    /// Moves the keyboard's own cursor, as with a spacebar trackpad.
    pub fn move_selection(&self, start: usize, end: usize) {
        if !self.is_visible() {
            return;
        }
        let len = char_len(&self.text.borrow());
        let (start, end) = (start.min(len), end.min(len));
        // The event keeps the drag direction; the stored range is ordered.
        self.selection.set((start.min(end), start.max(end)));
        self.queue.push(RawKeyboardEvent::selection(start, end));
    }

    /// The return key: a newline in newline-mode fields, otherwise the
    /// terminal key the field asked for.
    pub fn press_return(&self) {
        let request = self.request.borrow().clone();
        match request.line_mode {
            LineMode::MultiLineNewline => self.type_text("\n"),
            LineMode::MultiLineSubmit => self.queue.push(RawKeyboardEvent::bare(RawEventKind::Submit)),
            LineMode::SingleLine if request.has_next => {
                self.queue.push(RawKeyboardEvent::bare(RawEventKind::Next))
            }
            LineMode::SingleLine => self.queue.push(RawKeyboardEvent::bare(RawEventKind::Done)),
        }
    }

    pub fn press_cancel(&self) {
        self.queue.push(RawKeyboardEvent::bare(RawEventKind::Cancel));
    }

    fn replace(&self, start: usize, end: usize, insert: &str) {
        let (text, caret) = {
            let mut text = self.text.borrow_mut();
            let caret = replace_chars(&mut text, start..end, insert);
            (text.clone(), caret)
        };
        self.selection.set((caret, caret));
        self.queue.push(RawKeyboardEvent::new(RawEventKind::TextChanged, text));
        self.queue.push(RawKeyboardEvent::selection(caret, caret));
    }

    fn filter(&self, ch: char) -> Option<char> {
        let request = self.request.borrow();
        if ch == '\n' {
            return (request.line_mode != LineMode::SingleLine).then_some(ch);
        }
        if !request.emojis_allowed && is_emoji(ch) {
            return None;
        }
        let ok = match request.validation {
            ContentValidation::None => true,
            ContentValidation::Integer => ch.is_ascii_digit() || ch == '-',
            ContentValidation::Decimal => ch.is_ascii_digit() || ch == '-' || ch == '.',
            ContentValidation::Alphanumeric => ch.is_alphanumeric(),
            ContentValidation::Name => ch.is_alphabetic() || ch == ' ' || ch == '\'',
            ContentValidation::EmailAddress => ch.is_alphanumeric() || "@._-+".contains(ch),
            ContentValidation::Custom => {
                return match &*self.validator.borrow() {
                    Some(validator) => validator.validate(ch),
                    None => Some(ch),
                };
            }
        };
        ok.then_some(ch)
    }
}

fn is_emoji(ch: char) -> bool {
    matches!(ch as u32, 0x1F000..=0x1FAFF | 0x2600..=0x27BF)
}

impl NativeKeyboard for SimulatorKeyboard {
    fn state(&self) -> KeyboardState {
        self.state.get()
    }

    fn set_state(&self, state: KeyboardState) {
        self.record(KeyboardCall::SetState(state));
        self.state.set(state);
    }

    fn show(&self, request: &ShowRequest) {
        self.record(KeyboardCall::Show(request.clone()));
        let validator = request
            .validator_spec
            .as_deref()
            .and_then(|spec| match CharacterValidator::from_spec(spec) {
                Ok(v) => Some(v),
                Err(e) => {
                    log::warn!("ignoring unreadable validator spec: {e}");
                    None
                }
            });
        *self.validator.borrow_mut() = validator;
        *self.text.borrow_mut() = request.text.clone();
        let len = char_len(&request.text);
        self.selection.set((len, len));
        *self.request.borrow_mut() = request.clone();
        self.state.set(KeyboardState::PendingShow);
        self.transition.borrow_mut().restart();
    }

    fn hide(&self) {
        self.record(KeyboardCall::Hide);
        self.state.set(KeyboardState::PendingHide);
        self.transition.borrow_mut().restart();
    }

    fn change_text(&self, text: &str) {
        self.record(KeyboardCall::ChangeText(text.to_owned()));
        *self.text.borrow_mut() = text.to_owned();
        let len = char_len(text);
        let (start, end) = self.selection.get();
        self.selection.set((start.min(len), end.min(len)));
    }

    fn change_selection(&self, start: usize, end: usize) {
        self.record(KeyboardCall::ChangeSelection(start, end));
        let len = char_len(&self.text.borrow());
        let (start, end) = (start.min(len), end.min(len));
        self.selection.set((start.min(end), start.max(end)));
    }

    fn pop_event(&self) -> Option<RawKeyboardEvent> {
        self.queue.pop()
    }

    fn clear_event_queue(&self) {
        self.record(KeyboardCall::ClearEventQueue);
        self.queue.clear();
    }
}
