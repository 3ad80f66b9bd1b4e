//! Protocol spoken with the platform's on-screen keyboard.
//!
//! The keyboard runs outside our control (often on another thread) and talks
//! back through an [`EventQueue`]: it pushes [`RawKeyboardEvent`]s, the bridge
//! pops and parses them once per frame.

use std::collections::VecDeque;
use std::num::ParseIntError;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyboardState {
    Hidden,
    PendingShow,
    Visible,
    PendingHide,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyboardKind {
    #[default]
    Default,
    AsciiCapable,
    DecimalPad,
    Url,
    NumberPad,
    PhonePad,
    EmailAddress,
}

/// Character class a field accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentValidation {
    #[default]
    None,
    Integer,
    Decimal,
    Alphanumeric,
    Name,
    EmailAddress,
    /// Defer to the field's [`CharacterValidator`](crate::config::CharacterValidator).
    Custom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineMode {
    #[default]
    SingleLine,
    /// Multiple lines, the return key submits.
    MultiLineSubmit,
    /// Multiple lines, the return key inserts a newline.
    MultiLineNewline,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Autocapitalization {
    #[default]
    None,
    Characters,
    Words,
    Sentences,
}

/// Everything the keyboard needs to present itself for a field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShowRequest {
    pub text: String,
    pub kind: KeyboardKind,
    pub validation: ContentValidation,
    pub line_mode: LineMode,
    pub autocapitalization: Autocapitalization,
    pub autocorrect: bool,
    pub secure: bool,
    pub emojis_allowed: bool,
    /// Whether the keyboard should offer "next" instead of "done".
    pub has_next: bool,
    /// `0` means unlimited.
    pub character_limit: usize,
    /// JSON-encoded custom validator, for [`ContentValidation::Custom`].
    pub validator_spec: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    Show,
    Hide,
    TextChanged,
    SelectionChanged,
    Submit,
    Done,
    Next,
    Cancel,
}

/// Event exactly as the keyboard reported it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawKeyboardEvent {
    pub kind: RawEventKind,
    pub value: String,
}

impl RawKeyboardEvent {
    pub fn new(kind: RawEventKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn bare(kind: RawEventKind) -> Self {
        Self::new(kind, String::new())
    }

    pub fn selection(start: usize, end: usize) -> Self {
        Self::new(RawEventKind::SelectionChanged, format!("{start}, {end}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyboardEvent {
    Show,
    Hide,
    TextChanged(String),
    SelectionChanged { start: usize, end: usize },
    Submit,
    Done,
    Next,
    Cancel,
}

impl KeyboardEvent {
    /// Events that end the edit session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            KeyboardEvent::Submit | KeyboardEvent::Done | KeyboardEvent::Next | KeyboardEvent::Cancel
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("selection payload {payload:?} is not of the form `start, end`")]
    MalformedSelection { payload: String },
    #[error("selection payload {payload:?} has a non-numeric bound")]
    InvalidOffset {
        payload: String,
        #[source]
        source: ParseIntError,
    },
}

/// Parses a `"start, end"` selection payload.
pub fn parse_selection(payload: &str) -> Result<(usize, usize), ProtocolError> {
    let Some((start, end)) = payload.split_once(',') else {
        return Err(ProtocolError::MalformedSelection {
            payload: payload.to_owned(),
        });
    };
    let parse = |s: &str| {
        s.trim().parse::<usize>().map_err(|source| ProtocolError::InvalidOffset {
            payload: payload.to_owned(),
            source,
        })
    };
    Ok((parse(start)?, parse(end)?))
}

impl TryFrom<RawKeyboardEvent> for KeyboardEvent {
    type Error = ProtocolError;

    fn try_from(raw: RawKeyboardEvent) -> Result<Self, Self::Error> {
        Ok(match raw.kind {
            RawEventKind::Show => KeyboardEvent::Show,
            RawEventKind::Hide => KeyboardEvent::Hide,
            RawEventKind::TextChanged => KeyboardEvent::TextChanged(raw.value),
            RawEventKind::SelectionChanged => {
                let (start, end) = parse_selection(&raw.value)?;
                KeyboardEvent::SelectionChanged { start, end }
            }
            RawEventKind::Submit => KeyboardEvent::Submit,
            RawEventKind::Done => KeyboardEvent::Done,
            RawEventKind::Next => KeyboardEvent::Next,
            RawEventKind::Cancel => KeyboardEvent::Cancel,
        })
    }
}

/// FIFO of keyboard events, shared with whichever thread the keyboard
/// reports from.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<RawKeyboardEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: RawKeyboardEvent) {
        self.inner.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<RawKeyboardEvent> {
        self.inner.lock().pop_front()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Push-only handle for the keyboard side.
    pub fn sender(&self) -> EventSender {
        EventSender {
            inner: self.inner.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventSender {
    inner: Arc<Mutex<VecDeque<RawKeyboardEvent>>>,
}

impl EventSender {
    pub fn send(&self, event: RawKeyboardEvent) {
        self.inner.lock().push_back(event);
    }
}

/// The platform keyboard as seen from the bridge.
///
/// Outbound calls are fire-and-forget. Results come back as events through
/// [`pop_event`](NativeKeyboard::pop_event).
pub trait NativeKeyboard {
    fn state(&self) -> KeyboardState;

    fn set_state(&self, state: KeyboardState);

    fn show(&self, request: &ShowRequest);

    fn hide(&self);

    fn change_text(&self, text: &str);

    fn change_selection(&self, start: usize, end: usize);

    fn pop_event(&self) -> Option<RawKeyboardEvent>;

    fn clear_event_queue(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_payload_parses_with_spaces() {
        assert_eq!(parse_selection("3, 7"), Ok((3, 7)));
        assert_eq!(parse_selection("12,4"), Ok((12, 4)));
    }

    #[test]
    fn malformed_selection_payloads_are_rejected() {
        assert!(matches!(
            parse_selection("37"),
            Err(ProtocolError::MalformedSelection { .. })
        ));
        assert!(matches!(
            parse_selection("3, x"),
            Err(ProtocolError::InvalidOffset { .. })
        ));
        assert!(matches!(
            parse_selection("-1, 2"),
            Err(ProtocolError::InvalidOffset { .. })
        ));
    }

    #[test]
    fn raw_events_convert() {
        let event = KeyboardEvent::try_from(RawKeyboardEvent::selection(2, 5)).unwrap();
        assert_eq!(event, KeyboardEvent::SelectionChanged { start: 2, end: 5 });
        let event = KeyboardEvent::try_from(RawKeyboardEvent::new(RawEventKind::TextChanged, "hi")).unwrap();
        assert_eq!(event, KeyboardEvent::TextChanged("hi".into()));
        assert!(KeyboardEvent::Next.is_terminal());
        assert!(!KeyboardEvent::Show.is_terminal());
    }

    #[test]
    fn queue_is_fifo_across_threads() {
        let queue = EventQueue::new();
        let sender = queue.sender();
        std::thread::spawn(move || {
            sender.send(RawKeyboardEvent::bare(RawEventKind::Show));
            sender.send(RawKeyboardEvent::bare(RawEventKind::Done));
        })
        .join()
        .unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|e| e.kind), Some(RawEventKind::Show));
        queue.clear();
        assert!(queue.is_empty());
    }
}
