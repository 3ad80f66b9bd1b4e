//! Caret and selection state of the focused field.
//!
//! [`SelectionModel`] is a cheap-to-clone handle; every clone sees the same
//! state and the same observers. Observers run synchronously, in
//! subscription order, after each committed change. An observer that tries to
//! mutate the model from inside its notification gets
//! [`EditError::Reentrancy`](caretsync_core::EditError) back, and so does the
//! caller whose mutation triggered the notification.

use std::cell::Cell;
use std::rc::Rc;

use caretsync_core::{EditResult, ObserverId, ObserverList};

/// Caret position plus selection bounds, in character offsets.
///
/// `start <= end` always holds. The caret is tracked on its own and need not
/// coincide with either bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    pub caret: usize,
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub const fn collapsed(at: usize) -> Self {
        Self {
            caret: at,
            start: at,
            end: at,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.end > self.start
    }

    /// Bounds mirrored to an external keyboard: the selection when there is
    /// one, otherwise the caret on both ends.
    pub fn sync_bounds(&self) -> (usize, usize) {
        if self.has_selection() {
            (self.start, self.end)
        } else {
            (self.caret, self.caret)
        }
    }

    /// Character offset the action bar anchors to.
    pub fn leading_edge(&self) -> usize {
        if self.has_selection() { self.start } else { self.caret }
    }
}

/// Who asked for a change. Observers use it to tell keyboard-driven updates
/// from local ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    Api,
    Drag,
    Keyboard,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Selection,
    pub current: Selection,
    pub origin: ChangeOrigin,
}

impl SelectionChange {
    pub fn range_changed(&self) -> bool {
        self.previous.start != self.current.start || self.previous.end != self.current.end
    }

    pub fn caret_changed(&self) -> bool {
        self.previous.caret != self.current.caret
    }

    /// Folds two consecutive changes into one spanning both.
    pub fn coalesce(self, later: SelectionChange) -> SelectionChange {
        SelectionChange {
            previous: self.previous,
            current: later.current,
            origin: later.origin,
        }
    }
}

struct Inner {
    state: Cell<Selection>,
    text_len: Cell<usize>,
    observers: ObserverList<SelectionChange>,
}

#[derive(Clone)]
pub struct SelectionModel {
    inner: Rc<Inner>,
}

impl SelectionModel {
    pub fn new(text_len: usize) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: Cell::new(Selection::default()),
                text_len: Cell::new(text_len),
                observers: ObserverList::new(),
            }),
        }
    }

    pub fn get(&self) -> Selection {
        self.inner.state.get()
    }

    pub fn caret(&self) -> usize {
        self.get().caret
    }

    pub fn start(&self) -> usize {
        self.get().start
    }

    pub fn end(&self) -> usize {
        self.get().end
    }

    pub fn has_selection(&self) -> bool {
        self.get().has_selection()
    }

    pub fn text_len(&self) -> usize {
        self.inner.text_len.get()
    }

    /// Whether an observer is currently being notified.
    pub fn is_notifying(&self) -> bool {
        self.inner.observers.is_notifying()
    }

    pub fn subscribe(
        &self,
        label: &'static str,
        f: impl FnMut(&SelectionChange) -> EditResult<()> + 'static,
    ) -> ObserverId {
        self.inner.observers.subscribe(label, f)
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.inner.observers.unsubscribe(id);
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Moves the caret without touching the selection bounds.
    pub fn set_caret(&self, position: usize) -> EditResult<()> {
        self.set_caret_with(position, ChangeOrigin::Api)
    }

    pub fn set_caret_with(&self, position: usize, origin: ChangeOrigin) -> EditResult<()> {
        let mut next = self.get();
        next.caret = self.clamp(position);
        self.commit(next, origin)
    }

    /// Collapses the selection and puts the caret at `position`.
    pub fn collapse_to(&self, position: usize, origin: ChangeOrigin) -> EditResult<()> {
        self.commit(Selection::collapsed(self.clamp(position)), origin)
    }

    pub fn set_selection(&self, start: usize, end: usize) -> EditResult<()> {
        self.set_selection_with(start, end, ChangeOrigin::Api)
    }

    /// Sets the bounds, swapping them if given backwards.
    ///
    /// The caret follows whichever bound moved; when both moved it goes to
    /// `start` if the selection grew or shifted toward the beginning and to
    /// `end` otherwise.
    pub fn set_selection_with(&self, start: usize, end: usize, origin: ChangeOrigin) -> EditResult<()> {
        let (start, end) = self.ordered(start, end);
        let old = self.get();
        let caret = match (start != old.start, end != old.end) {
            (true, false) => start,
            (false, true) => end,
            (false, false) => old.caret,
            (true, true) if start < old.start => start,
            (true, true) => end,
        };
        self.commit(Selection { caret, start, end }, origin)
    }

    /// Sets the bounds and the caret in one change.
    pub fn set_bounds(&self, start: usize, end: usize, caret: usize, origin: ChangeOrigin) -> EditResult<()> {
        let (start, end) = self.ordered(start, end);
        let caret = self.clamp(caret);
        self.commit(Selection { caret, start, end }, origin)
    }

    pub fn select_all(&self) -> EditResult<()> {
        let len = self.text_len();
        self.commit(
            Selection {
                caret: len,
                start: 0,
                end: len,
            },
            ChangeOrigin::Api,
        )
    }

    /// Selects the run of word characters around `position`.
    pub fn select_word_at(&self, position: usize, text: &str) -> EditResult<()> {
        self.select_word_at_with(position, text, |ch| ch.is_alphanumeric() || ch == '_')
    }

    /// Like [`select_word_at`](Self::select_word_at) with a custom word test.
    ///
    /// Positions on a non-word character or past the end collapse the
    /// selection there instead.
    pub fn select_word_at_with(
        &self,
        position: usize,
        text: &str,
        is_word: impl Fn(char) -> bool,
    ) -> EditResult<()> {
        let chars: Vec<char> = text.chars().collect();
        let position = position.min(chars.len());
        if chars.get(position).is_none_or(|ch| !is_word(*ch)) {
            return self.collapse_to(position, ChangeOrigin::Api);
        }

        let mut start = position;
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
        let mut end = position;
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }
        self.set_bounds(start, end, end, ChangeOrigin::Api)
    }

    /// Drops the selection, keeping the caret where it is.
    pub fn clear(&self) -> EditResult<()> {
        if !self.has_selection() {
            return self.inner.observers.check_mutation();
        }
        let caret = self.caret();
        self.commit(Selection::collapsed(caret), ChangeOrigin::Api)
    }

    /// Back to `(0, 0, 0)`, used when editing ends.
    pub fn reset(&self) -> EditResult<()> {
        self.commit(Selection::default(), ChangeOrigin::Reset)
    }

    /// Updates the text length and clamps the current state into it.
    pub fn set_text_len(&self, len: usize, origin: ChangeOrigin) -> EditResult<()> {
        self.inner.observers.check_mutation()?;
        self.inner.text_len.set(len);
        let old = self.get();
        let next = Selection {
            caret: old.caret.min(len),
            start: old.start.min(len),
            end: old.end.min(len),
        };
        self.commit(next, origin)
    }

    fn clamp(&self, position: usize) -> usize {
        position.min(self.text_len())
    }

    fn ordered(&self, a: usize, b: usize) -> (usize, usize) {
        let (a, b) = (self.clamp(a), self.clamp(b));
        if a <= b { (a, b) } else { (b, a) }
    }

    fn commit(&self, next: Selection, origin: ChangeOrigin) -> EditResult<()> {
        self.inner.observers.check_mutation()?;
        let previous = self.get();
        if previous == next {
            return Ok(());
        }
        self.inner.state.set(next);
        log::trace!("selection {previous:?} -> {next:?} ({origin:?})");
        self.inner.observers.notify(&SelectionChange {
            previous,
            current: next,
            origin,
        })
    }
}

impl std::fmt::Debug for SelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionModel")
            .field("state", &self.get())
            .field("text_len", &self.text_len())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caretsync_core::EditError;
    use std::cell::RefCell;

    fn recorded(model: &SelectionModel) -> Rc<RefCell<Vec<SelectionChange>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        model.subscribe("recorder", move |change| {
            sink.borrow_mut().push(*change);
            Ok(())
        });
        seen
    }

    #[test]
    fn backwards_bounds_are_swapped() {
        let model = SelectionModel::new(10);
        model.set_selection(7, 2).unwrap();
        let sel = model.get();
        assert_eq!((sel.start, sel.end), (2, 7));
    }

    #[test]
    fn bounds_are_clamped_to_text() {
        let model = SelectionModel::new(5);
        model.set_selection(3, 40).unwrap();
        assert_eq!((model.start(), model.end()), (3, 5));
        model.set_caret(99).unwrap();
        assert_eq!(model.caret(), 5);
    }

    #[test]
    fn caret_follows_moved_bound() {
        let model = SelectionModel::new(20);
        model.set_selection(5, 10).unwrap();
        model.set_selection(5, 12).unwrap();
        assert_eq!(model.caret(), 12);
        model.set_selection(3, 12).unwrap();
        assert_eq!(model.caret(), 3);
        // Both moved forward: caret lands on the end.
        model.set_selection(6, 15).unwrap();
        assert_eq!(model.caret(), 15);
    }

    #[test]
    fn select_all_spans_text() {
        let model = SelectionModel::new(11);
        model.select_all().unwrap();
        assert_eq!(model.get(), Selection { caret: 11, start: 0, end: 11 });
    }

    #[test]
    fn word_selection() {
        let model = SelectionModel::new(11);
        model.select_word_at(8, "hello world").unwrap();
        assert_eq!((model.start(), model.end()), (6, 11));
        model.select_word_at(5, "hello world").unwrap();
        assert!(!model.has_selection());
        assert_eq!(model.caret(), 5);
        model.select_word_at(11, "hello world").unwrap();
        assert_eq!(model.get(), Selection::collapsed(11));
    }

    #[test]
    fn custom_word_test() {
        let model = SelectionModel::new(9);
        model.select_word_at_with(2, "a-b-c d-e", |ch| ch != ' ').unwrap();
        assert_eq!((model.start(), model.end()), (0, 5));
    }

    #[test]
    fn identical_writes_do_not_notify() {
        let model = SelectionModel::new(10);
        let seen = recorded(&model);
        model.set_selection(1, 4).unwrap();
        model.set_selection(1, 4).unwrap();
        model.set_caret(model.caret()).unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn observers_see_previous_and_current() {
        let model = SelectionModel::new(10);
        let seen = recorded(&model);
        model.set_caret(3).unwrap();
        model.clear().unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].previous, Selection::default());
        assert_eq!(seen[0].current.caret, 3);
        assert!(seen[0].caret_changed());
        assert!(!seen[0].range_changed());
    }

    #[test]
    fn mutation_from_observer_is_rejected() {
        let model = SelectionModel::new(10);
        let inner_result = Rc::new(RefCell::new(None));
        {
            let handle = model.clone();
            let inner_result = inner_result.clone();
            model.subscribe("meddler", move |change| {
                if change.current.caret != 0 {
                    *inner_result.borrow_mut() = Some(handle.set_caret(0));
                }
                Ok(())
            });
        }

        let outer = model.set_caret(4);
        assert_eq!(outer, Err(EditError::Reentrancy { observer: "meddler" }));
        assert_eq!(
            *inner_result.borrow(),
            Some(Err(EditError::Reentrancy { observer: "meddler" }))
        );
        // The rejected write did not land.
        assert_eq!(model.caret(), 4);
    }

    #[test]
    fn shrinking_text_clamps_state() {
        let model = SelectionModel::new(10);
        model.set_bounds(4, 9, 9, ChangeOrigin::Api).unwrap();
        model.set_text_len(6, ChangeOrigin::Keyboard).unwrap();
        assert_eq!(model.get(), Selection { caret: 6, start: 4, end: 6 });
    }

    #[test]
    fn reset_returns_to_origin() {
        let model = SelectionModel::new(10);
        model.set_bounds(2, 8, 8, ChangeOrigin::Drag).unwrap();
        let seen = recorded(&model);
        model.reset().unwrap();
        assert_eq!(model.get(), Selection::default());
        assert_eq!(seen.borrow()[0].origin, ChangeOrigin::Reset);
    }

    #[test]
    fn coalesced_change_spans_both() {
        let a = SelectionChange {
            previous: Selection::collapsed(1),
            current: Selection::collapsed(2),
            origin: ChangeOrigin::Api,
        };
        let b = SelectionChange {
            previous: Selection::collapsed(2),
            current: Selection { caret: 5, start: 2, end: 5 },
            origin: ChangeOrigin::Keyboard,
        };
        let merged = a.coalesce(b);
        assert_eq!(merged.previous, Selection::collapsed(1));
        assert_eq!(merged.current.end, 5);
        assert_eq!(merged.origin, ChangeOrigin::Keyboard);
    }
}
