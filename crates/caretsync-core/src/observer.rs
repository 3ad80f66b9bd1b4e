//! Ordered observer list with reentrancy detection.
//!
//! Observers run in registration order. While one of them is running, the
//! owner of the list must call [`ObserverList::check_mutation`] before changing
//! the observed state; a mutation attempted from inside a notification is
//! rejected instead of recursing into the observers again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{EditError, EditResult};

pub type ObserverId = usize;

type Callback<E> = Box<dyn FnMut(&E) -> EditResult<()>>;

struct Entry<E> {
    id: ObserverId,
    label: &'static str,
    callback: Callback<E>,
}

pub struct ObserverList<E: 'static> {
    entries: RefCell<SmallVec<[Entry<E>; 4]>>,
    next_id: Cell<ObserverId>,
    running: Cell<Option<&'static str>>,
    violation: Cell<Option<&'static str>>,
    removed_while_running: RefCell<Vec<ObserverId>>,
}

impl<E: 'static> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> ObserverList<E> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(SmallVec::new()),
            next_id: Cell::new(0),
            running: Cell::new(None),
            violation: Cell::new(None),
            removed_while_running: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(
        &self,
        label: &'static str,
        f: impl FnMut(&E) -> EditResult<()> + 'static,
    ) -> ObserverId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push(Entry {
            id,
            label,
            callback: Box::new(f),
        });
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        if self.running.get().is_some() {
            self.removed_while_running.borrow_mut().push(id);
        }
        self.entries.borrow_mut().retain(|e| e.id != id);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_notifying(&self) -> bool {
        self.running.get().is_some()
    }

    /// Rejects a mutation of the observed state if an observer is running.
    ///
    /// The violation is remembered so the outer `notify` reports it even when
    /// the offending observer swallows the error.
    pub fn check_mutation(&self) -> EditResult<()> {
        match self.running.get() {
            Some(observer) => {
                log::warn!("nested mutation from observer `{observer}` rejected");
                self.violation.set(Some(observer));
                Err(EditError::Reentrancy { observer })
            }
            None => Ok(()),
        }
    }

    /// Runs every observer once, in registration order.
    ///
    /// All observers run even if one fails; the first error is returned.
    pub fn notify(&self, event: &E) -> EditResult<()> {
        self.check_mutation()?;

        let mut entries = std::mem::take(&mut *self.entries.borrow_mut());
        let mut first_err = None;

        for entry in entries.iter_mut() {
            if self.removed_while_running.borrow().contains(&entry.id) {
                continue;
            }
            self.running.set(Some(entry.label));
            let result = (entry.callback)(event);
            self.running.set(None);
            if let Err(e) = result {
                first_err.get_or_insert(e);
            }
        }

        // Observers registered during the pass were pushed into the (empty) live list.
        let added = std::mem::take(&mut *self.entries.borrow_mut());
        entries.extend(added);
        let removed = std::mem::take(&mut *self.removed_while_running.borrow_mut());
        entries.retain(|e| !removed.contains(&e.id));
        *self.entries.borrow_mut() = entries;

        if let Some(observer) = self.violation.take() {
            return Err(EditError::Reentrancy { observer });
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Single-slot mailbox shared between an observer closure and the component
/// that consumes what it saw.
pub struct Latch<T>(Rc<RefCell<Option<T>>>);

impl<T> Clone for Latch<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }
}

impl<T> Latch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }

    /// Folds `value` into whatever is already pending.
    pub fn merge(&self, value: T, fold: impl FnOnce(T, T) -> T) {
        let mut slot = self.0.borrow_mut();
        let next = match slot.take() {
            Some(pending) => fold(pending, value),
            None => value,
        };
        *slot = Some(next);
    }

    pub fn take(&self) -> Option<T> {
        self.0.borrow_mut().take()
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}
