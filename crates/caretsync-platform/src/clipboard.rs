use std::cell::RefCell;

/// Text clipboard used by cut, copy and paste.
pub trait Clipboard {
    fn get(&self) -> Option<String>;
    fn set(&self, text: &str);
}

/// Process-local clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: RefCell<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn get(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    fn set(&self, text: &str) {
        *self.contents.borrow_mut() = Some(text.to_owned());
    }
}
