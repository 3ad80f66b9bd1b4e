//! # Touch editing widgets
//!
//! Everything that sits on top of a focused text field while it is being
//! edited on a touch screen:
//!
//! - [`SelectionModel`]: caret and selection bounds, with ordered observers.
//! - [`DragHandle`] and [`HandleCoordinator`]: the start, end and caret handles.
//! - [`ContextMenu`]: the cut/copy/paste/select-all bar.
//! - [`TextLayoutProvider`]: glyph geometry supplied by the text renderer.
//!
//! ```rust
//! use caretsync_ui::{MonospaceLayout, SelectionModel, TextLayoutProvider, handle_anchor};
//!
//! let layout = MonospaceLayout::with_text(10.0, 20.0, "hello world");
//! let model = SelectionModel::new(layout.character_count());
//! model.select_word_at(7, "hello world").unwrap();
//! assert_eq!((model.start(), model.end()), (6, 11));
//! assert_eq!(handle_anchor(&layout, model.start()).x, 60.0);
//! ```

pub mod context_menu;
pub mod field;
pub mod gestures;
pub mod handle;
pub mod handles;
pub mod layout;
pub mod selection;
pub mod text;

pub use context_menu::{ContextMenu, EditActions, FieldCapabilities, MenuState};
pub use field::{FieldGeometry, FieldId};
pub use gestures::{Gesture, GestureDetector};
pub use handle::{DragHandle, HandleId, HandleRole};
pub use handles::{HandleCoordinator, HandleRelease};
pub use layout::{
    CharacterInfo, LineInfo, MonospaceLayout, TextLayoutProvider, glyph_origin, handle_anchor, resolve_index,
};
pub use selection::{ChangeOrigin, Selection, SelectionChange, SelectionModel};
