//! On-screen keyboard plumbing.
//!
//! [`NativeSyncBridge`] owns the focused field's edit session and keeps the
//! selection widgets and the platform keyboard agreeing on text and selection.
//! Platforms implement [`NativeKeyboard`]; [`SimulatorKeyboard`] is an
//! in-process implementation used by tests and the demo.
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use caretsync_platform::{BridgeOptions, FieldConfig, NativeSyncBridge, SimulatorKeyboard};
//! use caretsync_ui::{FieldId, MonospaceLayout};
//! use web_time::Duration;
//!
//! let keyboard = Rc::new(SimulatorKeyboard::new());
//! let mut bridge = NativeSyncBridge::new(
//!     keyboard.clone(),
//!     Box::new(MonospaceLayout::new(10.0, 20.0)),
//!     BridgeOptions::default(),
//! );
//! bridge.register_field(FieldId(1), FieldConfig::default(), "hi");
//! bridge.begin_edit(FieldId(1)).unwrap();
//! bridge.tick(Duration::from_millis(16)).unwrap();
//! assert_eq!(keyboard.request().text, "hi");
//! ```

pub mod bridge;
pub mod clipboard;
pub mod config;
pub mod keyboard;
pub mod simulator;

pub use bridge::{BridgeError, EndEditReason, FieldListener, NativeSyncBridge, SharedListener, SyncGuards};
pub use clipboard::{Clipboard, MemoryClipboard};
pub use config::{BridgeOptions, CharacterValidator, FieldConfig};
pub use keyboard::{
    Autocapitalization, ContentValidation, EventQueue, EventSender, KeyboardEvent, KeyboardKind, KeyboardState,
    LineMode, NativeKeyboard, ProtocolError, RawEventKind, RawKeyboardEvent, ShowRequest,
};
pub use simulator::{KeyboardCall, SimulatorKeyboard};
