//! # Core building blocks
//!
//! Shared pieces used by the selection model, the drag handles and the
//! keyboard bridge:
//!
//! - [`geometry`]: `Vec2`, `Size` and `Rect` in y-down screen space.
//! - [`animation`]: transitions stepped by an explicit frame delta.
//! - [`observer`]: ordered observer lists that reject nested mutation.
//! - [`display`]: physical display metrics and touch-target sizing.
//! - [`input`]: pointer samples as delivered by the platform layer.
//!
//! ## Observers
//!
//! ```rust
//! use caretsync_core::observer::ObserverList;
//!
//! let list: ObserverList<u32> = ObserverList::new();
//! list.subscribe("log", |v| {
//!     log::debug!("saw {v}");
//!     Ok(())
//! });
//! assert!(list.notify(&7).is_ok());
//! ```
//!
//! ## Animation
//!
//! ```rust
//! use caretsync_core::animation::{AnimationSpec, Transition};
//! use web_time::Duration;
//!
//! let mut t = Transition::new(AnimationSpec::linear(Duration::from_millis(100)));
//! t.restart();
//! assert!((t.advance(Duration::from_millis(50)) - 0.5).abs() < 1e-4);
//! ```

pub mod animation;
pub mod display;
pub mod error;
pub mod geometry;
pub mod input;
pub mod observer;
pub mod tests;

pub use display::*;
pub use error::*;
pub use geometry::*;
pub use observer::{Latch, ObserverId, ObserverList};
