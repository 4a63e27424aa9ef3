//! Platform abstraction layer
//!
//! Handles native input differences:
//! - Mouse click detection
//! - Multi-touch with per-finger cooldown

pub mod input;

pub use input::{InputEvent, PointerAction, PointerInput};
