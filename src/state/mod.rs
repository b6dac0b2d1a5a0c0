/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The controller that owns and mutates state (controller.rs)
/// - Preset persistence (presets.rs) on top of a key-value store (storage.rs)
/// - Launch query parsing (query.rs)

pub mod controller;
pub mod data;
pub mod presets;
pub mod query;
pub mod storage;

pub use controller::OverlayController;
pub use data::{ImageRef, OverlayState, Preset};
