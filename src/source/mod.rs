/// Image sources module
///
/// This module handles:
/// - Opening the native file chooser
/// - Decoding the design image
/// - Fetching or rendering the overlay layer behind a URL

pub mod design;
pub mod page;

pub use design::{load_design, pick_design_file};
pub use page::{OverlayFetcher, OverlayLayer, OverlayRefresh, RefreshOutcome};
