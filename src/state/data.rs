/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the controller and the UI layer.
use iced::widget::image::Handle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Width used when the width field holds something that is not a number
pub const FALLBACK_WIDTH: u32 = 1920;
/// Height used when the height field holds something that is not a number
pub const FALLBACK_HEIGHT: u32 = 1080;
/// Upper bound of the opacity range (percent)
pub const MAX_OPACITY: u8 = 100;

/// A loaded design bitmap
///
/// Created once per pick or drop and never mutated. Cloning shares
/// the underlying pixels.
#[derive(Debug, Clone)]
pub struct ImageRef {
    /// File the bitmap was decoded from
    pub path: PathBuf,
    /// Pixel width of the decoded bitmap
    pub width: u32,
    /// Pixel height of the decoded bitmap
    pub height: u32,
    /// GPU-uploadable RGBA handle
    pub handle: Handle,
}

impl ImageRef {
    /// Wrap decoded RGBA pixels
    pub fn from_rgba(path: PathBuf, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            path,
            width,
            height,
            handle: Handle::from_rgba(width, height, pixels),
        }
    }

    /// Two refs are the same image when they share a handle
    pub fn same_as(&self, other: &ImageRef) -> bool {
        self.handle.id() == other.handle.id()
    }
}

/// A saved (width, height) pair
///
/// Serialized as a two-element JSON array: `[1920, 1080]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Preset(pub u32, pub u32);

impl Preset {
    pub fn width(&self) -> u32 {
        self.0
    }

    pub fn height(&self) -> u32 {
        self.1
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.0, self.1)
    }
}

/// Everything the overlay view is derived from
///
/// Invariants: `opacity <= 100`, `width > 0`, `height > 0`,
/// no two entries of `presets` are equal.
#[derive(Debug, Clone)]
pub struct OverlayState {
    /// The design image, if one has been picked or dropped
    pub image: Option<ImageRef>,
    /// URL rendered on top of the design
    pub overlay_url: Option<String>,
    /// Overlay opacity in percent
    pub opacity: u8,
    /// Stage width in logical pixels
    pub width: u32,
    /// Stage height in logical pixels
    pub height: u32,
    /// Saved dimension presets, in insertion order
    pub presets: Vec<Preset>,
}

impl OverlayState {
    /// Fresh state with the given initial values and no image or URL
    pub fn new(width: u32, height: u32, opacity: u8) -> Self {
        Self {
            image: None,
            overlay_url: None,
            opacity: opacity.min(MAX_OPACITY),
            width: width.max(1),
            height: height.max(1),
            presets: Vec::new(),
        }
    }

    /// Opacity as a fraction in `[0.0, 1.0]`
    pub fn opacity_fraction(&self) -> f32 {
        f32::from(self.opacity) / f32::from(MAX_OPACITY)
    }

    /// The overlay is only composited when there is something to compare it to
    pub fn shows_overlay(&self) -> bool {
        self.image.is_some() && self.overlay_url.is_some()
    }

    /// Index of the preset matching the current dimensions
    pub fn active_preset(&self) -> Option<usize> {
        self.presets
            .iter()
            .position(|p| p.width() == self.width && p.height() == self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_enforces_invariants() {
        let state = OverlayState::new(0, 0, 250);
        assert_eq!(state.width, 1);
        assert_eq!(state.height, 1);
        assert_eq!(state.opacity, 100);
        assert!(state.presets.is_empty());
    }

    #[test]
    fn test_preset_serializes_as_pair() {
        let json = serde_json::to_string(&vec![Preset(100, 200), Preset(3, 4)]).unwrap();
        assert_eq!(json, "[[100,200],[3,4]]");
    }

    #[test]
    fn test_overlay_needs_image_and_url() {
        let mut state = OverlayState::new(10, 10, 50);
        state.overlay_url = Some("https://example.com".into());
        assert!(!state.shows_overlay());

        state.image = Some(ImageRef::from_rgba("a.png".into(), 1, 1, vec![0, 0, 0, 255]));
        assert!(state.shows_overlay());
        assert!((state.opacity_fraction() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_active_preset() {
        let mut state = OverlayState::new(800, 600, 70);
        state.presets = vec![Preset(1920, 1080), Preset(800, 600)];
        assert_eq!(state.active_preset(), Some(1));
        state.width = 801;
        assert_eq!(state.active_preset(), None);
    }
}
