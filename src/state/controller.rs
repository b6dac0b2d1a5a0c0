/// Overlay controller
///
/// Owns the `OverlayState` and is the only place it is mutated. Every
/// operation that changes state notifies the registered listeners with
/// the new state; rejected or no-op operations do not.
use thiserror::Error;
use tracing::{debug, info, warn};

use super::data::{ImageRef, OverlayState, Preset, FALLBACK_HEIGHT, FALLBACK_WIDTH, MAX_OPACITY};
use super::presets::{load_presets, save_presets};
use super::query::LaunchQuery;
use super::storage::KeyValueStore;

/// Callback invoked after each state change
pub type Listener = Box<dyn FnMut(&OverlayState) + Send>;

/// Reasons a preset cannot be added
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetError {
    #[error("Preset {0} already exists")]
    Duplicate(Preset),
    #[error("Width and height must be non-zero")]
    ZeroSized,
}

pub struct OverlayController {
    state: OverlayState,
    /// Content of the URL text field
    url_input: String,
    /// A file chooser is currently open
    picking: bool,
    store: Box<dyn KeyValueStore + Send>,
    listeners: Vec<Listener>,
    /// User-visible warnings not yet shown
    warnings: Vec<String>,
}

impl OverlayController {
    /// Create a controller with the given initial values, loading saved presets
    pub fn new(initial: OverlayState, store: Box<dyn KeyValueStore + Send>) -> Self {
        let mut state = initial;
        state.presets = load_presets(store.as_ref());
        info!(presets = state.presets.len(), "controller initialized");

        Self {
            state,
            url_input: String::new(),
            picking: false,
            store,
            listeners: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// Register a change listener
    pub fn subscribe(&mut self, listener: impl FnMut(&OverlayState) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.state);
        }
    }

    fn warn_user(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Drain warnings queued for display
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Apply launch query overrides. Read once at start-up.
    pub fn seed(&mut self, query: &LaunchQuery) {
        if query.is_empty() {
            return;
        }
        if let Some(width) = query.width {
            self.state.width = width;
        }
        if let Some(height) = query.height {
            self.state.height = height;
        }
        if let Some(opacity) = query.opacity {
            self.state.opacity = opacity.min(MAX_OPACITY);
        }
        if let Some(url) = &query.url {
            self.state.overlay_url = Some(url.clone());
        }
        debug!(?query, "state seeded from launch query");
        self.notify();
    }

    // ========== Design image ==========

    /// Mark a file chooser as open. Returns `false` if one already is.
    pub fn begin_pick(&mut self) -> bool {
        if self.picking {
            debug!("file chooser already open, ignoring request");
            return false;
        }
        self.picking = true;
        true
    }

    /// The file chooser was dismissed, with or without a selection
    pub fn end_pick(&mut self) {
        self.picking = false;
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    /// Replace the design image wholesale
    pub fn set_image(&mut self, image: ImageRef) {
        info!(
            path = %image.path.display(),
            width = image.width,
            height = image.height,
            "design image loaded"
        );
        self.state.image = Some(image);
        self.notify();
    }

    // ========== Overlay URL ==========

    pub fn url_input(&self) -> &str {
        &self.url_input
    }

    /// Track the URL text field
    pub fn set_url_input(&mut self, input: String) {
        self.url_input = input;
    }

    /// Commit the URL text field as the overlay URL and clear the field
    pub fn submit_overlay_url(&mut self) {
        let input = std::mem::take(&mut self.url_input);
        self.set_overlay_url(&input);
    }

    /// Replace the overlay URL with trimmed input. Blank input clears it.
    pub fn set_overlay_url(&mut self, input: &str) {
        self.url_input.clear();
        let trimmed = input.trim();
        let next = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        if next == self.state.overlay_url {
            return;
        }
        info!(url = ?next, "overlay url changed");
        self.state.overlay_url = next;
        self.notify();
    }

    pub fn clear_overlay_url(&mut self) {
        self.set_overlay_url("");
    }

    // ========== Dimensions & opacity ==========

    /// Set both dimensions from form input
    pub fn set_dimensions(&mut self, width: &str, height: &str) {
        let width = parse_dimension(width, FALLBACK_WIDTH);
        let height = parse_dimension(height, FALLBACK_HEIGHT);
        self.apply_dimensions(width, height);
    }

    pub fn set_width(&mut self, input: &str) {
        let width = parse_dimension(input, FALLBACK_WIDTH);
        self.apply_dimensions(width, self.state.height);
    }

    pub fn set_height(&mut self, input: &str) {
        let height = parse_dimension(input, FALLBACK_HEIGHT);
        self.apply_dimensions(self.state.width, height);
    }

    fn apply_dimensions(&mut self, width: u32, height: u32) {
        if (width, height) == (self.state.width, self.state.height) {
            return;
        }
        self.state.width = width;
        self.state.height = height;
        self.notify();
    }

    /// Set opacity in percent, clamped to `[0, 100]`
    pub fn set_opacity(&mut self, percent: i32) {
        let opacity = percent.clamp(0, i32::from(MAX_OPACITY)) as u8;
        if opacity == self.state.opacity {
            return;
        }
        self.state.opacity = opacity;
        self.notify();
    }

    // ========== Presets ==========

    /// Save the current dimensions as a preset
    pub fn add_preset(&mut self) -> Result<Preset, PresetError> {
        let preset = Preset(self.state.width, self.state.height);

        if preset.width() == 0 || preset.height() == 0 {
            self.warn_user(PresetError::ZeroSized.to_string());
            return Err(PresetError::ZeroSized);
        }
        if self.state.presets.contains(&preset) {
            let err = PresetError::Duplicate(preset);
            self.warn_user(err.to_string());
            return Err(err);
        }

        self.state.presets.push(preset);
        info!(%preset, "preset added");
        self.persist_presets();
        self.notify();
        Ok(preset)
    }

    /// Apply a stored preset. `None` is the "no preset selected" sentinel.
    ///
    /// Returns whether the dimensions were applied.
    pub fn select_preset(&mut self, index: Option<usize>) -> bool {
        let Some(preset) = index.and_then(|i| self.state.presets.get(i).copied()) else {
            return false;
        };
        debug!(%preset, "preset selected");
        self.apply_dimensions(preset.width(), preset.height());
        true
    }

    /// Delete a stored preset
    pub fn remove_preset(&mut self, index: usize) -> Option<Preset> {
        if index >= self.state.presets.len() {
            return None;
        }
        let preset = self.state.presets.remove(index);
        info!(%preset, "preset removed");
        self.persist_presets();
        self.notify();
        Some(preset)
    }

    fn persist_presets(&mut self) {
        if let Err(e) = save_presets(self.store.as_mut(), &self.state.presets) {
            self.warn_user(format!("Could not save presets: {}", e));
        }
    }
}

impl std::fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayController")
            .field("state", &self.state)
            .field("picking", &self.picking)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Parse a dimension field, falling back when it is not a positive integer
pub fn parse_dimension(input: &str, fallback: u32) -> u32 {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .unwrap_or(fallback)
}
