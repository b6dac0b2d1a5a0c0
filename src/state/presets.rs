/// Preset persistence
///
/// Presets live under a single store key as a JSON array of
/// `[width, height]` pairs.
use tracing::warn;

use super::data::Preset;
use super::storage::KeyValueStore;
use crate::error::Result;

/// Store key holding the preset list
pub const PRESETS_KEY: &str = "presets";

/// Read the preset list. Missing or malformed content yields an empty list.
///
/// Zero-sized entries and repeated pairs are dropped so the list
/// always satisfies the uniqueness invariant.
pub fn load_presets(store: &dyn KeyValueStore) -> Vec<Preset> {
    let Some(raw) = store.get(PRESETS_KEY) else {
        return Vec::new();
    };

    let parsed: Vec<Preset> = match serde_json::from_str(&raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "ignoring malformed preset list");
            return Vec::new();
        }
    };

    let mut presets: Vec<Preset> = Vec::with_capacity(parsed.len());
    for preset in parsed {
        if preset.width() == 0 || preset.height() == 0 || presets.contains(&preset) {
            continue;
        }
        presets.push(preset);
    }
    presets
}

/// Write the preset list
pub fn save_presets(store: &mut dyn KeyValueStore, presets: &[Preset]) -> Result<()> {
    let json = serde_json::to_string(presets)?;
    store.set(PRESETS_KEY, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::storage::MemoryStore;

    #[test]
    fn test_missing_key_is_empty() {
        let store = MemoryStore::default();
        assert!(load_presets(&store).is_empty());
    }

    #[test]
    fn test_malformed_content_is_empty() {
        let mut store = MemoryStore::default();
        store.set(PRESETS_KEY, "{\"width\": 3}".into()).unwrap();
        assert!(load_presets(&store).is_empty());

        store.set(PRESETS_KEY, "[[1, \"two\"]]".into()).unwrap();
        assert!(load_presets(&store).is_empty());
    }

    #[test]
    fn test_load_drops_duplicates_and_zero() {
        let mut store = MemoryStore::default();
        store
            .set(PRESETS_KEY, "[[100,200],[0,5],[100,200],[1280,720]]".into())
            .unwrap();
        assert_eq!(load_presets(&store), vec![Preset(100, 200), Preset(1280, 720)]);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::default();
        save_presets(&mut store, &[Preset(1920, 1080), Preset(375, 812)]).unwrap();
        assert_eq!(store.get(PRESETS_KEY).as_deref(), Some("[[1920,1080],[375,812]]"));
        assert_eq!(load_presets(&store), vec![Preset(1920, 1080), Preset(375, 812)]);
    }
}
