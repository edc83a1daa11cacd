use gloo_storage::Storage;
use leptos::prelude::*;
use web_sys::HtmlImageElement;

use zonemap_shared::MapCatalog;

use crate::images;

const STORAGE_KEY: &str = "zonemap_selected_map";

/// Reactive state for the active map: the selected catalog key, the decoded
/// background image, and a monotonic load generation used to discard stale
/// async completions after a map switch.
///
/// Exactly one map is active at a time; everything drawn on screen derives
/// from the definition behind `selected_key`.
#[derive(Clone, Copy)]
pub struct Session {
    pub selected_key: RwSignal<Option<String>>,
    pub background: RwSignal<Option<HtmlImageElement>>,
    pub load_generation: RwSignal<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            selected_key: RwSignal::new(None),
            background: RwSignal::new(None),
            load_generation: RwSignal::new(0),
        }
    }

    /// Switch the active map. Silently a no-op for keys absent from the
    /// catalog (including a stale persisted preference fed back through the
    /// selector) and for re-selecting the already-loaded map.
    ///
    /// On success: records the selection, persists it, and starts the
    /// background image load; the redraw fires once the image decodes.
    pub fn select_map(&self, catalog: &MapCatalog, key: &str) {
        if !catalog.contains_key(key) {
            return;
        }

        let current = self.selected_key.get_untracked();
        let has_image = self.background.with_untracked(|bg| bg.is_some());
        if !needs_background_load(current.as_deref(), has_image, key) {
            return;
        }

        self.selected_key.set(Some(key.to_string()));
        save_selected_key(key);
        self.load_generation.update(|generation| *generation += 1);
        images::load_background(*self, key);
    }
}

/// Startup key policy: the persisted preference when it is still valid
/// against the loaded catalog, otherwise the first key in catalog order.
pub fn initial_key<'a>(catalog: &'a MapCatalog, saved: Option<&'a str>) -> Option<&'a str> {
    saved
        .filter(|key| catalog.contains_key(key))
        .or_else(|| catalog.first_key())
}

/// Re-selecting the active map with its image already decoded is a no-op;
/// everything else (new key, or same key whose image never arrived) reloads.
fn needs_background_load(current: Option<&str>, has_image: bool, requested: &str) -> bool {
    !(current == Some(requested) && has_image)
}

pub fn saved_map_key() -> Option<String> {
    gloo_storage::LocalStorage::get(STORAGE_KEY).ok()
}

fn save_selected_key(key: &str) {
    let _ = gloo_storage::LocalStorage::set(STORAGE_KEY, key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonemap_shared::MapDefinition;

    fn catalog(keys: &[&str]) -> MapCatalog {
        keys.iter()
            .map(|&key| {
                (
                    key.to_string(),
                    MapDefinition {
                        size_factor: 100.0,
                        is_small_map: false,
                        icons: Vec::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn valid_saved_preference_wins() {
        let c = catalog(&["Zone1", "Zone2", "Zone3"]);
        assert_eq!(initial_key(&c, Some("Zone2")), Some("Zone2"));
    }

    #[test]
    fn stale_preference_falls_back_to_first_key() {
        let c = catalog(&["Zone1", "Zone2"]);
        assert_eq!(initial_key(&c, Some("Removed")), Some("Zone1"));
        assert_eq!(initial_key(&c, None), Some("Zone1"));
    }

    #[test]
    fn empty_catalog_yields_no_key() {
        let c = catalog(&[]);
        assert_eq!(initial_key(&c, Some("Zone1")), None);
        assert_eq!(initial_key(&c, None), None);
    }

    #[test]
    fn unknown_key_leaves_selection_unchanged() {
        let c = catalog(&["Zone1", "Zone2"]);
        let session = Session::new();
        session.selected_key.set(Some("Zone1".to_string()));

        session.select_map(&c, "Nowhere");

        assert_eq!(
            session.selected_key.get_untracked(),
            Some("Zone1".to_string())
        );
        assert_eq!(session.load_generation.get_untracked(), 0);
    }

    #[test]
    fn empty_catalog_rejects_any_selection() {
        let session = Session::new();
        session.select_map(&catalog(&[]), "Zone1");
        assert_eq!(session.selected_key.get_untracked(), None);
    }

    #[test]
    fn reselecting_loaded_map_skips_the_load() {
        assert!(!needs_background_load(Some("Zone1"), true, "Zone1"));
    }

    #[test]
    fn switching_or_unloaded_map_reloads() {
        assert!(needs_background_load(Some("Zone1"), true, "Zone2"));
        assert!(needs_background_load(Some("Zone1"), false, "Zone1"));
        assert!(needs_background_load(None, false, "Zone1"));
    }
}
