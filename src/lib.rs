//! Leptos admin panel for schema-driven document collections.
//!
//! The reusable pieces are headless and browser-agnostic: [`stabilizer`] smooths live
//! collection snapshots, [`editor`] drives the floating inline cell editor, and [`store`]
//! runs saves and deletes through the [`models::EntityCallbacks`] lifecycle. The Leptos
//! components and pages wire them to the DOM.

mod app;
mod components;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod models;
mod pages;
pub mod stabilizer;
mod state;
mod storage;
pub mod store;
pub mod timer;
pub mod util;
pub mod validation;

pub use app::App;
pub use config::CmsConfig;
pub use editor::{CommitSink, EditorState, PopupEditor, StoreCommitSink};
pub use error::{CallbackError, StoreError};
pub use stabilizer::SequenceStabilizer;
pub use store::{EntityStore, MemoryEntityStore};

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

fn init_logging(level: log::Level) {
    #[cfg(target_arch = "wasm32")]
    {
        if console_log::init_with_level(level).is_err() {
            web_sys::console::warn_1(&"logger already initialised".into());
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = level;
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    init_logging(CmsConfig::from_env().log_level);
    mount_to_body(App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::models::Entity;
    use crate::storage::{
        clear_storage_key, load_string_from_storage, save_string_to_storage,
    };
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_persisted_store_roundtrip() {
        let key = "cms_admin_store_test";
        clear_storage_key(key);

        let store = MemoryEntityStore::persisted(key);
        assert!(!store.has_collection("products"));
        store.insert(Entity::new("products", "p1", serde_json::Map::new()));

        let reloaded = MemoryEntityStore::persisted(key);
        assert_eq!(reloaded.collection("products").len(), 1);

        clear_storage_key(key);
        assert!(load_string_from_storage(key).is_none());

        save_string_to_storage(key, "{not json");
        assert!(!MemoryEntityStore::persisted(key).has_collection("products"));
        clear_storage_key(key);
    }

    #[wasm_bindgen_test]
    fn test_string_storage_roundtrip() {
        let key = "cms_admin_last_collection_test";
        save_string_to_storage(key, "articles");
        assert_eq!(load_string_from_storage(key).as_deref(), Some("articles"));
        clear_storage_key(key);
        assert!(load_string_from_storage(key).is_none());
    }

    #[wasm_bindgen_test]
    fn test_unknown_pointer_capture_is_refused() {
        let el = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.create_element("div").ok())
            .expect("div");
        assert!(!crate::components::popup_field::set_pointer_capture(&el, 9999, true));
        assert!(!crate::components::popup_field::set_pointer_capture(&el, 9999, false));
    }

    #[wasm_bindgen_test]
    fn test_config_defaults_without_env() {
        assert_eq!(CmsConfig::from_env(), CmsConfig::default());
    }
}
