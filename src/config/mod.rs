use crate::stabilizer::DEFAULT_WINDOW_MS;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMMIT_DEBOUNCE_MS: u32 = 300;
pub const DEFAULT_POPUP_WIDTH: u32 = 470;

/// Runtime knobs for the admin panel.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CmsConfig {
    /// How long a shrinking live snapshot must persist before tables show it.
    pub stabilize_window_ms: u32,
    /// Quiet period before an inline edit is written back.
    pub commit_debounce_ms: u32,
    pub popup_width: u32,
    pub log_level: log::Level,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            stabilize_window_ms: DEFAULT_WINDOW_MS,
            commit_debounce_ms: DEFAULT_COMMIT_DEBOUNCE_MS,
            popup_width: DEFAULT_POPUP_WIDTH,
            log_level: log::Level::Info,
        }
    }
}

impl CmsConfig {
    /// Read overrides from `window.ENV`.
    ///
    /// Both `STABILIZE_WINDOW_MS` and `stabilize_window_ms` spellings are accepted; unknown
    /// or malformed values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let Some(window) = web_sys::window() else {
            return config;
        };
        let Some(env) = window.get("ENV") else {
            return config;
        };
        if env.is_undefined() || !env.is_object() {
            return config;
        }

        let read = |key: &str| -> Option<wasm_bindgen::JsValue> {
            [key.to_uppercase(), key.to_lowercase()]
                .into_iter()
                .filter_map(|k| js_sys::Reflect::get(&env, &k.into()).ok())
                .find(|v| !v.is_undefined() && !v.is_null())
        };
        let read_ms = |key: &str| -> Option<u32> {
            let v = read(key)?;
            v.as_f64()
                .or_else(|| v.as_string().and_then(|s| s.trim().parse().ok()))
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n as u32)
        };

        if let Some(ms) = read_ms("stabilize_window_ms") {
            config.stabilize_window_ms = ms;
        }
        if let Some(ms) = read_ms("commit_debounce_ms") {
            config.commit_debounce_ms = ms;
        }
        if let Some(width) = read_ms("popup_width") {
            config.popup_width = width;
        }
        if let Some(level) = read("log_level")
            .and_then(|v| v.as_string())
            .and_then(|s| s.parse().ok())
        {
            config.log_level = level;
        }

        config
    }
}
