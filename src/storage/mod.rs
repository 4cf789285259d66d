use serde::Serialize;

pub(crate) const STORE_KEY: &str = "cms_admin_store";
pub(crate) const LAST_COLLECTION_KEY: &str = "cms_admin_last_collection";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("could not serialize {key}: {e}");
            return;
        }
    };
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, &json);
    }
}

pub(crate) fn load_string_from_storage(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

pub(crate) fn save_string_to_storage(key: &str, value: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, value);
    }
}

#[allow(dead_code)]
pub(crate) fn clear_storage_key(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}
