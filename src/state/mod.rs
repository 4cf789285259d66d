use crate::config::CmsConfig;
use crate::error::{CallbackError, StoreError};
use crate::models::{CmsContext, EntityCallbacks, EntityOnDeleteProps, EntityOnSaveProps, EntityValues};
use crate::storage::{load_string_from_storage, STORE_KEY, LAST_COLLECTION_KEY};
use crate::store::MemoryEntityStore;
use leptos::prelude::*;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Error,
}

/// One toast-style message shown above the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub config: StoredValue<CmsConfig>,
    pub store: StoredValue<MemoryEntityStore, LocalStorage>,
    pub context: StoredValue<CmsContext>,

    /// Live-editable copy of `config.stabilize_window_ms`.
    pub stabilize_window_ms: RwSignal<u32>,
    pub notices: RwSignal<Vec<Notice>>,
    pub notice_seq: RwSignal<u64>,
    pub last_collection: RwSignal<Option<String>>,
}

impl AppState {
    pub fn new(config: CmsConfig) -> Self {
        let store = MemoryEntityStore::persisted(STORE_KEY);
        let context = CmsContext {
            user: Some("admin".to_string()),
            ..Default::default()
        };

        Self {
            stabilize_window_ms: RwSignal::new(config.stabilize_window_ms),
            config: StoredValue::new(config),
            store: StoredValue::new_local(store),
            context: StoredValue::new(context),
            notices: RwSignal::new(vec![]),
            notice_seq: RwSignal::new(0),
            last_collection: RwSignal::new(load_string_from_storage(LAST_COLLECTION_KEY)),
        }
    }

    pub fn notify(&self, kind: NoticeKind, text: impl Into<String>) {
        let id = self.notice_seq.get_untracked() + 1;
        self.notice_seq.set(id);
        let text = text.into();
        log::info!("[{kind}] {text}");
        self.notices.update(|xs| {
            xs.push(Notice { id, kind, text });
            // Keep the stack short.
            if xs.len() > 5 {
                xs.remove(0);
            }
        });
    }

    pub fn dismiss_notice(&self, id: u64) {
        self.notices.update(|xs| xs.retain(|n| n.id != id));
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);

/// Strip surrounding whitespace from every top-level string value.
pub(crate) fn trim_strings(values: &EntityValues) -> EntityValues {
    values
        .iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other.clone(),
            };
            (k.clone(), v)
        })
        .collect()
}

/// Admin-panel hooks: normalise text before saving and surface every outcome as a notice.
pub(crate) struct NotifyingCallbacks {
    pub state: AppState,
}

impl EntityCallbacks for NotifyingCallbacks {
    fn on_pre_save(&self, props: &EntityOnSaveProps<'_>) -> Result<EntityValues, CallbackError> {
        if props.context.user.is_none() {
            return Err(CallbackError("not signed in".into()));
        }
        Ok(trim_strings(props.values))
    }

    fn on_save_success(&self, props: &EntityOnSaveProps<'_>) {
        let id = props.entity_id.unwrap_or("new entity");
        self.state
            .notify(NoticeKind::Info, format!("Saved {}/{id}", props.resolved_path));
    }

    fn on_save_failure(&self, props: &EntityOnSaveProps<'_>, error: &StoreError) {
        let id = props.entity_id.unwrap_or("new entity");
        self.state.notify(
            NoticeKind::Error,
            format!("Could not save {}/{id}: {error}", props.path),
        );
    }

    fn on_pre_delete(&self, props: &EntityOnDeleteProps<'_>) -> Result<(), CallbackError> {
        if props.context.user.is_none() {
            return Err(CallbackError("not signed in".into()));
        }
        Ok(())
    }

    fn on_delete(&self, props: &EntityOnDeleteProps<'_>) {
        self.state
            .notify(NoticeKind::Info, format!("Deleted {}/{}", props.path, props.entity_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trim_strings_only_touches_strings() {
        let values = json!({"name": "  Lamp ", "price": 12, "tags": [" a "]})
            .as_object()
            .cloned()
            .expect("object");
        let trimmed = trim_strings(&values);
        assert_eq!(trimmed.get("name"), Some(&json!("Lamp")));
        assert_eq!(trimmed.get("price"), Some(&json!(12)));
        assert_eq!(trimmed.get("tags"), Some(&json!([" a "])));
    }

    #[test]
    fn notice_kind_display() {
        assert_eq!(NoticeKind::Error.to_string(), "error");
    }
}
