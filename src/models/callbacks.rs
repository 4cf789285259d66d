use super::{Entity, EntitySchema, EntityStatus, EntityValues};
use crate::error::{CallbackError, StoreError};
use std::collections::BTreeMap;

/// Application state handed to every callback.
#[derive(Clone, Debug, Default)]
pub struct CmsContext {
    /// Signed-in user, if any. Opaque to this crate.
    pub user: Option<String>,

    /// Alias -> real collection path. Only the first path segment is aliased.
    pub path_aliases: BTreeMap<String, String>,
}

impl CmsContext {
    pub fn resolve_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        let (head, rest) = match path.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let head = self
            .path_aliases
            .get(head)
            .map(String::as_str)
            .unwrap_or(head);

        match rest {
            Some(rest) => format!("{head}/{rest}"),
            None => head.to_string(),
        }
    }
}

/// Parameters passed to the save hooks.
#[derive(Clone, Debug)]
pub struct EntityOnSaveProps<'a> {
    pub schema: &'a EntitySchema,
    /// Path as the caller wrote it; may contain aliases.
    pub path: &'a str,
    pub resolved_path: String,
    /// `None` when the entity is new.
    pub entity_id: Option<&'a str>,
    pub values: &'a EntityValues,
    pub previous_values: Option<&'a EntityValues>,
    pub status: EntityStatus,
    pub context: &'a CmsContext,
}

/// Parameters passed to the delete hooks.
#[derive(Clone, Debug)]
pub struct EntityOnDeleteProps<'a> {
    pub schema: &'a EntitySchema,
    pub path: &'a str,
    pub entity_id: &'a str,
    pub entity: &'a Entity,
    pub context: &'a CmsContext,
}

/// Hooks run by the store orchestration around saves and deletes.
///
/// Every method has a no-op default; implement only what you need.
pub trait EntityCallbacks {
    /// Returns the values that will actually be written. An error stops the save.
    fn on_pre_save(&self, props: &EntityOnSaveProps<'_>) -> Result<EntityValues, CallbackError> {
        Ok(props.values.clone())
    }

    fn on_save_success(&self, _props: &EntityOnSaveProps<'_>) {}

    fn on_save_failure(&self, _props: &EntityOnSaveProps<'_>, _error: &StoreError) {}

    /// An error stops the delete.
    fn on_pre_delete(&self, _props: &EntityOnDeleteProps<'_>) -> Result<(), CallbackError> {
        Ok(())
    }

    fn on_delete(&self, _props: &EntityOnDeleteProps<'_>) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCallbacks;

impl EntityCallbacks for NoopCallbacks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_rewrites_first_segment_only() {
        let mut ctx = CmsContext::default();
        ctx.path_aliases
            .insert("items".to_string(), "shop/products".to_string());

        assert_eq!(ctx.resolve_path("items"), "shop/products");
        assert_eq!(ctx.resolve_path("/items/p1/locales"), "shop/products/p1/locales");
        assert_eq!(ctx.resolve_path("orders/items"), "orders/items");
    }
}
