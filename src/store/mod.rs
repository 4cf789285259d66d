mod memory;

pub use memory::MemoryEntityStore;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    CmsContext, Entity, EntityCallbacks, EntityOnDeleteProps, EntityOnSaveProps, EntitySchema,
    EntityStatus, EntityValues,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::rc::Rc;

/// One write against a collection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SaveEntityRequest {
    pub path: String,
    pub id: String,
    pub values: EntityValues,
    pub status: EntityStatus,
}

/// Receives collection snapshots from a live listener.
pub type CollectionListener = Rc<dyn Fn(Vec<Entity>)>;

/// Keeps a live listener registered. Dropping it unsubscribes.
pub struct ListenerHandle {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl ListenerHandle {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

/// Backing document store. Transport is up to the implementation.
pub trait EntityStore {
    fn save(&self, request: &SaveEntityRequest) -> impl Future<Output = StoreResult<()>>;

    fn delete(&self, path: &str, id: &str) -> impl Future<Output = StoreResult<()>>;

    fn fetch(&self, path: &str, id: &str) -> Option<Entity>;

    /// Register a live listener. The current snapshot is delivered right away.
    fn listen_collection(&self, path: &str, listener: CollectionListener) -> ListenerHandle;
}

/// Save through the store with the callback lifecycle around it.
///
/// `on_pre_save` may rewrite the values or stop the save; afterwards exactly one of
/// `on_save_success` / `on_save_failure` runs.
pub async fn save_entity<S: EntityStore>(
    store: &S,
    schema: &EntitySchema,
    callbacks: &dyn EntityCallbacks,
    context: &CmsContext,
    request: SaveEntityRequest,
) -> StoreResult<()> {
    let resolved_path = context.resolve_path(&request.path);
    let previous = store.fetch(&resolved_path, &request.id).map(|e| e.values);
    let props = EntityOnSaveProps {
        schema,
        path: &request.path,
        resolved_path,
        entity_id: match request.status {
            EntityStatus::New => None,
            EntityStatus::Existing => Some(request.id.as_str()),
        },
        values: &request.values,
        previous_values: previous.as_ref(),
        status: request.status,
        context,
    };

    let values = match callbacks.on_pre_save(&props) {
        Ok(values) => values,
        Err(e) => {
            log::warn!("pre-save rejected {}/{}: {e}", request.path, request.id);
            let err = StoreError::PreSaveRejected(e);
            callbacks.on_save_failure(&props, &err);
            return Err(err);
        }
    };

    let write = SaveEntityRequest {
        path: props.resolved_path.clone(),
        values,
        ..request.clone()
    };

    match store.save(&write).await {
        Ok(()) => {
            log::debug!("saved {}/{}", write.path, write.id);
            let saved = EntityOnSaveProps {
                values: &write.values,
                ..props
            };
            callbacks.on_save_success(&saved);
            Ok(())
        }
        Err(e) => {
            log::warn!("save of {}/{} failed: {e}", write.path, write.id);
            callbacks.on_save_failure(&props, &e);
            Err(e)
        }
    }
}

/// Delete through the store with the callback lifecycle around it.
pub async fn delete_entity<S: EntityStore>(
    store: &S,
    schema: &EntitySchema,
    callbacks: &dyn EntityCallbacks,
    context: &CmsContext,
    entity: &Entity,
) -> StoreResult<()> {
    let props = EntityOnDeleteProps {
        schema,
        path: &entity.path,
        entity_id: &entity.id,
        entity,
        context,
    };

    callbacks
        .on_pre_delete(&props)
        .map_err(StoreError::PreDeleteRejected)?;

    store
        .delete(&context.resolve_path(&entity.path), &entity.id)
        .await?;
    callbacks.on_delete(&props);
    Ok(())
}
