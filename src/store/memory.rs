use super::{CollectionListener, EntityStore, ListenerHandle, SaveEntityRequest};
use crate::error::{StoreError, StoreResult};
use crate::models::{Entity, EntityStatus};
use crate::storage::{load_string_from_storage, save_json_to_storage};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::{ready, Future};
use std::rc::{Rc, Weak};

#[derive(Default)]
struct Inner {
    /// path -> entities in insertion order
    collections: BTreeMap<String, Vec<Entity>>,
    listeners: BTreeMap<String, Vec<(u64, CollectionListener)>>,
    next_listener: u64,
    /// localStorage key; `None` keeps everything in memory.
    persist_key: Option<String>,
}

/// In-process document store with live collection listeners.
///
/// Listeners are notified synchronously after every write, outside of any internal borrow,
/// so they may read from or write to the store again.
#[derive(Clone, Default)]
pub struct MemoryEntityStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Browser only: restore collections from localStorage under `key` and persist every
    /// write back to it.
    pub fn persisted(key: &str) -> Self {
        let collections = match restore_collections(load_string_from_storage(key).as_deref()) {
            Ok(collections) => collections,
            Err(e) => {
                log::warn!("starting empty, {key} is unreadable: {e}");
                BTreeMap::new()
            }
        };
        log::debug!("restored {} collections from {key}", collections.len());

        Self {
            inner: Rc::new(RefCell::new(Inner {
                collections,
                persist_key: Some(key.to_string()),
                ..Default::default()
            })),
        }
    }

    pub fn has_collection(&self, path: &str) -> bool {
        self.inner.borrow().collections.contains_key(path)
    }

    /// Insert or replace an entity without going through the save lifecycle.
    pub fn insert(&self, entity: Entity) {
        let path = entity.path.clone();
        {
            let mut inner = self.inner.borrow_mut();
            let items = inner.collections.entry(path.clone()).or_default();
            match items.iter().position(|e| e.id == entity.id) {
                Some(i) => items[i] = entity,
                None => items.push(entity),
            }
        }
        self.commit(&path);
    }

    pub fn collection(&self, path: &str) -> Vec<Entity> {
        self.inner
            .borrow()
            .collections
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Replays a multi-step trigger write: listeners first see the collection emptied, then
    /// the full collection again.
    pub fn rebuild_collection(&self, path: &str) {
        let full = self.collection(path);
        log::info!("rebuilding {path} ({} entities)", full.len());
        self.notify(path, Vec::new());
        self.notify(path, full);
    }

    fn commit(&self, path: &str) {
        self.persist();
        self.notify(path, self.collection(path));
    }

    fn persist(&self) {
        let inner = self.inner.borrow();
        if let Some(key) = &inner.persist_key {
            save_json_to_storage(key, &inner.collections);
        }
    }

    fn notify(&self, path: &str, snapshot: Vec<Entity>) {
        let listeners: Vec<CollectionListener> = self
            .inner
            .borrow()
            .listeners
            .get(path)
            .map(|ls| ls.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in listeners {
            listener(snapshot.clone());
        }
    }

    fn apply_save(&self, request: &SaveEntityRequest) -> StoreResult<()> {
        if request.id.trim().is_empty() {
            return Err(StoreError::Rejected(format!("empty entity id in {}", request.path)));
        }
        {
            let mut inner = self.inner.borrow_mut();
            let items = inner.collections.entry(request.path.clone()).or_default();
            let position = items.iter().position(|e| e.id == request.id);

            match (request.status, position) {
                (_, Some(i)) => {
                    items[i].values = request.values.clone();
                    items[i].status = EntityStatus::Existing;
                }
                (EntityStatus::New, None) => items.push(Entity::new(
                    request.path.clone(),
                    request.id.clone(),
                    request.values.clone(),
                )),
                (EntityStatus::Existing, None) => {
                    return Err(StoreError::NotFound {
                        path: request.path.clone(),
                        id: request.id.clone(),
                    });
                }
            }
        }

        self.commit(&request.path);
        Ok(())
    }

    fn apply_delete(&self, path: &str, id: &str) -> StoreResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let Some(items) = inner.collections.get_mut(path) else {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                    id: id.to_string(),
                });
            };
            let before = items.len();
            items.retain(|e| e.id != id);
            if items.len() == before {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                    id: id.to_string(),
                });
            }
        }

        self.commit(path);
        Ok(())
    }
}

/// Parses a persisted snapshot. No snapshot means an empty store.
fn restore_collections(raw: Option<&str>) -> StoreResult<BTreeMap<String, Vec<Entity>>> {
    match raw {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(BTreeMap::new()),
    }
}

impl EntityStore for MemoryEntityStore {
    fn save(&self, request: &SaveEntityRequest) -> impl Future<Output = StoreResult<()>> {
        ready(self.apply_save(request))
    }

    fn delete(&self, path: &str, id: &str) -> impl Future<Output = StoreResult<()>> {
        ready(self.apply_delete(path, id))
    }

    fn fetch(&self, path: &str, id: &str) -> Option<Entity> {
        self.inner
            .borrow()
            .collections
            .get(path)
            .and_then(|items| items.iter().find(|e| e.id == id).cloned())
    }

    fn listen_collection(&self, path: &str, listener: CollectionListener) -> ListenerHandle {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_listener += 1;
            let id = inner.next_listener;
            inner
                .listeners
                .entry(path.to_string())
                .or_default()
                .push((id, listener.clone()));
            id
        };

        listener(self.collection(path));

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        let path = path.to_string();
        ListenerHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Some(ls) = inner.borrow_mut().listeners.get_mut(&path) {
                    ls.retain(|(lid, _)| *lid != id);
                }
            }
        })
    }
}
