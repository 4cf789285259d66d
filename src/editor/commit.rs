use crate::models::{CmsContext, EntityCallbacks, EntitySchema};
use crate::store::{save_entity, EntityStore, SaveEntityRequest};
use std::rc::Rc;

/// Where the popup editor sends its writes. Fire-and-forget: the sink owns failure
/// reporting.
pub trait CommitSink {
    fn commit(&self, request: SaveEntityRequest);
}

impl<F: Fn(SaveEntityRequest)> CommitSink for F {
    fn commit(&self, request: SaveEntityRequest) {
        self(request)
    }
}

/// Runs [`save_entity`] on the local executor so the callback hooks see every commit.
pub struct StoreCommitSink<S> {
    store: S,
    schema: Rc<EntitySchema>,
    callbacks: Rc<dyn EntityCallbacks>,
    context: Rc<CmsContext>,
}

impl<S: EntityStore + Clone + 'static> StoreCommitSink<S> {
    pub fn new(
        store: S,
        schema: Rc<EntitySchema>,
        callbacks: Rc<dyn EntityCallbacks>,
        context: Rc<CmsContext>,
    ) -> Self {
        Self {
            store,
            schema,
            callbacks,
            context,
        }
    }
}

impl<S: EntityStore + Clone + 'static> CommitSink for StoreCommitSink<S> {
    fn commit(&self, request: SaveEntityRequest) {
        let store = self.store.clone();
        let schema = self.schema.clone();
        let callbacks = self.callbacks.clone();
        let context = self.context.clone();

        leptos::task::spawn_local(async move {
            let target = format!("{}/{}", request.path, request.id);
            // Failures already went through on_save_failure.
            if let Err(e) = save_entity(&store, &schema, callbacks.as_ref(), &context, request).await {
                log::debug!("inline commit of {target} did not land: {e}");
            }
        });
    }
}
