mod demo;

pub(crate) use demo::{demo_schema, seed_store, COLLECTIONS, DEFAULT_COLLECTION};

use crate::components::hooks::use_debounced_data;
use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize, ButtonVariant};
use crate::components::{CollectionTable, EntityPreview};
use crate::editor::{PopupEditor, StoreCommitSink};
use crate::geometry::BrowserViewport;
use crate::models::{Entity, EntityCallbacks, EntitySchema, EntityStatus, EntityValues};
use crate::state::{AppContext, NoticeKind, NotifyingCallbacks};
use crate::storage::{save_string_to_storage, LAST_COLLECTION_KEY};
use crate::store::{delete_entity, save_entity, EntityStore, ListenerHandle, SaveEntityRequest};
use crate::timer::BrowserScheduler;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::Redirect;
use leptos_router::hooks::use_params;
use leptos_router::params::Params;
use std::rc::Rc;

#[derive(Params, PartialEq, Clone, Debug)]
pub struct CollectionRouteParams {
    pub collection: Option<String>,
}

/// `/` goes to the last visited collection.
#[component]
pub fn RootPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let target = app_state
        .0
        .last_collection
        .get_untracked()
        .filter(|c| COLLECTIONS.contains(&c.as_str()))
        .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

    view! { <Redirect path=format!("/c/{target}") /> }
}

#[component]
fn Notices() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    view! {
        <div class="space-y-2">
            <For
                each=move || app_state.0.notices.get()
                key=|n| n.id
                children=move |n| {
                    let id = n.id;
                    let class = match n.kind {
                        NoticeKind::Error => "border-destructive/30 flex items-start justify-between gap-2",
                        NoticeKind::Info => "flex items-start justify-between gap-2",
                    };
                    let text_class = match n.kind {
                        NoticeKind::Error => "text-destructive",
                        NoticeKind::Info => "text-muted-foreground",
                    };
                    view! {
                        <Alert class=class>
                            <AlertDescription class=text_class>{n.text}</AlertDescription>
                            <Button
                                variant=ButtonVariant::Ghost
                                size=ButtonSize::Sm
                                on:click=move |_| app_state.0.dismiss_notice(id)
                            >
                                "Dismiss"
                            </Button>
                        </Alert>
                    }
                }
            />
        </div>
    }
}

fn next_entity_id(rows: &[Entity]) -> String {
    let prefix = rows
        .first()
        .and_then(|e| e.id.chars().next())
        .unwrap_or('e');
    let max = rows
        .iter()
        .filter_map(|e| e.id.get(1..).and_then(|n| n.parse::<u64>().ok()))
        .max()
        .unwrap_or(0);
    format!("{prefix}{}", max + 1)
}

/// Starter values for a new entity: every property present, empty.
fn blank_values(schema: &EntitySchema) -> EntityValues {
    schema
        .ordered_keys()
        .into_iter()
        .map(|k| (k, serde_json::Value::Null))
        .collect()
}

#[component]
pub fn CollectionPage() -> impl IntoView {
    let params = use_params::<CollectionRouteParams>();
    let collection = move || params.get().ok().and_then(|p| p.collection).unwrap_or_default();

    view! {
        {move || {
            let path = collection();
            match demo_schema(&path) {
                Some(schema) => view! { <CollectionView path=path schema=schema /> }.into_any(),
                None => view! {
                    <div class="px-4 py-8 text-xs text-muted-foreground">
                        {format!("Unknown collection \"{path}\"")}
                    </div>
                }
                .into_any(),
            }
        }}
    }
}

#[component]
fn CollectionView(path: String, schema: EntitySchema) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let state = app_state.0;

    save_string_to_storage(LAST_COLLECTION_KEY, &path);
    state.last_collection.set(Some(path.clone()));

    let raw: RwSignal<Vec<Entity>> = RwSignal::new(vec![]);
    let handle: ListenerHandle = state.store.with_value(|store| {
        store.listen_collection(&path, Rc::new(move |items: Vec<Entity>| raw.set(items)))
    });
    let handle = StoredValue::new_local(Some(handle));
    on_cleanup(move || {
        if let Some(Some(h)) = handle.try_update_value(|h| h.take()) {
            h.unsubscribe();
        }
    });

    let rows = use_debounced_data(raw.into(), state.stabilize_window_ms.into());

    let callbacks: Rc<dyn EntityCallbacks> = Rc::new(NotifyingCallbacks { state });
    let config = state.config.get_value();
    let store = state.store.get_value();
    let context = Rc::new(state.context.get_value());
    let schema_rc = Rc::new(schema.clone());

    let sink = StoreCommitSink::new(store, schema_rc.clone(), callbacks.clone(), context.clone());
    let editor = PopupEditor::new(Rc::new(BrowserScheduler), Rc::new(BrowserViewport), Rc::new(sink))
        .with_debounce_ms(config.commit_debounce_ms);

    let selected: RwSignal<Option<String>> = RwSignal::new(None);
    let services = StoredValue::new_local((schema_rc, callbacks, context));
    let title = schema.name.clone();
    let path_sv = StoredValue::new(path.clone());
    let schema_sv = StoredValue::new(schema.clone());

    let on_rebuild = move |_| {
        state.store.with_value(|s| s.rebuild_collection(&path_sv.get_value()));
    };

    let on_add = move |_| {
        let path = path_sv.get_value();
        let store = state.store.get_value();
        let (schema, callbacks, context) = services.get_value();
        let request = SaveEntityRequest {
            id: next_entity_id(&store.collection(&path)),
            path,
            values: blank_values(&schema),
            status: EntityStatus::New,
        };
        spawn_local(async move {
            let _ = save_entity(&store, &schema, callbacks.as_ref(), &context, request).await;
        });
    };

    let on_delete = move |_| {
        let Some(id) = selected.get_untracked() else {
            return;
        };
        let store = state.store.get_value();
        let Some(entity) = store.fetch(&path_sv.get_value(), &id) else {
            return;
        };
        let (schema, callbacks, context) = services.get_value();
        selected.set(None);
        spawn_local(async move {
            if let Err(e) = delete_entity(&store, &schema, callbacks.as_ref(), &context, &entity).await {
                state.notify(NoticeKind::Error, format!("Could not delete {}: {e}", entity.id));
            }
        });
    };

    let on_window_change = move |ev: web_sys::Event| {
        let value = event_target_value(&ev);
        if let Ok(ms) = value.parse::<u32>() {
            state.stabilize_window_ms.set(ms);
        }
    };

    let preview = move || {
        let id = selected.get()?;
        let entity = rows.with(|r| r.iter().find(|e| e.id == id).cloned())?;
        Some(view! { <EntityPreview schema=schema_sv.get_value() entity=entity /> })
    };

    let nav = COLLECTIONS
        .iter()
        .map(|c| {
            let active = *c == path;
            view! {
                <a
                    href=format!("/c/{c}")
                    class="rounded-md px-2 py-1 text-sm hover:bg-accent"
                    class:bg-accent=active
                    class:font-semibold=active
                >
                    {c.to_string()}
                </a>
            }
        })
        .collect_view();

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[1080px] space-y-4 px-4 py-8">
                <div class="flex items-center justify-between">
                    <div class="space-y-1">
                        <h1 class="text-xl font-semibold">{title}</h1>
                        <nav class="flex gap-1">{nav}</nav>
                    </div>
                    <div class="flex items-center gap-2">
                        <label class="flex items-center gap-2 text-xs text-muted-foreground">
                            "Shrink window"
                            <select
                                class="border-input h-8 rounded-md border bg-transparent px-2 text-xs"
                                prop:value=move || state.stabilize_window_ms.get().to_string()
                                on:change=on_window_change
                            >
                                <option value="0">"0 ms"</option>
                                <option value="500">"500 ms"</option>
                                <option value="2000">"2000 ms"</option>
                                <option value="5000">"5000 ms"</option>
                            </select>
                        </label>
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_rebuild>
                            "Simulate trigger rebuild"
                        </Button>
                        <Button size=ButtonSize::Sm on:click=on_add>"Add"</Button>
                        <Button
                            variant=ButtonVariant::Destructive
                            size=ButtonSize::Sm
                            attr:disabled=move || selected.get().is_none()
                            on:click=on_delete
                        >
                            "Delete"
                        </Button>
                    </div>
                </div>

                <Notices />

                <CollectionTable
                    schema=schema
                    rows=rows
                    editor=editor
                    selected=selected
                    popup_width=config.popup_width
                />

                {preview}
            </div>
        </div>
    }
}
