use crate::components::popup_field::dom_rect;
use crate::components::PopupFormField;
use crate::editor::PopupEditor;
use crate::models::{Entity, EntitySchema};
use crate::util::display_value;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// Table over a (stabilized) collection. Clicking a cell opens the inline popup editor
/// anchored at that cell.
#[component]
pub fn CollectionTable(
    schema: EntitySchema,
    #[prop(into)] rows: Signal<Vec<Entity>>,
    editor: PopupEditor,
    #[prop(into)] selected: RwSignal<Option<String>>,
    #[prop(default = crate::config::DEFAULT_POPUP_WIDTH)] popup_width: u32,
) -> impl IntoView {
    let columns = schema.ordered_keys();
    let headers: Vec<String> = columns
        .iter()
        .map(|k| schema.property(k).map(|p| p.title.clone()).unwrap_or_else(|| k.clone()))
        .collect();
    let columns = StoredValue::new(columns);
    let schema = StoredValue::new(schema);

    let open = RwSignal::new(false);
    // Bumped on every cell click so the popup remounts (and re-measures) per target.
    let session = RwSignal::new(0u64);
    let target: RwSignal<Option<String>> = RwSignal::new(None);

    editor.set_on_dismiss(move || open.set(false));
    let editor = StoredValue::new_local(editor);

    // Caller-controlled visibility.
    Effect::new(move |_| {
        let is_open = open.get();
        editor.with_value(|e| e.set_open(is_open));
    });

    // Keep the open record in step with the live rows; a vanished row leaves the editor
    // with nothing to commit to.
    Effect::new(move |_| {
        let rows = rows.get();
        let Some(id) = target.get_untracked() else {
            return;
        };
        let record = rows.into_iter().find(|r| r.id == id);
        editor.with_value(|e| {
            if e.is_open() {
                e.update_record(record);
            }
        });
    });

    on_cleanup(move || {
        let _ = editor.try_with_value(|e| e.close());
    });

    let on_background_click = move |_| {
        let blocked = editor.with_value(|e| {
            let blocked = e.prevents_outside_click();
            if blocked {
                e.on_outside_click();
            }
            blocked
        });
        if !blocked {
            selected.set(None);
        }
    };

    let open_cell = move |ev: web_sys::MouseEvent, entity: Entity, key: String| {
        ev.stop_propagation();
        let anchor = ev
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| dom_rect(&el.get_bounding_client_rect()))
            .unwrap_or_default();

        selected.set(Some(entity.id.clone()));
        target.set(Some(entity.id.clone()));
        editor.with_value(|e| e.open(Some(entity), key, anchor));
        open.set(true);
        session.update(|n| *n += 1);
    };

    view! {
        <div class="relative w-full overflow-x-auto rounded-lg border" on:click=on_background_click>
            <table class="w-full text-sm" data-name="CollectionTable">
                <thead class="bg-muted/50 text-xs text-muted-foreground">
                    <tr>
                        <th class="px-3 py-2 text-left font-medium">"ID"</th>
                        {headers
                            .into_iter()
                            .map(|h| view! { <th class="px-3 py-2 text-left font-medium">{h}</th> })
                            .collect_view()}
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || rows.get()
                        key=|e| (e.id.clone(), serde_json::to_string(&e.values).unwrap_or_default())
                        children=move |entity: Entity| {
                            let id = entity.id.clone();
                            let row_id = id.clone();
                            let cells = columns
                                .get_value()
                                .into_iter()
                                .map(|key| {
                                    let text = display_value(entity.value(&key));
                                    let entity = entity.clone();
                                    view! {
                                        <td
                                            class="px-3 py-2 cursor-pointer hover:bg-accent/50 max-w-64 truncate"
                                            on:click=move |ev| open_cell(ev, entity.clone(), key.clone())
                                        >
                                            {text}
                                        </td>
                                    }
                                })
                                .collect_view();
                            view! {
                                <tr
                                    class="border-t"
                                    class:bg-accent=move || selected.get().as_deref() == Some(row_id.as_str())
                                >
                                    <td class="px-3 py-2 font-mono text-xs text-muted-foreground">{id}</td>
                                    {cells}
                                </tr>
                            }
                        }
                    />
                </tbody>
            </table>
            <Show when=move || rows.with(|r| r.is_empty())>
                <div class="px-3 py-6 text-center text-xs text-muted-foreground">"No entities"</div>
            </Show>
            <Show when=move || open.get()>
                {move || {
                    session.track();
                    view! { <PopupFormField editor=editor schema=schema width=popup_width /> }
                }}
            </Show>
        </div>
    }
}
