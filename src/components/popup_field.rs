use crate::components::hooks::{use_random_id_for, use_window_size};
use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::components::FieldWidget;
use crate::editor::{EditorState, PopupEditor};
use crate::geometry::{Point, Rect, Size};
use crate::models::{EntitySchema, EntityValues};
use crate::validation::FieldErrors;
use icons::X;
use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

pub(crate) fn dom_rect(rect: &web_sys::DomRect) -> Rect {
    Rect::new(rect.x(), rect.y(), rect.width(), rect.height())
}

fn pointer(ev: &web_sys::PointerEvent) -> Point {
    Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

/// Capture or release a pointer on the drag handle. Dragging still works without capture,
/// so a refusal is only logged.
pub(crate) fn set_pointer_capture(el: &web_sys::Element, pointer_id: i32, capture: bool) -> bool {
    let result = if capture {
        el.set_pointer_capture(pointer_id)
    } else {
        el.release_pointer_capture(pointer_id)
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            log::debug!("pointer {pointer_id} capture={capture} failed: {e:?}");
            false
        }
    }
}

/// Floating panel that edits one field of the editor's current record.
///
/// Positioning, dragging and commits all live in [`PopupEditor`]; this component only
/// forwards DOM measurements and events and mirrors the editor's position into the style.
#[component]
pub fn PopupFormField(
    editor: StoredValue<PopupEditor, LocalStorage>,
    schema: StoredValue<EntitySchema>,
    #[prop(default = crate::config::DEFAULT_POPUP_WIDTH)] width: u32,
) -> impl IntoView {
    let popup_id = use_random_id_for("popup");
    let panel_ref: NodeRef<html::Div> = NodeRef::new();
    let position: RwSignal<Option<Point>> = RwSignal::new(None);
    let dragging = RwSignal::new(false);

    let sync = move || {
        editor.with_value(|e| {
            position.set(e.position());
            dragging.set(e.state() == EditorState::Dragging);
        });
    };

    // First layout picks the side of the cell; later ones only re-clamp.
    Effect::new(move |_| {
        if let Some(panel) = panel_ref.get() {
            let r = panel.get_bounding_client_rect();
            editor.with_value(|e| e.measure_panel(Size::new(r.width(), r.height())));
            sync();
        }
    });

    let window_size = use_window_size();
    Effect::new(move |prev: Option<()>| {
        window_size.track();
        if prev.is_some() {
            editor.with_value(|e| e.handle_resize());
            sync();
        }
    });

    let on_pointer_down = move |ev: web_sys::PointerEvent| {
        if ev.button() != 0 {
            return;
        }
        if let Some(el) = ev
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        {
            set_pointer_capture(&el, ev.pointer_id(), true);
        }
        editor.with_value(|e| e.begin_drag(pointer(&ev)));
        sync();
    };
    let on_pointer_move = move |ev: web_sys::PointerEvent| {
        if !dragging.get_untracked() {
            return;
        }
        editor.with_value(|e| e.drag_to(pointer(&ev)));
        sync();
    };
    let on_pointer_up = move |ev: web_sys::PointerEvent| {
        if let Some(el) = ev
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        {
            set_pointer_capture(&el, ev.pointer_id(), false);
        }
        editor.with_value(|e| e.end_drag());
        sync();
    };

    let on_change = Callback::new(move |(values, errors): (EntityValues, FieldErrors)| {
        editor.with_value(|e| e.report(values, errors));
    });

    let style = move || match position.get() {
        Some(p) => format!("left:{}px;top:{}px;width:{width}px;", p.x, p.y),
        // Laid out but invisible until the first measurement places it.
        None => format!("left:0;top:0;width:{width}px;visibility:hidden;"),
    };

    let field = editor.with_value(|e| (e.record(), e.field_key()));
    let body = match field {
        (Some(record), Some(key)) => {
            let property = schema.with_value(|s| s.property(&key).cloned());
            match property {
                Some(property) => view! {
                    <FieldWidget property=property field_key=key values=record.values on_change=on_change />
                }
                .into_any(),
                None => view! {
                    <p class="text-xs text-muted-foreground">{format!("Unknown field {key}")}</p>
                }
                .into_any(),
            }
        }
        _ => ().into_any(),
    };
    let title = editor.with_value(|e| {
        let key = e.field_key().unwrap_or_default();
        schema.with_value(|s| s.property(&key).map(|p| p.title.clone()).unwrap_or(key))
    });

    view! {
        <div
            id=popup_id
            node_ref=panel_ref
            data-name="PopupFormField"
            role="dialog"
            class="fixed z-50 flex flex-col rounded-lg border bg-popover text-popover-foreground shadow-lg"
            class:opacity-90=move || dragging.get()
            style=style
            on:click=|ev: web_sys::MouseEvent| ev.stop_propagation()
        >
            <div
                class="flex items-center justify-between gap-2 border-b px-3 py-1.5 cursor-move select-none touch-none"
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointercancel=on_pointer_up
            >
                <span class="text-xs font-medium">{title}</span>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::IconSm
                    attr:aria-label="Close"
                    on:pointerdown=|ev: web_sys::PointerEvent| ev.stop_propagation()
                    on:click=move |_| editor.with_value(|e| e.dismiss())
                >
                    <X />
                </Button>
            </div>
            <div class="p-3">{body}</div>
        </div>
    }
}
