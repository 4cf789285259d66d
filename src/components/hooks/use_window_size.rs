use crate::geometry::{BrowserViewport, Size, ViewportProvider};
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::{window_event_listener, WindowListenerHandle};

/// Current `innerWidth`/`innerHeight`, refreshed on `resize`.
pub fn use_window_size() -> ReadSignal<Size> {
    let size = RwSignal::new(BrowserViewport.size());

    let handle = window_event_listener(ev::resize, move |_ev: web_sys::UiEvent| {
        size.set(BrowserViewport.size());
    });
    let handle: StoredValue<Option<WindowListenerHandle>, LocalStorage> = StoredValue::new_local(Some(handle));

    on_cleanup(move || {
        if let Some(Some(h)) = handle.try_update_value(|h| h.take()) {
            h.remove();
        }
    });

    size.read_only()
}
