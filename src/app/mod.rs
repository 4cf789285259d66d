use crate::config::CmsConfig;
use crate::pages::{seed_store, CollectionPage, RootPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new(CmsConfig::from_env());
    state.store.with_value(seed_store);
    provide_context(AppContext(state));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("c/:collection") view=CollectionPage />
                <Route path=path!("") view=RootPage />
            </Routes>
        </Router>
    }
}
