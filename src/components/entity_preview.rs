use crate::models::{Entity, EntitySchema, RenderHint};
use crate::util::display_value;
use leptos::prelude::*;

/// Read-only summary of one entity, in schema column order.
#[component]
pub fn EntityPreview(schema: EntitySchema, entity: Entity) -> impl IntoView {
    let rows = schema
        .ordered_keys()
        .into_iter()
        .map(|key| {
            let property = schema.property(&key);
            let title = property
                .map(|p| p.title.clone())
                .unwrap_or_else(|| key.clone());
            let long_text = property.is_some_and(|p| p.hint != RenderHint::Default);
            let value = display_value(entity.value(&key));
            // Markdown and multiline text keep their line breaks; no rendering.
            let value = if long_text {
                view! { <pre class="whitespace-pre-wrap font-sans text-sm">{value}</pre> }.into_any()
            } else {
                value.into_any()
            };
            view! {
                <div class="grid grid-cols-[8rem_1fr] gap-2 py-1">
                    <dt class="text-xs text-muted-foreground">{title}</dt>
                    <dd class="text-sm break-words">{value}</dd>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="rounded-lg border p-4" data-name="EntityPreview">
            <div class="mb-2 flex items-center justify-between">
                <h3 class="text-sm font-semibold">{schema.name.clone()}</h3>
                <span class="font-mono text-xs text-muted-foreground">
                    {format!("{}/{}", entity.path, entity.id)}
                </span>
            </div>
            <dl class="divide-y">{rows}</dl>
        </div>
    }
}
