use crate::components::ui::{FieldErrorText, Input, Label};
use crate::models::{DataType, EntityValues, Property, RenderHint};
use crate::validation::{validate_property, FieldError, FieldErrors};
use leptos::prelude::*;
use serde_json::Value;
use wasm_bindgen::JsCast;

/// How raw widget text turns into a stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WidgetKind {
    Text,
    LongText,
    Number,
    Boolean,
    Select,
    Json,
}

fn widget_kind(property: &Property) -> WidgetKind {
    match (&property.data_type, property.hint) {
        (DataType::String, RenderHint::Default) => WidgetKind::Text,
        (DataType::String, _) => WidgetKind::LongText,
        (DataType::Number, _) => WidgetKind::Number,
        (DataType::Boolean, _) => WidgetKind::Boolean,
        (DataType::Enum { .. }, _) => WidgetKind::Select,
        (DataType::Array { .. } | DataType::Map { .. }, _) => WidgetKind::Json,
    }
}

/// Text shown in the widget for a stored value.
fn raw_text(kind: WidgetKind, value: Option<&Value>) -> String {
    match (kind, value) {
        (_, None | Some(Value::Null)) => String::new(),
        (WidgetKind::Json, Some(v)) => serde_json::to_string_pretty(v).unwrap_or_default(),
        (_, Some(Value::String(s))) => s.clone(),
        (_, Some(v)) => v.to_string(),
    }
}

/// Parse widget text back into a value. `Err` carries a message for values the widget
/// cannot represent at all.
fn parse_raw(kind: WidgetKind, raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    match kind {
        WidgetKind::Text | WidgetKind::LongText | WidgetKind::Select => {
            if raw.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::String(raw.to_string()))
            }
        }
        WidgetKind::Number if trimmed.is_empty() => Ok(Value::Null),
        WidgetKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(|n| match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
                _ => Value::Number(n),
            })
            .ok_or_else(|| "Not a number".to_string()),
        WidgetKind::Boolean => Ok(Value::Bool(trimmed == "true")),
        WidgetKind::Json if trimmed.is_empty() => Ok(Value::Null),
        WidgetKind::Json => serde_json::from_str(trimmed).map_err(|e| format!("Invalid JSON: {e}")),
    }
}

/// Fold one edited field into a copy of the form values and validate it.
fn apply_edit(
    base: &EntityValues,
    field_key: &str,
    property: &Property,
    kind: WidgetKind,
    raw: &str,
) -> (EntityValues, FieldErrors) {
    let mut values = base.clone();
    let mut errors = FieldErrors::new();

    match parse_raw(kind, raw) {
        Ok(value) => {
            if let Some(error) = validate_property(property, Some(&value)) {
                errors.insert(field_key.to_string(), error);
            }
            values.insert(field_key.to_string(), value);
        }
        Err(message) => {
            errors.insert(field_key.to_string(), FieldError::Message(message));
        }
    }

    (values, errors)
}

/// Editor for a single property, chosen from its data type and render hint.
///
/// Every change reports the full form values plus the field's errors through `on_change`.
#[component]
pub fn FieldWidget(
    property: Property,
    #[prop(into)] field_key: String,
    values: EntityValues,
    #[prop(into)] on_change: Callback<(EntityValues, FieldErrors)>,
) -> impl IntoView {
    let kind = widget_kind(&property);
    let text = RwSignal::new(raw_text(kind, values.get(&field_key)));
    let errors: RwSignal<Vec<String>> = RwSignal::new(Vec::new());
    let input_id = format!("field_{field_key}");

    let title = property.title.clone();
    let required = property.validation.required;
    let options = match &property.data_type {
        DataType::Enum { values } => values.clone(),
        _ => Vec::new(),
    };

    let base = StoredValue::new(values);
    let property = StoredValue::new(property);
    let field_key = StoredValue::new(field_key);

    let emit = move |raw: String| {
        let (values, field_errors) = property.with_value(|p| {
            base.with_value(|b| field_key.with_value(|k| apply_edit(b, k, p, kind, &raw)))
        });
        errors.set(
            field_errors
                .values()
                .flat_map(FieldError::messages)
                .collect(),
        );
        base.set_value(values.clone());
        on_change.run((values, field_errors));
    };

    Effect::new(move |prev: Option<()>| {
        let raw = text.get();
        if prev.is_some() {
            emit(raw);
        }
    });

    let on_text = move |ev: web_sys::Event| {
        if let Some(area) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        {
            text.set(area.value());
        }
    };
    let on_select = move |ev: web_sys::Event| {
        if let Some(select) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
        {
            text.set(select.value());
        }
    };
    let on_check = move |ev: web_sys::Event| {
        if let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            text.set(input.checked().to_string());
        }
    };

    let invalid = Signal::derive(move || !errors.get().is_empty());
    let textarea_class = "border-input w-full min-h-24 rounded-md border bg-transparent px-3 py-2 text-sm shadow-xs outline-none focus-visible:ring-2 focus-visible:ring-ring/50 aria-invalid:border-destructive";

    let widget = match kind {
        WidgetKind::Text => view! {
            <Input id=input_id.clone() bind_value=text invalid=invalid autofocus=true />
        }
        .into_any(),
        WidgetKind::Number => view! {
            <Input id=input_id.clone() r#type="number" bind_value=text invalid=invalid autofocus=true />
        }
        .into_any(),
        WidgetKind::LongText | WidgetKind::Json => view! {
            <textarea
                id=input_id.clone()
                class=textarea_class
                class:font-mono={kind == WidgetKind::Json}
                aria-invalid=move || invalid.get().then_some("true")
                prop:value=move || text.get()
                on:input=on_text
            />
        }
        .into_any(),
        WidgetKind::Boolean => view! {
            <input
                id=input_id.clone()
                type="checkbox"
                class="size-4"
                prop:checked=move || text.get() == "true"
                on:change=on_check
            />
        }
        .into_any(),
        WidgetKind::Select => view! {
            <select
                id=input_id.clone()
                class="border-input h-9 w-full rounded-md border bg-transparent px-3 text-sm"
                prop:value=move || text.get()
                on:change=on_select
            >
                <option value="">"-"</option>
                {options
                    .into_iter()
                    .map(|o| view! { <option value=o.clone()>{o.clone()}</option> })
                    .collect_view()}
            </select>
        }
        .into_any(),
    };

    view! {
        <div class="flex flex-col gap-2" data-name="FieldWidget">
            <Label html_for=input_id required=required>{title}</Label>
            {widget}
            <For
                each=move || errors.get()
                key=|m| m.clone()
                children=move |m| view! { <FieldErrorText>{m}</FieldErrorText> }
            />
        </div>
    }
}
