//! Field-level validation. Errors are reported as data, never raised.

use crate::models::{DataType, EntitySchema, EntityValues, Property};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validation result for one field.
///
/// Composite fields (arrays) report one optional message per entry; an entry list whose
/// entries are all `None` counts as no error.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldError {
    Message(String),
    Entries(Vec<Option<String>>),
}

impl FieldError {
    pub fn messages(&self) -> Vec<String> {
        match self {
            FieldError::Message(m) => vec![m.clone()],
            FieldError::Entries(entries) => entries
                .iter()
                .enumerate()
                .filter_map(|(i, e)| e.as_ref().map(|m| format!("#{}: {m}", i + 1)))
                .collect(),
        }
    }
}

pub type FieldErrors = BTreeMap<String, FieldError>;

/// The auto-submit rule: absent, an empty message, or an entry list with no truthy entries.
pub fn errors_cleared(error: Option<&FieldError>) -> bool {
    match error {
        None => true,
        Some(FieldError::Message(m)) => m.is_empty(),
        Some(FieldError::Entries(entries)) => entries.iter().all(|e| match e {
            None => true,
            Some(m) => m.is_empty(),
        }),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

pub fn validate_property(property: &Property, value: Option<&Value>) -> Option<FieldError> {
    let rules = &property.validation;
    let title = &property.title;

    if is_blank(value) {
        return rules
            .required
            .then(|| FieldError::Message(format!("{title} is required")));
    }
    let value = value?;

    let message = match (&property.data_type, value) {
        (DataType::String, Value::String(s)) => {
            let len = s.chars().count();
            match (rules.min_length, rules.max_length) {
                (Some(min), _) if len < min => {
                    Some(format!("{title} must be at least {min} characters"))
                }
                (_, Some(max)) if len > max => {
                    Some(format!("{title} must be at most {max} characters"))
                }
                _ => None,
            }
        }
        (DataType::Number, Value::Number(n)) => {
            let n = n.as_f64().unwrap_or_default();
            match (rules.min, rules.max) {
                (Some(min), _) if n < min => Some(format!("{title} must be at least {min}")),
                (_, Some(max)) if n > max => Some(format!("{title} must be at most {max}")),
                _ => None,
            }
        }
        (DataType::Boolean, Value::Bool(_)) => None,
        (DataType::Enum { values }, Value::String(s)) => (!values.iter().any(|v| v == s))
            .then(|| format!("{title} must be one of {}", values.join(", "))),
        (DataType::Array { of }, Value::Array(items)) => {
            match (rules.min_length, rules.max_length) {
                (Some(min), _) if items.len() < min => {
                    return Some(FieldError::Message(format!(
                        "{title} needs at least {min} entries"
                    )));
                }
                (_, Some(max)) if items.len() > max => {
                    return Some(FieldError::Message(format!(
                        "{title} allows at most {max} entries"
                    )));
                }
                _ => {}
            }

            let entries: Vec<Option<String>> = items
                .iter()
                .map(|item| {
                    validate_property(of, Some(item)).map(|e| e.messages().join("; "))
                })
                .collect();
            return entries
                .iter()
                .any(Option::is_some)
                .then_some(FieldError::Entries(entries));
        }
        (DataType::Map { properties }, Value::Object(map)) => {
            let nested = validate_map(properties, map);
            (!nested.is_empty()).then(|| {
                nested
                    .iter()
                    .flat_map(|(k, e)| e.messages().into_iter().map(move |m| format!("{k}: {m}")))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
        }
        (data_type, _) => Some(format!("{title} has the wrong type (expected {})", type_name(data_type))),
    };

    message.map(FieldError::Message)
}

fn type_name(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::String => "text",
        DataType::Number => "number",
        DataType::Boolean => "boolean",
        DataType::Enum { .. } => "one of the allowed values",
        DataType::Array { .. } => "list",
        DataType::Map { .. } => "map",
    }
}

fn validate_map(properties: &BTreeMap<String, Property>, values: &EntityValues) -> FieldErrors {
    properties
        .iter()
        .filter_map(|(key, property)| {
            validate_property(property, values.get(key)).map(|e| (key.clone(), e))
        })
        .collect()
}

/// Validate every schema property present in or required by `values`.
pub fn validate_values(schema: &EntitySchema, values: &EntityValues) -> FieldErrors {
    validate_map(&schema.properties, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyValidation;
    use serde_json::json;

    fn name_property() -> Property {
        Property::new("Name", DataType::String).with_validation(PropertyValidation {
            required: true,
            min_length: Some(2),
            max_length: Some(10),
            ..Default::default()
        })
    }

    #[test]
    fn cleared_rule() {
        assert!(errors_cleared(None));
        assert!(errors_cleared(Some(&FieldError::Entries(vec![]))));
        assert!(errors_cleared(Some(&FieldError::Entries(vec![None, Some(String::new())]))));
        assert!(!errors_cleared(Some(&FieldError::Entries(vec![None, Some("bad".into())]))));
        assert!(!errors_cleared(Some(&FieldError::Message("bad".into()))));
        assert!(errors_cleared(Some(&FieldError::Message(String::new()))));
    }

    #[test]
    fn required_and_length() {
        let p = name_property();
        assert_eq!(
            validate_property(&p, Some(&json!("  "))),
            Some(FieldError::Message("Name is required".into()))
        );
        assert!(validate_property(&p, Some(&json!("a"))).is_some());
        assert!(validate_property(&p, Some(&json!("abcdefghijk"))).is_some());
        assert_eq!(validate_property(&p, Some(&json!("Lamp"))), None);
    }

    #[test]
    fn optional_blank_is_fine() {
        let p = Property::new("Note", DataType::String);
        assert_eq!(validate_property(&p, None), None);
    }

    #[test]
    fn number_bounds_and_type() {
        let p = Property::new("Price", DataType::Number).with_validation(PropertyValidation {
            min: Some(0.0),
            max: Some(100.0),
            ..Default::default()
        });
        assert!(validate_property(&p, Some(&json!(-1))).is_some());
        assert!(validate_property(&p, Some(&json!(150.5))).is_some());
        assert_eq!(validate_property(&p, Some(&json!(42))), None);
        assert!(validate_property(&p, Some(&json!("42"))).is_some());
    }

    #[test]
    fn enum_membership() {
        let p = Property::new(
            "Status",
            DataType::Enum {
                values: vec!["draft".into(), "published".into()],
            },
        );
        assert_eq!(validate_property(&p, Some(&json!("draft"))), None);
        assert!(validate_property(&p, Some(&json!("archived"))).is_some());
    }

    #[test]
    fn array_reports_entries() {
        let p = Property::new(
            "Tags",
            DataType::Array {
                of: Box::new(Property::new("Tag", DataType::String).with_validation(
                    PropertyValidation {
                        max_length: Some(3),
                        ..Default::default()
                    },
                )),
            },
        );

        let err = validate_property(&p, Some(&json!(["ok", "too long", "no"])));
        let Some(FieldError::Entries(entries)) = err else {
            panic!("expected entries, got {err:?}");
        };
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_none());
        assert!(entries[1].is_some());
        assert!(entries[2].is_none());

        assert_eq!(validate_property(&p, Some(&json!(["a", "b"]))), None);
    }

    #[test]
    fn validate_values_collects_by_key() {
        let mut schema = EntitySchema::default();
        schema.properties.insert("name".into(), name_property());
        schema
            .properties
            .insert("active".into(), Property::new("Active", DataType::Boolean));

        let values = json!({"active": "yes"});
        let errors = validate_values(&schema, values.as_object().expect("object"));
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("active"));
    }

    #[test]
    fn entries_serialize_as_plain_array() {
        let e = FieldError::Entries(vec![None, Some("bad".into())]);
        assert_eq!(serde_json::to_value(&e).expect("serialize"), json!([null, "bad"]));
    }
}
