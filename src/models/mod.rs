pub(crate) mod callbacks;

pub use callbacks::{CmsContext, EntityCallbacks, EntityOnDeleteProps, EntityOnSaveProps, NoopCallbacks};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field-keyed values of an entity. Kept as raw JSON so schemas can evolve freely.
pub type EntityValues = serde_json::Map<String, serde_json::Value>;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityStatus {
    New,
    #[default]
    Existing,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: String,

    /// Path of the collection this entity lives in, e.g. `products` or
    /// `products/p1/locales`.
    pub path: String,

    #[serde(default)]
    pub values: EntityValues,

    #[serde(default)]
    pub status: EntityStatus,
}

impl Entity {
    pub fn new(path: impl Into<String>, id: impl Into<String>, values: EntityValues) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            values,
            status: EntityStatus::Existing,
        }
    }

    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataType {
    String,
    Number,
    Boolean,
    /// Closed set of allowed string values.
    Enum { values: Vec<String> },
    Array { of: Box<Property> },
    Map { properties: BTreeMap<String, Property> },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderHint {
    #[default]
    Default,
    Multiline,
    Markdown,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct PropertyValidation {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Property {
    pub title: String,
    #[serde(flatten)]
    pub data_type: DataType,
    #[serde(default)]
    pub validation: PropertyValidation,
    #[serde(default)]
    pub hint: RenderHint,
}

impl Property {
    pub fn new(title: impl Into<String>, data_type: DataType) -> Self {
        Self {
            title: title.into(),
            data_type,
            validation: PropertyValidation::default(),
            hint: RenderHint::default(),
        }
    }

    pub fn with_validation(mut self, validation: PropertyValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_hint(mut self, hint: RenderHint) -> Self {
        self.hint = hint;
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct EntitySchema {
    pub name: String,
    pub properties: BTreeMap<String, Property>,

    /// Column order for tables. Keys missing here are appended in key order.
    #[serde(default)]
    pub property_order: Vec<String>,
}

impl EntitySchema {
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn ordered_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .property_order
            .iter()
            .filter(|k| self.properties.contains_key(k.as_str()))
            .cloned()
            .collect();
        for k in self.properties.keys() {
            if !keys.iter().any(|existing| existing == k) {
                keys.push(k.clone());
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_contract_deserialize() {
        let json = r#"{
            "id": "p1",
            "path": "products",
            "values": {"name": "Lamp", "price": 12.5}
        }"#;
        let parsed: Entity = serde_json::from_str(json).expect("entity should parse");
        assert_eq!(parsed.id, "p1");
        assert_eq!(parsed.status, EntityStatus::Existing);
        assert_eq!(parsed.value("name").and_then(|v| v.as_str()), Some("Lamp"));
    }

    #[test]
    fn test_property_data_type_is_flattened() {
        let json = r#"{
            "title": "Tags",
            "type": "array",
            "of": {"title": "Tag", "type": "string", "validation": {"max_length": 8}}
        }"#;
        let parsed: Property = serde_json::from_str(json).expect("property should parse");
        let DataType::Array { of } = &parsed.data_type else {
            panic!("expected array");
        };
        assert_eq!(of.validation.max_length, Some(8));
        assert_eq!(parsed.hint, RenderHint::Default);
    }

    #[test]
    fn test_ordered_keys_respects_order_then_appends() {
        let mut schema = EntitySchema {
            name: "Products".to_string(),
            ..Default::default()
        };
        for key in ["a", "b", "c"] {
            schema
                .properties
                .insert(key.to_string(), Property::new(key, DataType::String));
        }
        schema.property_order = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        assert_eq!(schema.ordered_keys(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EntityStatus::Existing.to_string(), "existing");
        assert_eq!(EntityStatus::New.to_string(), "new");
    }
}
