//! Built-in collections the admin panel ships with.

use crate::models::{DataType, Entity, EntitySchema, EntityValues, Property, PropertyValidation, RenderHint};
use crate::store::MemoryEntityStore;
use serde_json::json;
use std::collections::BTreeMap;

pub(crate) const COLLECTIONS: &[&str] = &["products", "articles"];
pub(crate) const DEFAULT_COLLECTION: &str = "products";

fn required() -> PropertyValidation {
    PropertyValidation {
        required: true,
        ..Default::default()
    }
}

fn schema(name: &str, properties: Vec<(&str, Property)>) -> EntitySchema {
    EntitySchema {
        name: name.to_string(),
        property_order: properties.iter().map(|(k, _)| k.to_string()).collect(),
        properties: properties
            .into_iter()
            .map(|(k, p)| (k.to_string(), p))
            .collect(),
    }
}

pub(crate) fn demo_schema(path: &str) -> Option<EntitySchema> {
    match path {
        "products" => Some(schema(
            "Products",
            vec![
                (
                    "name",
                    Property::new("Name", DataType::String).with_validation(PropertyValidation {
                        min_length: Some(2),
                        max_length: Some(60),
                        ..required()
                    }),
                ),
                (
                    "price",
                    Property::new("Price", DataType::Number).with_validation(PropertyValidation {
                        min: Some(0.0),
                        ..required()
                    }),
                ),
                ("available", Property::new("Available", DataType::Boolean)),
                (
                    "category",
                    Property::new("Category", DataType::Enum {
                        values: vec!["lighting".into(), "furniture".into(), "decor".into()],
                    }),
                ),
                (
                    "tags",
                    Property::new("Tags", DataType::Array {
                        of: Box::new(Property::new("Tag", DataType::String).with_validation(
                            PropertyValidation {
                                min_length: Some(2),
                                ..Default::default()
                            },
                        )),
                    }),
                ),
            ],
        )),
        "articles" => Some(schema(
            "Articles",
            vec![
                ("title", Property::new("Title", DataType::String).with_validation(required())),
                (
                    "status",
                    Property::new("Status", DataType::Enum {
                        values: vec!["draft".into(), "published".into()],
                    })
                    .with_validation(required()),
                ),
                (
                    "body",
                    Property::new("Body", DataType::String).with_hint(RenderHint::Markdown),
                ),
                (
                    "meta",
                    Property::new("Meta", DataType::Map {
                        properties: BTreeMap::from([
                            ("author".to_string(), Property::new("Author", DataType::String)),
                            (
                                "reading_minutes".to_string(),
                                Property::new("Reading minutes", DataType::Number).with_validation(
                                    PropertyValidation {
                                        min: Some(1.0),
                                        ..Default::default()
                                    },
                                ),
                            ),
                        ]),
                    }),
                ),
            ],
        )),
        _ => None,
    }
}

fn values(v: serde_json::Value) -> EntityValues {
    match v {
        serde_json::Value::Object(map) => map,
        _ => EntityValues::new(),
    }
}

fn seed_entities(path: &str) -> Vec<Entity> {
    let rows = match path {
        "products" => vec![
            ("p1", json!({"name": "Desk lamp", "price": 39, "available": true, "category": "lighting", "tags": ["desk", "led"]})),
            ("p2", json!({"name": "Oak table", "price": 420, "available": false, "category": "furniture", "tags": ["oak"]})),
            ("p3", json!({"name": "Vase", "price": 18.5, "available": true, "category": "decor", "tags": []})),
        ],
        "articles" => vec![
            ("a1", json!({"title": "Spring catalogue", "status": "published", "body": "# New in\n\nLamps.", "meta": {"author": "Ana", "reading_minutes": 3}})),
            ("a2", json!({"title": "Care guide", "status": "draft", "body": "", "meta": {"author": "Jo"}})),
        ],
        _ => vec![],
    };
    rows.into_iter()
        .map(|(id, v)| Entity::new(path, id, values(v)))
        .collect()
}

/// Fill empty demo collections so a fresh browser has something to edit.
pub(crate) fn seed_store(store: &MemoryEntityStore) {
    for path in COLLECTIONS {
        if store.has_collection(path) {
            continue;
        }
        log::info!("seeding {path}");
        for entity in seed_entities(path) {
            store.insert(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_values;

    #[test]
    fn every_collection_has_a_schema() {
        for path in COLLECTIONS {
            assert!(demo_schema(path).is_some(), "{path}");
        }
        assert!(demo_schema("nope").is_none());
    }

    #[test]
    fn seed_data_is_valid() {
        for path in COLLECTIONS {
            let schema = demo_schema(path).expect("schema");
            for entity in seed_entities(path) {
                let errors = validate_values(&schema, &entity.values);
                assert!(errors.is_empty(), "{path}/{}: {errors:?}", entity.id);
            }
        }
    }

    #[test]
    fn seeding_skips_existing_collections() {
        let store = MemoryEntityStore::new();
        store.insert(Entity::new("products", "mine", EntityValues::new()));
        seed_store(&store);
        assert_eq!(store.collection("products").len(), 1);
        assert_eq!(store.collection("articles").len(), 2);
    }

    #[test]
    fn column_order_follows_declaration() {
        let schema = demo_schema("products").expect("schema");
        assert_eq!(schema.ordered_keys()[..2], ["name".to_string(), "price".to_string()]);
    }
}
