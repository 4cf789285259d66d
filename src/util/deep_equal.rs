use crate::models::EntityValues;
use serde_json::Value;

/// Structural equality used for change detection.
///
/// Object keys compare order-insensitively and recurse; arrays compare element-wise in
/// order; numbers compare by value, so `1` and `1.0` are equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => map_equal(x, y),
        _ => false,
    }
}

pub fn map_equal(a: &EntityValues, b: &EntityValues) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
}

/// True when `pending` would change what is known about the record.
pub fn snapshot_differs(known: Option<&EntityValues>, pending: &EntityValues) -> bool {
    match known {
        Some(known) => !map_equal(known, pending),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> EntityValues {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = obj(json!({"name": "Lamp", "price": 12, "tags": ["x"]}));
        let b = obj(json!({"tags": ["x"], "price": 12, "name": "Lamp"}));
        assert!(map_equal(&a, &b));
    }

    #[test]
    fn nested_maps_recurse() {
        let a = obj(json!({"meta": {"a": 1, "b": {"c": true}}}));
        let b = obj(json!({"meta": {"b": {"c": true}, "a": 1}}));
        let c = obj(json!({"meta": {"b": {"c": false}, "a": 1}}));
        assert!(map_equal(&a, &b));
        assert!(!map_equal(&a, &c));
    }

    #[test]
    fn array_order_matters() {
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(values_equal(&json!([1, 2]), &json!([1, 2])));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!(1.5)));
        assert!(!values_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn missing_key_differs_from_null() {
        let a = obj(json!({"a": null}));
        let b = obj(json!({}));
        assert!(!map_equal(&a, &b));
        assert!(snapshot_differs(Some(&a), &b));
        assert!(snapshot_differs(None, &b));
    }
}
