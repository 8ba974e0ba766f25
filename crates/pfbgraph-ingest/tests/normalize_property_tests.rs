use pfbgraph_ingest::normalize::{normalize, Normalizer};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Trees without union wrappers: object keys never collide with a tag.
fn plain_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("f_[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Wraps every string directly held by an object in `{"string": ...}`, the
/// way an optional string field is encoded. Arrays are left alone.
fn wrap_strings(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(_) => {
                            let mut wrapper = Map::new();
                            wrapper.insert("string".to_string(), v.clone());
                            Value::Object(wrapper)
                        }
                        other => wrap_strings(other),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

proptest! {
    #[test]
    fn normalizing_plain_trees_is_identity(v in plain_value()) {
        prop_assert_eq!(normalize(v.clone()), v);
    }

    #[test]
    fn normalize_is_idempotent_on_wrapped_trees(v in plain_value()) {
        let once = normalize(wrap_strings(&v));
        prop_assert_eq!(normalize(once.clone()), once);
    }

    #[test]
    fn wrapped_object_fields_unwrap_to_original(v in plain_value()) {
        prop_assert_eq!(normalize(wrap_strings(&v)), v);
    }

    #[test]
    fn sequence_descent_is_identity_on_plain_trees(v in plain_value()) {
        let n = Normalizer::default().descend_sequences(true);
        prop_assert_eq!(n.normalize(v.clone()), v);
    }
}
