//! Prop pipeline tests against a JSON-loaded definition
//!
//! Covers validate → normalize → serialize as a child would observe it,
//! and decoding the query string back on the child side.

use serde_json::{json, Value};
use zos_embed::{
    decode_query, ComponentDefinition, EmbedError, NormalizedValue, PropValue, Props, PropsManager,
};

const CHECKOUT_JSON: &str = r#"{
    "tag": "checkout",
    "url": "https://pay.example/checkout",
    "dimensions": { "width": 500, "height": 640 },
    "contexts": ["iframe", "popup"],
    "defaultContext": "popup",
    "props": {
        "merchant": { "type": "string" },
        "amount": { "type": "number" },
        "express": { "type": "boolean", "required": false },
        "cart": { "type": "object", "required": false },
        "note": { "type": "string", "required": false },
        "onPaid": { "type": "function", "required": false }
    }
}"#;

fn manager() -> PropsManager {
    PropsManager::new(ComponentDefinition::from_json(CHECKOUT_JSON).unwrap().props)
}

fn props(pairs: Vec<(&str, PropValue)>) -> Props {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn order() -> Props {
    props(vec![
        ("merchant", "Tea & Co".into()),
        ("amount", PropValue::from(1250)),
        ("express", true.into()),
        ("cart", json!({ "items": [{ "sku": "t-1", "qty": 2 }] }).into()),
        ("onPaid", PropValue::function(|_| Ok(Value::Null))),
    ])
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_query_follows_schema_order() {
    let prepared = manager().prepare(order()).unwrap();
    assert_eq!(
        prepared.query,
        "merchant=Tea%20%26%20Co&amount=1250&express=1&cart=%7B%22items%22%3A%5B%7B%22qty%22%3A2%2C%22sku%22%3A%22t-1%22%7D%5D%7D"
    );
    assert!(prepared.raw.contains_key("onPaid"));
}

#[test]
fn test_normalized_keys_exclude_functions() {
    let normalized = manager().prepare(order()).unwrap().normalized;
    let keys: Vec<&str> = normalized.keys().collect();
    assert_eq!(keys, vec!["merchant", "amount", "express", "cart", "note"]);
    assert_eq!(normalized.get("note"), Some(&NormalizedValue::Text(String::new())));
}

#[test]
fn test_falsy_props_omitted_from_query() {
    let raw = props(vec![
        ("merchant", "m".into()),
        ("amount", PropValue::from(0)),
        ("express", false.into()),
        ("note", "".into()),
    ]);
    assert_eq!(manager().prepare(raw).unwrap().query, "merchant=m");
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_missing_required_number_rejected() {
    let raw = props(vec![("merchant", "m".into())]);
    let err = manager().prepare(raw).unwrap_err();
    assert_eq!(err, EmbedError::prop("amount", "is required"));
}

#[test]
fn test_wrong_type_rejected() {
    let raw = props(vec![
        ("merchant", "m".into()),
        ("amount", PropValue::from(5)),
        ("onPaid", "not callable".into()),
    ]);
    let err = manager().prepare(raw).unwrap_err();
    assert_eq!(err.prop_key(), Some("onPaid"));
}

// =============================================================================
// Normalization Properties
// =============================================================================

#[test]
fn test_normalize_is_idempotent() {
    let manager = manager();
    for raw in [
        order(),
        props(vec![("merchant", "m".into()), ("amount", "42".into()), ("note", "n".into())]),
        props(vec![
            ("merchant", "m".into()),
            ("amount", PropValue::from(-7)),
            ("express", "".into()),
        ]),
    ] {
        let once = manager.normalize(&raw);
        let twice = manager.normalize(&once.to_props());
        assert_eq!(once, twice);
    }
}

#[test]
fn test_child_decodes_what_parent_sent() {
    let definition = ComponentDefinition::from_json(CHECKOUT_JSON).unwrap();
    let manager = manager();
    for raw in [
        order(),
        props(vec![("merchant", "ü/?=&".into()), ("amount", PropValue::from(-3))]),
    ] {
        let prepared = manager.prepare(raw).unwrap();
        let decoded = decode_query(&definition.props, &format!("?{}", prepared.query)).unwrap();
        assert_eq!(decoded, prepared.normalized);
        assert_eq!(manager.decode(&prepared.query).unwrap(), prepared.normalized);
    }
}

#[test]
fn test_updated_props_merge_over_current() {
    let manager = manager();
    let current = manager.prepare(order()).unwrap().raw;
    let merged = PropsManager::merge(&current, props(vec![("amount", PropValue::from(99))]));

    let prepared = manager.prepare(merged).unwrap();
    assert_eq!(prepared.normalized.get("amount"), Some(&NormalizedValue::Int(99)));
    assert_eq!(
        prepared.normalized.get("merchant"),
        Some(&NormalizedValue::Text("Tea & Co".into()))
    );
    assert!(prepared.raw.contains_key("onPaid"));
}
