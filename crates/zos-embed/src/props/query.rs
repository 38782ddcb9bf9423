//! Child-side query decoding
//!
//! The inverse of [`PropsManager::serialize`]: a child reads its initial
//! props back out of the URL it was loaded from. Pairs dropped for being
//! falsy decode to the same defaults normalization produces, so decoding
//! a serialized set yields the normalized set it came from.

use std::collections::BTreeMap;

use crate::definition::{PropSchema, PropType};
use crate::error::{EmbedError, Result};

use super::value::{NormalizedProps, NormalizedValue};
use super::PropsManager;

impl PropsManager {
    /// Decode a query string produced by [`PropsManager::serialize`].
    pub fn decode(&self, query: &str) -> Result<NormalizedProps> {
        decode_query(self.schema(), query)
    }
}

/// Decode `query` against `schema` into normalized props.
///
/// Unknown keys are ignored. A leading `?` is accepted.
pub fn decode_query(schema: &PropSchema, query: &str) -> Result<NormalizedProps> {
    let pairs = parse_pairs(query)?;
    let mut props = NormalizedProps::new();

    for (key, descriptor) in schema.iter() {
        let raw = pairs.get(key).map(String::as_str);
        let value = match descriptor.prop_type {
            PropType::Function => continue,
            PropType::String => NormalizedValue::Text(raw.unwrap_or_default().to_string()),
            PropType::Boolean => NormalizedValue::Bool(raw.is_some_and(|v| !v.is_empty())),
            PropType::Object => NormalizedValue::Object(raw.map(str::to_string)),
            PropType::Number => match raw {
                None => NormalizedValue::Int(0),
                Some(text) => NormalizedValue::Int(text.parse().map_err(|_| {
                    EmbedError::prop(key, format!("`{}` is not an integer", text))
                })?),
            },
        };
        props.push(key, value);
    }
    Ok(props)
}

fn parse_pairs(query: &str) -> Result<BTreeMap<String, String>> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut pairs = BTreeMap::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        pairs.insert(unescape(key)?, unescape(value)?);
    }
    Ok(pairs)
}

fn unescape(text: &str) -> Result<String> {
    urlencoding::decode(text)
        .map(|s| s.into_owned())
        .map_err(|e| EmbedError::validation(format!("malformed query component `{}`: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PropDescriptor;
    use crate::props::{PropValue, Props};
    use serde_json::{json, Value};

    fn manager() -> PropsManager {
        PropsManager::new(
            [
                ("title".to_string(), PropDescriptor::optional(PropType::String)),
                ("limit".to_string(), PropDescriptor::optional(PropType::Number)),
                ("compact".to_string(), PropDescriptor::optional(PropType::Boolean)),
                ("theme".to_string(), PropDescriptor::optional(PropType::Object)),
                ("onPick".to_string(), PropDescriptor::optional(PropType::Function)),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn roundtrip(raw: Props) -> (NormalizedProps, NormalizedProps) {
        let manager = manager();
        let prepared = manager.prepare(raw).unwrap();
        let decoded = manager.decode(&prepared.query).unwrap();
        (prepared.normalized, decoded)
    }

    #[test]
    fn test_decode_reproduces_normalized_props() {
        let raw: Props = [
            ("title".to_string(), PropValue::from("hello & goodbye")),
            ("limit".to_string(), PropValue::from(-25)),
            ("compact".to_string(), PropValue::from(true)),
            ("onPick".to_string(), PropValue::function(|_| Ok(Value::Null))),
        ]
        .into_iter()
        .collect();
        let (normalized, decoded) = roundtrip(raw);
        assert_eq!(normalized, decoded);
    }

    #[test]
    fn test_decode_defaults_for_dropped_pairs() {
        let (normalized, decoded) = roundtrip(Props::new());
        assert_eq!(normalized, decoded);
        assert_eq!(decoded.get("limit"), Some(&NormalizedValue::Int(0)));
        assert_eq!(decoded.get("compact"), Some(&NormalizedValue::Bool(false)));
        assert_eq!(decoded.get("theme"), Some(&NormalizedValue::Object(None)));
        assert_eq!(decoded.get("onPick"), None);
    }

    #[test]
    fn test_decode_object_structurally_equal() {
        let theme = json!({"palette": {"fg": "#fff", "bg": "#000"}, "sizes": [1, 2, 3]});
        let raw: Props = [("theme".to_string(), PropValue::from(theme.clone()))]
            .into_iter()
            .collect();
        let (_, decoded) = roundtrip(raw);
        let text = match decoded.get("theme") {
            Some(NormalizedValue::Object(Some(text))) => text.clone(),
            other => panic!("unexpected theme: {:?}", other),
        };
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, theme);
    }

    #[test]
    fn test_decode_accepts_leading_question_mark() {
        let decoded = manager().decode("?title=a%20b&compact=1").unwrap();
        assert_eq!(decoded.get("title"), Some(&NormalizedValue::Text("a b".into())));
        assert_eq!(decoded.get("compact"), Some(&NormalizedValue::Bool(true)));
    }

    #[test]
    fn test_decode_rejects_non_integer_number() {
        let err = manager().decode("limit=ten").unwrap_err();
        assert_eq!(err.prop_key(), Some("limit"));
    }
}
