//! Raw and normalized prop values

use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Function prop: invoked by the child through PROP_CALLBACK.
pub type PropFn = Rc<dyn Fn(&[Value]) -> Result<Value, String>>;

/// Raw props as supplied by the host page.
pub type Props = BTreeMap<String, PropValue>;

/// A raw (pre-normalization) prop value.
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Structured data (objects, arrays, nested values)
    Json(Value),
    Function(PropFn),
}

impl PropValue {
    /// Wrap a closure as a function prop.
    pub fn function(f: impl Fn(&[Value]) -> Result<Value, String> + 'static) -> Self {
        PropValue::Function(Rc::new(f))
    }

    /// Truthiness as seen by the child: `false`, `0`, `NaN`, `""` and null
    /// are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(b) => *b,
            PropValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropValue::String(s) => !s.is_empty(),
            PropValue::Json(value) => json_truthy(value),
            PropValue::Function(_) => true,
        }
    }

    /// Null or the empty string (counts as absent for required props).
    pub fn is_blank(&self) -> bool {
        match self {
            PropValue::Null | PropValue::Json(Value::Null) => true,
            PropValue::String(s) => s.is_empty(),
            PropValue::Json(Value::String(s)) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_function(&self) -> Option<&PropFn> {
        match self {
            PropValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            PropValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// JSON form of the value; functions have none.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            PropValue::Null => Some(Value::Null),
            PropValue::Bool(b) => Some(Value::Bool(*b)),
            PropValue::Number(n) => Some(
                serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            ),
            PropValue::String(s) => Some(Value::String(s.clone())),
            PropValue::Json(value) => Some(value.clone()),
            PropValue::Function(_) => None,
        }
    }

    /// Leading-integer parse: optional whitespace and sign followed by
    /// decimal digits; trailing garbage is ignored. Numbers truncate toward
    /// zero. Returns None when no integer can be read.
    pub fn parse_int(&self) -> Option<i64> {
        match self {
            PropValue::Number(n) => truncate(*n),
            PropValue::String(s) => parse_int_str(s),
            PropValue::Json(Value::Number(n)) => {
                n.as_i64().or_else(|| n.as_f64().and_then(truncate))
            }
            PropValue::Json(Value::String(s)) => parse_int_str(s),
            _ => None,
        }
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truncate(n: f64) -> Option<i64> {
    if n.is_finite() {
        Some(n.trunc() as i64)
    } else {
        None
    }
}

fn parse_int_str(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let magnitude = rest[..digits_end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("Null"),
            PropValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            PropValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            PropValue::String(s) => f.debug_tuple("String").field(s).finish(),
            PropValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
            PropValue::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::String(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::String(s)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        PropValue::Number(n as f64)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        PropValue::Number(n as f64)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        PropValue::Number(n)
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Json(value)
    }
}

/// A prop coerced into its wire-safe representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedValue {
    Bool(bool),
    Int(i64),
    Text(String),
    /// Serialized JSON text; None when the prop was absent
    Object(Option<String>),
}

impl NormalizedValue {
    /// Falsy values are dropped from the query string.
    pub fn is_truthy(&self) -> bool {
        match self {
            NormalizedValue::Bool(b) => *b,
            NormalizedValue::Int(n) => *n != 0,
            NormalizedValue::Text(s) => !s.is_empty(),
            NormalizedValue::Object(text) => text.as_deref().is_some_and(|t| !t.is_empty()),
        }
    }

    /// Plain text form used in the query string.
    pub fn to_text(&self) -> String {
        match self {
            NormalizedValue::Bool(b) => b.to_string(),
            NormalizedValue::Int(n) => n.to_string(),
            NormalizedValue::Text(s) => s.clone(),
            NormalizedValue::Object(text) => text.clone().unwrap_or_default(),
        }
    }

    /// Convert back to a raw value that normalizes to `self` again.
    pub fn to_prop_value(&self) -> PropValue {
        match self {
            NormalizedValue::Bool(b) => PropValue::Bool(*b),
            NormalizedValue::Int(n) => PropValue::Json(Value::Number((*n).into())),
            NormalizedValue::Text(s) => PropValue::String(s.clone()),
            NormalizedValue::Object(None) => PropValue::Null,
            NormalizedValue::Object(Some(text)) => serde_json::from_str(text)
                .map(PropValue::Json)
                .unwrap_or_else(|_| PropValue::String(text.clone())),
        }
    }
}

impl Serialize for NormalizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NormalizedValue::Bool(b) => serializer.serialize_bool(*b),
            NormalizedValue::Int(n) => serializer.serialize_i64(*n),
            NormalizedValue::Text(s) => serializer.serialize_str(s),
            NormalizedValue::Object(Some(text)) => serializer.serialize_str(text),
            NormalizedValue::Object(None) => serializer.serialize_none(),
        }
    }
}

/// Normalized props in schema order.
///
/// Keys are exactly the schema keys minus function-typed entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedProps {
    entries: Vec<(String, NormalizedValue)>,
}

impl NormalizedProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: impl Into<String>, value: NormalizedValue) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw props that normalize back to these values.
    pub fn to_props(&self) -> Props {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_prop_value()))
            .collect()
    }

    /// Serialized JSON text, used to detect changes between updates.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for NormalizedProps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
