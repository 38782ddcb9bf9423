//! Per-type prop handling
//!
//! Each [`PropType`] maps to a [`PropKind`] that knows how to validate,
//! normalize and encode values of that type. New prop types plug in by
//! implementing the trait and extending [`PropType::kind`].

use crate::definition::PropType;
use crate::error::{EmbedError, Result};

use super::value::{NormalizedValue, PropValue};

/// Capability interface for one prop type.
pub trait PropKind: Sync {
    /// Type-specific checks. Presence of required props has already been
    /// verified; `value` is None when the prop is absent.
    fn validate(&self, key: &str, value: Option<&PropValue>) -> Result<()>;

    /// Coerce into the wire-safe form. None means the prop is not
    /// transmitted at all.
    fn normalize(&self, value: Option<&PropValue>) -> Option<NormalizedValue>;

    /// Query-string text for a normalized value. None drops the pair.
    fn encode(&self, value: &NormalizedValue) -> Option<String> {
        value.is_truthy().then(|| value.to_text())
    }
}

struct FunctionKind;
struct StringKind;
struct ObjectKind;
struct NumberKind;
struct BooleanKind;

impl PropType {
    /// Dispatch table entry for this type.
    pub fn kind(self) -> &'static dyn PropKind {
        match self {
            PropType::Function => &FunctionKind,
            PropType::String => &StringKind,
            PropType::Object => &ObjectKind,
            PropType::Number => &NumberKind,
            PropType::Boolean => &BooleanKind,
        }
    }
}

/// Absent or explicitly null.
fn is_unset(value: Option<&PropValue>) -> bool {
    matches!(value, None | Some(PropValue::Null))
}

impl PropKind for FunctionKind {
    fn validate(&self, key: &str, value: Option<&PropValue>) -> Result<()> {
        match value {
            v if is_unset(v) => Ok(()),
            Some(PropValue::Function(_)) => Ok(()),
            _ => Err(EmbedError::prop(key, "is not a function")),
        }
    }

    fn normalize(&self, _value: Option<&PropValue>) -> Option<NormalizedValue> {
        None
    }

    fn encode(&self, _value: &NormalizedValue) -> Option<String> {
        None
    }
}

impl PropKind for StringKind {
    fn validate(&self, key: &str, value: Option<&PropValue>) -> Result<()> {
        if is_unset(value) || value.and_then(PropValue::as_str).is_some() {
            Ok(())
        } else {
            Err(EmbedError::prop(key, "is not of type string"))
        }
    }

    fn normalize(&self, value: Option<&PropValue>) -> Option<NormalizedValue> {
        let text = value.and_then(PropValue::as_str).unwrap_or_default();
        Some(NormalizedValue::Text(text.to_string()))
    }
}

impl PropKind for ObjectKind {
    fn validate(&self, key: &str, value: Option<&PropValue>) -> Result<()> {
        match value {
            Some(v) if v.to_json().is_none() => Err(EmbedError::prop(key, "unable to serialize")),
            _ => Ok(()),
        }
    }

    fn normalize(&self, value: Option<&PropValue>) -> Option<NormalizedValue> {
        let text = value
            .and_then(PropValue::to_json)
            .map(|json| json.to_string());
        Some(NormalizedValue::Object(text))
    }
}

impl PropKind for NumberKind {
    fn validate(&self, key: &str, value: Option<&PropValue>) -> Result<()> {
        match value {
            v if is_unset(v) => Ok(()),
            Some(v) if v.parse_int().is_some() => Ok(()),
            _ => Err(EmbedError::prop(key, "is not a number")),
        }
    }

    fn normalize(&self, value: Option<&PropValue>) -> Option<NormalizedValue> {
        let n = value
            .filter(|v| v.is_truthy())
            .and_then(PropValue::parse_int)
            .unwrap_or(0);
        Some(NormalizedValue::Int(n))
    }
}

impl PropKind for BooleanKind {
    fn validate(&self, _key: &str, _value: Option<&PropValue>) -> Result<()> {
        Ok(())
    }

    fn normalize(&self, value: Option<&PropValue>) -> Option<NormalizedValue> {
        Some(NormalizedValue::Bool(value.is_some_and(PropValue::is_truthy)))
    }

    fn encode(&self, value: &NormalizedValue) -> Option<String> {
        value.is_truthy().then(|| String::from("1"))
    }
}
