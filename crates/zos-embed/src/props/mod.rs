//! Prop validation, normalization and serialization
//!
//! Raw props supplied by the host page go through three stages before
//! reaching the child:
//!
//! 1. `validate` - schema checks (required, per-type)
//! 2. `normalize` - coercion into [`NormalizedProps`]; function props are
//!    dropped here and only reachable through PROP_CALLBACK
//! 3. `serialize` - percent-encoded query string appended to the child URL

mod kind;
mod query;
mod value;

pub use kind::PropKind;
pub use query::decode_query;
pub use value::{NormalizedProps, NormalizedValue, PropFn, PropValue, Props};

use crate::definition::PropSchema;
use crate::error::{EmbedError, Result};

/// Props after all three stages.
#[derive(Clone, Debug)]
pub struct PreparedProps {
    pub raw: Props,
    pub normalized: NormalizedProps,
    pub query: String,
}

/// Applies a definition's prop schema.
#[derive(Clone, Debug)]
pub struct PropsManager {
    schema: PropSchema,
}

impl PropsManager {
    pub fn new(schema: PropSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &PropSchema {
        &self.schema
    }

    /// Check `props` against the schema.
    pub fn validate(&self, props: &Props) -> Result<()> {
        for (key, descriptor) in self.schema.iter() {
            let value = props.get(key);

            if descriptor.required && value.map_or(true, PropValue::is_blank) {
                return Err(EmbedError::prop(key, "is required"));
            }

            descriptor.prop_type.kind().validate(key, value)?;
        }
        Ok(())
    }

    /// Coerce `props` into their wire-safe form, in schema order.
    pub fn normalize(&self, props: &Props) -> NormalizedProps {
        let mut normalized = NormalizedProps::new();
        for (key, descriptor) in self.schema.iter() {
            if let Some(value) = descriptor.prop_type.kind().normalize(props.get(key)) {
                normalized.push(key, value);
            }
        }
        normalized
    }

    /// Build the query string for normalized props.
    ///
    /// Falsy entries are omitted; keys and values are percent-encoded.
    pub fn serialize(&self, normalized: &NormalizedProps) -> String {
        normalized
            .iter()
            .filter_map(|(key, value)| {
                let kind = self.schema.get(key)?.prop_type.kind();
                let text = kind.encode(value)?;
                Some(format!("{}={}", urlencoding::encode(key), urlencoding::encode(&text)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Run all three stages.
    pub fn prepare(&self, props: Props) -> Result<PreparedProps> {
        self.validate(&props)?;
        let normalized = self.normalize(&props);
        let query = self.serialize(&normalized);
        Ok(PreparedProps {
            raw: props,
            normalized,
            query,
        })
    }

    /// Shallow merge of `partial` over `current`.
    pub fn merge(current: &Props, partial: Props) -> Props {
        let mut merged = current.clone();
        merged.extend(partial);
        merged
    }
}

/// Child URL for a base URL and query string.
pub fn child_url(base: &str, query: &str) -> String {
    if query.is_empty() {
        return base.to_string();
    }
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, query)
}
