//! Component definitions
//!
//! A [`ComponentDefinition`] is the immutable schema of a remotely hosted
//! UI unit: where it lives, how large it is, which contexts it can render
//! in and which props it accepts. Definitions are usually loaded from JSON
//! configuration:
//!
//! ```json
//! {
//!   "tag": "login",
//!   "url": "https://child.example/login",
//!   "dimensions": { "width": 400, "height": 300 },
//!   "contexts": ["popup", "lightbox"],
//!   "defaultContext": "popup",
//!   "props": { "email": { "type": "string", "required": false } }
//! }
//! ```

use core::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EmbedError, Result};

/// Rendering mode for an embedded instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    /// Inline frame attached under a caller-supplied element
    Iframe,
    /// Separate browser window
    Popup,
    /// Frame attached to the document root and positioned over the page
    Lightbox,
}

impl Context {
    /// Wire name of the context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Iframe => "iframe",
            Context::Popup => "popup",
            Context::Lightbox => "lightbox",
        }
    }

    /// Whether the context is backed by a frame element.
    #[inline]
    pub fn is_frame(&self) -> bool {
        matches!(self, Context::Iframe | Context::Lightbox)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared size and optional fixed position of the child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    /// Fixed horizontal position (None = center in viewport)
    #[serde(default)]
    pub x: Option<i32>,
    /// Fixed vertical position (None = center in viewport)
    #[serde(default)]
    pub y: Option<i32>,
}

impl Dimensions {
    /// Dimensions without a fixed position.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: None,
            y: None,
        }
    }

    /// Pin the child to a fixed position.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }
}

/// Declared type of a prop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    Function,
    String,
    Object,
    Number,
    Boolean,
}

fn default_required() -> bool {
    true
}

/// Schema entry for a single prop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropDescriptor {
    #[serde(rename = "type")]
    pub prop_type: PropType,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl PropDescriptor {
    /// A required prop of the given type.
    pub fn required(prop_type: PropType) -> Self {
        Self {
            prop_type,
            required: true,
        }
    }

    /// An optional prop of the given type.
    pub fn optional(prop_type: PropType) -> Self {
        Self {
            prop_type,
            required: false,
        }
    }
}

/// Ordered mapping of prop name to descriptor.
///
/// Declaration order is preserved; it determines the order of pairs in
/// the query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropSchema {
    entries: Vec<(String, PropDescriptor)>,
}

impl PropSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: PropDescriptor) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = descriptor,
            None => self.entries.push((name, descriptor)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropDescriptor> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropDescriptor)> {
        self.entries.iter().map(|(key, descriptor)| (key.as_str(), descriptor))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, PropDescriptor)> for PropSchema {
    fn from_iter<I: IntoIterator<Item = (String, PropDescriptor)>>(iter: I) -> Self {
        let mut schema = PropSchema::new();
        for (name, descriptor) in iter {
            schema.insert(name, descriptor);
        }
        schema
    }
}

impl Serialize for PropSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, descriptor) in &self.entries {
            map.serialize_entry(key, descriptor)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = PropSchema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of prop name to descriptor")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> core::result::Result<PropSchema, A::Error> {
                let mut schema = PropSchema::new();
                while let Some((key, descriptor)) = access.next_entry::<String, PropDescriptor>()? {
                    schema.insert(key, descriptor);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

/// Immutable schema of an embeddable component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    /// Unique tag naming the component
    pub tag: String,
    /// Base URL of the child (props are appended as a query string)
    pub url: String,
    pub dimensions: Dimensions,
    /// Supported rendering contexts
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub default_context: Option<Context>,
    /// At most one active instance at a time
    #[serde(default)]
    pub singleton: bool,
    #[serde(default)]
    pub props: PropSchema,
}

impl ComponentDefinition {
    /// Create a definition with no contexts and no props.
    pub fn new(tag: impl Into<String>, url: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            tag: tag.into(),
            url: url.into(),
            dimensions,
            contexts: Vec::new(),
            default_context: None,
            singleton: false,
            props: PropSchema::new(),
        }
    }

    /// Load and validate a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: ComponentDefinition = serde_json::from_str(json)
            .map_err(|e| EmbedError::validation(format!("invalid component definition: {}", e)))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Add a supported context.
    pub fn with_context(mut self, context: Context) -> Self {
        if !self.contexts.contains(&context) {
            self.contexts.push(context);
        }
        self
    }

    /// Set the context attempted first when no container is given.
    pub fn with_default_context(mut self, context: Context) -> Self {
        self.default_context = Some(context);
        self
    }

    /// Restrict the definition to one active instance.
    pub fn as_singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Declare a prop.
    pub fn with_prop(mut self, name: impl Into<String>, descriptor: PropDescriptor) -> Self {
        self.props.insert(name, descriptor);
        self
    }

    /// Check if the definition can render in `context`.
    #[inline]
    pub fn supports(&self, context: Context) -> bool {
        self.contexts.contains(&context)
    }

    /// Check the definition is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.tag.trim().is_empty() {
            return Err(EmbedError::validation("component tag must not be empty"));
        }
        if self.url.trim().is_empty() {
            return Err(EmbedError::validation(format!("component {} has no url", self.tag)));
        }
        if self.dimensions.width == 0 || self.dimensions.height == 0 {
            return Err(EmbedError::validation(format!(
                "component {} must declare non-zero dimensions",
                self.tag
            )));
        }
        if self.contexts.is_empty() {
            return Err(EmbedError::validation(format!(
                "component {} supports no contexts",
                self.tag
            )));
        }
        if let Some(default) = self.default_context {
            if !self.supports(default) {
                return Err(EmbedError::validation(format!(
                    "default context {} is not supported by {}",
                    default, self.tag
                )));
            }
        }
        Ok(())
    }
}
