//! Provider configuration and its schema.
//!
//! The schema and the decoder are both driven by [`CONFIG_FIELDS`], so the
//! advertised attributes and the accepted payload cannot drift apart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::ConfigError;
use super::protocol::{Schema, SchemaAttribute};
use crate::wire::{DynamicValue, Type, Value};

/// Configuration of the provider block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Script source text.
    pub js: String,

    /// Compile the script in strict mode (default: true).
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            js: String::new(),
            strict: default_strict(),
        }
    }
}

/// Primitive kind of a configuration attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String attribute.
    String,
    /// Boolean attribute.
    Bool,
}

impl FieldKind {
    /// Wire type of the attribute.
    pub fn ty(self) -> Type {
        match self {
            FieldKind::String => Type::String,
            FieldKind::Bool => Type::Bool,
        }
    }
}

/// Declaration of one configuration attribute.
#[derive(Debug, Clone, Copy)]
pub struct ConfigField {
    /// Attribute name.
    pub name: &'static str,
    /// Attribute kind.
    pub kind: FieldKind,
    /// Whether the attribute must be set.
    pub required: bool,
    /// Description shown to users.
    pub description: &'static str,
}

/// Attributes of the provider block.
pub const CONFIG_FIELDS: &[ConfigField] = &[
    ConfigField {
        name: "js",
        kind: FieldKind::String,
        required: true,
        description: "Script source whose uppercase-initial functions are exposed",
    },
    ConfigField {
        name: "strict",
        kind: FieldKind::Bool,
        required: false,
        description: "Reject use of undeclared variables at compile time (default true)",
    },
];

impl ProviderConfig {
    /// Create a configuration for `js` with default options.
    pub fn new(js: impl Into<String>) -> Self {
        Self {
            js: js.into(),
            ..Self::default()
        }
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema {
            version: 0,
            attributes: CONFIG_FIELDS
                .iter()
                .map(|field| SchemaAttribute {
                    name: field.name.to_string(),
                    ty: field.kind.ty(),
                    required: field.required,
                    optional: !field.required,
                    description: field.description.to_string(),
                })
                .collect(),
        }
    }

    /// Object type the configuration payload is decoded against.
    pub fn object_type() -> Type {
        Type::object(CONFIG_FIELDS.iter().map(|field| (field.name, field.kind.ty())))
    }

    /// Decode a configuration payload.
    ///
    /// The payload is decoded against [`Self::object_type`], so attribute
    /// shapes are already checked once this sees them.
    pub fn from_dynamic(payload: &DynamicValue) -> Result<Self, ConfigError> {
        let mut attributes = match payload.unmarshal(&Self::object_type())? {
            Value::Record(attributes) => attributes,
            _ => BTreeMap::new(),
        };

        let missing = CONFIG_FIELDS.iter().find(|field| {
            field.required && attributes.get(field.name).is_none_or(Value::is_null)
        });
        if let Some(field) = missing {
            return Err(ConfigError::MissingRequired(field.name.to_string()));
        }

        let mut config = Self::default();
        if let Some(Value::String(js)) = attributes.remove("js") {
            config.js = js;
        }
        if let Some(Value::Bool(strict)) = attributes.remove("strict") {
            config.strict = strict;
        }
        Ok(config)
    }

    /// Encode this configuration as a wire value.
    pub fn to_value(&self) -> Value {
        Value::record([
            ("js", Value::from(self.js.as_str())),
            ("strict", Value::from(self.strict)),
        ])
    }
}
