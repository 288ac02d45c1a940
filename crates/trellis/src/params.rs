//! Declarative control parameters.
//!
//! A control is described by the option it binds to, an optional initial
//! value, and values for its registered properties:
//!
//! ```json
//! {
//!     "name": "colour",
//!     "value": "green",
//!     "label": "Colour",
//!     "options": ["red", "green", "blue"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trellis_core::{PropertySchema, PropertyStore, Result};

use crate::control::check_value_format;

/// Parameters for one control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlParams {
    /// Name of the bound option.
    pub name: String,
    /// Initial logical value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Property values, keyed by property name.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ControlParams {
    /// Parameters for the option `name` with no properties set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            properties: Map::new(),
        }
    }

    /// Set a property value.
    pub fn with(mut self, property: impl Into<String>, value: Value) -> Self {
        self.properties.insert(property.into(), value);
        self
    }

    /// Set the initial logical value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Parse parameters from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build a store over `schema` holding these parameters.
    ///
    /// Property values are applied first, so the initial value is checked
    /// against the configured `format`. Fails with
    /// [`UnregisteredProperty`](trellis_core::TrellisError::UnregisteredProperty)
    /// for a key `schema` does not declare.
    pub fn into_store(self, schema: PropertySchema) -> Result<PropertyStore> {
        let store = PropertyStore::new(schema, self.name);
        store.apply(self.properties)?;
        if let Some(value) = self.value {
            check_value_format(&store, &value)?;
            store.set_value(value);
        }
        Ok(store)
    }
}
