//! Per-control property store.
//!
//! A [`PropertyStore`] holds the configuration properties of one control
//! instance together with the control's logical value, the option it is
//! bound to. Both are JSON values checked against the store's
//! [`PropertySchema`]. Writes that change something are announced on the
//! [`changed`](PropertyStore::changed) signal as a [`StoreEvent`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_core::{PropertyDescriptor, PropertySchema, PropertyStore, ValueFormat};
//!
//! let schema = PropertySchema::new()
//!     .with(PropertyDescriptor::simple("label", ValueFormat::String))?;
//! let store = PropertyStore::new(schema, "colour");
//!
//! store.set("label", json!("Colour"))?;
//! assert_eq!(store.get("label")?, json!("Colour"));
//! assert!(store.get("missing").is_err());
//! # Ok::<(), trellis_core::TrellisError>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{Result, TrellisError};
use crate::logging::targets;
use crate::schema::{PropertyDescriptor, PropertySchema};
use crate::signal::Signal;

/// A change announced by a [`PropertyStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A registered property changed.
    PropertyChanged {
        /// The property name.
        name: String,
    },
    /// The logical value changed. `key` addresses the changed part of a
    /// compound value and is empty when the whole value was replaced.
    OptionValueChanged {
        /// Path to the changed part of the value.
        key: Vec<String>,
        /// The new value at `key`.
        data: Value,
    },
}

/// Property values and the logical value of one control.
///
/// Reads and writes are synchronous and last-write-wins. The internal locks
/// are released before [`StoreEvent`]s are emitted, so slots may read the
/// store freely.
pub struct PropertyStore {
    schema: PropertySchema,
    values: RwLock<HashMap<String, Value>>,
    option_name: String,
    option_value: RwLock<Value>,
    changed: Arc<Signal<StoreEvent>>,
}

impl PropertyStore {
    /// Create a store for `schema`, bound to the option called `option_name`.
    pub fn new(schema: PropertySchema, option_name: impl Into<String>) -> Self {
        Self {
            schema,
            values: RwLock::new(HashMap::new()),
            option_name: option_name.into(),
            option_value: RwLock::new(Value::Null),
            changed: Arc::new(Signal::new()),
        }
    }

    /// The schema this store was built from.
    pub fn schema(&self) -> &PropertySchema {
        &self.schema
    }

    /// The change signal.
    pub fn changed(&self) -> &Arc<Signal<StoreEvent>> {
        &self.changed
    }

    fn descriptor(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.schema
            .get(name)
            .ok_or_else(|| TrellisError::unregistered(name))
    }

    /// Current value of `name`, or its default when not defined.
    pub fn get(&self, name: &str) -> Result<Value> {
        let descriptor = self.descriptor(name)?;
        Ok(self
            .values
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| descriptor.default_value().clone()))
    }

    /// Whether `name` has been given a value, as opposed to using its default.
    pub fn is_defined(&self, name: &str) -> Result<bool> {
        self.descriptor(name)?;
        Ok(self.values.read().contains_key(name))
    }

    /// Set `name`, announcing the change.
    ///
    /// Returns `Ok(false)` and emits nothing when the value is unchanged.
    #[tracing::instrument(skip(self, value), target = "trellis_core::store", level = "trace")]
    pub fn set(&self, name: &str, value: Value) -> Result<bool> {
        if !self.write(name, value)? {
            return Ok(false);
        }
        tracing::debug!(target: targets::STORE, property = name, "property changed");
        self.changed.emit(StoreEvent::PropertyChanged {
            name: name.to_string(),
        });
        Ok(true)
    }

    /// Set `name` without announcing the change.
    ///
    /// Used for construction-time parameters and for rewriting a value into
    /// an equivalent canonical form.
    pub fn set_silent(&self, name: &str, value: Value) -> Result<()> {
        self.write(name, value).map(|_| ())
    }

    fn write(&self, name: &str, value: Value) -> Result<bool> {
        self.descriptor(name)?.validate(&value)?;
        let mut values = self.values.write();
        if values.get(name) == Some(&value) {
            return Ok(false);
        }
        values.insert(name.to_string(), value);
        Ok(true)
    }

    /// Apply a parameter map silently. Fails on the first unregistered or
    /// invalid entry; entries before it stay applied.
    pub fn apply(&self, params: Map<String, Value>) -> Result<()> {
        for (name, value) in params {
            self.set_silent(&name, value)?;
        }
        Ok(())
    }

    /// The name of the option this store is bound to.
    pub fn option_name(&self) -> &str {
        &self.option_name
    }

    /// The current logical value.
    pub fn value(&self) -> Value {
        self.option_value.read().clone()
    }

    /// Replace the logical value, announcing the change.
    ///
    /// Returns `false` and emits nothing when the value is unchanged.
    pub fn set_value(&self, value: Value) -> bool {
        {
            let mut current = self.option_value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        tracing::debug!(target: targets::STORE, option = %self.option_name, %value, "option value changed");
        self.changed.emit(StoreEvent::OptionValueChanged {
            key: Vec::new(),
            data: value,
        });
        true
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("option_name", &self.option_name)
            .field("values", &*self.values.read())
            .field("option_value", &*self.option_value.read())
            .finish()
    }
}

static_assertions::assert_impl_all!(PropertyStore: Send, Sync);
