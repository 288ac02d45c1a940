//! Typed property schemas.
//!
//! Every control declares the properties it reads and writes up front as a
//! [`PropertySchema`]. A [`PropertyStore`](crate::PropertyStore) is built
//! from a schema and refuses to touch any name the schema does not declare,
//! so a control wired against the wrong properties fails at construction
//! instead of quietly reading defaults.

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::error::{Result, TrellisError};

/// The value format of a simple property or of a control's logical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueFormat {
    /// Any string.
    #[default]
    String,
    /// Any JSON number.
    Number,
    /// A whole number.
    Integer,
    /// `true` or `false`.
    Bool,
}

impl ValueFormat {
    /// The name used for this format in control parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Bool => "bool",
        }
    }

    /// Parse a format name as written in control parameters.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" | "int" => Some(Self::Integer),
            "bool" | "boolean" => Some(Self::Bool),
            _ => None,
        }
    }

    /// Whether `value` conforms to this format. `null` means "unset" and is
    /// accepted by every format.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Bool, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What sort of value a property holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A list of options: raw labels or `{title, name}` entries.
    OptionList,
    /// A scalar in the given format.
    Simple(ValueFormat),
    /// A tri-state flag: `true`, `false` or unset.
    Flag,
    /// A designated grid cell, `{row, column}`.
    Cell,
}

/// Extra validation applied after the kind's own check.
pub type Validator = fn(&Value) -> std::result::Result<(), String>;

/// A single registered property.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    kind: PropertyKind,
    default: Value,
    validator: Option<Validator>,
}

impl PropertyDescriptor {
    /// Create a descriptor with a `null` default.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Value::Null,
            validator: None,
        }
    }

    /// An option-list property.
    pub fn option_list(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::OptionList)
    }

    /// A simple property in the given format.
    pub fn simple(name: impl Into<String>, format: ValueFormat) -> Self {
        Self::new(name, PropertyKind::Simple(format))
    }

    /// A flag property.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Flag)
    }

    /// A designated-cell property.
    pub fn cell(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Cell)
    }

    /// Set the value returned while the property has not been defined.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Attach an additional validation rule.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property kind.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// The default value.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Check `value` against the kind and the extra validator.
    pub fn validate(&self, value: &Value) -> Result<()> {
        let checked = match self.kind {
            PropertyKind::OptionList => validate_option_list(value),
            PropertyKind::Simple(format) => {
                if format.accepts(value) {
                    Ok(())
                } else {
                    Err(format!("expected a {format} value, got {value}"))
                }
            }
            PropertyKind::Flag => match value {
                Value::Null | Value::Bool(_) => Ok(()),
                other => Err(format!("expected a boolean, got {other}")),
            },
            PropertyKind::Cell => validate_cell(value),
        };

        checked
            .and_then(|()| self.validator.map_or(Ok(()), |validator| validator(value)))
            .map_err(|message| TrellisError::invalid_value(&self.name, message))
    }
}

fn validate_option_list(value: &Value) -> std::result::Result<(), String> {
    let items = match value {
        Value::Null => return Ok(()),
        Value::Array(items) => items,
        other => return Err(format!("expected a list of options, got {other}")),
    };

    if let Some(first) = items.first()
        && items.iter().any(|item| item.is_string() != first.is_string())
    {
        return Err("options mix plain labels and entries".to_string());
    }

    let mut seen = HashSet::new();
    for item in items {
        let name = match item {
            Value::String(name) => name.as_str(),
            Value::Object(entry) => {
                if !entry.get("title").is_some_and(Value::is_string) {
                    return Err(format!("option entry {item} has no string 'title'"));
                }
                match entry.get("name") {
                    Some(Value::String(name)) => name.as_str(),
                    _ => return Err(format!("option entry {item} has no string 'name'")),
                }
            }
            other => return Err(format!("unexpected option {other}")),
        };
        if !seen.insert(name) {
            return Err(format!("duplicate option name '{name}'"));
        }
    }
    Ok(())
}

fn validate_cell(value: &Value) -> std::result::Result<(), String> {
    match value {
        Value::Null => Ok(()),
        Value::Object(cell) => {
            for key in ["row", "column"] {
                if !cell.get(key).is_some_and(Value::is_u64) {
                    return Err(format!("cell needs a non-negative integer '{key}'"));
                }
            }
            Ok(())
        }
        other => Err(format!("expected a cell object, got {other}")),
    }
}

/// The set of properties a control declares.
#[derive(Debug, Clone, Default)]
pub struct PropertySchema {
    descriptors: Vec<PropertyDescriptor>,
}

impl PropertySchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a property. Each name may be registered once.
    pub fn register(&mut self, descriptor: PropertyDescriptor) -> Result<()> {
        if self.contains(descriptor.name()) {
            return Err(TrellisError::duplicate(descriptor.name()));
        }
        descriptor.validate(descriptor.default_value())?;
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, descriptor: PropertyDescriptor) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fail with [`TrellisError::MissingProperty`] unless every name is registered.
    pub fn require(&self, control: &'static str, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.contains(name)) {
            Some(missing) => Err(TrellisError::missing(control, *missing)),
            None => Ok(()),
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no property is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_format_accepts() {
        assert!(ValueFormat::String.accepts(&json!("red")));
        assert!(!ValueFormat::String.accepts(&json!(3)));
        assert!(ValueFormat::Integer.accepts(&json!(3)));
        assert!(!ValueFormat::Integer.accepts(&json!(3.5)));
        assert!(ValueFormat::Number.accepts(&json!(3.5)));
        assert!(ValueFormat::Bool.accepts(&json!(false)));
        assert!(ValueFormat::Bool.accepts(&Value::Null));
    }

    #[test]
    fn test_value_format_parse_round_trips_names() {
        for format in [
            ValueFormat::String,
            ValueFormat::Number,
            ValueFormat::Integer,
            ValueFormat::Bool,
        ] {
            assert_eq!(ValueFormat::parse(format.name()), Some(format));
        }
        assert_eq!(ValueFormat::parse("colour"), None);
    }

    #[test]
    fn test_option_list_validation() {
        let desc = PropertyDescriptor::option_list("options");

        assert!(desc.validate(&Value::Null).is_ok());
        assert!(desc.validate(&json!(["a", "b"])).is_ok());
        assert!(desc
            .validate(&json!([{"title": "A", "name": "a"}, {"title": "A", "name": "b"}]))
            .is_ok());

        assert!(desc.validate(&json!("a")).is_err());
        assert!(desc.validate(&json!(["a", "a"])).is_err());
        assert!(desc.validate(&json!([{"title": "A"}])).is_err());
        assert!(desc.validate(&json!([1, 2])).is_err());
        assert!(desc
            .validate(&json!(["a", {"title": "B", "name": "b"}]))
            .is_err());
    }

    #[test]
    fn test_flag_and_cell_validation() {
        let flag = PropertyDescriptor::flag("enable");
        assert!(flag.validate(&json!(true)).is_ok());
        assert!(flag.validate(&Value::Null).is_ok());
        assert!(flag.validate(&json!("yes")).is_err());

        let cell = PropertyDescriptor::cell("cell");
        assert!(cell.validate(&json!({"row": 0, "column": 1})).is_ok());
        assert!(cell.validate(&json!({"row": 0})).is_err());
        assert!(cell.validate(&json!({"row": -1, "column": 0})).is_err());
    }

    #[test]
    fn test_extra_validator_runs_after_kind_check() {
        fn known_format(value: &Value) -> std::result::Result<(), String> {
            match value.as_str() {
                Some(name) if ValueFormat::parse(name).is_none() => {
                    Err(format!("unknown format '{name}'"))
                }
                _ => Ok(()),
            }
        }

        let desc = PropertyDescriptor::simple("format", ValueFormat::String)
            .with_validator(known_format);
        assert!(desc.validate(&json!("number")).is_ok());

        let err = desc.validate(&json!("colour")).unwrap_err();
        assert_eq!(
            err,
            TrellisError::invalid_value("format", "unknown format 'colour'")
        );
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let mut schema = PropertySchema::new();
        schema
            .register(PropertyDescriptor::option_list("options"))
            .unwrap();

        let err = schema
            .register(PropertyDescriptor::option_list("options"))
            .unwrap_err();
        assert_eq!(err, TrellisError::duplicate("options"));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_schema_rejects_invalid_default() {
        let err = PropertySchema::new()
            .with(PropertyDescriptor::flag("enable").with_default("on"))
            .unwrap_err();
        assert!(matches!(err, TrellisError::InvalidValue { .. }));
    }

    #[test]
    fn test_schema_require() {
        let schema = PropertySchema::new()
            .with(PropertyDescriptor::simple("label", ValueFormat::String))
            .unwrap();

        assert!(schema.require("combobox", &["label"]).is_ok());
        assert_eq!(
            schema.require("combobox", &["label", "options"]),
            Err(TrellisError::missing("combobox", "options"))
        );
    }
}
