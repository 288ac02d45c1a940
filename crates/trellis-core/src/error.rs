//! Error types for Trellis.

/// Result type alias for Trellis operations.
pub type Result<T> = std::result::Result<T, TrellisError>;

/// Errors raised by the property store and the control contract.
///
/// None of these come from I/O. They signal either bad data written into a
/// store or a control that was constructed against the wrong schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrellisError {
    /// A property was read or written without being registered first.
    #[error("Property '{name}' is not registered")]
    UnregisteredProperty { name: String },

    /// A property name was registered twice on the same schema.
    #[error("Property '{name}' is already registered")]
    DuplicateProperty { name: String },

    /// A control requires a property the store's schema does not declare.
    #[error("Control '{control}' requires property '{name}'")]
    MissingProperty { control: &'static str, name: String },

    /// A value was rejected by the property's validation rule.
    #[error("Invalid value for property '{property}': {message}")]
    InvalidValue { property: String, message: String },

    /// Control parameters could not be parsed.
    #[error("Failed to parse control parameters: {message}")]
    Params { message: String },
}

impl TrellisError {
    /// Create an unregistered-property error.
    pub fn unregistered(name: impl Into<String>) -> Self {
        Self::UnregisteredProperty { name: name.into() }
    }

    /// Create a duplicate-registration error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateProperty { name: name.into() }
    }

    /// Create a missing-property error.
    pub fn missing(control: &'static str, name: impl Into<String>) -> Self {
        Self::MissingProperty {
            control,
            name: name.into(),
        }
    }

    /// Create a value error.
    pub fn invalid_value(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Whether this error indicates a construction bug rather than bad data.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredProperty { .. }
                | Self::DuplicateProperty { .. }
                | Self::MissingProperty { .. }
        )
    }
}

impl From<serde_json::Error> for TrellisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Params {
            message: err.to_string(),
        }
    }
}
