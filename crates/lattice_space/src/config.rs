//! Component space configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`ComponentSpace`](crate::space::ComponentSpace).
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use lattice_space::SpaceConfig;
///
/// let config = SpaceConfig::from_json(r#"{ "strict_data_fields": false }"#).unwrap();
/// assert!(!config.strict_data_fields);
/// assert!(config.property_type_check);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Human readable name used in logs.
    pub name: String,

    /// Reject data generators that produce fields they did not declare.
    ///
    /// When disabled, undeclared fields are logged and kept as
    /// instance-local data unless they collide with a declared field.
    pub strict_data_fields: bool,

    /// Reject property writes whose value does not match the declared type.
    ///
    /// When disabled, mismatches are logged and the value is stored anyway.
    pub property_type_check: bool,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            strict_data_fields: true,
            property_type_check: true,
        }
    }
}

impl SpaceConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not a valid configuration object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the space name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables or disables strict data field checking.
    #[must_use]
    pub fn with_strict_data_fields(mut self, enabled: bool) -> Self {
        self.strict_data_fields = enabled;
        self
    }

    /// Enables or disables property type checking on writes.
    #[must_use]
    pub fn with_property_type_check(mut self, enabled: bool) -> Self {
        self.property_type_check = enabled;
        self
    }
}
