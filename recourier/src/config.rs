//! Plugin options.

use crate::errors::ConfigurationError;
use crate::request::RequestField;
use serde::{Deserialize, Serialize};

/// Namespace used when the options do not name one.
pub const DEFAULT_NAMESPACE: &str = "recourier";

/// Options accepted by the recourier plugin.
///
/// ```
/// use recourier::config::RecourierOptions;
///
/// let options = RecourierOptions::from_value(serde_json::json!({
///     "namespace": "foo",
///     "properties": ["params", "payload", "query"],
/// }))
/// .unwrap();
/// assert_eq!(options.properties.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecourierOptions {
    /// Key of the snapshot on the request's application state.
    pub namespace: String,
    /// Request fields to capture and restore.
    pub properties: Vec<RequestField>,
}

impl Default for RecourierOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            properties: Vec::new(),
        }
    }
}

impl RecourierOptions {
    /// Creates options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the protected properties.
    #[must_use]
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = RequestField>) -> Self {
        self.properties = properties.into_iter().collect();
        self
    }

    /// Parses options given as JSON; `null` means all defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the value does not have the expected
    /// shape, names an unknown property, or fails [`validate`](Self::validate).
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigurationError> {
        let options: Self = if value.is_null() {
            Self::default()
        } else {
            serde_json::from_value(value).map_err(|e| ConfigurationError::new(e.to_string()))?
        };
        options.validate()?;
        Ok(options)
    }

    /// Checks that the namespace is usable as a single context key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for an empty, padded or dotted namespace.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.namespace.is_empty() {
            return Err(ConfigurationError::new("namespace must not be empty").with_field("namespace"));
        }
        if self.namespace.trim() != self.namespace || self.namespace.contains('.') {
            return Err(ConfigurationError::new(format!(
                "namespace '{}' must be a single key without dots or surrounding whitespace",
                self.namespace
            ))
            .with_field("namespace"));
        }
        Ok(())
    }
}
