//! A field container that can be closed against new fields.

use crate::errors::StructuralViolation;
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct ContainerState {
    fields: serde_json::Map<String, serde_json::Value>,
    closed: bool,
}

/// A thread-safe set of named fields with one-way structural closure.
///
/// Once [`finalize`](Self::finalize) has run, adding or removing fields fails
/// with a `StructuralViolation`. Fields that already exist can still be
/// updated in place.
#[derive(Debug, Default)]
pub struct ClosedContainer {
    state: RwLock<ContainerState>,
}

impl ClosedContainer {
    /// Creates a new open, empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an open container holding `fields`.
    #[must_use]
    pub fn populate(fields: impl IntoIterator<Item = (String, serde_json::Value)>) -> Self {
        Self {
            state: RwLock::new(ContainerState {
                fields: fields.into_iter().collect(),
                closed: false,
            }),
        }
    }

    /// Creates an open container from the entries of a JSON object.
    ///
    /// Anything other than an object yields an empty container.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(fields) => Self::populate(fields),
            _ => Self::new(),
        }
    }

    /// Closes the container against new fields.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::AlreadyClosed` on a second call.
    pub fn finalize(&self) -> Result<(), StructuralViolation> {
        let mut state = self.state.write();
        if state.closed {
            return Err(StructuralViolation::AlreadyClosed);
        }
        state.closed = true;
        Ok(())
    }

    /// Returns true once the container has been finalized.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    /// Sets a field.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::NotExtensible` if the container is
    /// closed and `key` is not one of its fields.
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), StructuralViolation> {
        let key = key.into();
        let mut state = self.state.write();

        if state.closed && !state.fields.contains_key(&key) {
            return Err(StructuralViolation::NotExtensible { key });
        }

        state.fields.insert(key, value);
        Ok(())
    }

    /// Removes a field.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::SealedField` if the container is closed
    /// and holds `key`.
    pub fn remove(&self, key: &str) -> Result<Option<serde_json::Value>, StructuralViolation> {
        let mut state = self.state.write();

        if state.closed && state.fields.contains_key(key) {
            return Err(StructuralViolation::SealedField {
                key: key.to_string(),
            });
        }

        Ok(state.fields.remove(key))
    }

    /// Gets a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.state.read().fields.get(key).cloned()
    }

    /// Checks if a field exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.read().fields.contains_key(key)
    }

    /// Returns all field names.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.read().fields.keys().cloned().collect()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().fields.len()
    }

    /// Returns true if the container has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().fields.is_empty()
    }

    /// Returns a copy of the fields as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.state.read().fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_container_accepts_anything() {
        let container = ClosedContainer::new();
        container.insert("a", json!(1)).unwrap();
        container.insert("b", json!(2)).unwrap();
        assert_eq!(container.remove("a").unwrap(), Some(json!(1)));

        assert_eq!(container.to_value(), json!({"b": 2}));
        assert!(!container.is_closed());
    }

    #[test]
    fn test_closed_container_rejects_new_fields() {
        let container = ClosedContainer::from_value(json!({"request": {}}));
        container.finalize().unwrap();

        let err = container.insert("extra", json!(1)).unwrap_err();
        assert_eq!(err, StructuralViolation::NotExtensible { key: "extra".into() });
        assert!(err.to_string().contains("not extensible"));
        assert!(!container.contains_key("extra"));
    }

    #[test]
    fn test_closed_container_allows_updates() {
        let container = ClosedContainer::from_value(json!({"request": {"params": {"foo": "bar"}}}));
        container.finalize().unwrap();

        container.insert("request", json!({"params": {}})).unwrap();
        assert_eq!(container.get("request"), Some(json!({"params": {}})));
    }

    #[test]
    fn test_closed_container_rejects_removal() {
        let container = ClosedContainer::from_value(json!({"request": {}}));
        container.finalize().unwrap();

        let err = container.remove("request").unwrap_err();
        assert!(matches!(err, StructuralViolation::SealedField { .. }));
        assert_eq!(container.len(), 1);

        // Removing a field that never existed changes nothing.
        assert_eq!(container.remove("missing").unwrap(), None);
    }

    #[test]
    fn test_finalize_twice_fails() {
        let container = ClosedContainer::new();
        container.finalize().unwrap();

        assert_eq!(container.finalize(), Err(StructuralViolation::AlreadyClosed));
        assert!(container.is_closed());
    }

    #[test]
    fn test_from_non_object() {
        let container = ClosedContainer::from_value(json!([1, 2]));
        assert!(container.is_empty());
    }
}
