//! The extensible per-request context shared by all extensions.

use crate::errors::StructuralViolation;
use crate::snapshot::{ClosedContainer, ImmutableBinding};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
enum Slot {
    Value(serde_json::Value),
    Bound(ImmutableBinding<ClosedContainer>),
}

/// Application state attached to a single request.
///
/// Any extension may store values under its own keys. Keys established with
/// [`AppContext::bind`] can never be reassigned or removed afterwards.
#[derive(Debug, Default)]
pub struct AppContext {
    slots: BTreeMap<String, Slot>,
}

impl AppContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value by key.
    ///
    /// Bound containers are returned as their JSON view.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.slots.get(key).map(|slot| match slot {
            Slot::Value(value) => value.clone(),
            Slot::Bound(binding) => binding.value().to_value(),
        })
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Returns true if the key is held by an immutable binding.
    #[must_use]
    pub fn is_bound(&self, key: &str) -> bool {
        matches!(self.slots.get(key), Some(Slot::Bound(_)))
    }

    /// Sets a value, replacing any previous plain value.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::ReadOnlyBinding` if the key is bound.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), StructuralViolation> {
        let key = key.into();
        if self.is_bound(&key) {
            return Err(StructuralViolation::ReadOnlyBinding { key });
        }
        self.slots.insert(key, Slot::Value(value));
        Ok(())
    }

    /// Removes a plain value.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::UndeletableBinding` if the key is bound.
    pub fn remove(&mut self, key: &str) -> Result<Option<serde_json::Value>, StructuralViolation> {
        if self.is_bound(key) {
            return Err(StructuralViolation::UndeletableBinding {
                key: key.to_string(),
            });
        }
        Ok(self.slots.remove(key).map(|slot| match slot {
            Slot::Value(value) => value,
            Slot::Bound(binding) => binding.value().to_value(),
        }))
    }

    /// Permanently binds a container under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::Redefine` if the key already exists,
    /// whether it holds a plain value or an earlier binding.
    pub fn bind(
        &mut self,
        key: impl Into<String>,
        container: Arc<ClosedContainer>,
    ) -> Result<(), StructuralViolation> {
        let key = key.into();
        if self.slots.contains_key(&key) {
            return Err(StructuralViolation::Redefine { key });
        }
        let binding = ImmutableBinding::new(key.clone(), container);
        self.slots.insert(key, Slot::Bound(binding));
        Ok(())
    }

    /// Returns the container bound under `key`, if any.
    #[must_use]
    pub fn binding(&self, key: &str) -> Option<&Arc<ClosedContainer>> {
        match self.slots.get(key) {
            Some(Slot::Bound(binding)) => Some(binding.value()),
            _ => None,
        }
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns a JSON view of the whole context.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .slots
            .keys()
            .filter_map(|key| self.get(key).map(|value| (key.clone(), value)))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn closed(fields: serde_json::Value) -> Arc<ClosedContainer> {
        let container = ClosedContainer::from_value(fields);
        container.finalize().unwrap();
        Arc::new(container)
    }

    #[test]
    fn test_plain_values_are_mutable() {
        let mut app = AppContext::new();
        app.set("bar", json!({})).unwrap();
        app.set("bar", json!({"x": 1})).unwrap();

        assert_eq!(app.get("bar"), Some(json!({"x": 1})));
        assert_eq!(app.remove("bar").unwrap(), Some(json!({"x": 1})));
        assert!(app.is_empty());
    }

    #[test]
    fn test_bound_key_rejects_assignment() {
        let mut app = AppContext::new();
        app.bind("foo", closed(json!({"request": {}}))).unwrap();

        let err = app.set("foo", json!({})).unwrap_err();
        assert_eq!(err, StructuralViolation::ReadOnlyBinding { key: "foo".into() });
        assert!(err.to_string().starts_with("Cannot assign to read only property"));
        assert_eq!(app.get("foo"), Some(json!({"request": {}})));
    }

    #[test]
    fn test_bound_key_rejects_removal() {
        let mut app = AppContext::new();
        app.bind("foo", closed(json!({}))).unwrap();

        let err = app.remove("foo").unwrap_err();
        assert!(matches!(err, StructuralViolation::UndeletableBinding { .. }));
        assert!(app.is_bound("foo"));
    }

    #[test]
    fn test_bind_twice_fails() {
        let mut app = AppContext::new();
        app.bind("foo", closed(json!({}))).unwrap();

        let err = app.bind("foo", closed(json!({}))).unwrap_err();
        assert_eq!(err, StructuralViolation::Redefine { key: "foo".into() });
    }

    #[test]
    fn test_bind_over_plain_value_fails() {
        let mut app = AppContext::new();
        app.set("foo", json!(1)).unwrap();

        assert!(app.bind("foo", closed(json!({}))).is_err());
        assert_eq!(app.get("foo"), Some(json!(1)));
    }

    #[test]
    fn test_to_value() {
        let mut app = AppContext::new();
        app.set("a", json!(1)).unwrap();
        app.bind("b", closed(json!({"request": {"params": {}}}))).unwrap();

        assert_eq!(
            app.to_value(),
            json!({"a": 1, "b": {"request": {"params": {}}}})
        );
        assert_eq!(app.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
