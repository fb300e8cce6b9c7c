//! Bindings that can never be reassigned or removed.

use std::sync::Arc;

/// A value permanently attached under a key of a host object.
///
/// The binding exposes no way to replace or drop its value. Whether the value
/// itself can change is up to the value's own type.
#[derive(Debug)]
pub struct ImmutableBinding<T> {
    key: String,
    value: Arc<T>,
}

impl<T> ImmutableBinding<T> {
    pub(crate) fn new(key: impl Into<String>, value: Arc<T>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Returns the key this binding occupies.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the bound value.
    #[must_use]
    pub const fn value(&self) -> &Arc<T> {
        &self.value
    }
}
