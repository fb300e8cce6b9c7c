//! Per-request snapshots of protected request fields.

use super::ClosedContainer;
use crate::errors::StructuralViolation;
use crate::request::{AppContext, Request, RequestField};
use std::sync::Arc;

/// Top-level field of the snapshot container holding the captured values.
pub const REQUEST_KEY: &str = "request";

/// Captured request fields, closed and bound under a namespace.
///
/// The container always has the shape `{ "request": { <field>: <value> } }`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    container: Arc<ClosedContainer>,
}

impl SnapshotStore {
    /// Captures the live values of `fields` from `request` into a closed
    /// container.
    ///
    /// # Errors
    ///
    /// Returns a `StructuralViolation` if the fresh container cannot be closed.
    pub fn capture(request: &Request, fields: &[RequestField]) -> Result<Self, StructuralViolation> {
        let captured: serde_json::Map<String, serde_json::Value> = fields
            .iter()
            .map(|field| (field.as_str().to_string(), field.read(request).clone()))
            .collect();

        let container = ClosedContainer::populate([(
            REQUEST_KEY.to_string(),
            serde_json::Value::Object(captured),
        )]);
        container.finalize()?;

        Ok(Self {
            container: Arc::new(container),
        })
    }

    /// Binds this snapshot under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::Redefine` if `namespace` is already taken.
    pub fn attach(&self, app: &mut AppContext, namespace: &str) -> Result<(), StructuralViolation> {
        app.bind(namespace, Arc::clone(&self.container))
    }

    /// Finds the snapshot bound under `namespace`.
    ///
    /// A plain value stored under the same key is not a snapshot.
    #[must_use]
    pub fn lookup(app: &AppContext, namespace: &str) -> Option<Self> {
        app.binding(namespace).map(|container| Self {
            container: Arc::clone(container),
        })
    }

    /// Returns the captured value of `field`, if it was captured.
    #[must_use]
    pub fn captured(&self, field: RequestField) -> Option<serde_json::Value> {
        self.container
            .get(REQUEST_KEY)?
            .get(field.as_str())
            .cloned()
    }

    /// Returns the underlying container.
    #[must_use]
    pub fn container(&self) -> &ClosedContainer {
        &self.container
    }

    /// Returns a JSON view of the snapshot.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        self.container.to_value()
    }
}
