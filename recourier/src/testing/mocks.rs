//! Mock extensions for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::request::{Request, RequestField};
use crate::server::{Flow, LifecycleMethod, Response};

/// Shared record of extension calls, in call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Overwrites one request field with a fixed value.
#[derive(Debug)]
pub struct MutatingExtension {
    field: RequestField,
    value: serde_json::Value,
}

impl MutatingExtension {
    /// Creates an extension writing `value` into `field`.
    #[must_use]
    pub const fn new(field: RequestField, value: serde_json::Value) -> Self {
        Self { field, value }
    }
}

#[async_trait]
impl LifecycleMethod for MutatingExtension {
    async fn call(&self, request: &mut Request) -> anyhow::Result<Flow> {
        self.field.write(request, self.value.clone());
        Ok(Flow::Continue)
    }
}

/// Appends a label to a call log, optionally noting whether a namespace was
/// bound at call time (`label:bound` or `label:unbound`).
#[derive(Debug)]
pub struct RecordingExtension {
    label: String,
    namespace: Option<String>,
    log: CallLog,
}

impl RecordingExtension {
    /// Creates an extension that records `label`.
    #[must_use]
    pub fn new(label: impl Into<String>, log: CallLog) -> Self {
        Self {
            label: label.into(),
            namespace: None,
            log,
        }
    }

    /// Also records whether `namespace` is bound when called.
    #[must_use]
    pub fn observing(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[async_trait]
impl LifecycleMethod for RecordingExtension {
    async fn call(&self, request: &mut Request) -> anyhow::Result<Flow> {
        let entry = match &self.namespace {
            Some(namespace) if request.app.is_bound(namespace) => format!("{}:bound", self.label),
            Some(_) => format!("{}:unbound", self.label),
            None => self.label.clone(),
        };
        self.log.lock().push(entry);
        Ok(Flow::Continue)
    }
}

/// An illegal operation against a bound snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tamper {
    /// Assign a new value to the namespace.
    Reassign,
    /// Delete the namespace.
    Delete,
    /// Add a new top-level field to the snapshot.
    Extend,
}

/// Attempts a [`Tamper`] operation and answers with the resulting error.
///
/// On failure the request is taken over with `{"error": <message>}`; if the
/// operation unexpectedly succeeds the request continues.
#[derive(Debug)]
pub struct TamperingExtension {
    namespace: String,
    tamper: Tamper,
}

impl TamperingExtension {
    /// Creates a tampering extension.
    #[must_use]
    pub fn new(namespace: impl Into<String>, tamper: Tamper) -> Self {
        Self {
            namespace: namespace.into(),
            tamper,
        }
    }
}

#[async_trait]
impl LifecycleMethod for TamperingExtension {
    async fn call(&self, request: &mut Request) -> anyhow::Result<Flow> {
        let result = match self.tamper {
            Tamper::Reassign => request.app.set(self.namespace.clone(), serde_json::json!({})),
            Tamper::Delete => request.app.remove(&self.namespace).map(|_| ()),
            Tamper::Extend => match request.app.binding(&self.namespace) {
                Some(container) => container.insert("extra", serde_json::json!(1)),
                None => Ok(()),
            },
        };

        Ok(match result {
            Ok(()) => Flow::Continue,
            Err(violation) => Flow::Takeover(Response::ok(serde_json::json!({
                "error": violation.to_string(),
            }))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mutating_extension() {
        let ext = MutatingExtension::new(RequestField::Query, json!({"baz": "qux"}));
        let mut request = Request::new("GET", "/?foo=bar");

        ext.call(&mut request).await.unwrap();
        assert_eq!(request.query, json!({"baz": "qux"}));
    }

    #[tokio::test]
    async fn test_recording_extension() {
        let log = CallLog::default();
        let plain = RecordingExtension::new("a", log.clone());
        let observing = RecordingExtension::new("b", log.clone()).observing("foo");
        let mut request = Request::new("GET", "/");

        plain.call(&mut request).await.unwrap();
        observing.call(&mut request).await.unwrap();

        assert_eq!(*log.lock(), vec!["a", "b:unbound"]);
    }

    #[tokio::test]
    async fn test_tampering_without_snapshot_succeeds() {
        let mut request = Request::new("GET", "/");

        for tamper in [Tamper::Reassign, Tamper::Delete, Tamper::Extend] {
            let ext = TamperingExtension::new("foo", tamper);
            assert_eq!(ext.call(&mut request).await.unwrap(), Flow::Continue);
        }
    }
}
