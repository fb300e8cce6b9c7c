//! Pre-handler restoration of the protected fields.

use crate::config::RecourierOptions;
use crate::events::{Event, EventKind, EventSink};
use crate::request::Request;
use crate::server::{Flow, LifecycleMethod};
use crate::snapshot::SnapshotStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Overwrites the configured fields with their captured values.
pub struct RestoreStage {
    options: Arc<RecourierOptions>,
    event_sink: Arc<dyn EventSink>,
}

impl RestoreStage {
    /// Creates a restore stage.
    #[must_use]
    pub fn new(options: Arc<RecourierOptions>, event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            options,
            event_sink,
        }
    }

    /// Restores every configured field of `request` from its snapshot.
    ///
    /// Returns the number of fields written. A request without a snapshot is
    /// left untouched. A field missing from the snapshot is restored as `null`.
    pub fn restore(&self, request: &mut Request) -> usize {
        let namespace = &self.options.namespace;
        let Some(snapshot) = SnapshotStore::lookup(&request.app, namespace) else {
            debug!(
                request_id = %request.id(),
                namespace = %namespace,
                "No snapshot to restore"
            );
            self.event_sink.record(
                Event::new(EventKind::SnapshotMissing, request.id())
                    .with_data(serde_json::json!({"namespace": namespace})),
            );
            return 0;
        };

        for &field in &self.options.properties {
            let value = snapshot.captured(field).unwrap_or(serde_json::Value::Null);
            field.write(request, value);
        }

        debug!(
            request_id = %request.id(),
            namespace = %namespace,
            properties = self.options.properties.len(),
            "Restored request snapshot"
        );
        self.event_sink.record(
            Event::new(EventKind::SnapshotRestored, request.id()).with_data(serde_json::json!({
                "namespace": namespace,
                "properties": &self.options.properties,
            })),
        );

        self.options.properties.len()
    }
}

impl fmt::Debug for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestoreStage")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LifecycleMethod for RestoreStage {
    async fn call(&self, request: &mut Request) -> anyhow::Result<Flow> {
        self.restore(request);
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::plugin::CaptureStage;
    use crate::request::RequestField;
    use crate::snapshot::REQUEST_KEY;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stages(properties: &[RequestField]) -> (CaptureStage, RestoreStage, Arc<CollectingEventSink>) {
        let sink = Arc::new(CollectingEventSink::new());
        let options = Arc::new(
            RecourierOptions::new()
                .with_namespace("foo")
                .with_properties(properties.iter().copied()),
        );
        (
            CaptureStage::new(options.clone(), sink.clone()),
            RestoreStage::new(options, sink.clone()),
            sink,
        )
    }

    fn request() -> Request {
        let mut request = Request::new("POST", "/bar?foo=bar").with_payload(json!({"foo": "bar"}));
        request.params = json!({"foo": "bar"});
        request
    }

    #[test]
    fn test_restore_erases_mutations() {
        let (capture, restore, sink) =
            stages(&[RequestField::Params, RequestField::Payload, RequestField::Query]);
        let mut request = request();

        capture.capture(&mut request).unwrap();
        request.params = json!({"baz": "qux"});
        request.payload = json!({"baz": "qux"});
        request.query = json!({"baz": "qux"});

        assert_eq!(restore.restore(&mut request), 3);
        assert_eq!(request.params, json!({"foo": "bar"}));
        assert_eq!(request.payload, json!({"foo": "bar"}));
        assert_eq!(request.query, json!({"foo": "bar"}));
        assert_eq!(sink.of_kind(EventKind::SnapshotRestored).len(), 1);
    }

    #[test]
    fn test_unprotected_fields_keep_mutations() {
        let (capture, restore, _) = stages(&[RequestField::Params]);
        let mut request = request();

        capture.capture(&mut request).unwrap();
        request.query = json!({"baz": "qux"});
        restore.restore(&mut request);

        assert_eq!(request.query, json!({"baz": "qux"}));
    }

    #[test]
    fn test_missing_snapshot_is_a_no_op() {
        let (_, restore, sink) = stages(&[RequestField::Params]);
        let mut request = request();
        request.params = json!({"baz": "qux"});

        assert_eq!(restore.restore(&mut request), 0);
        assert_eq!(request.params, json!({"baz": "qux"}));
        assert_eq!(sink.of_kind(EventKind::SnapshotMissing).len(), 1);
    }

    #[test]
    fn test_plain_value_under_namespace_is_not_a_snapshot() {
        let (_, restore, _) = stages(&[RequestField::Params]);
        let mut request = request();
        request.app.set("foo", json!({"request": {"params": {"evil": true}}})).unwrap();

        restore.restore(&mut request);
        assert_eq!(request.params, json!({"foo": "bar"}));
    }

    #[test]
    fn test_empty_properties_restore_nothing() {
        let (capture, restore, _) = stages(&[]);
        let mut request = request();

        capture.capture(&mut request).unwrap();
        request.params = json!({"baz": "qux"});

        assert_eq!(restore.restore(&mut request), 0);
        assert_eq!(request.params, json!({"baz": "qux"}));
    }

    #[test]
    fn test_owner_may_rewrite_captured_values() {
        let (capture, restore, _) = stages(&[RequestField::Params]);
        let mut request = request();

        let snapshot = capture.capture(&mut request).unwrap();
        snapshot
            .container()
            .insert(REQUEST_KEY, json!({"params": {"rewritten": true}}))
            .unwrap();
        restore.restore(&mut request);

        assert_eq!(request.params, json!({"rewritten": true}));
    }

    #[tokio::test]
    async fn test_restore_as_lifecycle_method() {
        let (_, restore, _) = stages(&[RequestField::Params]);
        let mut request = request();

        assert_eq!(restore.call(&mut request).await.unwrap(), Flow::Continue);
    }
}
