//! Post-auth capture of the protected fields.

use crate::config::RecourierOptions;
use crate::errors::StructuralViolation;
use crate::events::{Event, EventKind, EventSink};
use crate::request::Request;
use crate::server::{Flow, LifecycleMethod};
use crate::snapshot::SnapshotStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Captures the configured fields and binds the snapshot under the namespace.
pub struct CaptureStage {
    options: Arc<RecourierOptions>,
    event_sink: Arc<dyn EventSink>,
}

impl CaptureStage {
    /// Creates a capture stage.
    #[must_use]
    pub fn new(options: Arc<RecourierOptions>, event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            options,
            event_sink,
        }
    }

    /// Captures and binds the snapshot for `request`.
    ///
    /// Live fields are left untouched; absent fields are captured as `null`.
    ///
    /// # Errors
    ///
    /// Returns `StructuralViolation::Redefine` if the namespace is already
    /// present, e.g. when capture runs twice for one request.
    pub fn capture(&self, request: &mut Request) -> Result<SnapshotStore, StructuralViolation> {
        let snapshot = SnapshotStore::capture(request, &self.options.properties)?;
        snapshot.attach(&mut request.app, &self.options.namespace)?;

        debug!(
            request_id = %request.id(),
            namespace = %self.options.namespace,
            properties = self.options.properties.len(),
            "Captured request snapshot"
        );
        self.event_sink.record(
            Event::new(EventKind::SnapshotCaptured, request.id()).with_data(serde_json::json!({
                "namespace": &self.options.namespace,
                "properties": &self.options.properties,
            })),
        );

        Ok(snapshot)
    }
}

impl fmt::Debug for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureStage")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LifecycleMethod for CaptureStage {
    async fn call(&self, request: &mut Request) -> anyhow::Result<Flow> {
        self.capture(request)?;
        Ok(Flow::Continue)
    }
}
