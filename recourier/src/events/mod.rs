//! Lifecycle events.
//!
//! The server reports each request's progress and the plugin reports what it
//! did to the snapshot. Events are best-effort: recording one never fails the
//! request.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Every event recourier and its host emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// A request entered the server.
    #[serde(rename = "request.received")]
    RequestReceived,
    /// A lifecycle method returned an error and the request ended with a 500.
    #[serde(rename = "extension.failed")]
    ExtensionFailed,
    /// A response was produced.
    #[serde(rename = "request.completed")]
    RequestCompleted,
    /// A snapshot was captured and bound.
    #[serde(rename = "recourier.captured")]
    SnapshotCaptured,
    /// Protected fields were written back from the snapshot.
    #[serde(rename = "recourier.restored")]
    SnapshotRestored,
    /// Restore ran without a bound snapshot.
    #[serde(rename = "recourier.snapshot_missing")]
    SnapshotMissing,
}

impl EventKind {
    /// Returns the dotted event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestReceived => "request.received",
            Self::ExtensionFailed => "extension.failed",
            Self::RequestCompleted => "request.completed",
            Self::SnapshotCaptured => "recourier.captured",
            Self::SnapshotRestored => "recourier.restored",
            Self::SnapshotMissing => "recourier.snapshot_missing",
        }
    }

    /// Returns true for events emitted by the plugin rather than the host.
    #[must_use]
    pub const fn is_snapshot_event(self) -> bool {
        matches!(
            self,
            Self::SnapshotCaptured | Self::SnapshotRestored | Self::SnapshotMissing
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event about one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// The request it happened to.
    pub request_id: Uuid,
    /// Event-specific details, an object or `null`.
    pub data: serde_json::Value,
}

impl Event {
    /// Creates an event without details.
    #[must_use]
    pub const fn new(kind: EventKind, request_id: Uuid) -> Self {
        Self {
            kind,
            request_id,
            data: serde_json::Value::Null,
        }
    }

    /// Sets the details.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
