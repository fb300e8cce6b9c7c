//! The protectable request fields and their accessors.

use super::Request;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A request field that can be captured and restored.
///
/// Each variant maps to a fixed accessor on [`Request`], so no field name is
/// ever resolved by parsing a path at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestField {
    /// Path parameters extracted by the router.
    Params,
    /// Parsed query string.
    Query,
    /// Request body; `null` when the request carries none.
    Payload,
    /// Request headers.
    Headers,
    /// Parsed cookies.
    State,
}

impl RequestField {
    /// Every protectable field, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Params,
        Self::Query,
        Self::Payload,
        Self::Headers,
        Self::State,
    ];

    /// Returns the field's name as used in options and snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Query => "query",
            Self::Payload => "payload",
            Self::Headers => "headers",
            Self::State => "state",
        }
    }

    /// Reads the live value of this field.
    #[must_use]
    pub const fn read(self, request: &Request) -> &serde_json::Value {
        match self {
            Self::Params => &request.params,
            Self::Query => &request.query,
            Self::Payload => &request.payload,
            Self::Headers => &request.headers,
            Self::State => &request.state,
        }
    }

    /// Overwrites the live value of this field.
    pub fn write(self, request: &mut Request, value: serde_json::Value) {
        *self.slot(request) = value;
    }

    fn slot(self, request: &mut Request) -> &mut serde_json::Value {
        match self {
            Self::Params => &mut request.params,
            Self::Query => &mut request.query,
            Self::Payload => &mut request.payload,
            Self::Headers => &mut request.headers,
            Self::State => &mut request.state,
        }
    }
}

impl fmt::Display for RequestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
