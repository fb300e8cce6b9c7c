//! The per-request object passed through every lifecycle checkpoint.
//!
//! This module provides:
//! - The `Request` model with its protectable fields
//! - The `RequestField` enumeration used by the options
//! - The extensible `AppContext` where snapshots are bound

mod app;
mod fields;

pub use app::AppContext;
pub use fields::RequestField;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A single request flowing through the server lifecycle.
#[derive(Debug)]
pub struct Request {
    id: Uuid,
    received: DateTime<Utc>,
    method: String,
    path: String,
    /// Path parameters, filled in by the router.
    pub params: serde_json::Value,
    /// Parsed query string.
    pub query: serde_json::Value,
    /// Request body, `null` when absent.
    pub payload: serde_json::Value,
    /// Request headers.
    pub headers: serde_json::Value,
    /// Parsed cookies.
    pub state: serde_json::Value,
    /// Extension-owned application state.
    pub app: AppContext,
}

impl Request {
    /// Creates a request for `url`, parsing its query string.
    #[must_use]
    pub fn new(method: impl Into<String>, url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));

        Self {
            id: Uuid::new_v4(),
            received: Utc::now(),
            method: method.into().to_uppercase(),
            path: path.to_string(),
            params: serde_json::json!({}),
            query: parse_query(query),
            payload: serde_json::Value::Null,
            headers: serde_json::json!({}),
            state: serde_json::json!({}),
            app: AppContext::new(),
        }
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: serde_json::Value) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the cookies.
    #[must_use]
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = state;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns when the request was received.
    #[must_use]
    pub const fn received(&self) -> DateTime<Utc> {
        self.received
    }

    /// Returns the upper-cased HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Parses an `application/x-www-form-urlencoded` query into a JSON object.
///
/// Keys and values are percent-decoded and `+` reads as a space. Repeated keys
/// collect into an array.
fn parse_query(query: &str) -> serde_json::Value {
    let mut map = serde_json::Map::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = serde_json::Value::String(value.into_owned());

        match map.get_mut(&*key) {
            Some(serde_json::Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = serde_json::Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }

    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request = Request::new("get", "/foobar");

        assert_eq!(request.method(), "GET");
        assert_eq!(request.path(), "/foobar");
        assert_eq!(request.params, json!({}));
        assert_eq!(request.query, json!({}));
        assert!(request.payload.is_null());
        assert!(request.app.is_empty());
    }

    #[test]
    fn test_query_parsing() {
        let request = Request::new("GET", "/foobar?foo=bar&flag&x=1&x=2");

        assert_eq!(request.path(), "/foobar");
        assert_eq!(
            request.query,
            json!({"foo": "bar", "flag": "", "x": ["1", "2"]})
        );
    }

    #[test]
    fn test_query_is_decoded() {
        let request = Request::new("GET", "/?name=John%20Doe&q=a+b&caf%C3%A9=1");

        assert_eq!(
            request.query,
            json!({"name": "John Doe", "q": "a b", "café": "1"})
        );
    }

    #[test]
    fn test_distinct_ids() {
        let a = Request::new("GET", "/");
        let b = Request::new("GET", "/");
        assert_ne!(a.id(), b.id());
    }
}
