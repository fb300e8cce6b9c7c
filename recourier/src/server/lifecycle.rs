//! Lifecycle methods, handlers and responses.

use crate::request::Request;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A response produced by a handler or by an extension taking over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body.
    pub result: serde_json::Value,
}

impl Response {
    /// Creates a response with an explicit status.
    #[must_use]
    pub const fn new(status_code: u16, result: serde_json::Value) -> Self {
        Self {
            status_code,
            result,
        }
    }

    /// Creates a 200 response.
    #[must_use]
    pub const fn ok(result: serde_json::Value) -> Self {
        Self::new(200, result)
    }

    /// Creates an error response in the `{statusCode, error, message}` shape.
    #[must_use]
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        let reason = match status_code {
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            _ => "Internal Server Error",
        };
        Self::new(
            status_code,
            serde_json::json!({
                "statusCode": status_code,
                "error": reason,
                "message": message.into(),
            }),
        )
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// What the server does after a lifecycle method returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Move on to the next method.
    Continue,
    /// End the request with this response.
    Takeover(Response),
}

/// A callback registered at a checkpoint.
#[async_trait]
pub trait LifecycleMethod: Send + Sync + Debug {
    /// Runs the method against the current request.
    async fn call(&self, request: &mut Request) -> anyhow::Result<Flow>;
}

/// A lifecycle method backed by a synchronous closure.
pub struct FnExtension<F>
where
    F: Fn(&mut Request) -> anyhow::Result<Flow> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnExtension<F>
where
    F: Fn(&mut Request) -> anyhow::Result<Flow> + Send + Sync,
{
    /// Creates a new closure-backed method.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnExtension<F>
where
    F: Fn(&mut Request) -> anyhow::Result<Flow> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExtension")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> LifecycleMethod for FnExtension<F>
where
    F: Fn(&mut Request) -> anyhow::Result<Flow> + Send + Sync,
{
    async fn call(&self, request: &mut Request) -> anyhow::Result<Flow> {
        (self.func)(request)
    }
}

/// The business-logic handler of a route.
#[async_trait]
pub trait RouteHandler: Send + Sync + Debug {
    /// Produces the response for the request.
    async fn handle(&self, request: &mut Request) -> anyhow::Result<Response>;
}

/// A route handler backed by a closure returning the 200 body.
pub struct FnHandler<F>
where
    F: Fn(&Request) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Request) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    /// Creates a new closure-backed handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnHandler<F>
where
    F: Fn(&Request) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> RouteHandler for FnHandler<F>
where
    F: Fn(&Request) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    async fn handle(&self, request: &mut Request) -> anyhow::Result<Response> {
        (self.func)(request).map(Response::ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_extension() {
        let ext = FnExtension::new("mutate", |request: &mut Request| {
            request.params = json!({"baz": "qux"});
            Ok(Flow::Continue)
        });

        let mut request = Request::new("GET", "/");
        assert_eq!(ext.call(&mut request).await.unwrap(), Flow::Continue);
        assert_eq!(request.params, json!({"baz": "qux"}));
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler = FnHandler::new(|request: &Request| Ok(json!({"query": request.query})));

        let mut request = Request::new("GET", "/?a=1");
        let response = handler.handle(&mut request).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.result, json!({"query": {"a": "1"}}));
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(404, "Not Found");
        assert_eq!(response.status_code, 404);
        assert_eq!(response.result["error"], "Not Found");
        assert!(!response.is_success());
    }
}
