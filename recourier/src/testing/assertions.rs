//! Test assertions for injected responses.

use crate::server::Response;

/// Asserts a 200 response without an `error` entry in its body.
pub fn assert_response_ok(response: &Response) {
    assert_eq!(
        response.status_code, 200,
        "Expected status 200, got {} with body {}",
        response.status_code, response.result
    );
    assert!(
        response.result.get("error").is_none(),
        "Expected no error, got {}",
        response.result["error"]
    );
}

/// Asserts that the body's `error` message starts with `prefix`.
pub fn assert_response_error(response: &Response, prefix: &str) {
    let message = response
        .result
        .get("error")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    assert!(
        message.starts_with(prefix),
        "Expected error starting with '{}', got body {}",
        prefix,
        response.result
    );
}
