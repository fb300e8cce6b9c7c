//! Route table with `{param}` path templates.

use super::RouteHandler;
use crate::errors::RegistrationError;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::str::Utf8Error;
use std::sync::Arc;

/// Matches any method.
pub const ANY_METHOD: &str = "*";

/// A compiled route.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    method: String,
    path: String,
    pattern: Regex,
    params: Vec<String>,
    pub handler: Arc<dyn RouteHandler>,
}

impl Route {
    /// Compiles `path` into a matcher.
    pub fn new(
        method: &str,
        path: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<Self, RegistrationError> {
        if !path.starts_with('/') {
            return Err(RegistrationError::InvalidRoute {
                path: path.to_string(),
                reason: "path must start with '/'".to_string(),
            });
        }

        let mut params = Vec::new();
        let mut source = String::from("^");
        for segment in path.split('/').skip(1) {
            source.push('/');
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) if !name.is_empty() => {
                    params.push(name.to_string());
                    source.push_str("([^/]+)");
                }
                Some(_) => {
                    return Err(RegistrationError::InvalidRoute {
                        path: path.to_string(),
                        reason: "empty parameter name".to_string(),
                    })
                }
                None => source.push_str(&regex::escape(segment)),
            }
        }
        source.push('$');

        let pattern = Regex::new(&source).map_err(|e| RegistrationError::InvalidRoute {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            pattern,
            params,
            handler,
        })
    }

    /// Returns the path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Matches a request, returning its percent-decoded path parameters.
    ///
    /// A matching path whose parameters are not valid UTF-8 once decoded
    /// yields `Some(Err(_))`.
    pub fn matches(&self, method: &str, path: &str) -> Option<Result<serde_json::Value, Utf8Error>> {
        if self.method != ANY_METHOD && !self.method.eq_ignore_ascii_case(method) {
            return None;
        }

        let captures = self.pattern.captures(path)?;
        let params: Result<serde_json::Map<String, serde_json::Value>, Utf8Error> = self
            .params
            .iter()
            .enumerate()
            .filter_map(|(i, name)| captures.get(i + 1).map(|m| (name, m.as_str())))
            .map(|(name, raw)| {
                percent_decode_str(raw)
                    .decode_utf8()
                    .map(|value| (name.clone(), serde_json::Value::String(value.into_owned())))
            })
            .collect();

        Some(params.map(serde_json::Value::Object))
    }
}
