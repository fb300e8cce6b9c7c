//! Test fixtures: a configurable plugin and an echo route.

use crate::errors::RecourierError;
use crate::request::{Request, RequestField};
use crate::server::{
    Checkpoint, ExtOptions, ExtensionHost, FnHandler, LifecycleMethod, Plugin, RouteHandler,
    Server, ANY_METHOD,
};
use std::sync::Arc;

/// Path template of the echo route.
pub const ECHO_PATH: &str = "/{foo}";

/// A plugin that registers a fixed list of extensions.
#[derive(Debug)]
pub struct TestPlugin {
    name: String,
    extensions: Vec<(Checkpoint, Arc<dyn LifecycleMethod>, ExtOptions)>,
}

impl TestPlugin {
    /// Creates a plugin with no extensions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extensions: Vec::new(),
        }
    }

    /// Adds an unconstrained extension.
    #[must_use]
    pub fn ext(self, checkpoint: Checkpoint, method: impl LifecycleMethod + 'static) -> Self {
        self.ext_with(checkpoint, method, ExtOptions::default())
    }

    /// Adds an extension with ordering constraints.
    #[must_use]
    pub fn ext_with(
        mut self,
        checkpoint: Checkpoint,
        method: impl LifecycleMethod + 'static,
        options: ExtOptions,
    ) -> Self {
        self.extensions.push((checkpoint, Arc::new(method), options));
        self
    }
}

impl Plugin for TestPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(
        &self,
        host: &mut dyn ExtensionHost,
        _options: serde_json::Value,
    ) -> Result<(), RecourierError> {
        for (checkpoint, method, options) in &self.extensions {
            host.ext(*checkpoint, Arc::clone(method), options.clone())?;
        }
        Ok(())
    }
}

/// A handler that answers with every protectable field of the request.
#[must_use]
pub fn echo_handler() -> Arc<dyn RouteHandler> {
    Arc::new(FnHandler::new(|request: &Request| {
        let body: serde_json::Map<String, serde_json::Value> = RequestField::ALL
            .into_iter()
            .map(|field| (field.as_str().to_string(), field.read(request).clone()))
            .collect();
        Ok(serde_json::Value::Object(body))
    }))
}

/// Builds a server with `plugins` registered in order and the echo route
/// at [`ECHO_PATH`] for any method.
///
/// # Errors
///
/// Returns the first registration error.
pub fn echo_server(plugins: &[(&dyn Plugin, serde_json::Value)]) -> Result<Server, RecourierError> {
    let mut server = Server::new();
    for (plugin, options) in plugins {
        server.register(*plugin, options.clone())?;
    }
    server.route(ANY_METHOD, ECHO_PATH, echo_handler())?;
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MutatingExtension;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo_server_answers_every_field() {
        let server = echo_server(&[]).unwrap();

        let response = server.inject("/bar?x=1").await;

        assert_eq!(
            response.result,
            json!({
                "params": {"foo": "bar"},
                "query": {"x": "1"},
                "payload": null,
                "headers": {},
                "state": {},
            })
        );
    }

    #[tokio::test]
    async fn test_plugin_registers_its_extensions() {
        let plugin = TestPlugin::new("mutator").ext(
            Checkpoint::OnPreHandler,
            MutatingExtension::new(RequestField::Params, json!({"baz": "qux"})),
        );
        let server = echo_server(&[(&plugin, serde_json::Value::Null)]).unwrap();

        assert_eq!(server.extension_order(Checkpoint::OnPreHandler), vec!["mutator"]);
        let response = server.inject("/bar").await;
        assert_eq!(response.result["params"], json!({"baz": "qux"}));
    }
}
