//! The server: plugin registration, routing and request injection.

use super::ordering::{ExtensionQueue, RegisteredExtension};
use super::router::Route;
use super::{
    Checkpoint, ExtOptions, ExtensionHost, Flow, LifecycleMethod, Plugin, Response, RouteHandler,
};
use crate::errors::{RecourierError, RegistrationError};
use crate::events::{Event, EventKind, EventSink, NoOpEventSink};
use crate::request::Request;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Realm of extensions added directly on the server rather than by a plugin.
pub const ROOT_REALM: &str = "(server)";

/// Describes a request to inject into the server.
#[derive(Debug, Clone, Default)]
pub struct InjectOptions {
    /// HTTP method.
    pub method: String,
    /// Path and optional query string.
    pub url: String,
    /// Request body.
    pub payload: Option<serde_json::Value>,
    /// Request headers.
    pub headers: Option<serde_json::Value>,
    /// Cookies.
    pub state: Option<serde_json::Value>,
}

impl InjectOptions {
    /// Creates options for `method` and `url`.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Creates a POST request with a payload.
    #[must_use]
    pub fn post(url: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new("POST", url).with_payload(payload)
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: serde_json::Value) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Sets the cookies.
    #[must_use]
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    fn into_request(self) -> Request {
        let mut request = Request::new(self.method, &self.url);
        if let Some(payload) = self.payload {
            request = request.with_payload(payload);
        }
        if let Some(headers) = self.headers {
            request = request.with_headers(headers);
        }
        if let Some(state) = self.state {
            request = request.with_state(state);
        }
        request
    }
}

impl From<&str> for InjectOptions {
    fn from(url: &str) -> Self {
        Self::get(url)
    }
}

/// A request lifecycle host.
///
/// Plugins register extensions at checkpoints; `inject` runs one request
/// through every checkpoint and the matched route's handler.
pub struct Server {
    registrations: Vec<String>,
    extensions: HashMap<Checkpoint, ExtensionQueue>,
    routes: Vec<Route>,
    event_sink: Arc<dyn EventSink>,
}

impl Server {
    /// Creates a server with no plugins or routes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            extensions: HashMap::new(),
            routes: Vec::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Registers a plugin under its name.
    ///
    /// The name is recorded before the plugin runs, so the plugin sees itself
    /// in [`ExtensionHost::registrations`]. Registration is all-or-nothing: if
    /// the plugin fails, its name and every extension it added are removed.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::DuplicatePlugin` if the name is taken, or
    /// whatever error the plugin's own registration returns.
    pub fn register(
        &mut self,
        plugin: &dyn Plugin,
        options: serde_json::Value,
    ) -> Result<(), RecourierError> {
        let name = plugin.name().to_string();
        if name == ROOT_REALM || self.registrations.contains(&name) {
            return Err(RegistrationError::DuplicatePlugin { name }.into());
        }
        self.registrations.push(name.clone());

        let mut realm = Realm {
            server: self,
            name: name.clone(),
        };
        if let Err(err) = plugin.register(&mut realm, options) {
            let removed: usize = self
                .extensions
                .values_mut()
                .map(|queue| queue.remove_realm(&name))
                .sum();
            self.registrations.retain(|n| *n != name);
            warn!(
                plugin = %name,
                error = %err,
                removed_extensions = removed,
                "Plugin registration failed"
            );
            return Err(err);
        }

        info!(plugin = %name, "Plugin registered");
        Ok(())
    }

    /// Adds a route.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::InvalidRoute` for a malformed path.
    pub fn route(
        &mut self,
        method: &str,
        path: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<(), RecourierError> {
        self.routes.push(Route::new(method, path, handler)?);
        Ok(())
    }

    /// Returns the realms of the extensions at `checkpoint`, in execution order.
    #[must_use]
    pub fn extension_order(&self, checkpoint: Checkpoint) -> Vec<String> {
        self.extensions
            .get(&checkpoint)
            .map(ExtensionQueue::realms)
            .unwrap_or_default()
    }

    /// Runs a request through the full lifecycle.
    pub async fn inject(&self, options: impl Into<InjectOptions>) -> Response {
        let mut request = options.into().into_request();
        let span = info_span!(
            "request",
            request_id = %request.id(),
            method = %request.method(),
            path = %request.path(),
        );

        self.event_sink.record(
            Event::new(EventKind::RequestReceived, request.id()).with_data(serde_json::json!({
                "method": request.method(),
                "path": request.path(),
            })),
        );

        let response = self.lifecycle(&mut request).instrument(span).await;

        self.event_sink.record(
            Event::new(EventKind::RequestCompleted, request.id())
                .with_data(serde_json::json!({"status_code": response.status_code})),
        );

        response
    }

    async fn lifecycle(&self, request: &mut Request) -> Response {
        if let Some(response) = self.run_checkpoint(Checkpoint::OnRequest, request).await {
            return response;
        }

        let matched = self.routes.iter().find_map(|route| {
            route
                .matches(request.method(), request.path())
                .map(|params| (route, params))
        });
        let Some((route, params)) = matched else {
            debug!("No route matched");
            return Response::error(404, "Not Found");
        };
        request.params = match params {
            Ok(params) => params,
            Err(err) => {
                debug!(error = %err, "Undecodable path parameter");
                return Response::error(400, "Invalid request path");
            }
        };

        for checkpoint in [
            Checkpoint::OnPreAuth,
            Checkpoint::OnPostAuth,
            Checkpoint::OnPreHandler,
        ] {
            if let Some(response) = self.run_checkpoint(checkpoint, request).await {
                return response;
            }
        }

        let mut response = match route.handler.handle(request).await {
            Ok(response) => response,
            Err(err) => {
                error!(route = %route.path(), error = %err, "Handler failed");
                Response::error(500, err.to_string())
            }
        };

        for checkpoint in [Checkpoint::OnPostHandler, Checkpoint::OnPreResponse] {
            if let Some(takeover) = self.run_checkpoint(checkpoint, request).await {
                response = takeover;
            }
        }

        response
    }

    /// Runs every extension at `checkpoint`; returns a response if one of
    /// them ends the request.
    async fn run_checkpoint(&self, checkpoint: Checkpoint, request: &mut Request) -> Option<Response> {
        let queue = self.extensions.get(&checkpoint)?;

        for extension in queue.iter() {
            match extension.method.call(request).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Takeover(response)) => {
                    debug!(
                        checkpoint = %checkpoint,
                        realm = %extension.realm,
                        status_code = response.status_code,
                        "Extension took over the response"
                    );
                    return Some(response);
                }
                Err(err) => {
                    error!(
                        checkpoint = %checkpoint,
                        realm = %extension.realm,
                        error = %err,
                        "Extension failed"
                    );
                    self.event_sink.record(
                        Event::new(EventKind::ExtensionFailed, request.id()).with_data(
                            serde_json::json!({
                                "checkpoint": checkpoint.as_str(),
                                "realm": &extension.realm,
                                "error": err.to_string(),
                            }),
                        ),
                    );
                    return Some(Response::error(500, err.to_string()));
                }
            }
        }

        None
    }

    fn add_extension(
        &mut self,
        realm: &str,
        checkpoint: Checkpoint,
        method: Arc<dyn LifecycleMethod>,
        options: ExtOptions,
    ) -> Result<(), RecourierError> {
        let extension = RegisteredExtension {
            realm: realm.to_string(),
            options,
            method,
        };
        let queue = self.extensions.entry(checkpoint).or_default();
        queue.add(checkpoint, extension)?;

        debug!(
            realm = %realm,
            checkpoint = %checkpoint,
            queued = queue.len(),
            "Extension added"
        );
        Ok(())
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionHost for Server {
    fn registrations(&self) -> Vec<String> {
        self.registrations.clone()
    }

    fn ext(
        &mut self,
        checkpoint: Checkpoint,
        method: Arc<dyn LifecycleMethod>,
        options: ExtOptions,
    ) -> Result<(), RecourierError> {
        self.add_extension(ROOT_REALM, checkpoint, method, options)
    }
}

/// The server as seen by one plugin during registration.
struct Realm<'a> {
    server: &'a mut Server,
    name: String,
}

impl ExtensionHost for Realm<'_> {
    fn registrations(&self) -> Vec<String> {
        self.server.registrations()
    }

    fn ext(
        &mut self,
        checkpoint: Checkpoint,
        method: Arc<dyn LifecycleMethod>,
        options: ExtOptions,
    ) -> Result<(), RecourierError> {
        self.server.add_extension(&self.name, checkpoint, method, options)
    }
}
