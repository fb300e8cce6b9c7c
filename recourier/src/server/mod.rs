//! A compact request lifecycle host.
//!
//! This module provides:
//! - Named lifecycle checkpoints
//! - The `ExtensionHost` surface plugins register against
//! - Per-checkpoint ordering with before/after realm constraints
//! - A `Server` with routing and request injection

mod host;
mod lifecycle;
mod ordering;
mod router;

pub use host::{InjectOptions, Server, ROOT_REALM};
pub use lifecycle::{FnExtension, FnHandler, Flow, LifecycleMethod, Response, RouteHandler};
pub use router::ANY_METHOD;

use crate::errors::RecourierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A named point in the request lifecycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Checkpoint {
    /// Before routing.
    OnRequest,
    /// After routing, before authentication.
    OnPreAuth,
    /// After authentication and authorization.
    OnPostAuth,
    /// Immediately before the route handler.
    OnPreHandler,
    /// After the route handler.
    OnPostHandler,
    /// Before the response is returned.
    OnPreResponse,
}

impl Checkpoint {
    /// Every checkpoint, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::OnRequest,
        Self::OnPreAuth,
        Self::OnPostAuth,
        Self::OnPreHandler,
        Self::OnPostHandler,
        Self::OnPreResponse,
    ];

    /// Returns the checkpoint's name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnRequest => "onRequest",
            Self::OnPreAuth => "onPreAuth",
            Self::OnPostAuth => "onPostAuth",
            Self::OnPreHandler => "onPreHandler",
            Self::OnPostHandler => "onPostHandler",
            Self::OnPreResponse => "onPreResponse",
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative ordering constraints for an extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtOptions {
    /// Realms whose extensions at the same checkpoint must run after this one.
    #[serde(default)]
    pub before: Vec<String>,
    /// Realms whose extensions at the same checkpoint must run before this one.
    #[serde(default)]
    pub after: Vec<String>,
}

impl ExtOptions {
    /// Creates unconstrained options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs before the given realms.
    #[must_use]
    pub fn before(mut self, realms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.before.extend(realms.into_iter().map(Into::into));
        self
    }

    /// Runs after the given realms.
    #[must_use]
    pub fn after(mut self, realms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.after.extend(realms.into_iter().map(Into::into));
        self
    }
}

/// What a plugin sees of the server while it registers.
#[cfg_attr(test, mockall::automock)]
pub trait ExtensionHost {
    /// Names of every plugin registered so far, the caller included.
    fn registrations(&self) -> Vec<String>;

    /// Registers a callback at a checkpoint.
    fn ext(
        &mut self,
        checkpoint: Checkpoint,
        method: Arc<dyn LifecycleMethod>,
        options: ExtOptions,
    ) -> Result<(), RecourierError>;
}

/// A unit of server behavior registered under a unique name.
pub trait Plugin: Send + Sync {
    /// The plugin's unique name; also its realm for ordering.
    fn name(&self) -> &str;

    /// Registers the plugin's extensions.
    fn register(
        &self,
        host: &mut dyn ExtensionHost,
        options: serde_json::Value,
    ) -> Result<(), RecourierError>;
}
