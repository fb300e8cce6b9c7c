//! # Recourier
//!
//! Keeps selected request fields at their post-authentication values until
//! the route handler runs.
//!
//! Extensions installed by other plugins may rewrite `params`, `query`,
//! `payload` and friends between authentication and the handler. Recourier
//! captures the configured fields right after auth, binds the snapshot to
//! the request context where it can be read but not replaced, and writes the
//! captured values back just before the handler.
//!
//! - **Snapshot**: an [`snapshot::ImmutableBinding`] around a
//!   [`snapshot::ClosedContainer`]
//! - **Ordering**: capture runs before, and restore after, every plugin
//!   registered earlier
//! - **Host**: a small reference [`server::Server`] with named lifecycle
//!   checkpoints and `inject`
//!
//! ## Quick Start
//!
//! ```rust
//! use recourier::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mut server = Server::new();
//! server
//!     .register(&Recourier::new(), json!({"properties": ["params"]}))
//!     .unwrap();
//! server
//!     .route("GET", "/{id}", recourier::testing::echo_handler())
//!     .unwrap();
//!
//! let response = server.inject("/42").await;
//! assert_eq!(response.result["params"], json!({"id": "42"}));
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod plugin;
pub mod request;
pub mod server;
pub mod snapshot;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{RecourierOptions, DEFAULT_NAMESPACE};
    pub use crate::errors::{
        ConfigurationError, ContractErrorInfo, CycleDetectedError, RecourierError,
        RegistrationError, StructuralViolation,
    };
    pub use crate::events::{
        CollectingEventSink, Event, EventKind, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::logging::{init_tracing, LogFormat, LoggingConfig};
    pub use crate::plugin::{CaptureStage, Recourier, RestoreStage, PLUGIN_NAME};
    pub use crate::request::{AppContext, Request, RequestField};
    pub use crate::server::{
        Checkpoint, ExtOptions, ExtensionHost, FnExtension, FnHandler, Flow, InjectOptions,
        LifecycleMethod, Plugin, Response, RouteHandler, Server,
    };
    pub use crate::snapshot::{ClosedContainer, ImmutableBinding, SnapshotStore};
}
