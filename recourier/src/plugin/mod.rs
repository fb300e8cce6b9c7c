//! The recourier plugin.
//!
//! Registers two extensions:
//! - [`CaptureStage`] at `onPostAuth`, ordered before every other plugin
//! - [`RestoreStage`] at `onPreHandler`, ordered after every other plugin
//!
//! The order is computed once, from the plugins registered before recourier.
//! Plugins registered afterwards are not constrained.

mod capture;
pub mod order;
mod restore;

pub use capture::CaptureStage;
pub use order::OrderConstraints;
pub use restore::RestoreStage;

use crate::config::RecourierOptions;
use crate::errors::RecourierError;
use crate::events::{EventSink, NoOpEventSink};
use crate::server::{Checkpoint, ExtOptions, ExtensionHost, Plugin};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "recourier";

/// Checkpoint where the snapshot is captured.
pub const CAPTURE_CHECKPOINT: Checkpoint = Checkpoint::OnPostAuth;

/// Checkpoint where the snapshot is restored.
pub const RESTORE_CHECKPOINT: Checkpoint = Checkpoint::OnPreHandler;

/// Keeps protected request fields at their post-auth values until the
/// handler runs.
pub struct Recourier {
    event_sink: Arc<dyn EventSink>,
}

impl Recourier {
    /// Creates the plugin; events are discarded until a sink is set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Registers the capture and restore extensions with typed options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for invalid options, or the host's error
    /// if it rejects either extension.
    pub fn register_with(
        &self,
        host: &mut dyn ExtensionHost,
        options: RecourierOptions,
    ) -> Result<OrderConstraints, RecourierError> {
        options.validate()?;
        let options = Arc::new(options);
        let constraints = order::resolve(&host.registrations(), PLUGIN_NAME);

        host.ext(
            CAPTURE_CHECKPOINT,
            Arc::new(CaptureStage::new(options.clone(), self.event_sink.clone())),
            ExtOptions::new().before(constraints.before.iter().cloned()),
        )?;
        host.ext(
            RESTORE_CHECKPOINT,
            Arc::new(RestoreStage::new(options.clone(), self.event_sink.clone())),
            ExtOptions::new().after(constraints.after.iter().cloned()),
        )?;

        info!(
            namespace = %options.namespace,
            properties = options.properties.len(),
            constrained = constraints.before.len(),
            "Recourier registered"
        );
        Ok(constraints)
    }
}

impl Default for Recourier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Recourier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recourier").finish_non_exhaustive()
    }
}

impl Plugin for Recourier {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn register(
        &self,
        host: &mut dyn ExtensionHost,
        options: serde_json::Value,
    ) -> Result<(), RecourierError> {
        let options = RecourierOptions::from_value(options)?;
        self.register_with(host, options).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::MockExtensionHost;
    use crate::errors::CycleDetectedError;
    use mockall::predicate::{always, eq};
    use serde_json::json;

    fn registry(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_register_orders_against_others() {
        let mut host = MockExtensionHost::new();
        host.expect_registrations()
            .times(1)
            .returning(|| registry(&["baz-qux", "recourier", "err"]));
        host.expect_ext()
            .withf(|checkpoint, _, options| {
                *checkpoint == Checkpoint::OnPostAuth
                    && options.before == vec!["baz-qux", "err"]
                    && options.after.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        host.expect_ext()
            .withf(|checkpoint, _, options| {
                *checkpoint == Checkpoint::OnPreHandler
                    && options.after == vec!["baz-qux", "err"]
                    && options.before.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        Recourier::new()
            .register(&mut host, json!({"namespace": "foo", "properties": ["params"]}))
            .unwrap();
    }

    #[test]
    fn test_register_alone_is_unconstrained() {
        let mut host = MockExtensionHost::new();
        host.expect_registrations()
            .returning(|| registry(&["recourier"]));
        host.expect_ext()
            .withf(|_, _, options| options == &ExtOptions::default())
            .times(2)
            .returning(|_, _, _| Ok(()));

        let constraints = Recourier::new()
            .register_with(&mut host, RecourierOptions::default())
            .unwrap();
        assert_eq!(constraints, OrderConstraints::default());
    }

    #[test]
    fn test_invalid_options_register_nothing() {
        let mut host = MockExtensionHost::new();
        host.expect_registrations().never();
        host.expect_ext().never();

        let err = Recourier::new()
            .register(&mut host, json!({"properties": "params"}))
            .unwrap_err();
        assert!(matches!(err, RecourierError::Configuration(_)));
    }

    #[test]
    fn test_host_rejection_propagates() {
        let mut host = MockExtensionHost::new();
        host.expect_registrations().returning(Vec::new);
        host.expect_ext()
            .with(eq(Checkpoint::OnPostAuth), always(), always())
            .returning(|checkpoint, _, _| {
                Err(CycleDetectedError::new(checkpoint, vec!["x".into()]).into())
            });

        let err = Recourier::new()
            .register_with(&mut host, RecourierOptions::default())
            .unwrap_err();
        assert!(matches!(err, RecourierError::CycleDetected(_)));
    }
}
