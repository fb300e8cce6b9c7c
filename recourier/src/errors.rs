//! Error types for recourier.
//!
//! Structural violations are the errors extensions see when they tamper with
//! a snapshot. Their messages are deterministic so that callers can tell an
//! illegal reassignment of the binding apart from an illegal addition to the
//! closed container.

use crate::server::Checkpoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for recourier operations.
#[derive(Debug, Error)]
pub enum RecourierError {
    /// Invalid plugin options.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// An illegal mutation of a binding or closed container.
    #[error("{0}")]
    Structural(#[from] StructuralViolation),

    /// Contradictory ordering constraints at a checkpoint.
    #[error("{0}")]
    CycleDetected(#[from] CycleDetectedError),

    /// A plugin or route could not be registered.
    #[error("{0}")]
    Registration(#[from] RegistrationError),
}

/// Metadata about an error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "RECOURIER-ORDER-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when plugin options are invalid.
#[derive(Debug, Clone, Error)]
#[error("Invalid recourier options: {message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The offending option, if known.
    pub field: Option<String>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Sets the offending option.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Error raised on an illegal mutation of a binding or a closed container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralViolation {
    /// Assignment to a key held by an immutable binding.
    #[error("Cannot assign to read only property '{key}' of request context")]
    ReadOnlyBinding {
        /// The bound key.
        key: String,
    },

    /// Deletion of a key held by an immutable binding.
    #[error("Cannot delete read only property '{key}' of request context")]
    UndeletableBinding {
        /// The bound key.
        key: String,
    },

    /// A second binding for a key that is already present.
    #[error("Cannot redefine property: {key}")]
    Redefine {
        /// The key that already exists.
        key: String,
    },

    /// Addition of a new field to a closed container.
    #[error("Cannot add property {key}, object is not extensible")]
    NotExtensible {
        /// The rejected field.
        key: String,
    },

    /// Removal of a field from a closed container.
    #[error("Cannot delete property '{key}' of sealed object")]
    SealedField {
        /// The rejected field.
        key: String,
    },

    /// A container finalized twice.
    #[error("Cannot close an object that is already closed")]
    AlreadyClosed,
}

impl StructuralViolation {
    /// Returns true for violations of an immutable binding.
    #[must_use]
    pub const fn is_binding_violation(&self) -> bool {
        matches!(
            self,
            Self::ReadOnlyBinding { .. } | Self::UndeletableBinding { .. } | Self::Redefine { .. }
        )
    }

    /// Returns true for violations of a closed container's shape.
    #[must_use]
    pub const fn is_closure_violation(&self) -> bool {
        matches!(
            self,
            Self::NotExtensible { .. } | Self::SealedField { .. } | Self::AlreadyClosed
        )
    }

    /// Returns the key involved, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::ReadOnlyBinding { key }
            | Self::UndeletableBinding { key }
            | Self::Redefine { key }
            | Self::NotExtensible { key }
            | Self::SealedField { key } => Some(key),
            Self::AlreadyClosed => None,
        }
    }
}

/// Error raised when ordering constraints at a checkpoint form a cycle.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected at {checkpoint}: {}", .cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The checkpoint whose extensions could not be ordered.
    pub checkpoint: Checkpoint,
    /// The realms forming the cycle.
    pub cycle_path: Vec<String>,
    /// Error diagnostics.
    pub error_info: ContractErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(checkpoint: Checkpoint, cycle_path: Vec<String>) -> Self {
        let info = ContractErrorInfo::new(
            "RECOURIER-ORDER-CYCLE",
            format!(
                "Extensions at {checkpoint} have contradictory ordering: {}",
                cycle_path.join(" -> ")
            ),
        )
        .with_fix_hint("Remove one of the before/after constraints in the cycle.")
        .with_context_entry("checkpoint", checkpoint.to_string());

        Self {
            checkpoint,
            cycle_path,
            error_info: info,
        }
    }
}

/// Errors raised while registering plugins and routes.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    /// A plugin with the same name is already registered.
    #[error("Plugin {name} already registered")]
    DuplicatePlugin {
        /// The plugin name.
        name: String,
    },

    /// A route path template could not be compiled.
    #[error("Invalid route path {path}: {reason}")]
    InvalidRoute {
        /// The route path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}
