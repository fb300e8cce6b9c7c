//! Testing utilities for servers using recourier.
//!
//! This module provides:
//! - A configurable test plugin and an echo route fixture
//! - Mock extensions that mutate, record, or tamper with requests
//! - Assertions for injected responses

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_response_error, assert_response_ok};
pub use fixtures::{echo_handler, echo_server, TestPlugin, ECHO_PATH};
pub use mocks::{CallLog, MutatingExtension, RecordingExtension, Tamper, TamperingExtension};
