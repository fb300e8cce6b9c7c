//! Snapshot storage.
//!
//! This module provides two independent immutability primitives and the
//! snapshot built from them:
//! - `ImmutableBinding`: a slot that can never be reassigned or removed
//! - `ClosedContainer`: a field set that can be closed against new fields
//! - `SnapshotStore`: captured request fields, bound and closed

mod binding;
mod container;
mod store;

pub use binding::ImmutableBinding;
pub use container::ClosedContainer;
pub use store::{SnapshotStore, REQUEST_KEY};
