//! Ready-made referents with an atomic claim count, whose handles can be
//! shared between threads.
//!
//! This module is only included when the "sync" feature is enabled, but that feature is enabled by default.

pub use crate::macroed::sync::*;

unsafe impl<T: Sync + Send> Sync for RefCounted<T> {}
