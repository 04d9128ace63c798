//! # podsb-core -- Foundational Types for podsb
//!
//! podsb exposes remote media assets (YouTube videos) as locally cached,
//! sponsor-stripped audio files. This crate holds the primitives every other
//! crate in the workspace agrees on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A client-supplied id is a
//!    [`RawAssetId`]; only the id returned by the metadata service is a
//!    [`CanonicalAssetId`]. The cache and the lock registry accept nothing
//!    else, so locking on an unresolved id does not type-check.
//!
//! 2. **Explicit configuration.** [`ServiceConfig`] is built once at startup
//!    and handed to components by reference. Nothing below `main` reads the
//!    process environment.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `podsb-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod identity;

use std::future::Future;
use std::pin::Pin;

pub use config::{ConfigError, ServiceConfig};
pub use error::ValidationError;
pub use identity::{CanonicalAssetId, RawAssetId, ARTIFACT_EXTENSION};

/// Owned, sendable future returned by the object-safe collaborator traits
/// (existence checker, fetch pipeline).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
