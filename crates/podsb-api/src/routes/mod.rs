//! Route modules. Each exposes a `router()` merged in [`crate::app`].

pub mod media;
pub mod metrics;
