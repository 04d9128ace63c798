//! Tower middleware for the podsb API.

pub mod metrics;
pub mod tracing_layer;
