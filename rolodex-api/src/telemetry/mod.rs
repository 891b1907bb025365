//! Rolodex Telemetry - Logging Infrastructure
//!
//! Structured logging through `tracing`, plus a request middleware that
//! wraps every HTTP call in a span and logs its outcome.

pub mod middleware;
pub mod tracer;

pub use middleware::{normalize_path, observability_middleware};
pub use tracer::{init_tracing, LogFormat, TelemetryConfig};
