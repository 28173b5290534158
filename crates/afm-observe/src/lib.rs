//! Observability setup for AFM: tracing subscriber, log file routing and
//! optional OpenTelemetry export.

pub mod tracing_setup;
