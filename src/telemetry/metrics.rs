//! Metric instrument factories for taskecho-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"taskecho-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for taskecho-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("taskecho-rs")
}

/// Counter: task observations received.
/// Labels: `event_type`.
pub fn observations_received() -> Counter<u64> {
    meter()
        .u64_counter("taskecho.observations.received")
        .with_description("Number of task observations received")
        .build()
}

/// Counter: actions returned to callers.
/// Labels: `result` ("ok" | "error").
pub fn actions_sent() -> Counter<u64> {
    meter()
        .u64_counter("taskecho.actions.sent")
        .with_description("Number of actions returned")
        .build()
}

/// Counter: server lifecycle transitions.
/// Labels: `from`, `to`.
pub fn server_state_transitions() -> Counter<u64> {
    meter()
        .u64_counter("taskecho.server.state_transitions")
        .with_description("Number of echo server lifecycle transitions")
        .build()
}

/// Histogram: handler duration in milliseconds.
/// Labels: `method`.
pub fn rpc_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("taskecho.rpc.duration_ms")
        .with_description("RPC handler duration in milliseconds")
        .with_unit("ms")
        .build()
}
