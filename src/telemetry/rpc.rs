//! RPC span helpers.
//!
//! Span fields follow the OpenTelemetry RPC conventions:
//! - `rpc.system`
//! - `rpc.service`
//! - `rpc.method`

use crate::proto::AiActionServiceServer;
use crate::service::EchoHandler;
use tonic::server::NamedService;
use tracing::Span;

const SERVICE_NAME: &str = <AiActionServiceServer<EchoHandler> as NamedService>::NAME;

/// Start a span for one `SendTaskObservation` call.
///
/// `action.id` is declared empty and filled once the action is built.
pub fn start_observation_span(event_id: &str, event_type: &str) -> Span {
    tracing::info_span!(
        "rpc.send_task_observation",
        "rpc.system" = "grpc",
        "rpc.service" = SERVICE_NAME,
        "rpc.method" = "SendTaskObservation",
        "observation.event_id" = event_id,
        "observation.event_type" = event_type,
        "action.id" = tracing::field::Empty,
    )
}

/// Record the generated action id on an observation span.
pub fn record_action_id(span: &Span, action_id: &str) {
    span.record("action.id", action_id);
}

/// Record a server lifecycle transition.
///
/// Emits a tracing `info` event and bumps the transition counter.
pub fn record_state_transition(from: &str, to: &str) {
    tracing::info!(from = from, to = to, "state_transition");
    super::metrics::server_state_transitions().add(
        1,
        &[
            opentelemetry::KeyValue::new("from", from.to_string()),
            opentelemetry::KeyValue::new("to", to.to_string()),
        ],
    );
}
