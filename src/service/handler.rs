//! Request handlers: observation acknowledgment and the greeter demo.

use crate::proto::{
    Action, AiActionService, Greeter, HelloReply, HelloRequest, TaskObservation,
};
use crate::telemetry::metrics;
use crate::telemetry::rpc::{record_action_id, start_observation_span};
use opentelemetry::KeyValue;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonic::{Request, Response, Status};
use tracing::{Instrument, error, info};
use uuid::Uuid;

use super::activity_log::ActivityLog;

pub const ACTION_MESSAGE: &str = "Successfully processed TaskObservation";

/// Build the acknowledgment for an observation.
///
/// Unconditional: no field of the observation changes the outcome, and the
/// action id is never derived from input.
pub fn acknowledge(observation: &TaskObservation) -> Action {
    Action {
        observation_event_id: observation.event_id.clone(),
        action_id: format!("act_{}", Uuid::new_v4()),
        action_details: format!(
            "Action for event {}: Processed event type '{}'",
            observation.event_id, observation.event_type
        ),
        success: true,
        message: ACTION_MESSAGE.to_string(),
    }
}

/// Run handler work on its own task so a panic fails only this call.
pub async fn isolate<F, T>(work: F) -> Result<T, Status>
where
    F: Future<Output = Result<T, Status>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            error!("handler panicked");
            Err(Status::internal("handler panicked"))
        }
        Err(e) => Err(Status::internal(format!("handler aborted: {e}"))),
    }
}

/// `AiActionService` implementation.
#[derive(Debug, Clone, Default)]
pub struct EchoHandler {
    activity_log: Option<Arc<ActivityLog>>,
    response_delay: Option<Duration>,
}

impl EchoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity_log(mut self, log: Arc<ActivityLog>) -> Self {
        self.activity_log = Some(log);
        self
    }

    pub fn response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }

    async fn handle(self, observation: TaskObservation) -> Result<Action, Status> {
        info!(
            pipeline = %observation.pipeline_name,
            process = %observation.process_name,
            task = %observation.task_name,
            "received task observation"
        );
        metrics::observations_received().add(
            1,
            &[KeyValue::new("event_type", observation.event_type.clone())],
        );
        if let Some(log) = &self.activity_log {
            log.record(&format!(
                "Received TaskObservation: event_id={}, event_type={}",
                observation.event_id, observation.event_type
            ))
            .await;
        }

        if let Some(delay) = self.response_delay {
            tokio::time::sleep(delay).await;
        }

        let action = acknowledge(&observation);
        info!(action_id = %action.action_id, "sending action");
        if let Some(log) = &self.activity_log {
            log.record(&format!("Sending Action: action_id={}", action.action_id))
                .await;
        }
        Ok(action)
    }
}

#[tonic::async_trait]
impl AiActionService for EchoHandler {
    async fn send_task_observation(
        &self,
        request: Request<TaskObservation>,
    ) -> Result<Response<Action>, Status> {
        let start = Instant::now();
        let observation = request.into_inner();
        let span = start_observation_span(&observation.event_id, &observation.event_type);

        let handler = self.clone();
        let result = isolate(handler.handle(observation).instrument(span.clone())).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::actions_sent().add(1, &[KeyValue::new("result", outcome)]);
        metrics::rpc_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("method", "SendTaskObservation")],
        );

        let action = result?;
        record_action_id(&span, &action.action_id);
        Ok(Response::new(action))
    }
}

/// `Greeter` implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreeterHandler;

#[tonic::async_trait]
impl Greeter for GreeterHandler {
    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        let name = request.into_inner().name;
        info!(%name, "received hello");
        Ok(Response::new(HelloReply {
            message: format!("Hello, {name}!"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledge_ignores_status_and_event_type() {
        for (event_type, status) in [("task_start", "RUNNING"), ("task_complete", "FAILED")] {
            let obs = TaskObservation {
                event_id: "e9".to_string(),
                event_type: event_type.to_string(),
                status: status.to_string(),
                exit_code: 137,
                ..Default::default()
            };
            let action = acknowledge(&obs);
            assert!(action.success);
            assert_eq!(action.observation_event_id, "e9");
            assert_eq!(action.message, ACTION_MESSAGE);
            assert!(action.action_details.contains(event_type));
        }
    }

    #[test]
    fn action_id_is_not_derived_from_event_id() {
        let obs = TaskObservation {
            event_id: "act_fixed".to_string(),
            ..Default::default()
        };
        let action = acknowledge(&obs);
        assert!(action.action_id.starts_with("act_"));
        assert_ne!(action.action_id, obs.event_id);
    }

    #[tokio::test]
    async fn isolate_turns_panic_into_internal_status() {
        let result = isolate(async {
            let empty: Vec<u8> = Vec::new();
            Ok::<_, Status>(empty[0])
        })
        .await;
        let status = result.unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);

        let ok = isolate(async { Ok::<_, Status>(7) }).await.unwrap();
        assert_eq!(ok, 7);
    }

    #[tokio::test]
    async fn response_delay_is_applied() {
        let handler = EchoHandler::new().response_delay(Duration::from_millis(30));
        let start = Instant::now();
        let response = handler
            .send_task_observation(Request::new(TaskObservation {
                event_id: "slow".to_string(),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(response.into_inner().observation_event_id, "slow");
    }
}
