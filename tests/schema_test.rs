//! Wire schema tests: proto3 defaults, round trips, unknown-field tolerance.

use prost::Message;
use taskecho_rs::proto::{Action, TaskObservation};

#[test]
fn observation_fields_are_accessible() {
    let obs = TaskObservation {
        event_id: "obs_123".to_string(),
        event_type: "task_start".to_string(),
        timestamp_iso: "2023-10-27T10:00:00Z".to_string(),
        pipeline_name: "test_pipeline".to_string(),
        process_name: "test_process".to_string(),
        task_id_num: 1,
        task_hash: "abcdef123456".to_string(),
        task_name: "test_process (1)".to_string(),
        native_id: "native_001".to_string(),
        status: "RUNNING".to_string(),
        ..Default::default()
    };

    assert_eq!(obs.event_id, "obs_123");
    assert_eq!(obs.task_name, "test_process (1)");
    // Completion-only fields untouched on a start event
    assert_eq!(obs.exit_code, 0);
    assert_eq!(obs.duration_ms, 0);
}

#[test]
fn unset_exit_code_decodes_as_zero() {
    let obs = TaskObservation {
        event_id: "no_exit".to_string(),
        event_type: "task_start".to_string(),
        ..Default::default()
    };

    let decoded = TaskObservation::decode(obs.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded.exit_code, 0);
    assert_eq!(decoded.peak_rss_bytes, 0);
    assert_eq!(decoded.cpu_time_seconds, 0.0);
    assert_eq!(decoded.error_message, "");
}

#[test]
fn serialized_observation_round_trips() {
    let obs = TaskObservation {
        event_id: "obs_serialize_test".to_string(),
        event_type: "task_complete".to_string(),
        timestamp_iso: "2024-05-01T12:00:00Z".to_string(),
        pipeline_name: "serialize_pipeline".to_string(),
        process_name: "serialize_process".to_string(),
        task_id_num: 10,
        exit_code: 0,
        duration_ms: 1000,
        ..Default::default()
    };

    let bytes = obs.encode_to_vec();
    assert!(!bytes.is_empty());

    let decoded = TaskObservation::decode(bytes.as_slice()).unwrap();
    assert_eq!(decoded.event_id, "obs_serialize_test");
    assert_eq!(decoded.event_type, "task_complete");
    assert_eq!(decoded.pipeline_name, "serialize_pipeline");
    assert_eq!(decoded.task_id_num, 10);
    assert_eq!(decoded.duration_ms, 1000);
    assert_eq!(decoded, obs);
}

#[test]
fn fully_populated_observation_round_trips() {
    let obs = TaskObservation {
        event_id: "full".to_string(),
        event_type: "task_complete".to_string(),
        timestamp_iso: "2024-05-01T12:00:00.123456Z".to_string(),
        pipeline_name: "rnaseq".to_string(),
        process_name: "ALIGN".to_string(),
        task_id_num: 42,
        task_hash: "ab/cdef12".to_string(),
        task_name: "ALIGN (sample_1)".to_string(),
        native_id: "31337".to_string(),
        status: "COMPLETED".to_string(),
        exit_code: -1,
        duration_ms: 98_765,
        peak_rss_bytes: 3_221_225_472,
        cpu_time_seconds: 12.75,
        error_message: "none".to_string(),
        work_dir: "/work/ab/cdef12".to_string(),
        container_id: "c0ffee".to_string(),
        container_engine: "docker".to_string(),
        script_id: "s1".to_string(),
        script_hash: "deadbeef".to_string(),
    };

    let decoded = TaskObservation::decode(obs.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded, obs);
}

/// A newer peer's message: same leading fields plus one this build lacks.
#[derive(Clone, PartialEq, ::prost::Message)]
struct FutureObservation {
    #[prost(string, tag = "1")]
    event_id: String,
    #[prost(string, tag = "2")]
    event_type: String,
    #[prost(string, tag = "99")]
    scheduler_hint: String,
}

#[test]
fn unknown_fields_are_ignored() {
    let newer = FutureObservation {
        event_id: "fwd".to_string(),
        event_type: "task_start".to_string(),
        scheduler_hint: "gpu".to_string(),
    };

    let decoded = TaskObservation::decode(newer.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded.event_id, "fwd");
    assert_eq!(decoded.event_type, "task_start");
    assert_eq!(decoded.status, "");
}

#[test]
fn older_peer_sees_zero_values_for_missing_fields() {
    let obs = TaskObservation {
        event_id: "bwd".to_string(),
        task_id_num: 7,
        ..Default::default()
    };

    let older = FutureObservation::decode(obs.encode_to_vec().as_slice()).unwrap();
    assert_eq!(older.event_id, "bwd");
    assert_eq!(older.scheduler_hint, "");
}

#[test]
fn action_round_trips() {
    let action = Action {
        observation_event_id: "obs_123".to_string(),
        action_id: "act_789".to_string(),
        action_details: "echo_received_and_processed".to_string(),
        success: true,
        message: "Observation processed successfully.".to_string(),
    };

    let decoded = Action::decode(action.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded, action);
}

#[test]
fn json_with_missing_fields_uses_zero_values() {
    let obs: TaskObservation =
        serde_json::from_str(r#"{"event_id": "j1", "duration_ms": 250}"#).unwrap();
    assert_eq!(obs.event_id, "j1");
    assert_eq!(obs.duration_ms, 250);
    assert_eq!(obs.exit_code, 0);
    assert_eq!(obs.pipeline_name, "");
}

#[test]
fn generated_services_use_contract_names() {
    use taskecho_rs::proto::{AiActionServiceServer, GreeterServer};
    use taskecho_rs::service::{EchoHandler, GreeterHandler};
    use tonic::server::NamedService;

    assert_eq!(
        <AiActionServiceServer<EchoHandler> as NamedService>::NAME,
        "nf_ai_comms.AiActionService"
    );
    assert_eq!(
        <GreeterServer<GreeterHandler> as NamedService>::NAME,
        "dummy.Greeter"
    );
}

#[test]
fn supplemented_fields_are_on_the_wire() {
    let obs = TaskObservation {
        event_id: "container".to_string(),
        error_message: "oom".to_string(),
        container_engine: "docker".to_string(),
        script_hash: "beef".to_string(),
        ..Default::default()
    };
    let decoded = TaskObservation::decode(obs.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded, obs);

    let json = serde_json::to_value(&decoded).unwrap();
    assert_eq!(json["container_engine"], "docker");
    assert_eq!(json["exit_code"], 0);
}
