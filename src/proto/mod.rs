//! Wire schema and gRPC bindings, generated from `proto/` at build time.
//!
//! Messages follow proto3 rules: every field has a zero value, unset fields
//! are never distinguished from zero on the wire, and unknown tags are
//! skipped on decode. Each message also derives serde with `#[serde(default)]`.
//!
//! ```rust,ignore
//! use taskecho_rs::proto::TaskObservation;
//!
//! let obs = TaskObservation {
//!     event_id: "e1".to_string(),
//!     event_type: "task_start".to_string(),
//!     ..Default::default()
//! };
//! ```

#![allow(clippy::derive_partial_eq_without_eq)]

/// Task observation contract.
pub mod nf_ai_comms {
    tonic::include_proto!("nf_ai_comms");
}

/// Greeter demo contract.
pub mod dummy {
    tonic::include_proto!("dummy");
}

pub use dummy::greeter_client::GreeterClient;
pub use dummy::greeter_server::{Greeter, GreeterServer};
pub use dummy::{HelloReply, HelloRequest};
pub use nf_ai_comms::ai_action_service_client::AiActionServiceClient;
pub use nf_ai_comms::ai_action_service_server::{AiActionService, AiActionServiceServer};
pub use nf_ai_comms::{Action, TaskObservation};
