//! # taskecho-rs
//!
//! gRPC echo service for pipeline task observations.
//!
//! A caller submits a `TaskObservation` describing one lifecycle event of a
//! pipeline task; the server acknowledges it with an `Action` whose
//! `observation_event_id` equals the observation's `event_id`. Provides the
//! wire schema (prost), the server with its lifecycle and supervisor, a
//! lenient client helper, and OpenTelemetry observability.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod proto;
pub mod service;
pub mod telemetry;
