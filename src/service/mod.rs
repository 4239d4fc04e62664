//! Echo service: handlers, server lifecycle, supervision, activity log.

pub mod activity_log;
mod closable;
pub mod handler;
pub mod server;
pub mod supervisor;

pub use activity_log::ActivityLog;
pub use handler::{EchoHandler, GreeterHandler, acknowledge, isolate};
pub use server::EchoServer;
pub use supervisor::Supervisor;
