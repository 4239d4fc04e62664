//! Service lifecycle model.
//!
//! An echo server instance walks Stopped → Starting → Running → Stopping →
//! Stopped exactly once. Restarting means building a fresh instance.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an echo server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Not listening. Initial state, and terminal once the instance has run.
    Stopped,
    /// Binding the configured address.
    Starting,
    /// Listener accepting connections.
    Running,
    /// Draining in-flight calls before releasing the listener.
    Stopping,
}

impl ServiceState {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, to),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Stopped)   // bind failed
                | (Running, Stopping)
                | (Stopping, Stopped)
        )
    }

    /// Is the listener bound in this state?
    pub fn is_serving(self) -> bool {
        matches!(self, ServiceState::Running | ServiceState::Stopping)
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceState::Stopped => "stopped",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Stopping => "stopping",
        };
        write!(f, "{s}")
    }
}
