//! State enum for the link server lifecycle.

/// Current state of a [`LinkServer`](super::LinkServer).
///
/// The engine cycles `Listening` -> `Serving` -> `Listening` on its own as
/// clients come and go. Only an explicit `stop()` (or a fault while binding
/// or accepting) brings it back to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// No pipeline is active. `start()` is required before any client can
    /// connect.
    Idle,
    /// A pipeline was spawned and is binding its listening socket.
    Starting,
    /// Waiting for the next client to connect.
    Listening,
    /// Exactly one client session is open.
    Serving,
    /// An explicit stop is tearing the pipeline down.
    Stopping,
}

impl Default for LinkState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Starting => write!(f, "Starting"),
            Self::Listening => write!(f, "Listening"),
            Self::Serving => write!(f, "Serving"),
            Self::Stopping => write!(f, "Stopping"),
        }
    }
}
