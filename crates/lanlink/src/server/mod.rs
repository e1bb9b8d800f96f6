//! Single-client TCP link server.
//!
//! The server binds one port and hosts one client at a time. Its lifecycle
//! is a cycle: listen, serve the connected client, and return to listening
//! when that client goes away. See [`LinkServer`] for the full contract.

mod config;
mod engine;
mod session;
mod state;

pub use config::LinkServerConfig;
pub use engine::LinkServer;
pub use state::LinkState;
