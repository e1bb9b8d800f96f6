//! Configuration for the link server.

use std::time::Duration;

/// Configuration for a [`LinkServer`](super::LinkServer).
#[derive(Clone, Debug)]
pub struct LinkServerConfig {
    /// The address to bind to.
    pub bind_address: String,
    /// The port to listen on. Port 0 binds an ephemeral port; the bound
    /// address is then available from `LinkServer::local_addr`.
    pub port: u16,
    /// Enable TCP_NODELAY (disable Nagle's algorithm) on accepted
    /// connections.
    pub no_delay: bool,
    /// Read chunk size in bytes for the session read loop. Must be at
    /// least 1.
    pub read_buffer_size: usize,
    /// Bounded grace applied to in-flight teardown: how long a replaced or
    /// stopped pipeline, or a session's writer task, may take to wind down
    /// before it is forced.
    pub stop_grace: Duration,
}

impl LinkServerConfig {
    /// Create a new server configuration.
    pub fn new(bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            no_delay: false,
            read_buffer_size: 8192,
            stop_grace: Duration::from_millis(500),
        }
    }

    /// Enable TCP_NODELAY for accepted connections.
    pub fn no_delay(mut self, enabled: bool) -> Self {
        self.no_delay = enabled;
        self
    }

    /// Set the read chunk size. A size of zero is clamped to 1: a zero-byte
    /// read buffer would make every read report end of stream.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Set the teardown grace period.
    pub fn stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Get the bind address string (address:port).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
