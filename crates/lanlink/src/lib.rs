//! Single-client TCP link engine for LAN tools.
//!
//! This crate hosts exactly one TCP client at a time on a fixed port:
//!
//! - **Link server**: bind, accept one client, exchange payloads, and loop
//!   back to listening when the client goes away
//! - **Event sinks**: a narrow callback interface for everything observable
//! - **Network info**: host address discovery and interface change
//!   monitoring for operator display
//!
//! # Link Server
//!
//! The server is driven entirely by non-blocking calls and reports through
//! an [`EventSink`]:
//!
//! ```ignore
//! use std::sync::Arc;
//! use lanlink::{EventSink, LinkServer, LinkServerConfig};
//!
//! struct Console;
//!
//! impl EventSink for Console {
//!     fn on_connect(&self) { println!("client connected"); }
//!     fn on_receive(&self, text: &str) { println!("<- {text}"); }
//!     fn on_log(&self, line: &str) { println!("{line}"); }
//! }
//!
//! let server = LinkServer::new(LinkServerConfig::new("0.0.0.0", 5050));
//! server.set_event_sink(Arc::new(Console));
//! server.start();
//!
//! // Queue a payload for the connected client (no-op when nobody is
//! // connected):
//! server.send("hello");
//!
//! // Close the session and the listener:
//! server.stop();
//! ```
//!
//! `start()` spawns onto the ambient Tokio runtime, so it must be called
//! from within a runtime context; `send()` and `stop()` may be called from
//! any thread.
//!
//! # Message Boundaries
//!
//! Inbound bytes are split into messages by an idle-gap heuristic: a read
//! burst is accumulated for as long as more bytes are immediately
//! available, and flushed as one UTF-8 (lossy) message when the stream goes
//! quiet. Payloads sent back-to-back can coalesce into one message, and the
//! boundary depends on timing. Applications that need exact boundaries must
//! layer a framing protocol on top.
//!
//! # Host Addresses
//!
//! [`network_info::host_ip_report`] lists the private Class-C addresses a
//! LAN peer can reach this host at, and the same report is pushed through
//! `on_log` whenever the server starts listening.

mod error;
mod event;
pub mod network_info;
pub mod server;

pub use error::{NetworkError, Result};
pub use event::{EventSink, LinkEvent};

// Re-export commonly used types at the crate root
pub use server::{LinkServer, LinkServerConfig, LinkState};
