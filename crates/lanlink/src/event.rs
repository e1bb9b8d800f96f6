//! Event model and the host notification contract.
//!
//! The engine reports everything that happens on the link as [`LinkEvent`]
//! values delivered through a host-supplied [`EventSink`]. Callbacks fire on
//! whichever internal task produced the event; hosts that render into a UI
//! are responsible for marshalling onto their own thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::NetworkError;

/// A lifecycle or traffic notification produced by the link server.
///
/// Within one session, `Connected` precedes every `Received` and `Sent`,
/// which in turn precede the session's single `Disconnected`. No ordering
/// stronger than that may be assumed, and events carry no retry or
/// sequencing metadata.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// A client connected and a session is now open.
    Connected,
    /// The current session ended (peer close, stream fault, or stop).
    Disconnected,
    /// A transport fault was converted to an event at the boundary where it
    /// occurred.
    Error(NetworkError),
    /// One inbound message, segmented by the idle-gap heuristic and decoded
    /// as UTF-8 with lossy replacement.
    Received(String),
    /// An outbound payload, reported immediately before the write attempt.
    Sent(String),
    /// An operator-facing log line (host addresses, lifecycle notes).
    Log(String),
}

impl LinkEvent {
    /// Routes this event to the matching [`EventSink`] callback.
    pub fn dispatch(&self, sink: &dyn EventSink) {
        match self {
            Self::Connected => sink.on_connect(),
            Self::Disconnected => sink.on_disconnect(),
            Self::Error(error) => sink.on_error(error),
            Self::Received(text) => sink.on_receive(text),
            Self::Sent(text) => sink.on_send(text),
            Self::Log(line) => sink.on_log(line),
        }
    }
}

/// Observer interface a host implements to receive link events.
///
/// Every method has a no-op default, so a host overrides only the callbacks
/// it renders. Implementations must be cheap or hand off to their own
/// executor: callbacks run inline on the engine's tasks.
pub trait EventSink: Send + Sync {
    /// A client connected.
    fn on_connect(&self) {}

    /// The session ended.
    fn on_disconnect(&self) {}

    /// A transport fault occurred. The session may still be open; see
    /// [`NetworkError`] for which faults end it.
    fn on_error(&self, _error: &NetworkError) {}

    /// A complete inbound message was decoded.
    fn on_receive(&self, _text: &str) {}

    /// An outbound payload is about to be written to the client.
    fn on_send(&self, _text: &str) {}

    /// An operator-facing log line.
    fn on_log(&self, _line: &str) {}
}

/// Shared emit path for the engine task and its writer tasks.
///
/// Holds the single host sink slot plus the per-pipeline gate that `stop()`
/// clears, so no `Connected`, `Received`, or `Sent` is delivered after
/// `stop()` returns. `Disconnected`, `Error`, and `Log` always pass through.
#[derive(Clone)]
pub(crate) struct Emitter {
    sink: Arc<Mutex<Option<Arc<dyn EventSink>>>>,
    live: Arc<AtomicBool>,
}

impl Emitter {
    pub(crate) fn new(sink: Arc<Mutex<Option<Arc<dyn EventSink>>>>, live: Arc<AtomicBool>) -> Self {
        Self { sink, live }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Deliver an event, unless the gate suppresses it.
    ///
    /// Returns whether the event passed the gate. The engine keys the
    /// serve-or-close decision for a freshly accepted connection off the
    /// `Connected` return, so the suppression check and that decision are a
    /// single atomic read.
    pub(crate) fn emit(&self, event: LinkEvent) -> bool {
        if !self.is_live()
            && matches!(
                event,
                LinkEvent::Connected | LinkEvent::Received(_) | LinkEvent::Sent(_)
            )
        {
            return false;
        }
        // Clone the sink out so callbacks never run under the slot lock.
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            event.dispatch(&*sink);
        }
        true
    }

    pub(crate) fn log(&self, line: impl Into<String>) {
        self.emit(LinkEvent::Log(line.into()));
    }
}
