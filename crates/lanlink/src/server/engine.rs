//! The link server: a single-client accept/serve pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::config::LinkServerConfig;
use super::session::{self, Burst, Session};
use super::state::LinkState;
use crate::error::NetworkError;
use crate::event::{Emitter, EventSink, LinkEvent};
use crate::network_info;

/// Command sent to the engine's async task.
enum EngineCommand {
    Stop,
}

/// Internal state for the link server.
struct EngineInner {
    state: LinkState,
    /// Bumped by every `start()`. A pipeline task writes back into this
    /// struct only while its epoch is current, so a superseded task cannot
    /// clobber its successor.
    epoch: u64,
    command_tx: Option<mpsc::UnboundedSender<EngineCommand>>,
    /// Send handle into the live session's writer task, if a session is
    /// open.
    session_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    /// Event gate for the current pipeline. Cleared synchronously by
    /// `stop()` before the stop command is sent.
    live: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

/// A TCP server that hosts exactly one client at a time.
///
/// `start()` spawns a pipeline that binds the configured port, accepts one
/// connection, exchanges payloads with that client, and loops straight back
/// to listening when the client goes away. Serving ends only on `stop()` or
/// a listener fault. All calls return immediately; everything observable
/// arrives through the [`EventSink`] handed to
/// [`set_event_sink`](Self::set_event_sink).
///
/// # Events
///
/// - `Connected` / `Disconnected`: session lifecycle, strictly alternating
/// - `Received`: one inbound message per idle-gap burst, decoded as UTF-8
///   (lossy)
/// - `Sent`: an outbound payload, reported just before the write attempt
/// - `Error`: bind, accept, read, and write faults
/// - `Log`: operator-facing lines (host addresses, lifecycle notes)
///
/// # Example
///
/// ```ignore
/// let server = LinkServer::new(LinkServerConfig::new("0.0.0.0", 5050));
/// server.set_event_sink(Arc::new(MySink));
/// server.start();
///
/// // ... once a client is connected:
/// server.send("hello");
///
/// server.stop();
/// ```
///
/// `start()` must be called from within a Tokio runtime context.
pub struct LinkServer {
    config: LinkServerConfig,
    inner: Arc<Mutex<EngineInner>>,
    sink: Arc<Mutex<Option<Arc<dyn EventSink>>>>,
}

impl LinkServer {
    /// Create a new link server with the given configuration.
    pub fn new(config: LinkServerConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(EngineInner {
                state: LinkState::Idle,
                epoch: 0,
                command_tx: None,
                session_tx: None,
                live: Arc::new(AtomicBool::new(false)),
                task: None,
                local_addr: None,
            })),
            sink: Arc::new(Mutex::new(None)),
        }
    }

    /// Install the sink that receives all link events.
    ///
    /// Replaces any previously installed sink. Events emitted while no sink
    /// is installed are dropped.
    pub fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        *self.sink.lock() = Some(sink);
    }

    /// Remove the installed sink. Subsequent events are dropped.
    pub fn clear_event_sink(&self) {
        *self.sink.lock() = None;
    }

    /// Get the current server state.
    pub fn state(&self) -> LinkState {
        self.inner.lock().state
    }

    /// Check if the server is waiting for a client.
    pub fn is_listening(&self) -> bool {
        self.inner.lock().state == LinkState::Listening
    }

    /// Check if a client session is open.
    pub fn is_serving(&self) -> bool {
        self.inner.lock().state == LinkState::Serving
    }

    /// Get the configured bind address.
    pub fn bind_addr(&self) -> String {
        self.config.bind_addr()
    }

    /// Get the actual local address after the listener has bound.
    ///
    /// Returns `None` while no pipeline is listening. This is how the
    /// assigned port is discovered when binding to port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().local_addr
    }

    /// Start the server.
    ///
    /// If a pipeline is already running it is stopped first: each `start()`
    /// owns a fresh listener, command channel, and event gate. The new
    /// pipeline gives its predecessor the configured grace period to release
    /// the port before forcing it down.
    pub fn start(&self) {
        let mut inner = self.inner.lock();

        // Supersede any previous pipeline.
        inner.live.store(false, Ordering::SeqCst);
        if let Some(tx) = inner.command_tx.take() {
            let _ = tx.send(EngineCommand::Stop);
        }
        inner.session_tx = None;
        let prev_task = inner.task.take();

        inner.epoch += 1;
        let epoch = inner.epoch;
        let live = Arc::new(AtomicBool::new(true));
        inner.live = live.clone();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        inner.command_tx = Some(command_tx);
        inner.state = LinkState::Starting;
        inner.local_addr = None;

        let emitter = Emitter::new(self.sink.clone(), live);
        // Spawning while the lock is held serializes concurrent starts: the
        // task handle lands in `inner` before any later start() can take it
        // as the predecessor.
        let task = tokio::spawn(run_engine(
            self.config.clone(),
            self.inner.clone(),
            emitter,
            epoch,
            command_rx,
            prev_task,
        ));
        inner.task = Some(task);
    }

    /// Stop the server.
    ///
    /// Closes any live session and the listener, then returns immediately;
    /// teardown continues on the pipeline task, bounded by the configured
    /// grace period. Once this returns, no further `Connected`, `Received`,
    /// or `Sent` reaches the sink. Idempotent.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        // The gate closes before the command lands.
        inner.live.store(false, Ordering::SeqCst);
        inner.session_tx = None;
        if let Some(tx) = inner.command_tx.take() {
            let _ = tx.send(EngineCommand::Stop);
            if inner.state != LinkState::Idle {
                inner.state = LinkState::Stopping;
            }
        }
    }

    /// Queue a payload for the connected client.
    ///
    /// With no open session this is a silent no-op: nothing is written and
    /// no `Sent` or `Error` event is produced. Otherwise the payload is
    /// handed to the session's writer task, which reports it with a `Sent`
    /// event just before the write attempt.
    pub fn send(&self, data: impl Into<Vec<u8>>) {
        let session_tx = self.inner.lock().session_tx.clone();
        match session_tx {
            Some(tx) => {
                let _ = tx.send(data.into());
            }
            None => {
                tracing::trace!(target: "lanlink::server", "send ignored: no open session");
            }
        }
    }
}

impl Drop for LinkServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LinkServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkServer")
            .field("bind_addr", &self.config.bind_addr())
            .field("state", &self.state())
            .finish()
    }
}

/// One pipeline: bind once, then cycle accept -> serve until stopped.
async fn run_engine(
    config: LinkServerConfig,
    inner: Arc<Mutex<EngineInner>>,
    emitter: Emitter,
    epoch: u64,
    mut command_rx: mpsc::UnboundedReceiver<EngineCommand>,
    prev_task: Option<JoinHandle<()>>,
) {
    // Let the pipeline this one replaced finish closing its sockets before
    // rebinding, and force it down if it overstays the grace period.
    if let Some(prev) = prev_task {
        let abort = prev.abort_handle();
        if timeout(config.stop_grace, prev).await.is_err() {
            tracing::warn!(
                target: "lanlink::server",
                "superseded pipeline held on past {:?}, aborting it",
                config.stop_grace
            );
            abort.abort();
        }
    }

    if inner.lock().epoch != epoch {
        // A newer start() superseded this pipeline before it bound.
        return;
    }
    if !emitter.is_live() {
        // stop() arrived before the listener existed.
        finish(&inner, epoch);
        return;
    }

    // Bind the listener
    let listener = match TcpListener::bind(config.bind_addr()).await {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!(
                target: "lanlink::server",
                "failed to bind {}: {}",
                config.bind_addr(),
                e
            );
            emitter.emit(LinkEvent::Error(NetworkError::Bind(e.to_string())));
            finish(&inner, epoch);
            return;
        }
    };

    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            emitter.emit(LinkEvent::Error(NetworkError::Bind(format!(
                "failed to get local address: {e}"
            ))));
            finish(&inner, epoch);
            return;
        }
    };

    {
        let mut guard = inner.lock();
        if guard.epoch == epoch {
            guard.local_addr = Some(local_addr);
        }
    }
    tracing::info!(target: "lanlink::server", "listening on {}", local_addr);

    // Accept/serve cycle: one client at a time, back to listening when the
    // session ends. Clients arriving while a session is open wait in the OS
    // accept queue for the next cycle.
    loop {
        // A stop that landed while the previous session was tearing down is
        // honored here, before another listening cycle is announced.
        if !emitter.is_live() {
            emitter.log("Stopped accepting connections.");
            break;
        }
        set_state(&inner, epoch, LinkState::Listening);
        emitter.log("Waiting for a client to connect..");
        emitter.log(format!(
            "[Host IP information]\n{}",
            network_info::host_ip_report()
        ));

        let accepted = tokio::select! {
            cmd = command_rx.recv() => {
                match cmd {
                    Some(EngineCommand::Stop) | None => Err(NetworkError::Cancelled),
                }
            }
            result = listener.accept() => {
                result.map_err(|e| NetworkError::Accept(e.to_string()))
            }
        };

        let (stream, peer_addr) = match accepted {
            Ok(pair) => pair,
            Err(NetworkError::Cancelled) => {
                tracing::debug!(target: "lanlink::server", "accept wait cancelled");
                emitter.log("Stopped accepting connections.");
                break;
            }
            Err(e) => {
                tracing::warn!(target: "lanlink::server", "{}", e);
                emitter.emit(LinkEvent::Error(e));
                break;
            }
        };

        // Apply socket options
        if let Err(e) = stream.set_nodelay(config.no_delay) {
            tracing::debug!(target: "lanlink::server", "failed to set TCP_NODELAY: {}", e);
        }

        // The read loop stays inline so exactly one session runs at a time.
        // The send channel is published before Connected fires (a sink may
        // send from on_connect), but its writer task starts only after, so
        // no Sent can precede Connected.
        let (reader, writer) = stream.into_split();
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        {
            let mut guard = inner.lock();
            if guard.epoch == epoch {
                guard.session_tx = Some(writer_tx.clone());
            }
        }

        set_state(&inner, epoch, LinkState::Serving);
        // The gate decides here whether this session opens. When a stop
        // raced the accept, Connected is suppressed and the connection is
        // closed unserved with no Disconnected either: lifecycle events
        // stay paired.
        if !emitter.emit(LinkEvent::Connected) {
            let mut guard = inner.lock();
            if guard.epoch == epoch {
                guard.session_tx = None;
            }
            break;
        }
        tracing::info!(target: "lanlink::server", "client connected from {}", peer_addr);
        let writer_task = session::spawn_writer(writer, writer_rx, emitter.clone());

        let mut session = Session::new(reader, config.read_buffer_size);
        let mut stopped = false;
        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::Stop) | None => {
                            stopped = true;
                            break;
                        }
                    }
                }
                burst = session.next_burst() => {
                    match burst {
                        Burst::Message(text) => {
                            emitter.emit(LinkEvent::Received(text));
                        }
                        Burst::Eof(last) => {
                            if let Some(text) = last {
                                emitter.emit(LinkEvent::Received(text));
                            }
                            tracing::debug!(target: "lanlink::server", "peer closed the connection");
                            break;
                        }
                        Burst::Failed(e) => {
                            emitter.emit(LinkEvent::Error(NetworkError::SessionRead(e.to_string())));
                            break;
                        }
                    }
                }
            }
        }

        // Session teardown. The writer is joined (with grace, then force)
        // before Disconnected goes out, so no Sent can trail it.
        {
            let mut guard = inner.lock();
            if guard.epoch == epoch {
                guard.session_tx = None;
            }
        }
        drop(session);
        drop(writer_tx);
        let abort = writer_task.abort_handle();
        if timeout(config.stop_grace, writer_task).await.is_err() {
            abort.abort();
        }
        emitter.emit(LinkEvent::Disconnected);
        tracing::info!(target: "lanlink::server", "session with {} ended", peer_addr);

        if stopped {
            break;
        }
    }

    // The port is released before Idle becomes observable.
    drop(listener);
    finish(&inner, epoch);
}

fn set_state(inner: &Mutex<EngineInner>, epoch: u64, state: LinkState) {
    let mut guard = inner.lock();
    // Skipped once stop() has closed the gate, so a cycle that raced the
    // stop cannot report Listening/Serving on its way out.
    if guard.epoch == epoch && guard.live.load(Ordering::SeqCst) {
        guard.state = state;
    }
}

/// Final writeback for a pipeline that owned `epoch`.
fn finish(inner: &Mutex<EngineInner>, epoch: u64) {
    let mut guard = inner.lock();
    if guard.epoch == epoch {
        guard.state = LinkState::Idle;
        guard.command_tx = None;
        guard.session_tx = None;
        guard.local_addr = None;
    }
}
