//! Session I/O: the idle-gap framed read loop and the writer task.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::NetworkError;
use crate::event::{Emitter, LinkEvent};

/// Byte source the session read loop runs against.
///
/// `recv` parks until bytes, EOF, or a fault arrive. `try_recv` checks for
/// bytes the OS has already buffered without waiting; `Ok(None)` means the
/// stream is currently quiet. The split is what makes the idle-gap heuristic
/// testable: production wraps a TCP read half, unit tests script the check
/// outcomes.
pub(crate) trait SessionStream: Send {
    /// Wait for the next chunk. `Ok(0)` reports an orderly EOF.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Check for immediately available bytes. `Ok(Some(0))` reports EOF.
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

impl SessionStream for OwnedReadHalf {
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf).await
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.try_read(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Drain passes allowed per burst. A stream that stays readable past the
/// cap is flushed early, so a peer that never goes quiet still yields
/// messages, a bounded accumulator, and control back to the caller.
const MAX_DRAIN_PASSES: usize = 64;

/// Outcome of one pass of the burst loop.
#[derive(Debug)]
pub(crate) enum Burst {
    /// An idle gap followed the accumulated bytes; they form one message.
    Message(String),
    /// The peer closed the stream in an orderly way. Bytes accumulated in
    /// the same burst as the close are flushed as a final message.
    Eof(Option<String>),
    /// The stream faulted. Accumulated bytes are discarded.
    Failed(io::Error),
}

/// The inbound half of one accepted connection.
///
/// Groups raw reads into messages with the idle-gap heuristic: bytes are
/// accumulated for as long as more are immediately available, and the
/// accumulated run is flushed as one message the moment the stream goes
/// quiet, or once the burst spans [`MAX_DRAIN_PASSES`] back-to-back reads.
/// Two payloads separated by a sufficient pause arrive as two messages; two
/// sent back-to-back may arrive as one. Callers wanting exact boundaries
/// must put a framing protocol on top.
pub(crate) struct Session<S> {
    reader: S,
    buffer: BytesMut,
    chunk: Vec<u8>,
}

impl<S: SessionStream> Session<S> {
    pub(crate) fn new(reader: S, read_buffer_size: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(read_buffer_size),
            chunk: vec![0u8; read_buffer_size],
        }
    }

    /// Wait for and return the next complete burst.
    ///
    /// Cancel-safe: the only await is the initial blocking read, and
    /// cancelling it consumes no bytes. The accumulator is always empty on
    /// entry because every exit path either flushed or discarded it.
    pub(crate) async fn next_burst(&mut self) -> Burst {
        let n = match self.reader.recv(&mut self.chunk).await {
            Ok(0) => return Burst::Eof(None),
            Ok(n) => n,
            Err(e) => return Burst::Failed(e),
        };
        self.buffer.extend_from_slice(&self.chunk[..n]);

        // Drain whatever the OS already buffered before declaring the
        // message complete. The pass cap keeps a stream that is never quiet
        // from pinning this loop.
        for _ in 0..MAX_DRAIN_PASSES {
            match self.reader.try_recv(&mut self.chunk) {
                Ok(Some(0)) => return Burst::Eof(Some(self.take_message())),
                Ok(Some(n)) => self.buffer.extend_from_slice(&self.chunk[..n]),
                Ok(None) => return Burst::Message(self.take_message()),
                Err(e) => return Burst::Failed(e),
            }
        }
        Burst::Message(self.take_message())
    }

    fn take_message(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        text
    }
}

/// Spawn the writer task for one session.
///
/// The task owns the write half and drains `rx` in order, reporting each
/// payload with a `Sent` event immediately before the write attempt. A
/// failed write is reported as a `SessionWrite` error and the task keeps
/// going: only the read loop (or an explicit stop) ends a session. The task
/// exits once every sender clone is dropped, shutting the write direction
/// down on its way out.
///
/// The caller owns the channel: payloads queued before the task starts are
/// drained once it does, so the engine can publish the sender ahead of
/// `Connected` yet keep every `Sent` after it.
pub(crate) fn spawn_writer<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    emitter: Emitter,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            emitter.emit(LinkEvent::Sent(
                String::from_utf8_lossy(&data).into_owned(),
            ));
            if let Err(e) = writer.write_all(&data).await {
                tracing::debug!(target: "lanlink::server", "write failed: {}", e);
                emitter.emit(LinkEvent::Error(NetworkError::SessionWrite(e.to_string())));
                continue;
            }
            if let Err(e) = writer.flush().await {
                emitter.emit(LinkEvent::Error(NetworkError::SessionWrite(e.to_string())));
            }
        }
        let _ = writer.shutdown().await;
    })
}
