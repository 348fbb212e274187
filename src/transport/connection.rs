//! WebSocket connection to a frontend.
//!
//! A connection is split into two halves:
//!
//! - [`ConnectionHandle`]: cheap to clone, used by the renderer to queue
//!   outbound frames. Queuing never blocks; a writer task drains the queue
//!   onto the socket in order.
//! - [`FrameReader`]: owned by the connection's read task, yields inbound
//!   frames until the transport closes or the handle is shut down.
//!
//! # Lifecycle
//!
//! 1. [`Connection::open`] splits an upgraded stream and spawns the writer
//! 2. The renderer installs the handle and queues the bootstrap sequence
//! 3. The read task loops on [`FrameReader::next_frame`]
//! 4. Close frame, stream end, terminal error, or [`ConnectionHandle::shutdown`]
//!    ends the loop

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

// ============================================================================
// ConnectionMode
// ============================================================================

/// How the frontend connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionMode {
    /// Generic browser tab that loaded the bootstrap document.
    Direct,
    /// Native bridge client that ships its own UI chrome.
    Bridge,
}

impl ConnectionMode {
    /// Human-readable label used in log lines.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Direct => "Websocket",
            Self::Bridge => "Bridge",
        }
    }

    /// Returns `true` for bridge connections.
    #[inline]
    #[must_use]
    pub const fn is_bridge(self) -> bool {
        matches!(self, Self::Bridge)
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// WriterCommand
// ============================================================================

/// Internal commands for the writer task.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum WriterCommand {
    /// Write one text frame.
    Frame(String),
    /// Send a close frame and stop.
    Shutdown,
}

// ============================================================================
// ConnectionHandle
// ============================================================================

/// Send side of a live frontend connection.
///
/// # Thread Safety
///
/// `ConnectionHandle` is `Send + Sync`; clones share the same writer.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    mode: ConnectionMode,
    commands: mpsc::UnboundedSender<WriterCommand>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    /// Returns the connection id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the connection mode.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Queues a text frame for the writer task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the writer has stopped.
    pub fn send(&self, frame: String) -> Result<()> {
        self.commands
            .send(WriterCommand::Frame(frame))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Closes the connection and stops its reader.
    pub fn shutdown(&self) {
        let _ = self.commands.send(WriterCommand::Shutdown);
        self.shutdown.send_replace(true);
    }

    /// Returns `true` once the writer task has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Builds a handle backed by a plain channel instead of a socket.
    #[cfg(test)]
    pub(crate) fn channel(
        mode: ConnectionMode,
    ) -> (Self, mpsc::UnboundedReceiver<WriterCommand>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        let handle = Self {
            id: ConnectionId::next(),
            mode,
            commands,
            shutdown: Arc::new(shutdown),
        };
        (handle, rx)
    }
}

// ============================================================================
// FrameReader
// ============================================================================

/// Receive side of a frontend connection.
pub struct FrameReader<S> {
    id: ConnectionId,
    stream: SplitStream<WebSocketStream<S>>,
    shutdown: watch::Receiver<bool>,
}

impl<S> FrameReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Waits for the next inbound frame.
    ///
    /// Returns `None` once the connection is finished: close frame, end of
    /// stream, terminal transport error, or shutdown of the handle. Other
    /// read errors are logged and skipped.
    pub async fn next_frame(&mut self) -> Option<String> {
        loop {
            let message = tokio::select! {
                message = self.stream.next() => message,
                _ = self.shutdown.changed() => {
                    debug!(connection = %self.id, "Reader stopped by shutdown");
                    return None;
                }
            };

            if let Some(frame) = read_step(self.id, message)? {
                return Some(frame);
            }
        }
    }
}

/// Interprets one item from the WebSocket stream.
///
/// `None` ends the read loop, `Some(None)` means keep waiting, and
/// `Some(Some(frame))` is a frame to dispatch.
fn read_step(
    id: ConnectionId,
    message: Option<std::result::Result<Message, WsError>>,
) -> Option<Option<String>> {
    match message {
        Some(Ok(Message::Text(text))) => Some(Some(text.as_str().to_owned())),
        Some(Ok(Message::Binary(bytes))) => {
            Some(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        Some(Ok(Message::Close(_))) => {
            debug!(connection = %id, "WebSocket closed by remote");
            None
        }
        // Ping, Pong, raw frames
        Some(Ok(_)) => Some(None),
        Some(Err(e)) if is_terminal(&e) => {
            debug!(connection = %id, error = %e, "WebSocket read ended");
            None
        }
        Some(Err(e)) => {
            warn!(connection = %id, error = %e, "Error reading message");
            Some(None)
        }
        None => {
            debug!(connection = %id, "WebSocket stream ended");
            None
        }
    }
}

/// Returns `true` for errors after which the stream yields nothing useful.
fn is_terminal(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed | WsError::AlreadyClosed | WsError::Io(_) | WsError::Protocol(_)
    )
}

// ============================================================================
// Connection
// ============================================================================

/// Factory splitting an upgraded stream into handle and reader.
pub struct Connection;

impl Connection {
    /// Splits the stream and spawns its writer task.
    pub fn open<S>(
        ws_stream: WebSocketStream<S>,
        mode: ConnectionMode,
    ) -> (ConnectionHandle, FrameReader<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let id = ConnectionId::next();
        let (sink, stream) = ws_stream.split();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        tokio::spawn(run_writer(id, sink, command_rx));

        let handle = ConnectionHandle {
            id,
            mode,
            commands,
            shutdown: Arc::new(shutdown),
        };
        let reader = FrameReader {
            id,
            stream,
            shutdown: shutdown_rx,
        };

        (handle, reader)
    }
}

/// Writer task: drains queued frames onto the socket in order.
///
/// Write failures are logged and the task keeps draining; delivery to the
/// frontend is best-effort.
async fn run_writer<S>(
    id: ConnectionId,
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut command_rx: mpsc::UnboundedReceiver<WriterCommand>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(command) = command_rx.recv().await {
        match command {
            WriterCommand::Frame(frame) => {
                let len = frame.len();
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    error!(connection = %id, error = %e, "Failed to write frame");
                } else {
                    trace!(connection = %id, len, "Frame written");
                }
            }
            WriterCommand::Shutdown => {
                debug!(connection = %id, "Shutdown command received");
                let _ = sink.close().await;
                break;
            }
        }
    }

    debug!(connection = %id, "Writer terminated");
}

// ============================================================================
// Tests
// ============================================================================
