//! HTTP/WebSocket server for frontend connections.
//!
//! # Connection Flow
//!
//! 1. Rust binds the server (default `127.0.0.1:34115`)
//! 2. A browser loads `/`, or a bridge client dials `/bridge` directly
//! 3. The browser page dials `/ws`
//! 4. The request head is peeked to route it; upgrade paths go through
//!    tungstenite's handshake, whose callback picks the mode from the path
//! 5. The upgraded stream is handed to the [`UpgradeHandler`] with its mode
//!
//! Every TCP connection is handled on its own task, so a slow client never
//! holds up the accept loop.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::result::Result as StdResult;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tracing::{debug, error, info, warn};

use crate::assets::INDEX_HTML;
use crate::config::ServerOptions;
use crate::error::{Error, Result};

use super::connection::ConnectionMode;
use super::http::{self, Route};

// ============================================================================
// Types
// ============================================================================

/// Callback receiving each upgraded WebSocket.
///
/// Called on the connection's task; implementations should hand the stream
/// off (e.g. `tokio::spawn`) and return.
pub type UpgradeHandler = Arc<dyn Fn(WebSocketStream<TcpStream>, ConnectionMode) + Send + Sync>;

// ============================================================================
// Server
// ============================================================================

/// A bound server that has not started accepting yet.
///
/// # Example
///
/// ```ignore
/// use headless_bridge::{ServerOptions, transport::Server};
///
/// let server = Server::bind(ServerOptions::new().with_port(0)).await?;
/// println!("Browse to {}", server.http_url());
/// server.serve(handler).await;
/// ```
pub struct Server {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Address actually bound.
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn bind(options: ServerOptions) -> Result<Self> {
        let listener = TcpListener::bind(options.socket_addr()).await?;
        let local_addr = listener.local_addr()?;

        debug!(%local_addr, "Headless server bound");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the bound socket address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the URL a browser should open.
    ///
    /// Format: `http://localhost:{port}`
    #[inline]
    #[must_use]
    pub fn http_url(&self) -> String {
        format!("http://localhost:{}", self.port())
    }

    /// Returns the bridge-mode WebSocket URL.
    ///
    /// Format: `ws://localhost:{port}/bridge`
    #[inline]
    #[must_use]
    pub fn bridge_url(&self) -> String {
        format!("ws://localhost:{}{}", self.port(), http::BRIDGE_PATH)
    }

    /// Accepts connections forever.
    ///
    /// Accept failures are logged and the loop continues.
    pub async fn serve(self, handler: UpgradeHandler) {
        debug!("Accept loop started");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, handler).await {
                            warn!(error = %e, ?addr, "Connection handling failed");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept failed");
                }
            }
        }
    }
}

// ============================================================================
// Request Handling
// ============================================================================

/// Routes one HTTP request, upgrading it if asked.
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    handler: UpgradeHandler,
) -> Result<()> {
    let head = http::peek_head(&stream).await?;
    debug!(?addr, method = %head.method, path = %head.path, "HTTP request");

    let (status, content_type, body) = match Route::resolve(&head) {
        Route::Upgrade(_) => return upgrade(stream, addr, handler).await,
        Route::Index => ("200 OK", http::HTML, INDEX_HTML),
        Route::BadUpgrade => {
            warn!(?addr, path = %head.path, "Rejected WebSocket upgrade");
            ("400 Bad Request", http::PLAIN_TEXT, http::UPGRADE_FAILED_BODY)
        }
        Route::MethodNotAllowed => {
            ("405 Method Not Allowed", http::PLAIN_TEXT, "Method Not Allowed")
        }
        Route::NotFound => ("404 Not Found", http::PLAIN_TEXT, "Not Found"),
    };

    // Consume the peeked head before answering.
    http::read_head(&mut stream).await?;
    http::write_response(&mut stream, status, content_type, body).await
}

/// Runs the WebSocket handshake and hands the stream to `handler`.
async fn upgrade(stream: TcpStream, addr: SocketAddr, handler: UpgradeHandler) -> Result<()> {
    let mut mode = None;
    let pick_mode =
        |request: &Request, response: Response| -> StdResult<Response, ErrorResponse> {
            mode = http::upgrade_mode(request.uri().path());
            match mode {
                Some(_) => Ok(response),
                None => Err(http::bad_upgrade_response()),
            }
        };

    let ws_stream = accept_hdr_async(stream, pick_mode)
        .await
        .map_err(|e| Error::upgrade(e.to_string()))?;

    let Some(mode) = mode else {
        return Err(Error::upgrade("no connection mode for path"));
    };

    info!(?addr, mode = mode.label(), "WebSocket upgrade complete");
    handler(ws_stream, mode);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::mpsc;

    async fn bind_random() -> Server {
        Server::bind(ServerOptions::new().with_port(0))
            .await
            .expect("bind should succeed")
    }

    async fn request(port: u16, raw: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect");
        stream.write_all(raw.as_bytes()).await.expect("write");
        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read");
        response
    }

    fn noop_handler() -> UpgradeHandler {
        Arc::new(|_stream: WebSocketStream<TcpStream>, _mode: ConnectionMode| {})
    }

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let server = bind_random().await;
        assert!(server.port() > 0);
        assert!(server.http_url().starts_with("http://localhost:"));
        assert!(server.bridge_url().ends_with("/bridge"));
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let server = bind_random().await;
        let port = server.port();
        let task = tokio::spawn(server.serve(noop_handler()));

        let response = request(port, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("<div id=\"app\"></div>"));

        task.abort();
    }

    #[tokio::test]
    async fn test_plain_get_on_ws_path_is_bad_request() {
        let server = bind_random().await;
        let port = server.port();
        let task = tokio::spawn(server.serve(noop_handler()));

        let response = request(port, "GET /ws HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request"));
        assert!(response.ends_with("Could not open websocket connection"));

        task.abort();
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let server = bind_random().await;
        let port = server.port();
        let task = tokio::spawn(server.serve(noop_handler()));

        let response = request(port, "GET /nope HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404"));

        task.abort();
    }

    #[tokio::test]
    async fn test_upgrade_reports_mode() {
        let server = bind_random().await;
        let port = server.port();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler: UpgradeHandler =
            Arc::new(move |_stream: WebSocketStream<TcpStream>, mode: ConnectionMode| {
                let _ = tx.send(mode);
            });
        let task = tokio::spawn(server.serve(handler));

        let url = format!("ws://127.0.0.1:{port}/bridge");
        let (_client, response) = tokio_tungstenite::connect_async(url)
            .await
            .expect("handshake should succeed");
        assert_eq!(response.status().as_u16(), 101);
        assert_eq!(rx.recv().await, Some(ConnectionMode::Bridge));

        task.abort();
    }

    #[tokio::test]
    async fn test_upgrade_with_query_reports_direct_mode() {
        let server = bind_random().await;
        let port = server.port();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler: UpgradeHandler =
            Arc::new(move |_stream: WebSocketStream<TcpStream>, mode: ConnectionMode| {
                let _ = tx.send(mode);
            });
        let task = tokio::spawn(server.serve(handler));

        let url = format!("ws://127.0.0.1:{port}/ws?session=1");
        let (_client, response) = tokio_tungstenite::connect_async(url)
            .await
            .expect("handshake should succeed");
        assert_eq!(response.status().as_u16(), 101);
        assert_eq!(rx.recv().await, Some(ConnectionMode::Direct));

        task.abort();
    }

    #[tokio::test]
    async fn test_incomplete_handshake_never_reaches_handler() {
        let server = bind_random().await;
        let port = server.port();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler: UpgradeHandler =
            Arc::new(move |_stream: WebSocketStream<TcpStream>, mode: ConnectionMode| {
                let _ = tx.send(mode);
            });
        let task = tokio::spawn(server.serve(handler));

        // Asks for an upgrade but carries no key or version.
        let mut stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect");
        stream
            .write_all(b"GET /bridge HTTP/1.1\r\nHost: localhost\r\nUpgrade: websocket\r\n\r\n")
            .await
            .expect("write");
        let mut response = Vec::new();
        let _ = stream.read_to_end(&mut response).await;

        assert!(!String::from_utf8_lossy(&response).starts_with("HTTP/1.1 101"));
        assert!(rx.try_recv().is_err());

        task.abort();
    }
}
