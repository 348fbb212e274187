//! Minimal HTTP/1.1 handling for the three headless routes.
//!
//! Only request heads are parsed; bodies are never read. The head is first
//! peeked, not read, so an upgrade request reaches tungstenite's handshake
//! untouched. Plain requests are answered here.
//!
//! # Routes
//!
//! | Path | Behaviour |
//! |------|-----------|
//! | `/` | Bootstrap document |
//! | `/ws` | Upgrade, direct mode |
//! | `/bridge` | Upgrade, bridge mode |
//!
//! An upgrade path requested without `Upgrade: websocket` gets `400`, other
//! paths `404` and other methods `405`.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::handshake::server::ErrorResponse;
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::error::{Error, Result};

use super::connection::ConnectionMode;

// ============================================================================
// Constants
// ============================================================================

/// Largest request head accepted.
const MAX_HEAD_LEN: usize = 8 * 1024;

/// How long a client may take to send its request head.
const HEAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between peeks while a head is still arriving.
const PEEK_INTERVAL: Duration = Duration::from_millis(5);

/// Path serving the bootstrap document.
pub const ROOT_PATH: &str = "/";

/// Path upgraded in direct (browser) mode.
pub const WS_PATH: &str = "/ws";

/// Path upgraded in bridge mode.
pub const BRIDGE_PATH: &str = "/bridge";

/// Body sent with a rejected upgrade.
pub const UPGRADE_FAILED_BODY: &str = "Could not open websocket connection";

/// Content type of the bootstrap document.
pub const HTML: &str = "text/html; charset=utf-8";

/// Content type of status responses.
pub const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

// ============================================================================
// RequestHead
// ============================================================================

/// Parsed request line and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Path without query string.
    pub path: String,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Parses a request head (everything before the blank line).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the request line is malformed.
    pub fn parse(head: &str) -> Result<Self> {
        let mut lines = head.split("\r\n");
        let request_line = lines
            .next()
            .ok_or_else(|| Error::protocol("Empty request"))?;

        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::protocol(format!(
                "Malformed request line: {request_line}"
            )));
        };
        if !version.starts_with("HTTP/") {
            return Err(Error::protocol(format!("Unsupported version: {version}")));
        }

        let path = target.split(['?', '#']).next().unwrap_or(target).to_string();

        let headers = lines
            .filter(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Ok(Self {
            method: method.to_string(),
            path,
            headers,
        })
    }

    /// Returns the first header with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the named header lists `token` (case-insensitive).
    fn header_has_token(&self, name: &str, token: &str) -> bool {
        self.header(name).is_some_and(|value| {
            value
                .split(',')
                .any(|part| part.trim().eq_ignore_ascii_case(token))
        })
    }

    /// Returns `true` if the client asks for a WebSocket upgrade.
    ///
    /// The rest of the handshake is validated by tungstenite.
    #[must_use]
    pub fn is_websocket_upgrade(&self) -> bool {
        self.header_has_token("Upgrade", "websocket")
    }
}

// ============================================================================
// Route
// ============================================================================

/// What to do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Serve the bootstrap document.
    Index,
    /// Upgrade to a WebSocket in the given mode.
    Upgrade(ConnectionMode),
    /// Upgrade path requested without asking for an upgrade.
    BadUpgrade,
    /// Method other than GET.
    MethodNotAllowed,
    /// Unknown path.
    NotFound,
}

impl Route {
    /// Routes a request head.
    #[must_use]
    pub fn resolve(head: &RequestHead) -> Self {
        if head.method != "GET" {
            return Self::MethodNotAllowed;
        }
        if head.path == ROOT_PATH {
            return Self::Index;
        }
        match upgrade_mode(&head.path) {
            Some(mode) if head.is_websocket_upgrade() => Self::Upgrade(mode),
            Some(_) => Self::BadUpgrade,
            None => Self::NotFound,
        }
    }
}

/// Returns the connection mode served on `path`, if it is an upgrade path.
#[must_use]
pub fn upgrade_mode(path: &str) -> Option<ConnectionMode> {
    match path {
        WS_PATH => Some(ConnectionMode::Direct),
        BRIDGE_PATH => Some(ConnectionMode::Bridge),
        _ => None,
    }
}

/// Response the handshake callback returns to refuse an upgrade.
#[must_use]
pub fn bad_upgrade_response() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(UPGRADE_FAILED_BODY.to_string()));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

// ============================================================================
// I/O
// ============================================================================

/// Parses the request head without consuming it.
///
/// Peeks until the blank line that ends the head has arrived, so the bytes
/// are still there for whoever reads the stream next.
///
/// # Errors
///
/// - [`Error::Io`] on read failure
/// - [`Error::Connection`] if the peer closes before the head ends
/// - [`Error::Protocol`] if the head is too large or arrives too slowly
pub async fn peek_head(stream: &TcpStream) -> Result<RequestHead> {
    tokio::time::timeout(HEAD_TIMEOUT, peek_until_head_end(stream))
        .await
        .map_err(|_| Error::protocol("Timed out waiting for request head"))?
}

/// Peeks repeatedly until the head terminator is visible.
async fn peek_until_head_end(stream: &TcpStream) -> Result<RequestHead> {
    let mut buf = vec![0u8; MAX_HEAD_LEN];

    loop {
        let n = stream.peek(&mut buf).await?;
        if n == 0 {
            return Err(Error::connection("closed before request head"));
        }
        if let Some(end) = find_head_end(&buf[..n]) {
            return RequestHead::parse(&String::from_utf8_lossy(&buf[..end]));
        }
        if n == buf.len() {
            return Err(Error::protocol("Request head too large"));
        }
        tokio::time::sleep(PEEK_INTERVAL).await;
    }
}

/// Reads bytes up to and including the blank line that ends the head.
///
/// # Errors
///
/// - [`Error::Io`] on read failure
/// - [`Error::Connection`] if the peer closes before the head ends
/// - [`Error::Protocol`] if the head is too large
pub async fn read_head<S>(stream: &mut S) -> Result<RequestHead>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(Error::connection("closed before request head"));
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = find_head_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]);
            return RequestHead::parse(&head);
        }
        if buf.len() > MAX_HEAD_LEN {
            return Err(Error::protocol("Request head too large"));
        }
    }
}

/// Returns the offset of the `\r\n\r\n` terminator, if present.
fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Writes a complete response with a body.
pub async fn write_response<S>(
    stream: &mut S,
    status: &str,
    content_type: &str,
    body: &str,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const UPGRADE_HEAD: &str = "GET /bridge?token=1 HTTP/1.1\r\n\
        Host: localhost:34115\r\n\
        Upgrade: websocket\r\n\
        Connection: keep-alive, Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13";

    #[test]
    fn test_parse_strips_query() {
        let head = RequestHead::parse(UPGRADE_HEAD).unwrap();
        assert_eq!(head.method, "GET");
        assert_eq!(head.path, "/bridge");
        assert_eq!(head.header("host"), Some("localhost:34115"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RequestHead::parse("hello").is_err());
        assert!(RequestHead::parse("GET / SPDY/3").is_err());
    }

    #[test]
    fn test_is_websocket_upgrade() {
        let head = RequestHead::parse(UPGRADE_HEAD).unwrap();
        assert!(head.is_websocket_upgrade());

        let plain = RequestHead::parse("GET /ws HTTP/1.1\r\nHost: x").unwrap();
        assert!(!plain.is_websocket_upgrade());
    }

    #[test]
    fn test_route_resolution() {
        let route = |raw: &str| Route::resolve(&RequestHead::parse(raw).unwrap());
        let upgrade = |path: &str| format!("GET {path} HTTP/1.1\r\nUpgrade: WebSocket");

        assert_eq!(route("GET / HTTP/1.1"), Route::Index);
        assert_eq!(
            route(&upgrade("/ws")),
            Route::Upgrade(ConnectionMode::Direct)
        );
        assert_eq!(
            route(&upgrade("/bridge")),
            Route::Upgrade(ConnectionMode::Bridge)
        );
        assert_eq!(route("GET /ws HTTP/1.1"), Route::BadUpgrade);
        assert_eq!(route("GET /bridge HTTP/1.1"), Route::BadUpgrade);
        assert_eq!(route(&upgrade("/elsewhere")), Route::NotFound);
        assert_eq!(route("GET /favicon.ico HTTP/1.1"), Route::NotFound);
        assert_eq!(route("POST /ws HTTP/1.1"), Route::MethodNotAllowed);
    }

    #[test]
    fn test_upgrade_mode() {
        assert_eq!(upgrade_mode("/ws"), Some(ConnectionMode::Direct));
        assert_eq!(upgrade_mode("/bridge"), Some(ConnectionMode::Bridge));
        assert_eq!(upgrade_mode("/"), None);
        assert_eq!(upgrade_mode("/bridge/x"), None);
    }

    #[test]
    fn test_bad_upgrade_response_is_400() {
        let response = bad_upgrade_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.body().as_deref(), Some(UPGRADE_FAILED_BODY));
    }

    #[test]
    fn test_find_head_end() {
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\n\r\n"), Some(14));
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\n"), None);
    }

    #[tokio::test]
    async fn test_read_head_from_stream() {
        let raw = format!("{UPGRADE_HEAD}\r\n\r\n");
        let mut reader = raw.as_bytes();
        let head = read_head(&mut reader).await.unwrap();
        assert_eq!(head.path, "/bridge");
    }

    #[tokio::test]
    async fn test_read_head_eof() {
        let mut reader: &[u8] = b"GET / HTTP/1.1\r\n";
        assert!(read_head(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn test_peek_head_leaves_bytes_unread() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            // Head arrives in two pieces.
            stream.write_all(b"GET /bridge HTTP/1.1\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stream.write_all(b"Upgrade: websocket\r\n\r\n").await.unwrap();
            stream
        });

        let (mut server, _) = listener.accept().await.unwrap();
        let peeked = peek_head(&server).await.unwrap();
        assert_eq!(peeked.path, "/bridge");
        assert!(peeked.is_websocket_upgrade());

        let read = read_head(&mut server).await.unwrap();
        assert_eq!(read, peeked);

        drop(client.await.unwrap());
    }

    #[tokio::test]
    async fn test_peek_head_closed_early() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            drop(stream);
        });

        let (server, _) = listener.accept().await.unwrap();
        client.await.unwrap();
        let err = peek_head(&server).await.unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_write_response() {
        let mut out = Vec::new();
        write_response(&mut out, "400 Bad Request", PLAIN_TEXT, UPGRADE_FAILED_BODY)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.contains("Content-Length: 35\r\n"));
        assert!(text.ends_with(UPGRADE_FAILED_BODY));
    }
}
