//! Error types for the headless bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use headless_bridge::{EventData, Headless, Result};
//!
//! fn announce(renderer: &Headless) -> Result<()> {
//!     renderer.new_binding("main.Greet")?;
//!     renderer.notify("user:login", &["alice"])?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Minify`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::Upgrade`] |
//! | Protocol | [`Error::InvalidEvent`], [`Error::Protocol`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when renderer configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// CSS minification failed.
    ///
    /// Malformed stylesheets are a configuration fault and abort startup.
    #[error("Unable to minify CSS: {message}")]
    Minify {
        /// Reason reported by the minifier.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection-level failure.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// WebSocket connection closed.
    ///
    /// Returned when a frame is queued on a connection whose writer is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    /// HTTP request could not be upgraded to a WebSocket.
    #[error("Could not open websocket connection: {message}")]
    Upgrade {
        /// Why the handshake was rejected.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Event passed to the renderer was missing or unusable.
    #[error("Invalid event: {message}")]
    InvalidEvent {
        /// Description of the problem.
        message: String,
    },

    /// Malformed HTTP request or unexpected wire content.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a minification error.
    #[inline]
    pub fn minify(message: impl Into<String>) -> Self {
        Self::Minify {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an upgrade error.
    #[inline]
    pub fn upgrade(message: impl Into<String>) -> Self {
        Self::Upgrade {
            message: message.into(),
        }
    }

    /// Creates an invalid event error.
    #[inline]
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::Upgrade { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error should halt startup.
    ///
    /// Configuration faults are never retried.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Minify { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("dispatcher is required");
        assert_eq!(err.to_string(), "Configuration error: dispatcher is required");
    }

    #[test]
    fn test_minify_error_display() {
        let err = Error::minify("Unclosed comment");
        assert_eq!(err.to_string(), "Unable to minify CSS: Unclosed comment");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::upgrade("missing key").is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::invalid_event("nil").is_connection_error());
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::minify("bad").is_fatal());
        assert!(Error::config("bad").is_fatal());
        assert!(!Error::ConnectionClosed.is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::AddrInUse, "port taken");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
