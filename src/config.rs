//! Application and server configuration.
//!
//! [`AppConfig`] is the read-only snapshot of user-level frontend content
//! consulted on every bootstrap. [`ServerOptions`] controls where the
//! headless server listens.
//!
//! # Example
//!
//! ```ignore
//! use headless_bridge::{AppConfig, ServerOptions};
//!
//! let config = AppConfig::new()
//!     .with_css("body { margin: 0; }")
//!     .with_html_fragment("<h1>Hello</h1>");
//!
//! let options = ServerOptions::new().with_port(0);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

// ============================================================================
// Constants
// ============================================================================

/// Well-known local port for the headless server.
pub const DEFAULT_PORT: u16 = 34115;

/// Default bind address (localhost).
pub const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// AppConfig
// ============================================================================

/// User-level frontend content.
///
/// Owned by the application; the renderer never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// User stylesheet; the default stylesheet is used when empty.
    pub css: String,

    /// User script, sent after all cached scripts.
    pub js: String,

    /// Markup injected into `#app` when `html_fragment` is set.
    pub html: String,

    /// Whether `html` is a fragment to inject on bootstrap.
    pub html_fragment: bool,
}

impl AppConfig {
    /// Creates an empty configuration.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            css: String::new(),
            js: String::new(),
            html: String::new(),
            html_fragment: false,
        }
    }

    /// Sets the user stylesheet.
    #[inline]
    #[must_use]
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    /// Sets the user script.
    #[inline]
    #[must_use]
    pub fn with_js(mut self, js: impl Into<String>) -> Self {
        self.js = js.into();
        self
    }

    /// Sets markup to inject into the app container.
    #[inline]
    #[must_use]
    pub fn with_html_fragment(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self.html_fragment = true;
        self
    }
}

// ============================================================================
// ServerOptions
// ============================================================================

/// Listening address for the headless server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOptions {
    /// IP address to bind.
    pub ip: IpAddr,

    /// Port to bind (0 lets the OS choose).
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerOptions {
    /// Creates options for `127.0.0.1:34115`.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ip: DEFAULT_BIND_IP,
            port: DEFAULT_PORT,
        }
    }

    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub const fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    /// Sets the port.
    #[inline]
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the socket address to bind.
    #[inline]
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default_is_empty() {
        let config = AppConfig::new();
        assert_eq!(config, AppConfig::default());
        assert!(config.css.is_empty());
        assert!(!config.html_fragment);
    }

    #[test]
    fn test_html_fragment_sets_flag() {
        let config = AppConfig::new().with_html_fragment("<p>hi</p>");
        assert!(config.html_fragment);
        assert_eq!(config.html, "<p>hi</p>");
    }

    #[test]
    fn test_server_options_default_port() {
        let options = ServerOptions::default();
        assert_eq!(options.port, DEFAULT_PORT);
        assert_eq!(options.socket_addr().to_string(), "127.0.0.1:34115");
    }

    #[test]
    fn test_server_options_chaining() {
        let options = ServerOptions::new()
            .with_ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .with_port(0);
        assert_eq!(options.socket_addr().to_string(), "0.0.0.0:0");
    }
}
