//! Builder pattern for renderer configuration.
//!
//! Provides a fluent API for configuring and creating [`Headless`] instances.
//!
//! # Example
//!
//! ```no_run
//! use headless_bridge::{AppConfig, Headless};
//!
//! # fn example() -> headless_bridge::Result<()> {
//! let renderer = Headless::builder()
//!     .config(AppConfig::new().with_css("body { margin: 0; }"))
//!     .port(0)
//!     .dispatcher(|message: String| println!("{message}"))
//!     .events(|name: &str| println!("{name}"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::assets::DEFAULT_CSS;
use crate::config::{AppConfig, ServerOptions};
use crate::css;
use crate::error::{Error, Result};
use crate::ipc::{Dispatcher, EventEmitter};

use super::bootstrap::Stylesheets;
use super::headless::Headless;

// ============================================================================
// HeadlessBuilder
// ============================================================================

/// Builder for configuring a [`Headless`] renderer.
///
/// Use [`Headless::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct HeadlessBuilder {
    /// Application content.
    config: AppConfig,
    /// Listen address.
    options: ServerOptions,
    /// Receiver of inbound frames.
    dispatcher: Option<Arc<dyn Dispatcher>>,
    /// Application event system.
    events: Option<Arc<dyn EventEmitter>>,
}

impl fmt::Debug for HeadlessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessBuilder")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("dispatcher", &self.dispatcher.is_some())
            .field("events", &self.events.is_some())
            .finish()
    }
}

// ============================================================================
// HeadlessBuilder Implementation
// ============================================================================

impl HeadlessBuilder {
    /// Creates a builder with default options and no seams set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the application configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the user stylesheet, replacing the default one.
    #[inline]
    #[must_use]
    pub fn css(mut self, css: impl Into<String>) -> Self {
        self.config.css = css.into();
        self
    }

    /// Sets the user script run after all other assets.
    #[inline]
    #[must_use]
    pub fn js(mut self, js: impl Into<String>) -> Self {
        self.config.js = js.into();
        self
    }

    /// Sets the HTML injected into the app container in direct mode.
    #[inline]
    #[must_use]
    pub fn html_fragment(mut self, html: impl Into<String>) -> Self {
        self.config = self.config.with_html_fragment(html);
        self
    }

    /// Replaces the server options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the listen port; `0` picks a free one.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.options = self.options.with_port(port);
        self
    }

    /// Sets the listen address.
    #[inline]
    #[must_use]
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.options = self.options.with_ip(ip);
        self
    }

    /// Sets the receiver of inbound frontend frames.
    #[inline]
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: impl Dispatcher) -> Self {
        self.dispatcher = Some(Arc::new(dispatcher));
        self
    }

    /// Sets the application event system.
    #[inline]
    #[must_use]
    pub fn events(mut self, events: impl EventEmitter) -> Self {
        self.events = Some(Arc::new(events));
        self
    }

    /// Builds the renderer with validation.
    ///
    /// Stylesheets are minified here, so malformed CSS fails at startup
    /// rather than on the first connection.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the dispatcher or event emitter is not set
    /// - [`Error::Minify`] if the user or default CSS is malformed
    pub fn build(self) -> Result<Headless> {
        let dispatcher = self.validate_dispatcher()?;
        let events = self.validate_events()?;
        let stylesheets = self.prepare_stylesheets()?;

        Ok(Headless::from_parts(
            self.config,
            self.options,
            stylesheets,
            dispatcher,
            events,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl HeadlessBuilder {
    /// Validates the dispatcher configuration.
    fn validate_dispatcher(&self) -> Result<Arc<dyn Dispatcher>> {
        self.dispatcher.clone().ok_or_else(|| {
            Error::config(
                "Dispatcher is required. Use .dispatcher() to set it.\n\
                 Example: Headless::builder().dispatcher(|message: String| ...)",
            )
        })
    }

    /// Validates the event emitter configuration.
    fn validate_events(&self) -> Result<Arc<dyn EventEmitter>> {
        self.events.clone().ok_or_else(|| {
            Error::config(
                "Event emitter is required. Use .events() to set it.\n\
                 Example: Headless::builder().events(|name: &str| ...)",
            )
        })
    }

    /// Runs the configured stylesheets through the CSS pipeline.
    fn prepare_stylesheets(&self) -> Result<Stylesheets> {
        let user = if self.config.css.is_empty() {
            None
        } else {
            Some(css::injection(&self.config.css)?)
        };
        let default = css::injection(DEFAULT_CSS)?;

        Ok(Stylesheets { user, default })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use crate::config::DEFAULT_PORT;

    fn complete() -> HeadlessBuilder {
        HeadlessBuilder::new()
            .dispatcher(|_message: String| {})
            .events(|_name: &str| {})
    }

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = HeadlessBuilder::new();
        assert!(builder.dispatcher.is_none());
        assert!(builder.events.is_none());
        assert_eq!(builder.options.port, DEFAULT_PORT);
        assert_eq!(builder.config, AppConfig::default());
    }

    #[test]
    fn test_setters() {
        let builder = HeadlessBuilder::new()
            .css("body {}")
            .js("start()")
            .html_fragment("<p></p>")
            .port(8080)
            .ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        assert_eq!(builder.config.css, "body {}");
        assert_eq!(builder.config.js, "start()");
        assert_eq!(builder.config.html, "<p></p>");
        assert!(builder.config.html_fragment);
        assert_eq!(builder.options.port, 8080);
        assert_eq!(builder.options.ip, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_build_fails_without_dispatcher() {
        let err = HeadlessBuilder::new()
            .events(|_name: &str| {})
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Dispatcher"));
    }

    #[test]
    fn test_build_fails_without_events() {
        let err = HeadlessBuilder::new()
            .dispatcher(|_message: String| {})
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Event emitter"));
    }

    #[test]
    fn test_build_fails_with_malformed_css() {
        let err = complete().css("body { /* never closed").build().unwrap_err();
        assert!(matches!(err, Error::Minify { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_build_fails_with_unclosed_block() {
        let err = complete().css("body { color: red").build().unwrap_err();
        assert!(matches!(err, Error::Minify { .. }));
    }

    #[test]
    fn test_build_succeeds() {
        let renderer = complete().css("body { margin: 0; }").port(0).build().unwrap();
        assert_eq!(renderer.options().port, 0);
        assert!(!renderer.is_connected());
    }
}
