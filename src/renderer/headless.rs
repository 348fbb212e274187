//! Headless renderer: connection lifecycle and message injection.
//!
//! [`Headless`] owns the single active connection slot and the pending
//! buffer behind one lock. Every outbound call funnels through
//! [`Headless::evaluate`]:
//!
//! - disconnected: the frame is appended to the pending buffer
//! - connected: the frame is queued on the connection's writer
//!
//! On each accepted connection the bootstrap sequence and the drained
//! pending buffer are queued in one critical section, so no application
//! call can land between runtime and bindings.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, trace, warn};

use crate::config::{AppConfig, ServerOptions};
use crate::css;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::ipc::{Dispatcher, EventEmitter, READY_EVENT};
use crate::protocol::{EventData, MessageKind, OutboundMessage};
use crate::transport::{Connection, ConnectionHandle, ConnectionMode, Server, UpgradeHandler};

use super::WindowCapabilities;
use super::bootstrap::{AssetRegistry, Bootstrap, Stylesheets};
use super::builder::HeadlessBuilder;

// ============================================================================
// Link
// ============================================================================

/// Connection slot plus frames queued while no frontend is attached.
#[derive(Default)]
struct Link {
    connection: Option<ConnectionHandle>,
    pending: Vec<String>,
}

// ============================================================================
// Headless
// ============================================================================

/// Internal shared state.
struct HeadlessInner {
    config: AppConfig,
    options: ServerOptions,
    stylesheets: Stylesheets,
    dispatcher: Arc<dyn Dispatcher>,
    events: Arc<dyn EventEmitter>,
    assets: RwLock<AssetRegistry>,
    link: Mutex<Link>,
}

/// Renders the application over a local WebSocket.
///
/// Cheap to clone; clones share one connection slot.
///
/// # Example
///
/// ```ignore
/// use headless_bridge::{AppConfig, Headless};
///
/// let renderer = Headless::builder()
///     .config(AppConfig::new().with_html_fragment("<h1>Hello</h1>"))
///     .dispatcher(|message: String| println!("frontend: {message}"))
///     .events(|name: &str| println!("event: {name}"))
///     .build()?;
///
/// renderer.new_binding("main.Greet")?;
/// renderer.run().await?;
/// ```
#[derive(Clone)]
pub struct Headless {
    inner: Arc<HeadlessInner>,
}

impl fmt::Debug for Headless {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = self.inner.link.lock();
        f.debug_struct("Headless")
            .field("options", &self.inner.options)
            .field("connection", &link.connection)
            .field("pending", &link.pending.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Headless - Constructor
// ============================================================================

impl Headless {
    /// Returns a builder for configuring the renderer.
    #[inline]
    #[must_use]
    pub fn builder() -> HeadlessBuilder {
        HeadlessBuilder::new()
    }

    /// Assembles a renderer from validated parts.
    pub(crate) fn from_parts(
        config: AppConfig,
        options: ServerOptions,
        stylesheets: Stylesheets,
        dispatcher: Arc<dyn Dispatcher>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            inner: Arc::new(HeadlessInner {
                config,
                options,
                stylesheets,
                dispatcher,
                events,
                assets: RwLock::new(AssetRegistry::default()),
                link: Mutex::new(Link::default()),
            }),
        }
    }
}

// ============================================================================
// Headless - Accessors
// ============================================================================

impl Headless {
    /// Returns the application configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Returns the server options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> ServerOptions {
        self.inner.options
    }

    /// Returns `true` while a frontend is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.link.lock().connection.is_some()
    }

    /// Returns the mode of the attached frontend, if any.
    #[must_use]
    pub fn connection_mode(&self) -> Option<ConnectionMode> {
        self.inner
            .link
            .lock()
            .connection
            .as_ref()
            .map(ConnectionHandle::mode)
    }

    /// Returns the number of frames waiting for a connection.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.link.lock().pending.len()
    }
}

// ============================================================================
// Headless - Outbound Messages
// ============================================================================

impl Headless {
    /// Sends a payload to the frontend.
    ///
    /// While disconnected the framed payload is buffered, whatever its kind,
    /// and replayed in order on the next connection. Delivery is
    /// best-effort: a failed write is logged and still returns `Ok(())`.
    pub fn evaluate(&self, payload: &str, kind: MessageKind) -> Result<()> {
        self.send(&OutboundMessage::new(kind, payload));
        Ok(())
    }

    /// Routes one message to the live connection or the pending buffer.
    fn send(&self, message: &OutboundMessage) {
        let encoded = message.encode();

        let mut guard = self.inner.link.lock();
        let link = &mut *guard;
        match &link.connection {
            Some(connection) => send_frame(connection, encoded),
            None => {
                link.pending.push(encoded);
                trace!(
                    kind = %message.kind(),
                    pending = link.pending.len(),
                    "Buffered frame while disconnected"
                );
            }
        }
    }

    /// Notifies the frontend of an event.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEvent`] if `event` is `None`
    /// - [`Error::Json`] if the event data cannot be serialised
    ///
    /// No frame is produced on error.
    pub fn notify_event<T: Serialize>(&self, event: Option<&EventData<T>>) -> Result<()> {
        let Some(event) = event else {
            let err = Error::invalid_event("Sent nil event to renderer");
            error!(error = %err, "Rejected notification");
            return Err(err);
        };

        let script = event.to_script().inspect_err(|e| {
            error!(event = %event.name, error = %e, "Cannot serialise event data");
        })?;

        self.evaluate(&script, MessageKind::Notification)
    }

    /// Notifies the frontend of a named event with data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `data` cannot be serialised.
    pub fn notify<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        self.notify_event(Some(&EventData::new(name, data)))
    }

    /// Returns the result of a frontend-invoked call.
    pub fn callback(&self, data: &str) -> Result<()> {
        self.evaluate(data, MessageKind::Callback)
    }
}

/// Queues one frame, logging instead of failing.
fn send_frame(connection: &ConnectionHandle, message: String) {
    if let Err(e) = connection.send(message) {
        error!(connection = %connection.id(), error = %e, "Failed to send frame");
    }
}

// ============================================================================
// Headless - Registration
// ============================================================================

impl Headless {
    /// Registers a binding to announce on every connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `method_name` is empty.
    pub fn new_binding(&self, method_name: impl Into<String>) -> Result<()> {
        let method_name = method_name.into();
        if method_name.is_empty() {
            return Err(Error::config("Binding name must not be empty"));
        }

        debug!(binding = %method_name, "Binding registered");
        self.inner.assets.write().bindings.push(method_name);
        Ok(())
    }

    /// Sets the framework script and stylesheet injected at startup.
    ///
    /// Empty strings mean "none".
    ///
    /// # Errors
    ///
    /// Returns [`Error::Minify`] if `css` is malformed.
    pub fn inject_framework(&self, js: &str, css: &str) -> Result<()> {
        let framework_css = if css.is_empty() {
            None
        } else {
            Some(css::injection(css)?)
        };

        let mut assets = self.inner.assets.write();
        assets.framework_js = (!js.is_empty()).then(|| js.to_string());
        assets.framework_css = framework_css;
        Ok(())
    }

    /// Replaces the list of scripts injected at startup.
    pub fn add_js_list(&self, js_cache: Vec<String>) {
        self.inner.assets.write().js_cache = js_cache;
    }

    /// Replaces the list of stylesheets injected at startup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Minify`] if any stylesheet is malformed; the
    /// previous list is kept in that case.
    pub fn add_css_list(&self, css_cache: Vec<String>) -> Result<()> {
        let injections = css_cache
            .iter()
            .map(|css| css::injection(css))
            .collect::<Result<Vec<_>>>()?;

        self.inner.assets.write().css_cache = injections;
        Ok(())
    }
}

// ============================================================================
// Headless - Connection Lifecycle
// ============================================================================

impl Headless {
    /// Installs a freshly accepted connection and queues its bootstrap.
    ///
    /// A connection already in the slot is superseded and shut down.
    pub(crate) fn attach(&self, connection: ConnectionHandle) {
        let id = connection.id();
        let mode = connection.mode();

        let bootstrap = {
            let assets = self.inner.assets.read();
            Bootstrap::plan(mode, &self.inner.config, &self.inner.stylesheets, &assets)
        };

        let superseded = {
            let mut link = self.inner.link.lock();
            let pending = std::mem::take(&mut link.pending);

            info!(connection = %id, mode = mode.label(), "{} connection accepted", mode.label());
            debug!(connection = %id, pending = pending.len(), "Replaying buffered frames");

            for message in bootstrap
                .prologue
                .into_iter()
                .chain(pending)
                .chain(bootstrap.epilogue)
            {
                send_frame(&connection, message);
            }

            link.connection.replace(connection)
        };

        if let Some(previous) = superseded {
            warn!(
                connection = %previous.id(),
                replaced_by = %id,
                "Superseded connection closed"
            );
            previous.shutdown();
        }

        info!(connection = %id, mode = mode.label(), "Connected to frontend");
        self.inner.events.emit(READY_EVENT);
    }

    /// Clears the slot if `id` is still the attached connection.
    pub(crate) fn detach(&self, id: ConnectionId, mode: ConnectionMode) {
        let mut link = self.inner.link.lock();
        if link.connection.as_ref().is_some_and(|c| c.id() == id) {
            link.connection = None;
            info!(connection = %id, "{} connection dropped", mode.label());
        } else {
            debug!(connection = %id, "Stale connection finished");
        }
    }

    /// Runs one connection: bootstrap, then dispatch until it closes.
    pub async fn serve_connection<S>(self, ws_stream: WebSocketStream<S>, mode: ConnectionMode)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (connection, mut reader) = Connection::open(ws_stream, mode);
        let id = connection.id();

        self.attach(connection.clone());

        while let Some(message) = reader.next_frame().await {
            debug!(connection = %id, message = %message, "Got message");
            self.inner.dispatcher.dispatch(message);
        }

        self.detach(id, mode);
        connection.shutdown();
    }

    /// Returns a handler that spawns [`serve_connection`](Self::serve_connection)
    /// for every upgrade.
    #[must_use]
    pub fn upgrade_handler(&self) -> UpgradeHandler {
        let renderer = self.clone();
        Arc::new(
            move |ws_stream: WebSocketStream<TcpStream>, mode: ConnectionMode| {
                tokio::spawn(renderer.clone().serve_connection(ws_stream, mode));
            },
        )
    }
}

// ============================================================================
// Headless - Server
// ============================================================================

impl Headless {
    /// Binds the server described by the renderer's [`ServerOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(&self) -> Result<Server> {
        Server::bind(self.inner.options).await
    }

    /// Accepts frontend connections on an already bound server, forever.
    pub async fn serve(&self, server: Server) {
        server.serve(self.upgrade_handler()).await;
    }

    /// Runs the renderer in headless mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the server cannot bind.
    pub async fn run(&self) -> Result<()> {
        let server = self.bind().await.inspect_err(|e| {
            error!(error = %e, "Unable to start headless server");
        })?;

        info!("Headless mode started.");
        info!("If using the bridge, it will connect automatically.");
        info!(
            "You may also connect manually by browsing to {}",
            server.http_url()
        );

        self.serve(server).await;
        Ok(())
    }
}

// ============================================================================
// Headless - Window Capabilities
// ============================================================================

impl WindowCapabilities for Headless {
    fn select_file(&self) -> String {
        error!("select_file() unsupported in headless mode");
        String::new()
    }

    fn select_directory(&self) -> String {
        error!("select_directory() unsupported in headless mode");
        String::new()
    }

    fn select_save_file(&self) -> String {
        error!("select_save_file() unsupported in headless mode");
        String::new()
    }

    fn set_colour(&self, colour: &str) -> Result<()> {
        warn!(colour, "set_colour() ignored in headless mode");
        Ok(())
    }

    fn fullscreen(&self) {
        warn!("fullscreen() unsupported in headless mode");
    }

    fn unfullscreen(&self) {
        warn!("unfullscreen() unsupported in headless mode");
    }

    fn set_title(&self, title: &str) {
        warn!(title, "set_title() unsupported in headless mode");
    }

    fn close(&self) {
        warn!("close() unsupported in headless mode");
    }
}

// ============================================================================
// Tests
// ============================================================================
