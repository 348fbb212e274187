//! Headless bridge - serve a desktop application's UI over a local WebSocket.
//!
//! Instead of opening a native window, the application is rendered in a
//! browser tab or a native bridge client connected to a local server.
//!
//! # Architecture
//!
//! The renderer follows a client-server model:
//!
//! - **Backend (Rust)**: Serves the bootstrap page, pushes tagged frames
//! - **Frontend (JS runtime)**: Evaluates frames, sends calls back as text
//!
//! Key design principles:
//!
//! - One active connection at a time; a new connection supersedes the old
//! - Frames produced while disconnected are buffered and replayed once
//! - Every connection gets a fresh bootstrap: runtime, bindings, assets
//! - Inbound frames are forwarded verbatim to the application's dispatcher
//!
//! # Quick Start
//!
//! ```no_run
//! use headless_bridge::{AppConfig, Headless, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let renderer = Headless::builder()
//!         .config(AppConfig::new().with_html_fragment("<h1>Hello</h1>"))
//!         .dispatcher(|message: String| println!("call: {message}"))
//!         .events(|name: &str| println!("event: {name}"))
//!         .build()?;
//!
//!     renderer.new_binding("main.Greet")?;
//!     renderer.notify("app:started", &["headless"])?;
//!
//!     // Browse to http://localhost:34115
//!     renderer.run().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`renderer`] | [`Headless`] renderer and its builder |
//! | [`config`] | Application content and listen address |
//! | [`css`] | Stylesheet minification and injection |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`ipc`] | Dispatcher and event seams |
//! | [`protocol`] | Frame tags and frontend statements |
//! | [`transport`] | HTTP/WebSocket server and connections |

// ============================================================================
// Modules
// ============================================================================

/// Embedded frontend assets.
pub mod assets;

/// Application content and listen address.
pub mod config;

/// Stylesheet minification and injection.
pub mod css;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Seams to the surrounding application.
pub mod ipc;

/// Wire protocol message types.
pub mod protocol;

/// Headless renderer.
///
/// Use [`Headless::builder()`] to create a configured renderer.
pub mod renderer;

/// HTTP/WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Renderer types
pub use renderer::{Headless, HeadlessBuilder, WindowCapabilities};

// Configuration types
pub use config::{AppConfig, DEFAULT_PORT, ServerOptions};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{EventData, MessageKind};

// Application seams
pub use ipc::{Dispatcher, EventEmitter, READY_EVENT};

// Transport types
pub use transport::ConnectionMode;

// Identifier types
pub use identifiers::ConnectionId;
