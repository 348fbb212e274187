//! WebSocket transport layer.
//!
//! This module handles the single persistent connection between the backend
//! (Rust) and the frontend (browser tab or bridge client).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Headless       │                              │  Frontend       │
//! │  (Rust)         │   GET /  → bootstrap HTML    │  (browser tab / │
//! │                 │   GET /ws, /bridge → upgrade │   bridge client)│
//! │  Server         │◄────────────────────────────►│                 │
//! │  → Connection   │      localhost:34115         │  runtime JS     │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Server::bind` - Bind the listener
//! 2. `Server::serve` - Route requests; upgrades go to the handler
//! 3. `Connection::open` - Split into `ConnectionHandle` + `FrameReader`
//! 4. `ConnectionHandle::shutdown` - Close when superseded
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Writer task, frame reader, connection mode |
//! | `http` | Request-head peeking, routing, plain responses |
//! | `server` | Listener and accept loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection halves.
pub mod connection;

/// Minimal HTTP handling for the headless routes.
pub mod http;

/// Listener and accept loop.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionHandle, ConnectionMode, FrameReader};
pub use server::{Server, UpgradeHandler};
