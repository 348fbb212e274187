//! Wire protocol between the backend and the frontend runtime.
//!
//! Every outbound frame is a single WebSocket text message made of a
//! one-character kind tag followed by the raw payload. Inbound frames carry
//! no tag; they are handed verbatim to the application's dispatcher.
//!
//! # Outbound Tags
//!
//! | Tag | Kind | Payload |
//! |-----|------|---------|
//! | `w` | [`MessageKind::Runtime`] | Runtime bootstrap script |
//! | `j` | [`MessageKind::Script`] | Script to evaluate |
//! | `s` | [`MessageKind::Stylesheet`] | `injectCSS(...)` statement |
//! | `h` | [`MessageKind::HtmlFragment`] | Fragment injection statement |
//! | `n` | [`MessageKind::Notification`] | `notify(...)` statement |
//! | `b` | [`MessageKind::Binding`] | Binding method name |
//! | `c` | [`MessageKind::Callback`] | Callback result data |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Message kinds and framing |
//! | `script` | Frontend call expressions and string escaping |
//! | `event` | Event payloads for notifications |

// ============================================================================
// Submodules
// ============================================================================

/// Event payloads for frontend notifications.
pub mod event;

/// Message kinds and frame encoding.
pub mod message;

/// Frontend call expressions and string escaping.
pub mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::EventData;
pub use message::{MessageKind, OutboundMessage, frame};
pub use script::escape_single_quoted;
