//! Headless renderer.
//!
//! Serves the application to a browser tab or bridge client over a local
//! WebSocket instead of a native window.
//!
//! # Components
//!
//! - [`Headless`] - Connection slot, pending buffer and inbound dispatch
//! - [`HeadlessBuilder`] - Validating builder
//! - [`WindowCapabilities`] - Native window operations, degraded in headless mode

// ============================================================================
// Submodules
// ============================================================================

mod bootstrap;
mod builder;
mod headless;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::HeadlessBuilder;
pub use headless::Headless;

use crate::error::Result;

// ============================================================================
// WindowCapabilities
// ============================================================================

/// Operations a native window renderer provides.
///
/// Without a window most of these cannot do anything; implementations log
/// and return a benign value instead of failing.
pub trait WindowCapabilities {
    /// Opens a file picker and returns the chosen path, or `""`.
    fn select_file(&self) -> String;

    /// Opens a directory picker and returns the chosen path, or `""`.
    fn select_directory(&self) -> String;

    /// Opens a save dialog and returns the chosen path, or `""`.
    fn select_save_file(&self) -> String;

    /// Sets the window background colour.
    fn set_colour(&self, colour: &str) -> Result<()>;

    /// Enters fullscreen.
    fn fullscreen(&self);

    /// Leaves fullscreen.
    fn unfullscreen(&self);

    /// Sets the window title.
    fn set_title(&self, title: &str);

    /// Closes the window.
    fn close(&self);
}
