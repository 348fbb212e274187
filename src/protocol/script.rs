//! Frontend call expressions.
//!
//! Payloads that embed text inside a single-quoted JavaScript string go
//! through [`escape_single_quoted`] first.

// ============================================================================
// Constants
// ============================================================================

/// Runtime entry point that appends a stylesheet to the document.
const INJECT_CSS_FN: &str = "window.bridge._.injectCSS";

/// Runtime entry point that fans an event out to frontend listeners.
const NOTIFY_FN: &str = "window.bridge._.notify";

/// Selector of the element that receives the HTML fragment.
pub const APP_CONTAINER: &str = "#app";

// ============================================================================
// Escaping
// ============================================================================

/// Escapes text for a single-quoted JavaScript string literal.
///
/// Backslashes are doubled first, then single quotes get a backslash, then
/// newlines collapse to spaces. Reordering the first two steps would double
/// escape the quotes. Carriage returns are dropped last, so CRLF text ends
/// up as one space per line break.
#[must_use]
pub fn escape_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', " ")
        .replace('\r', "")
}

// ============================================================================
// Expressions
// ============================================================================

/// Builds the statement that injects an already-escaped stylesheet.
#[must_use]
pub fn inject_css_call(escaped_css: &str) -> String {
    format!("{INJECT_CSS_FN}('{escaped_css}')")
}

/// Builds the statement that notifies the frontend of an event.
#[must_use]
pub fn notify_call(event_name: &str, json: &str) -> String {
    format!(
        "{NOTIFY_FN}('{}','{}')",
        escape_single_quoted(event_name),
        escape_single_quoted(json)
    )
}

/// Builds the statement that replaces the app container's markup.
#[must_use]
pub fn html_fragment_call(html: &str) -> String {
    format!("$('{APP_CONTAINER}').html('{}')", escape_single_quoted(html))
}

// ============================================================================
// Tests
// ============================================================================
