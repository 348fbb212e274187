//! Stylesheet injection pipeline.
//!
//! CSS reaches the frontend as a script statement, so it is minified to drop
//! carriage returns and comments, escaped for a single-quoted string, and
//! wrapped in the runtime's `injectCSS` call. Malformed CSS is a
//! configuration error; it is reported when the stylesheet is registered,
//! not when a frontend connects.

// ============================================================================
// Imports
// ============================================================================

use tracing::error;

use crate::error::{Error, Result};
use crate::protocol::script::{escape_single_quoted, inject_css_call};

// ============================================================================
// Public Functions
// ============================================================================

/// Minifies a stylesheet.
///
/// # Errors
///
/// Returns [`Error::Minify`] if the input is not parseable as CSS.
pub fn minify(css: &str) -> Result<String> {
    check_blocks(css)
        .and_then(|()| minifier::css::minify(css))
        .map(|minified| minified.to_string())
        .map_err(|reason| {
            error!(reason, css_len = css.len(), "Unable to minify CSS");
            Error::minify(reason)
        })
}

/// Runs a stylesheet through the whole pipeline.
///
/// Returns the statement to send as a stylesheet frame.
///
/// # Errors
///
/// Returns [`Error::Minify`] if the input is not parseable as CSS.
pub fn injection(css: &str) -> Result<String> {
    let minified = minify(css)?;
    Ok(inject_css_call(&escape_single_quoted(&minified)))
}

// ============================================================================
// Validation
// ============================================================================

/// Checks that every `{` has a matching `}`.
///
/// Braces inside comments and quoted strings do not count. The minifier
/// accepts a block that is never closed, so this runs first.
fn check_blocks(css: &str) -> std::result::Result<(), &'static str> {
    let mut depth = 0usize;
    let mut chars = css.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                loop {
                    match chars.next() {
                        Some('/') if prev == '*' => break,
                        Some(next) => prev = next,
                        None => return Err("Unclosed comment"),
                    }
                }
            }
            '"' | '\'' => loop {
                match chars.next() {
                    Some('\\') => {
                        chars.next();
                    }
                    Some(next) if next == c => break,
                    Some(_) => {}
                    None => return Err("Unclosed string"),
                }
            },
            '{' => depth += 1,
            '}' => depth = depth.checked_sub(1).ok_or("Unexpected '}'")?,
            _ => {}
        }
    }

    if depth == 0 {
        Ok(())
    } else {
        Err("Unclosed block")
    }
}

// ============================================================================
// Tests
// ============================================================================
