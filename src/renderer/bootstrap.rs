//! Per-connection bootstrap sequence.
//!
//! The sequence is rebuilt from stable state on every connection: bindings,
//! framework assets, caches and configuration. The one-shot pending buffer is
//! spliced in between [`Bootstrap::prologue`] and [`Bootstrap::epilogue`] by
//! the renderer, under the same lock that installs the connection.
//!
//! # Order
//!
//! 1. Runtime (`w`)
//! 2. DOM helper (`j`), direct mode only
//! 3. *pending frames*
//! 4. Bindings (`b`)
//! 5. Direct mode only: framework JS, framework CSS, user or default CSS,
//!    cached CSS, cached JS, user JS, HTML fragment

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::assets::{DOM_HELPER_JS, RUNTIME_JS};
use crate::config::AppConfig;
use crate::protocol::script::html_fragment_call;
use crate::protocol::{MessageKind, frame};
use crate::transport::ConnectionMode;

// ============================================================================
// Constants
// ============================================================================

/// Characters of user CSS/JS shown in debug logs.
const PREVIEW_LEN: usize = 45;

// ============================================================================
// AssetRegistry
// ============================================================================

/// Application-supplied content replayed on every connection.
///
/// Stylesheets are stored as ready-to-send injection statements; they went
/// through the CSS pipeline when registered.
#[derive(Debug, Clone, Default)]
pub(crate) struct AssetRegistry {
    /// Binding method names, in registration order.
    pub bindings: Vec<String>,
    /// Framework script.
    pub framework_js: Option<String>,
    /// Framework stylesheet injection statement.
    pub framework_css: Option<String>,
    /// Cached scripts.
    pub js_cache: Vec<String>,
    /// Cached stylesheet injection statements.
    pub css_cache: Vec<String>,
}

// ============================================================================
// Stylesheets
// ============================================================================

/// Configured stylesheet injection statements.
#[derive(Debug, Clone)]
pub(crate) struct Stylesheets {
    /// Injection statement for the user's CSS, if any.
    pub user: Option<String>,
    /// Injection statement for the default CSS.
    pub default: String,
}

// ============================================================================
// Bootstrap
// ============================================================================

/// Frames to send around the pending buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bootstrap {
    /// Frames sent before the pending buffer.
    pub prologue: Vec<String>,
    /// Frames sent after the pending buffer.
    pub epilogue: Vec<String>,
}

impl Bootstrap {
    /// Builds the sequence for a connection of the given mode.
    pub fn plan(
        mode: ConnectionMode,
        config: &AppConfig,
        stylesheets: &Stylesheets,
        assets: &AssetRegistry,
    ) -> Self {
        let mut prologue = vec![frame(MessageKind::Runtime, RUNTIME_JS)];
        if !mode.is_bridge() {
            prologue.push(frame(MessageKind::Script, DOM_HELPER_JS));
        }

        let mut epilogue: Vec<String> = assets
            .bindings
            .iter()
            .map(|name| frame(MessageKind::Binding, name))
            .collect();

        // Bridge clients host their own chrome.
        if !mode.is_bridge() {
            Self::push_chrome(&mut epilogue, config, stylesheets, assets);
        }

        Self { prologue, epilogue }
    }

    /// Appends framework, stylesheet, script and fragment frames.
    fn push_chrome(
        frames: &mut Vec<String>,
        config: &AppConfig,
        stylesheets: &Stylesheets,
        assets: &AssetRegistry,
    ) {
        if let Some(js) = &assets.framework_js {
            frames.push(frame(MessageKind::Script, js));
        }
        if let Some(css) = &assets.framework_css {
            frames.push(frame(MessageKind::Stylesheet, css));
        }

        match &stylesheets.user {
            Some(css) => {
                debug!(css = %preview(&config.css), "Inject user CSS");
                frames.push(frame(MessageKind::Stylesheet, css));
            }
            None => {
                debug!("Injecting default CSS");
                frames.push(frame(MessageKind::Stylesheet, &stylesheets.default));
            }
        }

        frames.extend(
            assets
                .css_cache
                .iter()
                .map(|css| frame(MessageKind::Stylesheet, css)),
        );
        frames.extend(
            assets
                .js_cache
                .iter()
                .map(|js| frame(MessageKind::Script, js)),
        );

        if !config.js.is_empty() {
            debug!(js = %preview(&config.js), "Inject user JS");
            frames.push(frame(MessageKind::Script, &config.js));
        }

        if config.html_fragment {
            frames.push(frame(
                MessageKind::HtmlFragment,
                &html_fragment_call(&config.html),
            ));
        }
    }
}

/// Shortens text for log output.
pub(crate) fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_LEN).collect();
    if text.chars().nth(PREVIEW_LEN).is_some() {
        out.push_str("...");
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
