//! Static assets served to, or injected into, the frontend.
//!
//! The bootstrap document is what a plain browser tab loads from `/`. It
//! opens the WebSocket back to the backend and evaluates tagged frames as
//! they arrive. Everything else (runtime, DOM helper, default stylesheet) is
//! pushed over that socket during bootstrap.
//!
//! # Connection Flow
//!
//! 1. Browser loads `/` and receives [`INDEX_HTML`]
//! 2. Page connects to `ws://<host>/ws`
//! 3. Backend sends [`RUNTIME_JS`] as a `w` frame, which installs `window.bridge`
//! 4. Remaining bootstrap frames are applied through the runtime

// ============================================================================
// Constants
// ============================================================================

/// Bootstrap document served at the root path.
///
/// Only the frame loop lives here; the runtime arrives over the socket so
/// that bridge clients and browser tabs share one implementation.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Headless Bridge</title>
</head>
<body>
    <div id="app"></div>
    <script>
    (function () {
        var pending = [];
        function apply(frame) {
            var tag = frame.charAt(0);
            var body = frame.substring(1);
            switch (tag) {
                case 'w':
                case 'j':
                case 's':
                case 'h':
                case 'n':
                    (0, eval)(body);
                    break;
                case 'b':
                    window.bridge._.addBinding(body);
                    break;
                case 'c':
                    window.bridge._.callback(body);
                    break;
                default:
                    console.error('Unknown frame tag: ' + tag);
            }
        }
        var socket = new WebSocket('ws://' + window.location.host + '/ws');
        socket.onmessage = function (event) {
            pending.push(event.data);
            while (pending.length > 0) {
                apply(pending.shift());
            }
        };
        socket.onclose = function () {
            console.log('Connection to backend closed');
        };
        window.__bridgeSocket = socket;
    })();
    </script>
</body>
</html>"##;

/// Frontend runtime, sent first on every connection.
///
/// Installs `window.bridge`: binding stubs, callback correlation, event
/// listeners, and the stylesheet hook the `s` frames call into.
pub const RUNTIME_JS: &str = r##"(function () {
    var callbacks = {};
    var listeners = {};
    var nextId = 0;
    function send(message) {
        window.__bridgeSocket.send(JSON.stringify(message));
    }
    function call(name, args) {
        return new Promise(function (resolve, reject) {
            var id = name + '-' + (nextId++);
            callbacks[id] = { resolve: resolve, reject: reject };
            send({ type: 'call', payload: { bindingName: name, data: JSON.stringify(args), callbackId: id } });
        });
    }
    function addBinding(name) {
        var parts = name.split('.');
        var target = window.backend = window.backend || {};
        for (var i = 0; i < parts.length - 1; i++) {
            target = target[parts[i]] = target[parts[i]] || {};
        }
        target[parts[parts.length - 1]] = function () {
            return call(name, Array.prototype.slice.call(arguments));
        };
    }
    function callback(data) {
        var message = JSON.parse(data);
        var entry = callbacks[message.callbackid];
        if (!entry) {
            return;
        }
        delete callbacks[message.callbackid];
        if (message.error) {
            entry.reject(message.error);
        } else {
            entry.resolve(message.data);
        }
    }
    function notify(name, data) {
        var payload = JSON.parse(data);
        (listeners[name] || []).forEach(function (listener) {
            listener.apply(null, [].concat(payload));
        });
    }
    function injectCSS(css) {
        var style = document.createElement('style');
        style.setAttribute('type', 'text/css');
        style.appendChild(document.createTextNode(css));
        document.head.appendChild(style);
    }
    window.bridge = window.bridge || {};
    window.bridge._ = {
        addBinding: addBinding,
        callback: callback,
        notify: notify,
        injectCSS: injectCSS
    };
    window.bridge.Events = {
        On: function (name, listener) {
            (listeners[name] = listeners[name] || []).push(listener);
        },
        Emit: function (name) {
            send({ type: 'event', payload: { name: name, data: JSON.stringify([].slice.call(arguments, 1)) } });
        }
    };
})();"##;

/// Minimal DOM helper exposing `$(selector).html(markup)`.
///
/// Sent to browser tabs only; bridge clients ship their own chrome.
pub const DOM_HELPER_JS: &str = r##"(function () {
    function Selection(nodes) {
        this.nodes = nodes;
    }
    Selection.prototype.html = function (markup) {
        if (markup === undefined) {
            return this.nodes.length ? this.nodes[0].innerHTML : undefined;
        }
        this.nodes.forEach(function (node) { node.innerHTML = markup; });
        return this;
    };
    Selection.prototype.each = function (fn) {
        this.nodes.forEach(function (node, i) { fn.call(node, i, node); });
        return this;
    };
    window.$ = function (selector) {
        return new Selection(Array.prototype.slice.call(document.querySelectorAll(selector)));
    };
})();"##;

/// Stylesheet used when the application configures none.
pub const DEFAULT_CSS: &str = r##"/* Default bridge stylesheet */
html {
    height: 100%;
    overflow: hidden;
}

body {
    margin: 0;
    height: 100%;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background-color: #1b2636;
    color: #ffffff;
}

#app {
    height: 100%;
}
"##;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_contains_required_elements() {
        assert!(INDEX_HTML.contains("<!DOCTYPE html>"));
        assert!(INDEX_HTML.contains("<div id=\"app\"></div>"));
        assert!(INDEX_HTML.contains("'/ws'"));
    }

    #[test]
    fn test_index_handles_every_tag() {
        for kind in crate::protocol::MessageKind::ALL {
            assert!(
                INDEX_HTML.contains(&format!("case '{}'", kind.tag())),
                "missing handler for {kind}"
            );
        }
    }

    #[test]
    fn test_runtime_exposes_injection_hooks() {
        assert!(RUNTIME_JS.contains("injectCSS: injectCSS"));
        assert!(RUNTIME_JS.contains("notify: notify"));
        assert!(RUNTIME_JS.contains("addBinding: addBinding"));
    }

    #[test]
    fn test_default_css_minifies() {
        assert!(crate::css::injection(DEFAULT_CSS).is_ok());
    }
}
